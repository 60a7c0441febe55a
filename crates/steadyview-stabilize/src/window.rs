//! Quadrant search windows.
//!
//! ```text
//!  -------------------------------------------------
//!  |       P                               P       |
//!  |<-P-> ----------------------------------- <-P->|
//!  |      |(left, top)                      |      |
//!  |      |                                 |      |
//!  |      |                  (right, bottom)|      |
//!  |<-P-> ----------------------------------- <-P->|
//!  |      P                                 P      |
//!  -------------------------------------------------
//! ```
//!
//! One window of M x N pixels sits at the center of each frame quadrant.
//! Correlation reads the previous plane up to P pixels outside the window,
//! so the window expanded by P must stay inside the frame.

use serde::{Deserialize, Serialize};
use steadyview_core::{FrameSize, Result, SteadyError};

/// Frame quadrant, in the order local estimates are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::UpperLeft,
        Quadrant::UpperRight,
        Quadrant::LowerLeft,
        Quadrant::LowerRight,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Rectangular window; `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchWindow {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl SearchWindow {
    #[inline]
    pub fn width(self) -> u32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(self) -> u32 {
        self.bottom - self.top
    }

    /// Window grown by `margin` on every side. Callers guarantee the margin
    /// fits, which [`QuadrantWindows::compute`] checks once.
    #[inline]
    pub fn expanded(self, margin: u32) -> Self {
        Self {
            left: self.left - margin,
            top: self.top - margin,
            right: self.right + margin,
            bottom: self.bottom + margin,
        }
    }
}

/// The four quadrant windows of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadrantWindows {
    windows: [SearchWindow; 4],
    margin: u32,
}

impl QuadrantWindows {
    /// Place an M x N window at the center of every quadrant and verify the
    /// search margin fits inside the frame.
    pub fn compute(size: FrameSize, window_width: u32, window_height: u32, margin: u32) -> Result<Self> {
        if size.is_empty() {
            return Err(SteadyError::InvalidDimensions {
                width: size.width,
                height: size.height,
            });
        }
        let h_offset = size.width / 2;
        let v_offset = size.height / 2;
        let half_m = window_width / 2;
        let half_n = window_height / 2;

        let fits = h_offset / 2 >= half_m + margin
            && v_offset / 2 >= half_n + margin
            && h_offset + h_offset / 2 + half_m + margin <= size.width
            && v_offset + v_offset / 2 + half_n + margin <= size.height;
        if !fits {
            return Err(SteadyError::Configuration(format!(
                "{size} frame is too small for {window_width}x{window_height} windows with a {margin} pixel search margin"
            )));
        }

        let place = |col: u32, row: u32| {
            let cx = h_offset / 2 + col * h_offset;
            let cy = v_offset / 2 + row * v_offset;
            SearchWindow {
                left: cx - half_m,
                top: cy - half_n,
                right: cx + half_m,
                bottom: cy + half_n,
            }
        };

        Ok(Self {
            windows: [place(0, 0), place(1, 0), place(0, 1), place(1, 1)],
            margin,
        })
    }

    #[inline]
    pub fn get(&self, quadrant: Quadrant) -> SearchWindow {
        self.windows[quadrant.index()]
    }

    /// Search margin the windows were validated against.
    #[inline]
    pub fn margin(&self) -> u32 {
        self.margin
    }

    pub fn iter(&self) -> impl Iterator<Item = (Quadrant, SearchWindow)> + '_ {
        Quadrant::ALL.into_iter().map(|q| (q, self.get(q)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vga_windows() {
        let windows = QuadrantWindows::compute(FrameSize::new(640, 480), 25, 25, 6).unwrap();
        assert_eq!(
            windows.get(Quadrant::UpperLeft),
            SearchWindow {
                left: 148,
                top: 108,
                right: 172,
                bottom: 132
            }
        );
        assert_eq!(
            windows.get(Quadrant::LowerRight),
            SearchWindow {
                left: 468,
                top: 348,
                right: 492,
                bottom: 372
            }
        );
        for (_, w) in windows.iter() {
            assert_eq!(w.width(), 24);
            assert_eq!(w.height(), 24);
        }
    }

    #[test]
    fn test_quadrants_do_not_overlap_and_margin_fits() {
        let size = FrameSize::new(160, 120);
        let windows = QuadrantWindows::compute(size, 25, 25, 6).unwrap();
        for (q, w) in windows.iter() {
            let e = w.expanded(windows.margin());
            assert!(e.right <= size.width && e.bottom <= size.height);
            let (in_right, in_bottom) = (w.left >= size.width / 2, w.top >= size.height / 2);
            match q {
                Quadrant::UpperLeft => assert!(!in_right && !in_bottom),
                Quadrant::UpperRight => assert!(in_right && !in_bottom),
                Quadrant::LowerLeft => assert!(!in_right && in_bottom),
                Quadrant::LowerRight => assert!(in_right && in_bottom),
            }
        }
    }

    #[test]
    fn test_rejects_small_or_empty_frames() {
        assert!(matches!(
            QuadrantWindows::compute(FrameSize::new(0, 480), 25, 25, 6),
            Err(SteadyError::InvalidDimensions { .. })
        ));
        assert!(matches!(
            QuadrantWindows::compute(FrameSize::new(64, 64), 25, 25, 6),
            Err(SteadyError::Configuration(_))
        ));
        assert!(QuadrantWindows::compute(FrameSize::new(72, 72), 25, 25, 6).is_ok());
    }
}
