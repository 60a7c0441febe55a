//! Single-channel 8-bit frames, the working format of both engines.

use crate::error::{Result, SteadyError};
use crate::geometry::{FrameSize, PixelRect};

/// An 8-bit grayscale frame stored as a tightly packed row-major buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl GrayFrame {
    /// Black frame of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, 0)
    }

    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
        }
    }

    /// Wrap an existing buffer. The length must be exactly `width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(SteadyError::InvalidParameter(format!(
                "buffer holds {} bytes, a {width}x{height} frame needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        if x < self.width && y < self.height {
            self.data[y as usize * self.width as usize + x as usize] = value;
        }
    }

    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.width as usize;
        &self.data[start..start + self.width as usize]
    }

    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.width as usize;
        let end = start + self.width as usize;
        &mut self.data[start..end]
    }

    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }

    /// Fail with `DimensionMismatch` unless the frame has the given size.
    pub fn ensure_size(&self, expected: FrameSize) -> Result<()> {
        if self.size() == expected {
            Ok(())
        } else {
            Err(SteadyError::DimensionMismatch {
                expected,
                actual: self.size(),
            })
        }
    }

    /// Copy a sub-region. The rectangle must lie inside the frame.
    pub fn crop(&self, rect: PixelRect) -> Result<GrayFrame> {
        if rect.width == 0 || rect.height == 0 || !rect.fits_within(self.size()) {
            return Err(SteadyError::OutOfBounds {
                rect,
                frame: self.size(),
            });
        }
        let x0 = rect.x as usize;
        let w = rect.width as usize;
        let mut data = Vec::with_capacity(rect.area());
        for y in rect.top()..rect.bottom() {
            let row = self.row(y as u32);
            data.extend_from_slice(&row[x0..x0 + w]);
        }
        Ok(Self {
            width: rect.width,
            height: rect.height,
            data,
        })
    }

    /// Copy of the frame with its content moved by `(dx, dy)`:
    /// `out(x, y) = self(x - dx, y - dy)`, uncovered pixels set to `background`.
    pub fn translated(&self, dx: i32, dy: i32, background: u8) -> GrayFrame {
        let mut out = Self::filled(self.width, self.height, background);
        let w = self.width as i32;
        let h = self.height as i32;
        let x_start = dx.max(0);
        let x_end = (w + dx).min(w);
        if x_start >= x_end {
            return out;
        }
        for y in dy.max(0)..(h + dy).min(h) {
            let src = self.row((y - dy) as u32);
            let dst = out.row_mut(y as u32);
            dst[x_start as usize..x_end as usize]
                .copy_from_slice(&src[(x_start - dx) as usize..(x_end - dx) as usize]);
        }
        out
    }

    /// Deterministic uniform noise, useful as a richly textured test scene.
    pub fn noise_pattern(width: u32, height: u32, seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        let mut frame = Self::new(width, height);
        for px in &mut frame.data {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            *px = (state >> 56) as u8;
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec_length_check() {
        assert!(GrayFrame::from_vec(4, 4, vec![0; 16]).is_ok());
        assert!(matches!(
            GrayFrame::from_vec(4, 4, vec![0; 15]),
            Err(SteadyError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_crop() {
        let mut frame = GrayFrame::new(8, 8);
        frame.set(3, 4, 200);
        let crop = frame.crop(PixelRect::new(2, 3, 4, 4)).unwrap();
        assert_eq!(crop.size(), FrameSize::new(4, 4));
        assert_eq!(crop.get(1, 1), 200);
        assert!(frame.crop(PixelRect::new(6, 6, 4, 4)).is_err());
        assert!(frame.crop(PixelRect::new(0, 0, 0, 4)).is_err());
    }

    #[test]
    fn test_translated() {
        let frame = GrayFrame::noise_pattern(16, 16, 7);
        let moved = frame.translated(3, -2, 0);
        assert_eq!(moved.get(5, 5), frame.get(2, 7));
        assert_eq!(moved.get(0, 0), 0);
        assert_eq!(moved.get(15, 15), 0);
        assert!(frame.translated(20, 0, 9).data().iter().all(|&v| v == 9));
    }

    #[test]
    fn test_ensure_size() {
        let frame = GrayFrame::new(10, 20);
        assert!(frame.ensure_size(FrameSize::new(10, 20)).is_ok());
        assert_eq!(
            frame.ensure_size(FrameSize::new(20, 10)),
            Err(SteadyError::DimensionMismatch {
                expected: FrameSize::new(20, 10),
                actual: FrameSize::new(10, 20),
            })
        );
    }

    #[test]
    fn test_noise_pattern_is_deterministic() {
        let a = GrayFrame::noise_pattern(32, 32, 1);
        let b = GrayFrame::noise_pattern(32, 32, 1);
        let c = GrayFrame::noise_pattern(32, 32, 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
        let distinct: std::collections::HashSet<u8> = a.data().iter().copied().collect();
        assert!(distinct.len() > 128);
    }
}
