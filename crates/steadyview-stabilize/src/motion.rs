//! Global motion vector: robust combination and temporal smoothing.

use crate::config::{MedianReference, StabilizerConfig};
use serde::{Deserialize, Serialize};

/// Integer translation. For the smoothed vector this is the compensation
/// applied to the frame: `out(x, y) = in(x - dx, y - dy)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MotionVector {
    pub dx: i32,
    pub dy: i32,
}

impl MotionVector {
    pub const ZERO: Self = Self::new(0, 0);

    #[inline]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Clamp each axis independently to `[-max, max]`.
    #[inline]
    pub fn clamped(self, max_x: i32, max_y: i32) -> Self {
        Self::new(self.dx.clamp(-max_x, max_x), self.dy.clamp(-max_y, max_y))
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

/// Median of five values (third of five after sorting).
#[inline]
pub fn median_of_five(mut values: [i32; 5]) -> i32 {
    values.sort_unstable();
    values[2]
}

/// Result of one smoothing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotionUpdate {
    /// Per-axis median of the quadrant estimates and the reference vector.
    pub raw: MotionVector,
    /// Smoothed and clamped global vector.
    pub smoothed: MotionVector,
}

/// Persistent motion state of a stabilizer session.
#[derive(Debug, Clone)]
pub struct MotionSmoother {
    pan_factor: f64,
    max_x: i32,
    max_y: i32,
    reference: MedianReference,
    current: MotionVector,
    previous: MotionVector,
    last_raw: MotionVector,
}

impl MotionSmoother {
    pub fn new(config: &StabilizerConfig) -> Self {
        Self {
            pan_factor: config.pan_factor,
            max_x: config.max_motion_x,
            max_y: config.max_motion_y,
            reference: config.median_reference,
            current: MotionVector::ZERO,
            previous: MotionVector::ZERO,
            last_raw: MotionVector::ZERO,
        }
    }

    /// Combine four local estimates into the next global vector.
    ///
    /// `smoothed = trunc(pan_factor * current + median)`, clamped per axis.
    /// Truncation toward zero lets a still scene decay all the way to (0, 0).
    pub fn update(&mut self, locals: [MotionVector; 4]) -> MotionUpdate {
        let reference = match self.reference {
            MedianReference::Smoothed => self.current,
            MedianReference::Raw => self.last_raw,
        };
        let raw = MotionVector::new(
            median_of_five([
                locals[0].dx,
                locals[1].dx,
                locals[2].dx,
                locals[3].dx,
                reference.dx,
            ]),
            median_of_five([
                locals[0].dy,
                locals[1].dy,
                locals[2].dy,
                locals[3].dy,
                reference.dy,
            ]),
        );

        let smooth = |prev: i32, raw: i32| (self.pan_factor * prev as f64 + raw as f64).trunc();
        let dx = smooth(self.current.dx, raw.dx);
        let dy = smooth(self.current.dy, raw.dy);
        // Clamp in floating point first so extreme inputs cannot overflow the cast.
        let smoothed = MotionVector::new(
            dx.clamp(-self.max_x as f64, self.max_x as f64) as i32,
            dy.clamp(-self.max_y as f64, self.max_y as f64) as i32,
        );

        self.previous = self.current;
        self.current = smoothed;
        self.last_raw = raw;
        MotionUpdate { raw, smoothed }
    }

    /// Current smoothed vector.
    #[inline]
    pub fn current(&self) -> MotionVector {
        self.current
    }

    /// Smoothed vector of the frame before the current one.
    #[inline]
    pub fn previous(&self) -> MotionVector {
        self.previous
    }

    #[inline]
    pub fn last_raw(&self) -> MotionVector {
        self.last_raw
    }

    pub fn reset(&mut self) {
        self.current = MotionVector::ZERO;
        self.previous = MotionVector::ZERO;
        self.last_raw = MotionVector::ZERO;
    }
}
