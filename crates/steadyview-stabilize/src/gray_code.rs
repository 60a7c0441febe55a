//! Gray-code bit planes and their two-frame history.
//!
//! A gray-code bit is the XOR of two adjacent bits of a pixel value. It is
//! far less sensitive to slow illumination changes than raw intensity and
//! lets block matching use a plain mismatch count.

use crate::window::SearchWindow;
use steadyview_core::{FrameSize, GrayFrame};

/// Gray-code bit of `value` for plane `k`: bit `k` XOR bit `k + 1`.
#[inline]
pub fn gray_code_bit(value: u8, plane: u8) -> u8 {
    ((value >> plane) ^ (value >> (plane + 1))) & 1
}

/// Boolean plane stored one byte (0 or 1) per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayCodePlane {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl GrayCodePlane {
    pub fn new(size: FrameSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
            bits: vec![0; size.pixel_count()],
        }
    }

    #[inline]
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.bits[y as usize * self.width as usize + x as usize]
    }

    /// Bits of row `y` between columns `left..right`.
    #[inline]
    pub fn row_span(&self, y: u32, left: u32, right: u32) -> &[u8] {
        let start = y as usize * self.width as usize;
        &self.bits[start + left as usize..start + right as usize]
    }

    /// Recompute the bits inside `region` from `frame`. Pixels outside the
    /// region keep whatever they held before.
    pub fn encode_region(&mut self, frame: &GrayFrame, region: SearchWindow, plane: u8) {
        let (left, right) = (region.left as usize, region.right as usize);
        for y in region.top..region.bottom {
            let src = &frame.row(y)[left..right];
            let start = y as usize * self.width as usize;
            let dst = &mut self.bits[start + left..start + right];
            for (bit, &value) in dst.iter_mut().zip(src) {
                *bit = gray_code_bit(value, plane);
            }
        }
    }

    pub fn clear(&mut self) {
        self.bits.fill(0);
    }
}

/// Two-slot ring holding the gray-code planes of the current and the
/// previous frame.
///
/// `current()` is always the most recently encoded plane; `previous()`
/// becomes available once two frames have been encoded.
#[derive(Debug, Clone)]
pub struct GrayCodeHistory {
    slots: [GrayCodePlane; 2],
    current: usize,
    encoded: u8,
}

impl GrayCodeHistory {
    pub fn new(size: FrameSize) -> Self {
        Self {
            slots: [GrayCodePlane::new(size), GrayCodePlane::new(size)],
            current: 1,
            encoded: 0,
        }
    }

    /// Rotate the ring and return the slot that will hold the new frame.
    /// The old current plane becomes `previous()`.
    pub fn begin_frame(&mut self) -> &mut GrayCodePlane {
        self.current ^= 1;
        self.encoded = (self.encoded + 1).min(2);
        &mut self.slots[self.current]
    }

    /// Plane encoded by the latest `begin_frame`, if any.
    pub fn current(&self) -> Option<&GrayCodePlane> {
        (self.encoded > 0).then(|| &self.slots[self.current])
    }

    pub fn previous(&self) -> Option<&GrayCodePlane> {
        (self.encoded > 1).then(|| &self.slots[self.current ^ 1])
    }

    /// Current and previous planes together.
    pub fn pair(&self) -> Option<(&GrayCodePlane, &GrayCodePlane)> {
        Some((self.current()?, self.previous()?))
    }

    pub fn frames_encoded(&self) -> u8 {
        self.encoded
    }

    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.current = 1;
        self.encoded = 0;
    }
}
