//! Packed frame buffers as delivered by a capture source.
//!
//! Both engines work on [`GrayFrame`]; color input is converted once per
//! frame with [`FrameBuffer::to_gray`].

use crate::error::{Result, SteadyError};
use crate::geometry::FrameSize;
use crate::gray::GrayFrame;
use serde::{Deserialize, Serialize};

/// Pixel format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit grayscale
    #[default]
    Gray8,
    /// 8-bit RGB (24 bits per pixel)
    Rgb8,
    /// 8-bit BGR, the usual order of capture devices
    Bgr8,
    /// 8-bit RGBA (32 bits per pixel)
    Rgba8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Gray8 => 1,
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// A packed video frame in CPU memory.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    /// Bytes per row (may include padding)
    pub stride: usize,
    pub data: Vec<u8>,
}

impl FrameBuffer {
    /// Create a zeroed frame buffer.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        // Align stride to 64 bytes
        let min_stride = width as usize * format.bytes_per_pixel();
        let stride = (min_stride + 63) & !63;
        Self {
            format,
            width,
            height,
            stride,
            data: vec![0u8; stride * height as usize],
        }
    }

    /// Wrap tightly packed pixel data (`stride == width * bpp`).
    pub fn from_packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let stride = width as usize * format.bytes_per_pixel();
        if data.len() != stride * height as usize {
            return Err(SteadyError::InvalidParameter(format!(
                "{format:?} {width}x{height} frame needs {} bytes, got {}",
                stride * height as usize,
                data.len()
            )));
        }
        Ok(Self {
            format,
            width,
            height,
            stride,
            data,
        })
    }

    #[inline]
    pub fn size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }

    /// Pixel bytes of one row, without padding.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * self.format.bytes_per_pixel()]
    }

    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let end = start + self.width as usize * self.format.bytes_per_pixel();
        &mut self.data[start..end]
    }

    /// Convert to an 8-bit luma frame (BT.601 weights).
    pub fn to_gray(&self) -> GrayFrame {
        let mut gray = GrayFrame::new(self.width, self.height);
        for y in 0..self.height {
            let src = self.row(y);
            let dst = gray.row_mut(y);
            match self.format {
                PixelFormat::Gray8 => dst.copy_from_slice(src),
                PixelFormat::Rgb8 => {
                    let pixels: &[[u8; 3]] = bytemuck::cast_slice(src);
                    for (out, [r, g, b]) in dst.iter_mut().zip(pixels) {
                        *out = luma(*r, *g, *b);
                    }
                }
                PixelFormat::Bgr8 => {
                    let pixels: &[[u8; 3]] = bytemuck::cast_slice(src);
                    for (out, [b, g, r]) in dst.iter_mut().zip(pixels) {
                        *out = luma(*r, *g, *b);
                    }
                }
                PixelFormat::Rgba8 => {
                    let pixels: &[[u8; 4]] = bytemuck::cast_slice(src);
                    for (out, [r, g, b, _]) in dst.iter_mut().zip(pixels) {
                        *out = luma(*r, *g, *b);
                    }
                }
            }
        }
        gray
    }

    /// Expand a gray frame into `format`, replicating luma into every
    /// color channel (alpha opaque).
    pub fn from_gray(gray: &GrayFrame, format: PixelFormat) -> Self {
        let mut frame = Self::new(gray.width(), gray.height(), format);
        let bpp = format.bytes_per_pixel();
        for y in 0..gray.height() {
            let src = gray.row(y);
            let dst = frame.row_mut(y);
            for (px, &v) in dst.chunks_exact_mut(bpp).zip(src) {
                match format {
                    PixelFormat::Gray8 => px[0] = v,
                    PixelFormat::Rgb8 | PixelFormat::Bgr8 => px.copy_from_slice(&[v, v, v]),
                    PixelFormat::Rgba8 => px.copy_from_slice(&[v, v, v, 255]),
                }
            }
        }
        frame
    }
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    // 0.299, 0.587, 0.114 in 8.8 fixed point
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 128) >> 8) as u8
}
