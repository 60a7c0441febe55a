//! SteadyView Core - Foundation types for frame analysis
//!
//! This crate provides the types shared by the stabilizer and the tracker:
//! - Frame buffers (packed color input, 8-bit gray working frames)
//! - Integer pixel geometry
//! - The common error type

pub mod error;
pub mod frame;
pub mod geometry;
pub mod gray;

pub use error::{Result, SteadyError};
pub use frame::{FrameBuffer, PixelFormat};
pub use geometry::{FrameSize, PixelRect, Point};
pub use gray::GrayFrame;
