//! Error types for SteadyView.

use crate::geometry::{FrameSize, PixelRect};
use thiserror::Error;

/// Main error type for SteadyView operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SteadyError {
    /// Invalid configuration or a frame too small for the configured margins.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid frame dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A frame did not match the size the session was initialized with.
    #[error("Frame size mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: FrameSize,
        actual: FrameSize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Region {rect:?} lies outside a {frame} frame")]
    OutOfBounds { rect: PixelRect, frame: FrameSize },
}

/// Result type alias for SteadyView operations.
pub type Result<T> = std::result::Result<T, SteadyError>;
