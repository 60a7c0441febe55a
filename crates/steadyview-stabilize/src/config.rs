//! Stabilizer configuration.

use serde::{Deserialize, Serialize};
use steadyview_core::{Result, SteadyError};

/// Offset search strategy used inside each quadrant window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchStrategy {
    /// Coarse-to-fine 3x3 grids with halving step (three-step search).
    #[default]
    ThreeStep,
    /// Exhaustive (2P+1) x (2P+1) search. Experimental.
    Full,
}

/// Which previous vector joins the four quadrant estimates in the median.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MedianReference {
    /// The previous smoothed global vector.
    #[default]
    Smoothed,
    /// The previous frame's raw median estimate.
    Raw,
}

/// Fixed parameters of a [`Stabilizer`](crate::Stabilizer) session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// Gray-code bit plane `k`: the code bit is bit `k` XOR bit `k + 1`.
    pub bit_plane: u8,
    /// Largest offset searched on either axis (P).
    pub search_radius: u32,
    /// Quadrant window width (M).
    pub window_width: u32,
    /// Quadrant window height (N).
    pub window_height: u32,
    /// Exponential decay applied to the previous smoothed vector.
    pub pan_factor: f64,
    pub max_motion_x: i32,
    pub max_motion_y: i32,
    pub search: SearchStrategy,
    pub median_reference: MedianReference,
    /// Number of calls averaged per processing-time event.
    pub timing_window: u32,
    /// Run the four quadrant searches on the rayon pool.
    pub parallel_quadrants: bool,
    /// Fill value of compensated frames allocated by the stabilizer.
    pub background: u8,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            bit_plane: 4,
            search_radius: 6,
            window_width: 25,
            window_height: 25,
            pan_factor: 0.95,
            max_motion_x: 65,
            max_motion_y: 65,
            search: SearchStrategy::ThreeStep,
            median_reference: MedianReference::Smoothed,
            timing_window: 10,
            parallel_quadrants: false,
            background: 0,
        }
    }
}

impl StabilizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bit_plane > 6 {
            return Err(SteadyError::Configuration(format!(
                "bit plane must be in 0..=6, got {}",
                self.bit_plane
            )));
        }
        if self.search_radius == 0 {
            return Err(SteadyError::Configuration(
                "search radius must be positive".into(),
            ));
        }
        if self.window_width < 2 || self.window_height < 2 {
            return Err(SteadyError::Configuration(format!(
                "quadrant window {}x{} is too small",
                self.window_width, self.window_height
            )));
        }
        if !(0.0..1.0).contains(&self.pan_factor) {
            return Err(SteadyError::Configuration(format!(
                "pan factor must be in [0, 1), got {}",
                self.pan_factor
            )));
        }
        if self.max_motion_x < 0 || self.max_motion_y < 0 {
            return Err(SteadyError::Configuration(
                "maximum motion must be non-negative".into(),
            ));
        }
        if self.timing_window == 0 {
            return Err(SteadyError::Configuration(
                "timing window must be at least one frame".into(),
            ));
        }
        Ok(())
    }
}
