//! SteadyView Stabilize - gray-code block matching jitter compensation.

pub mod compensate;
pub mod config;
pub mod gray_code;
pub mod motion;
pub mod search;
pub mod stabilizer;
pub mod timing;
pub mod window;

pub use compensate::compensate_into;
pub use config::{MedianReference, SearchStrategy, StabilizerConfig};
pub use gray_code::{gray_code_bit, GrayCodeHistory, GrayCodePlane};
pub use motion::{median_of_five, MotionSmoother, MotionUpdate, MotionVector};
pub use search::{Candidate, QuadrantSearch};
pub use stabilizer::{MotionEstimate, StabilizeReport, Stabilizer};
pub use timing::{ProcessingTime, ProcessingTimer, TIMING_BACKLOG};
pub use window::{Quadrant, QuadrantWindows, SearchWindow};
