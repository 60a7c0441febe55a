//! SteadyView App - per-frame pipeline and synthetic input for the demo binary.

pub mod pipeline;
pub mod synthetic;

pub use pipeline::{FramePipeline, PipelineConfig, PipelineOutput};
pub use synthetic::{SyntheticConfig, SyntheticFrame, SyntheticSequence};
