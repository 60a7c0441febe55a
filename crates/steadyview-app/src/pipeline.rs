//! Stabilizer and tracker run back to back on every frame.

use anyhow::Context;
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::path::Path;
use steadyview_core::{FrameBuffer, FrameSize, GrayFrame, Point};
use steadyview_stabilize::{MotionEstimate, ProcessingTime, Stabilizer, StabilizerConfig};
use steadyview_tracking::{
    CenterGuidance, CenterOffset, GuidanceConfig, RegionTracker, SelectionHandle, TrackUpdate,
    TrackerConfig,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub stabilizer: StabilizerConfig,
    pub tracker: TrackerConfig,
    pub guidance: GuidanceConfig,
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub motion: MotionEstimate,
    /// Set when a timing window completed on this frame.
    pub timing: Option<ProcessingTime>,
    pub track: TrackUpdate,
    pub guidance: Option<CenterOffset>,
}

pub struct FramePipeline {
    size: FrameSize,
    stabilizer: Stabilizer,
    tracker: RegionTracker,
    guidance: CenterGuidance,
    background: u8,
    compensated: GrayFrame,
}

impl FramePipeline {
    pub fn new(width: u32, height: u32, config: PipelineConfig) -> steadyview_core::Result<Self> {
        let background = config.stabilizer.background;
        Ok(Self {
            size: FrameSize::new(width, height),
            stabilizer: Stabilizer::new(width, height, config.stabilizer)?,
            tracker: RegionTracker::new(config.tracker)?,
            guidance: CenterGuidance::new(config.guidance),
            background,
            compensated: GrayFrame::filled(width, height, background),
        })
    }

    /// Convert to luma and process.
    pub fn process(&mut self, frame: &FrameBuffer) -> steadyview_core::Result<PipelineOutput> {
        self.process_gray(&frame.to_gray())
    }

    /// Stabilize then track the same input frame.
    pub fn process_gray(&mut self, frame: &GrayFrame) -> steadyview_core::Result<PipelineOutput> {
        frame.ensure_size(self.size)?;
        self.compensated.fill(self.background);
        let report = self.stabilizer.stabilize_into(frame, &mut self.compensated)?;
        let track = self.tracker.process_frame(frame)?;
        let guidance = self.guidance.observe(track.point, self.size, track.locked);
        Ok(PipelineOutput {
            motion: report.estimate,
            timing: report.timing,
            track,
            guidance,
        })
    }

    /// Compensated frame of the last `process` call.
    pub fn compensated(&self) -> &GrayFrame {
        &self.compensated
    }

    pub fn select_point(&mut self, point: Point, frame: &GrayFrame) -> steadyview_core::Result<()> {
        self.guidance.reset();
        self.tracker.select_point(point, frame)
    }

    pub fn selection_handle(&self) -> SelectionHandle {
        self.tracker.selection_handle()
    }

    pub fn subscribe_timing(&mut self) -> Receiver<ProcessingTime> {
        self.stabilizer.subscribe_timing()
    }

    pub fn stabilizer(&self) -> &Stabilizer {
        &self.stabilizer
    }

    pub fn tracker(&self) -> &RegionTracker {
        &self.tracker
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }
}
