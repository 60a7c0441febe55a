//! Per-frame motion estimation and compensation.

use crate::compensate::compensate_into;
use crate::config::StabilizerConfig;
use crate::gray_code::{GrayCodeHistory, GrayCodePlane};
use crate::motion::{MotionSmoother, MotionVector};
use crate::search::{Candidate, QuadrantSearch};
use crate::timing::{ProcessingTime, ProcessingTimer};
use crate::window::{Quadrant, QuadrantWindows};
use crossbeam_channel::Receiver;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use steadyview_core::{FrameSize, GrayFrame, Result};
use tracing::{debug, info};

/// Motion found for one frame.
///
/// Local estimates use the convention `current(x, y) ~ previous(x + dx, y + dy)`,
/// so `vector` is directly the compensation applied to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionEstimate {
    /// Zero-based index of the frame within the session.
    pub frame_index: u64,
    /// Best candidate per quadrant, in [`Quadrant::ALL`] order.
    pub local: [Candidate; 4],
    /// Per-axis median of the local estimates and the reference vector.
    pub raw: MotionVector,
    /// Smoothed, clamped global vector.
    pub vector: MotionVector,
    /// False for the first frame of a session, which has nothing to match against.
    pub has_reference: bool,
}

impl MotionEstimate {
    pub fn local_vector(&self, quadrant: Quadrant) -> MotionVector {
        let c = self.local[quadrant.index()];
        MotionVector::new(c.dx, c.dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilizeReport {
    pub estimate: MotionEstimate,
    /// Wall time of this call.
    pub elapsed: Duration,
    /// Set on the call that completes a timing window.
    pub timing: Option<ProcessingTime>,
}

/// Gray-code block matching stabilizer for one fixed-size frame stream.
pub struct Stabilizer {
    config: StabilizerConfig,
    size: FrameSize,
    windows: QuadrantWindows,
    history: GrayCodeHistory,
    smoother: MotionSmoother,
    timer: ProcessingTimer,
    frames: u64,
}

impl Stabilizer {
    pub fn new(width: u32, height: u32, config: StabilizerConfig) -> Result<Self> {
        config.validate()?;
        let size = FrameSize::new(width, height);
        let windows = QuadrantWindows::compute(
            size,
            config.window_width,
            config.window_height,
            config.search_radius,
        )?;
        info!(
            width,
            height,
            radius = config.search_radius,
            search = ?config.search,
            "Stabilizer initialized"
        );
        Ok(Self {
            history: GrayCodeHistory::new(size),
            smoother: MotionSmoother::new(&config),
            timer: ProcessingTimer::new(config.timing_window),
            config,
            size,
            windows,
            frames: 0,
        })
    }

    /// Start a new session for frames of `width x height`. On error the
    /// previous session stays intact. Timing subscribers remain attached.
    pub fn initialize(&mut self, width: u32, height: u32) -> Result<()> {
        let size = FrameSize::new(width, height);
        let windows = QuadrantWindows::compute(
            size,
            self.config.window_width,
            self.config.window_height,
            self.config.search_radius,
        )?;
        if size == self.size {
            self.reset();
        } else {
            self.history = GrayCodeHistory::new(size);
            self.smoother.reset();
            self.timer.reset();
            self.frames = 0;
        }
        self.size = size;
        self.windows = windows;
        info!(width, height, "Stabilizer re-initialized");
        Ok(())
    }

    /// Estimate the compensation vector for `source` and advance the session.
    pub fn estimate(&mut self, source: &GrayFrame) -> Result<MotionEstimate> {
        source.ensure_size(self.size)?;

        let margin = self.windows.margin();
        let plane = self.history.begin_frame();
        for (_, window) in self.windows.iter() {
            plane.encode_region(source, window.expanded(margin), self.config.bit_plane);
        }

        let (local, has_reference) = match self.history.pair() {
            Some((current, previous)) => (
                search_quadrants(&self.windows, current, previous, &self.config),
                true,
            ),
            None => ([Candidate::default(); 4], false),
        };

        let update = self
            .smoother
            .update(local.map(|c| MotionVector::new(c.dx, c.dy)));
        let estimate = MotionEstimate {
            frame_index: self.frames,
            local,
            raw: update.raw,
            vector: update.smoothed,
            has_reference,
        };
        self.frames += 1;
        Ok(estimate)
    }

    /// Estimate motion and write the compensated frame into `dest`.
    pub fn stabilize_into(&mut self, source: &GrayFrame, dest: &mut GrayFrame) -> Result<StabilizeReport> {
        let start = Instant::now();
        dest.ensure_size(self.size)?;
        let estimate = self.estimate(source)?;
        compensate_into(source, estimate.vector, dest)?;

        let elapsed = start.elapsed();
        let timing = self.timer.record(elapsed);
        if let Some(t) = timing {
            debug!(
                average_ms = t.as_millis_f64(),
                frames = t.frames,
                "Stabilizer processing time"
            );
        }
        Ok(StabilizeReport {
            estimate,
            elapsed,
            timing,
        })
    }

    /// Like [`stabilize_into`](Self::stabilize_into) with a fresh output
    /// frame filled with the configured background.
    pub fn stabilize(&mut self, source: &GrayFrame) -> Result<(GrayFrame, StabilizeReport)> {
        source.ensure_size(self.size)?;
        let mut dest = GrayFrame::filled(self.size.width, self.size.height, self.config.background);
        let report = self.stabilize_into(source, &mut dest)?;
        Ok((dest, report))
    }

    pub fn subscribe_timing(&mut self) -> Receiver<ProcessingTime> {
        self.timer.subscribe()
    }

    /// Average of the last completed timing window.
    pub fn average_process_time(&self) -> Option<ProcessingTime> {
        self.timer.last()
    }

    /// Forget history, vectors and timing. Buffers are reused.
    pub fn reset(&mut self) {
        self.history.reset();
        self.smoother.reset();
        self.timer.reset();
        self.frames = 0;
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn windows(&self) -> &QuadrantWindows {
        &self.windows
    }

    /// Current smoothed vector.
    pub fn current_vector(&self) -> MotionVector {
        self.smoother.current()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }
}

fn search_quadrants(
    windows: &QuadrantWindows,
    current: &GrayCodePlane,
    previous: &GrayCodePlane,
    config: &StabilizerConfig,
) -> [Candidate; 4] {
    let run = |q: Quadrant| {
        QuadrantSearch::new(current, previous, windows.get(q), config.search_radius).run(config.search)
    };
    let mut local = [Candidate::default(); 4];
    if config.parallel_quadrants {
        local
            .par_iter_mut()
            .zip(Quadrant::ALL.par_iter())
            .for_each(|(slot, &q)| *slot = run(q));
    } else {
        for (slot, q) in local.iter_mut().zip(Quadrant::ALL) {
            *slot = run(q);
        }
    }
    local
}
