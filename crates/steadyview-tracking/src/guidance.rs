//! Camera steering hint: how far the tracked point sits from the frame centre.

use serde::{Deserialize, Serialize};
use steadyview_core::{FrameSize, Point};

/// Offset from the tracking point to the frame centre (`centre - point`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterOffset {
    pub dx: i32,
    pub dy: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidanceConfig {
    /// Locked updates between two checks.
    pub interval: u32,
    /// Largest per-axis offset that is not reported.
    pub dead_zone: u32,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            interval: 2,
            dead_zone: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CenterGuidance {
    config: GuidanceConfig,
    counter: u32,
}

impl CenterGuidance {
    pub fn new(config: GuidanceConfig) -> Self {
        Self { config, counter: 0 }
    }

    /// Feed one tracker update. Every `interval`-th locked update reports the
    /// offset when either axis exceeds the dead zone.
    pub fn observe(&mut self, point: Point, frame: FrameSize, locked: bool) -> Option<CenterOffset> {
        if !locked {
            return None;
        }
        self.counter += 1;
        if self.counter < self.config.interval.max(1) {
            return None;
        }
        self.counter = 0;
        let center = frame.center();
        let offset = CenterOffset {
            dx: center.x - point.x,
            dy: center.y - point.y,
        };
        let dz = self.config.dead_zone;
        (offset.dx.unsigned_abs() > dz || offset.dy.unsigned_abs() > dz).then_some(offset)
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}
