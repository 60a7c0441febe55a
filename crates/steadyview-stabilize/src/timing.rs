//! Rolling average of per-frame processing time.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Events queued per subscriber before new ones are dropped for it.
pub const TIMING_BACKLOG: usize = 16;

/// Average processing time over one completed window of calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingTime {
    pub average: Duration,
    pub frames: u32,
}

impl ProcessingTime {
    pub fn as_millis_f64(&self) -> f64 {
        self.average.as_secs_f64() * 1000.0
    }
}

/// Accumulates call durations and publishes an average every `window` calls.
#[derive(Debug)]
pub struct ProcessingTimer {
    window: u32,
    accumulated: Duration,
    count: u32,
    last: Option<ProcessingTime>,
    subscribers: Vec<Sender<ProcessingTime>>,
}

impl ProcessingTimer {
    pub fn new(window: u32) -> Self {
        Self {
            window: window.max(1),
            accumulated: Duration::ZERO,
            count: 0,
            last: None,
            subscribers: Vec::new(),
        }
    }

    /// Add one call's duration. Returns the event when a window completes.
    pub fn record(&mut self, elapsed: Duration) -> Option<ProcessingTime> {
        self.accumulated += elapsed;
        self.count += 1;
        if self.count < self.window {
            return None;
        }
        let event = ProcessingTime {
            average: self.accumulated / self.count,
            frames: self.count,
        };
        self.accumulated = Duration::ZERO;
        self.count = 0;
        self.last = Some(event);
        // Drop subscribers whose receiver is gone; a full queue skips this event.
        self.subscribers
            .retain(|tx| !matches!(tx.try_send(event), Err(TrySendError::Disconnected(_))));
        Some(event)
    }

    /// Receive future events on a channel holding up to [`TIMING_BACKLOG`]
    /// undrained events.
    pub fn subscribe(&mut self) -> Receiver<ProcessingTime> {
        let (tx, rx) = crossbeam_channel::bounded(TIMING_BACKLOG);
        self.subscribers.push(tx);
        rx
    }

    /// Average of the last completed window.
    pub fn last(&self) -> Option<ProcessingTime> {
        self.last
    }

    /// Clear the running window. Subscribers stay attached.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
        self.count = 0;
        self.last = None;
    }
}
