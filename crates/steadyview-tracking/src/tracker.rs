//! Template tracking by feature matching inside a local search window.
//!
//! ```text
//!   Idle --select--> Selecting --frame--> Tracking <--> Lost
//!    ^                                        |          |
//!    +------------------ disable -------------+----------+
//! ```

use crate::brief::FeatureExtractor;
use crate::config::TrackerConfig;
use crate::error::ExtractError;
use crate::kalman::ConstantVelocityFilter;
use crate::matcher::{create_matcher, good_matches, DescriptorMatcher};
use crate::template::Template;
use crossbeam_channel::{Receiver, Sender};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use steadyview_core::{FrameSize, GrayFrame, PixelRect, Point, Result, SteadyError};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackState {
    /// No target selected; frames are ignored.
    #[default]
    Idle,
    /// Template captured, descriptors pending.
    Selecting,
    /// Locked on the target.
    Tracking,
    /// Last match failed; matching continues every frame.
    Lost,
}

/// Result of one matching attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Enough good matches; `observed` is the raw target position in frame
    /// coordinates before filtering.
    Located { observed: Vec2, good_matches: usize },
    /// Too few good matches, or no features could be extracted.
    Insufficient {
        good_matches: usize,
        cause: Option<ExtractError>,
    },
}

impl MatchOutcome {
    pub fn good_matches(&self) -> usize {
        match self {
            Self::Located { good_matches, .. } | Self::Insufficient { good_matches, .. } => *good_matches,
        }
    }
}

/// Per-frame tracker output.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackUpdate {
    pub frame_index: u64,
    pub state: TrackState,
    pub point: Point,
    pub locked: bool,
    /// `None` while idle.
    pub outcome: Option<MatchOutcome>,
    /// The template was re-captured at the filtered position this frame.
    pub reseeded: bool,
}

/// Sends selection points to a [`RegionTracker`] from any thread. The most
/// recent point sent before a `process_frame` call takes effect on it.
#[derive(Debug, Clone)]
pub struct SelectionHandle {
    tx: Sender<Point>,
}

impl SelectionHandle {
    /// Returns false once the tracker has been dropped.
    pub fn select(&self, point: Point) -> bool {
        self.tx.send(point).is_ok()
    }
}

pub struct RegionTracker {
    config: TrackerConfig,
    extractor: FeatureExtractor,
    matcher: Box<dyn DescriptorMatcher>,
    filter: ConstantVelocityFilter,
    state: TrackState,
    template: Option<Template>,
    point: Point,
    frame_size: Option<FrameSize>,
    confident_streak: u32,
    frames: u64,
    selection_tx: Sender<Point>,
    selection_rx: Receiver<Point>,
}

impl RegionTracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        let (selection_tx, selection_rx) = crossbeam_channel::unbounded();
        Ok(Self {
            extractor: FeatureExtractor::new(&config.features),
            matcher: create_matcher(config.matcher, &config.lsh),
            filter: ConstantVelocityFilter::new(&config.kalman),
            config,
            state: TrackState::Idle,
            template: None,
            point: Point::ZERO,
            frame_size: None,
            confident_streak: 0,
            frames: 0,
            selection_tx,
            selection_rx,
        })
    }

    pub fn selection_handle(&self) -> SelectionHandle {
        SelectionHandle {
            tx: self.selection_tx.clone(),
        }
    }

    /// Capture the template around `point` on `frame` and start a session
    /// for frames of that size. Points off the frame select its nearest pixel.
    pub fn select_point(&mut self, point: Point, frame: &GrayFrame) -> Result<()> {
        let size = frame.size();
        let search = self.config.search_size;
        if size.width < search || size.height < search {
            return Err(SteadyError::InvalidParameter(format!(
                "{size} frame is smaller than the {search}x{search} search window"
            )));
        }
        let point = size.clamp(point);
        let template = Template::capture(frame, point, self.config.template_size)?;
        self.point = self.clamp_point(point, size);
        self.filter.reset(self.point.as_vec2());
        self.template = Some(template);
        self.frame_size = Some(size);
        self.state = TrackState::Selecting;
        self.confident_streak = 0;
        info!(x = point.x, y = point.y, tracking_x = self.point.x, tracking_y = self.point.y, "Target selected");
        Ok(())
    }

    /// Run one tracking cycle on `frame`.
    pub fn process_frame(&mut self, frame: &GrayFrame) -> Result<TrackUpdate> {
        if let Some(point) = self.selection_rx.try_iter().last() {
            self.select_point(point, frame)?;
        }

        let frame_index = self.frames;
        self.frames += 1;
        let Some(size) = self.frame_size.filter(|_| self.state != TrackState::Idle) else {
            return Ok(self.update(frame_index, None, false));
        };
        frame.ensure_size(size)?;

        if self.state == TrackState::Selecting {
            if let Some(template) = self.template.as_mut() {
                match template.extract_features(&self.extractor) {
                    Ok(count) => debug!(keypoints = count, "Template features extracted"),
                    Err(e) => warn!(error = %e, "Template feature extraction failed"),
                }
            }
            self.state = TrackState::Tracking;
        }

        self.filter.predict();
        let outcome = self.locate(frame);
        let mut reseeded = false;
        match &outcome {
            MatchOutcome::Located {
                observed,
                good_matches,
            } => {
                let corrected = self.filter.correct(*observed);
                self.point = self.clamp_point(Point::from_vec2_round(corrected), size);
                if self.state == TrackState::Lost {
                    debug!(x = self.point.x, y = self.point.y, "Target reacquired");
                }
                self.state = TrackState::Tracking;

                if *good_matches > self.config.min_good_matches {
                    self.confident_streak += 1;
                } else {
                    self.confident_streak = 0;
                }
                if self.confident_streak >= self.config.reseed_interval {
                    reseeded = self.reseed(frame);
                    self.confident_streak = 0;
                }
            }
            MatchOutcome::Insufficient { good_matches, cause } => {
                if self.state == TrackState::Tracking {
                    warn!(
                        good_matches,
                        cause = ?cause,
                        "Target lost"
                    );
                }
                self.state = TrackState::Lost;
                self.confident_streak = 0;
            }
        }
        Ok(self.update(frame_index, Some(outcome), reseeded))
    }

    /// Back to `Idle`; the template is dropped.
    pub fn disable(&mut self) {
        if self.state != TrackState::Idle {
            debug!("Tracking disabled");
        }
        self.state = TrackState::Idle;
        self.template = None;
        self.frame_size = None;
        self.confident_streak = 0;
    }

    /// `disable` plus discarding pending selections and the frame count.
    pub fn reset(&mut self) {
        self.disable();
        self.selection_rx.try_iter().for_each(drop);
        self.point = Point::ZERO;
        self.frames = 0;
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn tracking_point(&self) -> Point {
        self.point
    }

    pub fn is_locked(&self) -> bool {
        self.state == TrackState::Tracking
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    fn update(&self, frame_index: u64, outcome: Option<MatchOutcome>, reseeded: bool) -> TrackUpdate {
        TrackUpdate {
            frame_index,
            state: self.state,
            point: self.point,
            locked: self.is_locked(),
            outcome,
            reseeded,
        }
    }

    /// Keep the search window around `point` inside the frame.
    fn clamp_point(&self, point: Point, size: FrameSize) -> Point {
        let s = self.config.search_size;
        PixelRect::centered(point, s, s)
            .shifted_inside(size)
            .map_or(point, |rect| rect.center())
    }

    fn search_rect(&self) -> PixelRect {
        let s = self.config.search_size;
        PixelRect::centered(self.point, s, s)
    }

    fn locate(&self, frame: &GrayFrame) -> MatchOutcome {
        let insufficient = |good_matches, cause| MatchOutcome::Insufficient { good_matches, cause };
        let Some(template) = self.template.as_ref() else {
            return insufficient(0, None);
        };
        let Some(template_features) = template.features() else {
            return insufficient(0, Some(ExtractError::NoFeatures));
        };

        let rect = self.search_rect();
        let Ok(region) = frame.crop(rect) else {
            return insufficient(
                0,
                Some(ExtractError::RegionTooSmall {
                    width: rect.width,
                    height: rect.height,
                    min: self.extractor.min_region_size(),
                }),
            );
        };
        let search_features = match self.extractor.extract(&region) {
            Ok(features) => features,
            Err(e) => return insufficient(0, Some(e)),
        };

        let matches = self
            .matcher
            .match_best(&template_features.descriptors, &search_features.descriptors);
        let good = good_matches(&matches, self.config.match_distance_floor);
        if good.len() < self.config.min_good_matches {
            return insufficient(good.len(), None);
        }

        let sum = good.iter().fold(Vec2::ZERO, |sum, m| {
            let kp = search_features.keypoints[m.train];
            sum + Vec2::new(kp.x as f32, kp.y as f32)
        });
        let centroid = sum / good.len() as f32 + rect.origin().as_vec2();
        let Some(offset) = template.anchor_offset(good.iter().map(|m| m.query)) else {
            return insufficient(good.len(), None);
        };
        MatchOutcome::Located {
            observed: centroid + offset,
            good_matches: good.len(),
        }
    }

    fn reseed(&mut self, frame: &GrayFrame) -> bool {
        let mut template = match Template::capture(frame, self.point, self.config.template_size) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "Template re-capture failed");
                return false;
            }
        };
        match template.extract_features(&self.extractor) {
            Ok(count) => {
                debug!(x = self.point.x, y = self.point.y, keypoints = count, "Template re-seeded");
                self.template = Some(template);
                true
            }
            Err(e) => {
                warn!(error = %e, "Re-seeded template has no features, keeping previous");
                false
            }
        }
    }
}
