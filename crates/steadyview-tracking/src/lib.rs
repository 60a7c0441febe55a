//! SteadyView Tracking - feature-based region tracking with Kalman smoothing.

pub mod brief;
pub mod config;
pub mod error;
pub mod fast;
pub mod guidance;
pub mod kalman;
pub mod matcher;
pub mod template;
pub mod tracker;

pub use brief::{BriefExtractor, Descriptor, FeatureExtractor, FeatureSet, IntegralImage};
pub use config::{FeatureConfig, KalmanConfig, LshParams, MatcherKind, TrackerConfig};
pub use error::ExtractError;
pub use fast::{FastDetector, Keypoint};
pub use guidance::{CenterGuidance, CenterOffset, GuidanceConfig};
pub use kalman::ConstantVelocityFilter;
pub use matcher::{
    create_matcher, good_matches, BruteForceMatcher, DescriptorMatcher, LshMatcher, Match,
};
pub use template::Template;
pub use tracker::{MatchOutcome, RegionTracker, SelectionHandle, TrackState, TrackUpdate};
