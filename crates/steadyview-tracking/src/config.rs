//! Tracker configuration.

use serde::{Deserialize, Serialize};
use steadyview_core::{Result, SteadyError};

/// Nearest-neighbour strategy for descriptor matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatcherKind {
    /// Approximate search through locality-sensitive hash tables.
    #[default]
    Lsh,
    /// Exhaustive Hamming distance search.
    BruteForce,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LshParams {
    /// Number of hash tables.
    pub tables: u32,
    /// Descriptor bits sampled per table key.
    pub key_bits: u32,
}

impl Default for LshParams {
    fn default() -> Self {
        Self {
            tables: 6,
            key_bits: 12,
        }
    }
}

/// FAST detector and BRIEF extractor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Intensity difference a circle pixel needs to count as brighter or darker.
    pub fast_threshold: u8,
    /// Contiguous circle pixels required for a corner (FAST-N).
    pub arc_length: usize,
    /// Strongest keypoints kept per region after non-maximum suppression.
    pub max_features: usize,
    /// Half side of the square BRIEF sampling patch.
    pub patch_radius: u32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            arc_length: 9,
            max_features: 500,
            patch_radius: 12,
        }
    }
}

/// Constant-velocity Kalman filter noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanConfig {
    pub process_noise: f32,
    pub measurement_noise: f32,
    pub initial_covariance: f32,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            process_noise: 1e-4,
            measurement_noise: 1e-1,
            initial_covariance: 0.1,
        }
    }
}

/// Fixed parameters of a [`RegionTracker`](crate::RegionTracker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Side of the square template patch.
    pub template_size: u32,
    /// Side of the square search window around the tracking point.
    pub search_size: u32,
    /// Good matches needed to accept an observation.
    pub min_good_matches: usize,
    /// Consecutive confident frames before the template is re-captured.
    pub reseed_interval: u32,
    /// Lower bound of the good-match distance threshold, in bits.
    pub match_distance_floor: u32,
    pub matcher: MatcherKind,
    pub lsh: LshParams,
    pub features: FeatureConfig,
    pub kalman: KalmanConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            template_size: 100,
            search_size: 150,
            min_good_matches: 3,
            reseed_interval: 20,
            match_distance_floor: 16,
            matcher: MatcherKind::Lsh,
            lsh: LshParams::default(),
            features: FeatureConfig::default(),
            kalman: KalmanConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        let min_region = self.features.min_region_size();
        if self.template_size < min_region {
            return Err(SteadyError::Configuration(format!(
                "template size {} is below the {} pixel minimum for the feature patch",
                self.template_size, min_region
            )));
        }
        if self.search_size < self.template_size {
            return Err(SteadyError::Configuration(format!(
                "search size {} is smaller than template size {}",
                self.search_size, self.template_size
            )));
        }
        if self.min_good_matches == 0 {
            return Err(SteadyError::Configuration(
                "at least one good match must be required".into(),
            ));
        }
        if self.reseed_interval == 0 {
            return Err(SteadyError::Configuration(
                "reseed interval must be positive".into(),
            ));
        }
        if !(9..=12).contains(&self.features.arc_length) {
            return Err(SteadyError::Configuration(format!(
                "FAST arc length must be in 9..=12, got {}",
                self.features.arc_length
            )));
        }
        if self.features.max_features == 0 {
            return Err(SteadyError::Configuration(
                "max_features must be positive".into(),
            ));
        }
        if self.lsh.tables == 0 || !(1..=24).contains(&self.lsh.key_bits) {
            return Err(SteadyError::Configuration(format!(
                "LSH needs at least one table and 1..=24 key bits, got {} tables and {} bits",
                self.lsh.tables, self.lsh.key_bits
            )));
        }
        let k = &self.kalman;
        if !(k.process_noise > 0.0 && k.measurement_noise > 0.0 && k.initial_covariance > 0.0) {
            return Err(SteadyError::Configuration(
                "Kalman noise terms must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl FeatureConfig {
    /// Border excluded from detection so every descriptor sample and its
    /// smoothing box stay inside the region.
    pub fn border(&self) -> u32 {
        (self.patch_radius + crate::brief::SMOOTHING_RADIUS).max(3)
    }

    /// Smallest region side that can hold at least one keypoint.
    pub fn min_region_size(&self) -> u32 {
        2 * self.border() + 1
    }
}
