use thiserror::Error;

/// Failure to produce features for a region. Recovered inside the tracker:
/// a frame whose region cannot be described counts as a failed match.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Region {width}x{height} is smaller than the {min}x{min} minimum for feature extraction")]
    RegionTooSmall { width: u32, height: u32, min: u32 },

    #[error("No keypoints detected in region")]
    NoFeatures,
}
