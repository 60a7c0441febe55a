//! BRIEF-256 binary descriptors.
//!
//! Each bit compares the 5x5 box mean at two sample offsets inside a square
//! patch around the keypoint. Box sums come from an integral image, so a
//! descriptor costs 512 constant-time lookups.

use crate::config::FeatureConfig;
use crate::error::ExtractError;
use crate::fast::{FastDetector, Keypoint};
use serde::{Deserialize, Serialize};
use steadyview_core::GrayFrame;

/// Half side of the smoothing box around each sample.
pub const SMOOTHING_RADIUS: u32 = 2;

const DESCRIPTOR_BITS: usize = 256;

/// 256-bit binary descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Descriptor {
    words: [u64; 4],
}

impl Descriptor {
    #[inline]
    pub fn bit(&self, index: usize) -> bool {
        (self.words[index / 64] >> (index % 64)) & 1 == 1
    }

    #[inline]
    fn set_bit(&mut self, index: usize) {
        self.words[index / 64] |= 1 << (index % 64);
    }

    /// Hamming distance.
    #[inline]
    pub fn distance(&self, other: &Self) -> u32 {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// Summed-area table with one row and column of zero padding.
pub struct IntegralImage {
    stride: usize,
    sums: Vec<u32>,
}

impl IntegralImage {
    pub fn new(image: &GrayFrame) -> Self {
        let (w, h) = (image.width() as usize, image.height() as usize);
        let stride = w + 1;
        let mut sums = vec![0u32; stride * (h + 1)];
        for y in 0..h {
            let mut row_sum = 0u32;
            for (x, &value) in image.row(y as u32).iter().enumerate() {
                row_sum = row_sum.wrapping_add(u32::from(value));
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1].wrapping_add(row_sum);
            }
        }
        Self { stride, sums }
    }

    /// Sum of the `(2r + 1)^2` box centred on `(cx, cy)`. The box must lie
    /// inside the image.
    ///
    /// Prefix sums wrap on large images; the box sum stays exact while the
    /// box itself fits in `u32`.
    #[inline]
    pub fn box_sum(&self, cx: u32, cy: u32, r: u32) -> u32 {
        let (x0, y0) = ((cx - r) as usize, (cy - r) as usize);
        let (x1, y1) = ((cx + r + 1) as usize, (cy + r + 1) as usize);
        let s = &self.sums;
        s[y1 * self.stride + x1]
            .wrapping_add(s[y0 * self.stride + x0])
            .wrapping_sub(s[y0 * self.stride + x1])
            .wrapping_sub(s[y1 * self.stride + x0])
    }
}

/// Keypoints with their descriptors, index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Sampling pattern of the descriptor.
#[derive(Debug, Clone)]
pub struct BriefExtractor {
    patch_radius: u32,
    pairs: Vec<[(i32, i32); 2]>,
}

impl BriefExtractor {
    pub fn new(patch_radius: u32) -> Self {
        // Fixed seed: template and search descriptors must share the pattern.
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let span = 2 * patch_radius as u64 + 1;
        let r = patch_radius as i32;
        let mut next = move || {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % span) as i32 - r
        };
        let pairs = (0..DESCRIPTOR_BITS)
            .map(|_| [(next(), next()), (next(), next())])
            .collect();
        Self {
            patch_radius,
            pairs,
        }
    }

    pub fn patch_radius(&self) -> u32 {
        self.patch_radius
    }

    /// Describe `keypoint`. Samples reach `patch_radius + SMOOTHING_RADIUS`
    /// pixels from the keypoint, which must be inside the image.
    pub fn describe(&self, integral: &IntegralImage, keypoint: &Keypoint) -> Descriptor {
        let mut descriptor = Descriptor::default();
        let at = |(dx, dy): (i32, i32)| {
            integral.box_sum(
                (keypoint.x as i32 + dx) as u32,
                (keypoint.y as i32 + dy) as u32,
                SMOOTHING_RADIUS,
            )
        };
        for (i, &[a, b]) in self.pairs.iter().enumerate() {
            if at(a) < at(b) {
                descriptor.set_bit(i);
            }
        }
        descriptor
    }
}

/// Detector and descriptor pair applied to whole regions.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    detector: FastDetector,
    brief: BriefExtractor,
    border: u32,
}

impl FeatureExtractor {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            detector: FastDetector::new(config),
            brief: BriefExtractor::new(config.patch_radius),
            border: config.border(),
        }
    }

    pub fn min_region_size(&self) -> u32 {
        2 * self.border + 1
    }

    pub fn extract(&self, region: &GrayFrame) -> Result<FeatureSet, ExtractError> {
        let min = self.min_region_size();
        if region.width() < min || region.height() < min {
            return Err(ExtractError::RegionTooSmall {
                width: region.width(),
                height: region.height(),
                min,
            });
        }
        let keypoints = self.detector.detect(region, self.border);
        if keypoints.is_empty() {
            return Err(ExtractError::NoFeatures);
        }
        let integral = IntegralImage::new(region);
        let descriptors = keypoints
            .iter()
            .map(|kp| self.brief.describe(&integral, kp))
            .collect();
        Ok(FeatureSet {
            keypoints,
            descriptors,
        })
    }
}
