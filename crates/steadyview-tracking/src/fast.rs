//! FAST-N corner detection with 3x3 non-maximum suppression.
//!
//! Each pixel is compared against the 16 pixels of a radius-3 Bresenham
//! circle. It is a corner when at least N contiguous circle pixels are all
//! brighter than `center + t` or all darker than `center - t`.

use crate::config::FeatureConfig;
use serde::{Deserialize, Serialize};
use steadyview_core::GrayFrame;

/// Radius-3 circle, clockwise from 12 o'clock.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Detected corner in region coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: u32,
    pub y: u32,
    /// Sum of `|circle - center| - t` over the best arc.
    pub score: u32,
}

#[derive(Debug, Clone)]
pub struct FastDetector {
    threshold: i16,
    arc_length: u32,
    max_features: usize,
}

impl FastDetector {
    /// Arc length is validated by [`TrackerConfig::validate`](crate::TrackerConfig::validate).
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            threshold: i16::from(config.fast_threshold),
            arc_length: config.arc_length.clamp(9, 12) as u32,
            max_features: config.max_features,
        }
    }

    /// Corners at least `border` pixels away from every edge, suppressed to
    /// local maxima and capped to the strongest `max_features`.
    pub fn detect(&self, image: &GrayFrame, border: u32) -> Vec<Keypoint> {
        let border = border.max(3);
        let (w, h) = (image.width(), image.height());
        if w <= 2 * border || h <= 2 * border {
            return Vec::new();
        }

        let mut scores = vec![0u32; w as usize * h as usize];
        let mut raw = Vec::new();
        for y in border..h - border {
            for x in border..w - border {
                if let Some(score) = self.corner_score(image, x, y) {
                    scores[y as usize * w as usize + x as usize] = score;
                    raw.push(Keypoint { x, y, score });
                }
            }
        }

        let mut keypoints: Vec<Keypoint> = raw
            .into_iter()
            .filter(|kp| is_local_maximum(&scores, w, h, kp))
            .collect();
        if keypoints.len() > self.max_features {
            keypoints.sort_by(|a, b| b.score.cmp(&a.score).then((a.y, a.x).cmp(&(b.y, b.x))));
            keypoints.truncate(self.max_features);
            keypoints.sort_by_key(|kp| (kp.y, kp.x));
        }
        keypoints
    }

    /// Score of the pixel at `(x, y)` if it is a corner. The caller keeps the
    /// circle inside the image.
    fn corner_score(&self, image: &GrayFrame, x: u32, y: u32) -> Option<u32> {
        let center = i16::from(image.get(x, y));
        let t = self.threshold;
        let sample = |i: usize| {
            let (dx, dy) = CIRCLE[i];
            i16::from(image.get((x as i32 + dx) as u32, (y as i32 + dy) as u32))
        };

        // High-speed test on the four cardinal pixels.
        let cardinals = [sample(0), sample(4), sample(8), sample(12)];
        let needed = if self.arc_length >= 12 { 3 } else { 2 };
        let bright = cardinals.iter().filter(|&&v| v > center + t).count();
        let dark = cardinals.iter().filter(|&&v| v < center - t).count();
        if bright < needed && dark < needed {
            return None;
        }

        let mut circle = [0i16; 16];
        let mut bright_mask = 0u16;
        let mut dark_mask = 0u16;
        for (i, value) in circle.iter_mut().enumerate() {
            *value = sample(i);
            let diff = *value - center;
            if diff > t {
                bright_mask |= 1 << i;
            } else if diff < -t {
                dark_mask |= 1 << i;
            }
        }

        [bright_mask, dark_mask]
            .into_iter()
            .filter(|&mask| has_arc(mask, self.arc_length))
            .map(|mask| arc_score(mask, &circle, center, t))
            .max()
    }
}

/// True when the circular 16-bit mask contains `n` contiguous set bits.
fn has_arc(mask: u16, n: u32) -> bool {
    if mask.count_ones() < n {
        return false;
    }
    let doubled = u32::from(mask) | (u32::from(mask) << 16);
    let mut acc = doubled;
    for _ in 1..n {
        acc &= acc >> 1;
    }
    acc != 0
}

/// Score of the longest arc in `mask`.
fn arc_score(mask: u16, circle: &[i16; 16], center: i16, t: i16) -> u32 {
    let doubled = u32::from(mask) | (u32::from(mask) << 16);
    let (mut best_start, mut best_len) = (0usize, 0usize);
    let mut i = 0usize;
    while i < 16 {
        if doubled & (1 << i) == 0 {
            i += 1;
            continue;
        }
        let start = i;
        while i < 32 && doubled & (1 << i) != 0 {
            i += 1;
        }
        if i - start > best_len {
            best_len = (i - start).min(16);
            best_start = start;
        }
    }
    (best_start..best_start + best_len)
        .map(|j| ((circle[j % 16] - center).abs() - t).max(0) as u32)
        .sum()
}

/// A keypoint survives when no 8-neighbour scores higher, and no equal
/// neighbour precedes it in raster order.
fn is_local_maximum(scores: &[u32], w: u32, h: u32, kp: &Keypoint) -> bool {
    for ny in kp.y.saturating_sub(1)..=(kp.y + 1).min(h - 1) {
        for nx in kp.x.saturating_sub(1)..=(kp.x + 1).min(w - 1) {
            if (nx, ny) == (kp.x, kp.y) {
                continue;
            }
            let s = scores[ny as usize * w as usize + nx as usize];
            if s > kp.score || (s == kp.score && (ny, nx) < (kp.y, kp.x)) {
                return false;
            }
        }
    }
    true
}
