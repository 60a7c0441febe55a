//! Synthetic jittered camera over a static textured scene.

use serde::{Deserialize, Serialize};
use steadyview_core::{FrameBuffer, GrayFrame, PixelFormat, PixelRect, Point};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub width: u32,
    pub height: u32,
    /// Largest camera offset from the rest position on each axis.
    pub max_jitter: u32,
    /// Largest per-frame change of the offset on each axis.
    pub max_step: u32,
    pub seed: u64,
    pub format: PixelFormat,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            max_jitter: 8,
            max_step: 2,
            seed: 7,
            format: PixelFormat::Rgb8,
        }
    }
}

/// One generated frame and the camera offset it was cut at.
#[derive(Debug, Clone)]
pub struct SyntheticFrame {
    pub index: usize,
    pub frame: FrameBuffer,
    /// Camera offset relative to the rest position. Scene content appears
    /// moved by the negated offset.
    pub jitter: Point,
}

/// Endless sequence of frames cut from a larger scene with a bounded
/// random walk of the camera position.
pub struct SyntheticSequence {
    config: SyntheticConfig,
    scene: GrayFrame,
    jitter: Point,
    rng: u64,
    index: usize,
}

impl SyntheticSequence {
    pub fn new(config: SyntheticConfig) -> Self {
        let margin = config.max_jitter;
        let scene = scene(
            config.width + 2 * margin,
            config.height + 2 * margin,
            config.seed,
        );
        Self {
            rng: config.seed ^ 0xD1B5_4A32_D192_ED03,
            config,
            scene,
            jitter: Point::ZERO,
            index: 0,
        }
    }

    /// Frame at an explicit camera offset, clamped to the jitter bound.
    pub fn frame_at(&self, jitter: Point) -> GrayFrame {
        let m = self.config.max_jitter as i32;
        let rect = PixelRect::new(
            m + jitter.x.clamp(-m, m),
            m + jitter.y.clamp(-m, m),
            self.config.width,
            self.config.height,
        );
        // The scene holds every rect within the jitter bound.
        self.scene
            .crop(rect)
            .unwrap_or_else(|_| GrayFrame::new(self.config.width, self.config.height))
    }

    fn next_step(&mut self) -> i32 {
        self.rng = self
            .rng
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let span = 2 * self.config.max_step as u64 + 1;
        ((self.rng >> 33) % span) as i32 - self.config.max_step as i32
    }
}

impl Iterator for SyntheticSequence {
    type Item = SyntheticFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index > 0 {
            let m = self.config.max_jitter as i32;
            let step = Point::new(self.next_step(), self.next_step());
            let next = self.jitter + step;
            self.jitter = Point::new(next.x.clamp(-m, m), next.y.clamp(-m, m));
        }
        let gray = self.frame_at(self.jitter);
        let item = SyntheticFrame {
            index: self.index,
            frame: FrameBuffer::from_gray(&gray, self.config.format),
            jitter: self.jitter,
        };
        self.index += 1;
        Some(item)
    }
}

/// Smooth gradient under a grid of blocks with random brightness, plus fine
/// grain, so both the gray-code planes and the corner detector find structure.
fn scene(width: u32, height: u32, seed: u64) -> GrayFrame {
    const BLOCK: u32 = 24;
    let noise = GrayFrame::noise_pattern(width, height, seed);
    let mut scene = GrayFrame::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let (bx, by) = (u64::from(x / BLOCK), u64::from(y / BLOCK));
            let hash = (bx.wrapping_mul(73_856_093) ^ by.wrapping_mul(19_349_663) ^ seed)
                .wrapping_mul(0x9E37_79B9_7F4A_7C15);
            let block = ((hash >> 59) % 5) as i32 * 30;
            let gradient = (x * 64 / width.max(1) + y * 48 / height.max(1)) as i32;
            let grain = i32::from(noise.get(x, y)) / 12 - 10;
            scene.set(x, y, (30 + gradient + block + grain).clamp(0, 255) as u8);
        }
    }
    scene
}
