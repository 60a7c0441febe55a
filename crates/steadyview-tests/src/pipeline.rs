//! Stabilizer and tracker together on a jittering camera.

use steadyview_app::{FramePipeline, PipelineConfig, SyntheticConfig, SyntheticSequence};
use steadyview_core::{FrameBuffer, GrayFrame, PixelFormat, PixelRect, Point};
use steadyview_stabilize::{MotionVector, SearchStrategy, StabilizerConfig};
use steadyview_tracking::{TrackState, TrackerConfig};

const W: u32 = 640;
const H: u32 = 480;

#[test]
fn jitter_is_measured_and_target_followed() {
    let margin = 20;
    let scene = GrayFrame::noise_pattern(W + 2 * margin, H + 2 * margin, 83);
    let view = |j: Point| {
        scene
            .crop(PixelRect::new(margin as i32 + j.x, margin as i32 + j.y, W, H))
            .unwrap()
    };
    let config = PipelineConfig {
        stabilizer: StabilizerConfig {
            search: SearchStrategy::Full,
            ..Default::default()
        },
        tracker: TrackerConfig {
            reseed_interval: 1000,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut pipeline = FramePipeline::new(W, H, config).unwrap();
    let timing = pipeline.subscribe_timing();
    let handle = pipeline.selection_handle();
    std::thread::spawn(move || handle.select(Point::new(320, 240)))
        .join()
        .unwrap();

    let mut jitter: Vec<Point> = [(0, 0), (2, 1), (-1, 3), (3, -2), (1, 1), (-3, 0), (0, -2)]
        .iter()
        .cycle()
        .take(21)
        .map(|&(x, y)| Point::new(x, y))
        .collect();
    jitter.extend(std::iter::repeat(Point::new(2, -1)).take(30));

    let mut prev = jitter[0];
    for (i, &j) in jitter.iter().enumerate() {
        let frame = FrameBuffer::from_gray(&view(j), PixelFormat::Bgr8);
        let out = pipeline.process(&frame).unwrap();
        if i > 0 {
            let step = j - prev;
            assert_eq!(out.motion.raw, MotionVector::new(step.x, step.y), "frame {i}");
        }
        assert_eq!(out.track.state, TrackState::Tracking, "frame {i}");
        prev = j;
    }

    // The target sits at the scene centre, seen at (320, 240) - jitter.
    let last = pipeline.tracker().tracking_point();
    assert!(last.chebyshev_distance(Point::new(318, 241)) <= 1, "{last:?}");
    assert_eq!(timing.try_iter().count(), jitter.len() / 10);
}

#[test]
fn synthetic_run_reports_guidance() {
    let synthetic = SyntheticConfig {
        max_jitter: 0,
        ..Default::default()
    };
    let config = PipelineConfig::default();
    let mut pipeline = FramePipeline::new(synthetic.width, synthetic.height, config).unwrap();
    let mut frames = SyntheticSequence::new(synthetic);

    let first = frames.next().unwrap();
    // (120, 100) is (200, 140) from the frame centre.
    pipeline
        .select_point(Point::new(120, 100), &first.frame.to_gray())
        .unwrap();

    let mut offsets = Vec::new();
    for item in frames.take(6) {
        let out = pipeline.process(&item.frame).unwrap();
        assert_eq!(out.motion.vector, MotionVector::ZERO);
        if let Some(offset) = out.guidance {
            offsets.push((offset.dx, offset.dy));
        }
    }
    assert_eq!(offsets.len(), 3);
    for (dx, dy) in offsets {
        assert!((dx - 200).abs() <= 2 && (dy - 140).abs() <= 2, "({dx}, {dy})");
    }
}
