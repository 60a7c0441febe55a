//! End-to-end stabilizer runs at VGA resolution.

use proptest::prelude::*;
use steadyview_app::{SyntheticConfig, SyntheticSequence};
use steadyview_core::{GrayFrame, PixelRect, Point, SteadyError};
use steadyview_stabilize::{
    median_of_five, MotionVector, Quadrant, SearchStrategy, Stabilizer, StabilizerConfig,
};

const W: u32 = 640;
const H: u32 = 480;

fn full_search() -> StabilizerConfig {
    StabilizerConfig {
        search: SearchStrategy::Full,
        ..Default::default()
    }
}

/// Camera view of a larger scene; content moves by the negated offset.
fn view(scene: &GrayFrame, margin: i32, offset: (i32, i32)) -> GrayFrame {
    scene
        .crop(PixelRect::new(margin + offset.0, margin + offset.1, W, H))
        .unwrap()
}

#[test]
fn uniform_frames_emit_one_timing_event() {
    let mut stabilizer = Stabilizer::new(W, H, StabilizerConfig::default()).unwrap();
    let timing = stabilizer.subscribe_timing();
    let frame = GrayFrame::filled(W, H, 128);

    for _ in 0..10 {
        let (out, report) = stabilizer.stabilize(&frame).unwrap();
        assert_eq!(report.estimate.raw, MotionVector::ZERO);
        assert_eq!(report.estimate.vector, MotionVector::ZERO);
        assert_eq!(out, frame);
    }

    let events: Vec<_> = timing.try_iter().collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].frames, 10);
    assert!(events[0].average > std::time::Duration::ZERO);
    assert_eq!(stabilizer.average_process_time(), Some(events[0]));
}

#[test]
fn all_zero_frames_stay_still() {
    let mut stabilizer = Stabilizer::new(W, H, StabilizerConfig::default()).unwrap();
    let frame = GrayFrame::new(W, H);
    for _ in 0..4 {
        let estimate = stabilizer.estimate(&frame).unwrap();
        assert_eq!(estimate.raw, MotionVector::ZERO);
        assert_eq!(estimate.vector, MotionVector::ZERO);
    }
}

#[test]
fn grid_shift_found_by_three_step_search() {
    let prev = GrayFrame::noise_pattern(W, H, 41);
    for (dx, dy) in [(4, 0), (-4, 4), (4, 4), (0, -4)] {
        let mut stabilizer = Stabilizer::new(W, H, StabilizerConfig::default()).unwrap();
        stabilizer.estimate(&prev).unwrap();
        let estimate = stabilizer.estimate(&prev.translated(-dx, -dy, 0)).unwrap();
        let expected = MotionVector::new(dx, dy);
        assert!(
            Quadrant::ALL
                .iter()
                .any(|&q| estimate.local_vector(q) == expected),
            "no quadrant found ({dx}, {dy})"
        );
        assert_eq!(estimate.raw, expected);
    }
}

#[test]
fn three_step_search_reaches_the_whole_radius() {
    let scene = SyntheticSequence::new(SyntheticConfig::default());
    let rest = scene.frame_at(Point::ZERO);
    let mut stabilizer = Stabilizer::new(W, H, StabilizerConfig::default()).unwrap();
    let r = stabilizer.config().search_radius as i32;

    let mut found = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            stabilizer.reset();
            stabilizer.estimate(&rest).unwrap();
            let estimate = stabilizer.estimate(&scene.frame_at(Point::new(dx, dy))).unwrap();
            let expected = MotionVector::new(dx, dy);
            if Quadrant::ALL.iter().any(|&q| estimate.local_vector(q) == expected) {
                found.push((dx, dy));
            }
        }
    }

    for shift in [(5, 0), (-6, 6), (0, -5), (-5, -5), (6, 6), (5, -6), (-1, 2), (-1, 4)] {
        assert!(found.contains(&shift), "no quadrant found {shift:?}");
    }
    // Coarse-to-fine is a heuristic; a few offsets may still be missed.
    assert!(found.len() >= 160, "found {} of 169 offsets", found.len());
}

#[test]
fn any_shift_found_by_full_search() {
    let prev = GrayFrame::noise_pattern(W, H, 43);
    for (dx, dy) in [(1, 2), (-5, 4), (2, -1), (-6, -6)] {
        let mut stabilizer = Stabilizer::new(W, H, full_search()).unwrap();
        stabilizer.estimate(&prev).unwrap();
        let estimate = stabilizer.estimate(&prev.translated(-dx, -dy, 0)).unwrap();
        for q in Quadrant::ALL {
            assert_eq!(estimate.local_vector(q), MotionVector::new(dx, dy));
        }
    }
}

#[test]
fn vector_decays_to_zero_on_a_still_scene() {
    let mut stabilizer = Stabilizer::new(W, H, StabilizerConfig::default()).unwrap();
    let prev = GrayFrame::noise_pattern(W, H, 47);
    stabilizer.estimate(&prev).unwrap();
    let moved = prev.translated(-4, 4, 0);
    assert_eq!(stabilizer.estimate(&moved).unwrap().vector, MotionVector::new(4, -4));

    // trunc(0.95 * 4) = 3, trunc(2.85) = 2, trunc(1.9) = 1, trunc(0.95) = 0
    let expected = [(3, -3), (2, -2), (1, -1), (0, 0), (0, 0)];
    for (dx, dy) in expected {
        let estimate = stabilizer.estimate(&moved).unwrap();
        assert_eq!(estimate.raw, MotionVector::ZERO);
        assert_eq!(estimate.vector, MotionVector::new(dx, dy));
    }
}

#[test]
fn compensated_output_follows_the_scene() {
    let margin = 20;
    let scene = GrayFrame::noise_pattern(W + 2 * margin as u32, H + 2 * margin as u32, 53);
    let path = [(0, 0), (2, 1), (-1, 3), (3, -2), (3, -2), (-2, 0), (1, 1)];
    let mut stabilizer = Stabilizer::new(W, H, full_search()).unwrap();

    let mut prev_offset = path[0];
    for (i, &offset) in path.iter().enumerate() {
        let frame = view(&scene, margin, offset);
        let (out, report) = stabilizer.stabilize(&frame).unwrap();
        if i > 0 {
            let step = MotionVector::new(offset.0 - prev_offset.0, offset.1 - prev_offset.1);
            assert_eq!(report.estimate.raw, step, "frame {i}");
        }
        // out(x, y) = frame(x - v) = scene(margin + offset + (x, y) - v)
        let v = report.estimate.vector;
        for y in (80..400).step_by(7) {
            for x in (80..560).step_by(5) {
                let sx = margin + offset.0 + x - v.dx;
                let sy = margin + offset.1 + y - v.dy;
                assert_eq!(out.get(x as u32, y as u32), scene.get(sx as u32, sy as u32));
            }
        }
        prev_offset = offset;
    }
}

#[test]
fn median_keeps_reference_against_two_outliers() {
    // Two windows see a moving object, two see the still background.
    assert_eq!(median_of_five([6, 6, 0, 0, 0]), 0);
    assert_eq!(median_of_five([6, 6, 0, 0, 6]), 6);
    assert_eq!(median_of_five([-4, 2, 2, 9, -1]), 2);
}

#[test]
fn resized_input_is_rejected() {
    let mut stabilizer = Stabilizer::new(W, H, StabilizerConfig::default()).unwrap();
    stabilizer.estimate(&GrayFrame::new(W, H)).unwrap();
    assert!(matches!(
        stabilizer.estimate(&GrayFrame::new(320, 240)),
        Err(SteadyError::DimensionMismatch { .. })
    ));
    stabilizer.initialize(320, 240).unwrap();
    assert!(stabilizer.estimate(&GrayFrame::new(320, 240)).is_ok());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn vector_stays_within_clamp(
        steps in prop::collection::vec((-6i32..=6, -6i32..=6), 1..24),
        seed in any::<u64>(),
    ) {
        let config = StabilizerConfig {
            max_motion_x: 20,
            max_motion_y: 12,
            ..full_search()
        };
        let mut stabilizer = Stabilizer::new(160, 120, config).unwrap();
        let base = GrayFrame::noise_pattern(160, 120, seed);
        let (mut ox, mut oy) = (0, 0);
        stabilizer.estimate(&base).unwrap();
        for (dx, dy) in steps {
            ox += dx;
            oy += dy;
            let v = stabilizer.estimate(&base.translated(-ox, -oy, 0)).unwrap().vector;
            prop_assert!(v.dx.abs() <= 20 && v.dy.abs() <= 12);
        }
    }
}
