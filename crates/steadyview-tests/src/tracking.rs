//! Region tracker sessions on VGA frames.

use steadyview_core::{GrayFrame, PixelRect, Point};
use steadyview_tracking::{MatchOutcome, MatcherKind, RegionTracker, TrackState, TrackerConfig};

const W: u32 = 640;
const H: u32 = 480;

fn assert_near(actual: Point, expected: Point, tolerance: u32) {
    assert!(
        actual.chebyshev_distance(expected) <= tolerance,
        "{actual:?} is not within {tolerance} px of {expected:?}"
    );
}

#[test]
fn reacquires_the_template_frame() {
    for matcher in [MatcherKind::Lsh, MatcherKind::BruteForce] {
        let config = TrackerConfig {
            matcher,
            ..Default::default()
        };
        let mut tracker = RegionTracker::new(config).unwrap();
        let f0 = GrayFrame::noise_pattern(W, H, 61);
        tracker.select_point(Point::new(320, 240), &f0).unwrap();
        assert_eq!(tracker.state(), TrackState::Selecting);

        let update = tracker.process_frame(&f0).unwrap();
        assert!(update.locked, "{matcher:?}");
        assert_near(update.point, Point::new(320, 240), 2);
        assert!(update.outcome.unwrap().good_matches() >= 3);
    }
}

#[test]
fn blank_search_window_loses_the_target() {
    let mut tracker = RegionTracker::new(TrackerConfig::default()).unwrap();
    let f0 = GrayFrame::noise_pattern(W, H, 67);
    tracker.select_point(Point::new(200, 150), &f0).unwrap();
    let locked = tracker.process_frame(&f0).unwrap();
    assert!(locked.locked);

    // Blank out everything around the target.
    let mut covered = f0.clone();
    for y in 50..250 {
        for x in 100..300 {
            covered.set(x, y, 90);
        }
    }
    for _ in 0..3 {
        let update = tracker.process_frame(&covered).unwrap();
        assert_eq!(update.state, TrackState::Lost);
        assert!(!update.locked);
        assert_eq!(update.point, locked.point);
        assert!(matches!(update.outcome, Some(MatchOutcome::Insufficient { .. })));
    }

    let back = tracker.process_frame(&f0).unwrap();
    assert_eq!(back.state, TrackState::Tracking);
    assert_near(back.point, Point::new(200, 150), 2);
}

#[test]
fn follows_a_sliding_scene() {
    let margin = 40;
    let scene = GrayFrame::noise_pattern(W + 2 * margin, H + 2 * margin, 71);
    let view = |offset: i32| {
        scene
            .crop(PixelRect::new(margin as i32 + offset, margin as i32, W, H))
            .unwrap()
    };
    let config = TrackerConfig {
        reseed_interval: 1000,
        ..Default::default()
    };
    let mut tracker = RegionTracker::new(config).unwrap();
    tracker.select_point(Point::new(320, 240), &view(0)).unwrap();

    // Camera pans right by 1 px per frame, so the target drifts left.
    for offset in 0..30 {
        let update = tracker.process_frame(&view(offset)).unwrap();
        assert!(update.locked, "lost at offset {offset}");
    }
    // Hold still and let the filter settle.
    let mut last = None;
    for _ in 0..30 {
        last = Some(tracker.process_frame(&view(29)).unwrap());
    }
    let last = last.unwrap();
    assert!(last.locked);
    assert_near(last.point, Point::new(320 - 29, 240), 1);
}

#[test]
fn target_near_the_border_keeps_the_window_inside() {
    let mut tracker = RegionTracker::new(TrackerConfig::default()).unwrap();
    let f0 = GrayFrame::noise_pattern(W, H, 73);
    tracker.select_point(Point::new(630, 8), &f0).unwrap();
    // Half the 150 px search window is 75.
    assert_eq!(tracker.tracking_point(), Point::new(565, 75));
    assert_eq!(tracker.template().unwrap().anchor_in_frame(), Point::new(630, 8));

    let update = tracker.process_frame(&f0).unwrap();
    assert!(update.locked);
    let window = PixelRect::centered(update.point, 150, 150);
    assert!(window.fits_within(f0.size()));
}

#[test]
fn handle_selection_applies_on_next_frame() {
    let mut tracker = RegionTracker::new(TrackerConfig::default()).unwrap();
    let handle = tracker.selection_handle();
    let f0 = GrayFrame::noise_pattern(W, H, 79);

    assert_eq!(tracker.process_frame(&f0).unwrap().state, TrackState::Idle);
    std::thread::spawn(move || {
        handle.select(Point::new(100, 100));
        handle.select(Point::new(400, 300));
    })
    .join()
    .unwrap();

    let update = tracker.process_frame(&f0).unwrap();
    assert!(update.locked);
    assert_near(update.point, Point::new(400, 300), 2);

    tracker.disable();
    assert_eq!(tracker.process_frame(&f0).unwrap().state, TrackState::Idle);
}
