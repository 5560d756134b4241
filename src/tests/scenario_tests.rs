//! # End-to-End Scenarios
//!
//! These tests exercise the library the way a UI would: pick dates, drive the
//! controller through its timer queue, and inspect what reached the sink.

use moon_phase_lib::{
    config::Config, compute_silhouette, geometry::Silhouette, parse_date, AnimationController,
    LunarCycle, MoonPhase, PhaseSink, PlaybackState, Point2, TimerQueue, Viewport,
};
use std::fs;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::time::{sleep_until, Instant};

#[derive(Default)]
struct Recorder {
    frames: Vec<Silhouette>,
    statuses: Vec<String>,
}

impl PhaseSink for Recorder {
    fn draw(&mut self, silhouette: &Silhouette) {
        self.frames.push(silhouette.clone());
    }

    fn status(&mut self, text: &str) {
        self.statuses.push(text.to_string());
    }
}

fn viewport() -> Viewport {
    Viewport {
        radius: 100.0,
        center: Point2::new(200.0, 150.0),
    }
}

fn controller() -> AnimationController<TimerQueue, Recorder> {
    AnimationController::new(
        LunarCycle::default(),
        viewport(),
        TimerQueue::new(),
        Recorder::default(),
    )
}

/// Reference epoch scenario: new moon, fifteen days later, and the quarter.
#[test]
fn reference_epoch_scenario() {
    let cycle = LunarCycle::default();

    let epoch = cycle.phase_state("2025-10-21").unwrap();
    assert_eq!(epoch.days_into_cycle, 0.0);
    assert!(epoch.waxing);

    let later = cycle.phase_state("2025-11-05").unwrap();
    assert_eq!(later.days_into_cycle, 15.0);
    assert!(!later.waxing);

    assert_eq!(
        cycle.classify("2025-10-28").unwrap(),
        MoonPhase::FirstQuarter
    );
}

/// Every date across several years stays inside the cycle and classifies
/// into exactly one bucket.
#[test]
fn phase_is_total_over_many_years() {
    let cycle = LunarCycle::default();
    let mut day = parse_date("2019-01-01").unwrap();
    let end = parse_date("2032-12-31").unwrap();

    while day <= end {
        let state = cycle.phase_state_on(day);
        assert!((0.0..29.5).contains(&state.days_into_cycle), "{day}");
        assert_eq!(state.waxing, state.days_into_cycle < 14.75);
        let phase = cycle.classify_on(day);
        assert!(MoonPhase::ALL.contains(&phase));
        day = day.succ_opt().unwrap();
    }
}

/// Both new and full moon collapse to a bare disc.
#[test]
fn new_and_full_moon_have_no_terminator() {
    let cycle = LunarCycle::default();
    let v = viewport();

    let new_moon = compute_silhouette(&cycle, "2025-10-21", v.radius, v.center).unwrap();
    assert!(new_moon.terminator.is_none());

    // With a whole-day period the half period lands on a calendar date.
    let even = LunarCycle::new(30.0, parse_date("2025-10-21").unwrap()).unwrap();
    let full_moon = compute_silhouette(&even, "2025-11-05", v.radius, v.center).unwrap();
    assert_eq!(full_moon.phase.days_into_cycle, 15.0);
    assert!(full_moon.terminator.is_none());
    assert!(!full_moon.phase.waxing);
}

/// Seeking forward and back by the same amount restores the offset.
#[test]
fn seek_round_trip_restores_offset() {
    for x in [0.5, 1.0, 7.0, 13.5, 40.0, 100.0] {
        let mut ctrl = controller();
        ctrl.start("2025-10-21").unwrap();
        ctrl.seek(3.0).unwrap();
        let before = ctrl.elapsed_days().unwrap();

        ctrl.seek(x).unwrap();
        ctrl.seek(-x).unwrap();
        let after = ctrl.elapsed_days().unwrap();
        assert!((before - after).abs() < 1e-9, "seek ±{x}: {before} -> {after}");
    }
}

#[test]
fn seek_forty_days_from_start() {
    let mut ctrl = controller();
    ctrl.start("2025-10-21").unwrap();
    ctrl.seek(40.0).unwrap();
    assert_eq!(ctrl.elapsed_days(), Some(10.5));
}

/// Full pause, seek, resume, stop session against the timer queue.
#[test]
fn full_session_walkthrough() {
    let mut ctrl = controller();
    ctrl.set_speed(100);
    ctrl.start("2025-10-21").unwrap();

    for _ in 0..4 {
        let id = ctrl.scheduler_mut().pop_next().unwrap();
        ctrl.on_timer(id).unwrap();
    }
    assert_eq!(ctrl.elapsed_days(), Some(2.0));

    ctrl.pause();
    ctrl.skip_forward(5.0).unwrap();
    assert_eq!(
        ctrl.sink().statuses.last().map(String::as_str),
        Some("Showing: 2025-10-28 (Day 7)")
    );
    assert_eq!(ctrl.sink().frames.len(), 5);

    ctrl.resume();
    let id = ctrl.scheduler_mut().pop_next().unwrap();
    ctrl.on_timer(id).unwrap();
    assert_eq!(
        ctrl.sink().statuses.last().map(String::as_str),
        Some("Animating: 2025-10-28 (Day 7/29)")
    );

    ctrl.stop();
    assert_eq!(ctrl.state(), PlaybackState::Stopped);
    assert_eq!(ctrl.scheduler().pending_len(), 0);
    ctrl.show_date("2025-10-21").unwrap();
    assert_eq!(
        ctrl.sink().statuses.last().map(String::as_str),
        Some("Showing moon phase for 2025-10-21")
    );
}

/// One whole cycle of ticks wraps the offset back to zero.
#[test]
fn a_cycle_of_ticks_wraps_to_zero() {
    let mut ctrl = controller();
    ctrl.start("2025-10-21").unwrap();
    for _ in 0..59 {
        let id = ctrl.scheduler_mut().pop_next().unwrap();
        ctrl.on_timer(id).unwrap();
        assert_eq!(ctrl.scheduler().pending_len(), 1);
    }
    assert_eq!(ctrl.elapsed_days(), Some(0.0));
    assert_eq!(
        ctrl.sink().statuses.last().map(String::as_str),
        Some("Animating: 2025-11-19 (Day 29/29)")
    );
}

/// Wall-clock driven ticks with tokio's paused clock.
#[tokio::test(start_paused = true)]
async fn timed_ticks_follow_frame_interval() {
    let mut ctrl = controller();
    ctrl.set_speed(100);
    let started = Instant::now();
    ctrl.start("2025-10-21").unwrap();

    for _ in 0..2 {
        let (_, deadline) = ctrl.scheduler().next_deadline().unwrap();
        sleep_until(deadline).await;
        let id = ctrl.scheduler_mut().pop_due(Instant::now()).unwrap();
        ctrl.on_timer(id).unwrap();
    }

    assert_eq!(ctrl.elapsed_days(), Some(1.0));
    assert_eq!(ctrl.scheduler().pending_len(), 1);
    // First tick fires immediately, the second one interval later.
    assert!(Instant::now() - started >= Duration::from_millis(100));

    let (_, deadline) = ctrl.scheduler().next_deadline().unwrap();
    assert_eq!(ctrl.scheduler_mut().pop_due(deadline - Duration::from_millis(1)), None);
}

/// Config file on disk feeds the cycle and playback options.
#[test]
fn config_file_drives_cycle() {
    let file = NamedTempFile::new().unwrap();
    fs::write(
        file.path(),
        r#"
[lunar]
period_days = 30.0
reference_epoch = "2000-01-06"

[animation]
frame_interval_ms = 250
"#,
    )
    .unwrap();

    let config = Config::try_load_from_path(file.path()).unwrap();
    let cycle = config.cycle().unwrap();
    assert_eq!(cycle.phase_state("2000-01-21").unwrap().days_into_cycle, 15.0);

    let ctrl = AnimationController::new(
        cycle,
        config.viewport(),
        TimerQueue::new(),
        Recorder::default(),
    )
    .with_options(config.playback());
    assert_eq!(ctrl.frame_interval(), Duration::from_millis(250));
}

#[test]
fn invalid_config_file_is_reported_and_falls_back() {
    let file = NamedTempFile::new().unwrap();
    fs::write(file.path(), "[lunar]\nperiod_days = -3.0\n").unwrap();

    assert!(Config::try_load_from_path(file.path()).is_err());
    assert_eq!(Config::load_from_path(file.path()), Config::default());
}

#[test]
fn saved_config_loads_back() {
    let file = NamedTempFile::new().unwrap();
    let mut config = Config::default();
    config.animation.skip_days = 2.5;
    config.save(file.path()).unwrap();

    let loaded = Config::try_load_from_path(file.path()).unwrap();
    assert_eq!(loaded.animation.skip_days, 2.5);
}
