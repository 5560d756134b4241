//! Command parsing and dispatch for the interactive animate mode.

use crate::{apply_command, parse_command, run_animation, PlaybackCommand};
use moon_phase_lib::{
    geometry::Silhouette, AnimationController, LunarCycle, PhaseSink, PlaybackState, Point2,
    TimerQueue, Viewport,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

#[derive(Default)]
struct Recorder {
    statuses: Vec<String>,
    frames: usize,
}

impl PhaseSink for Recorder {
    fn draw(&mut self, _silhouette: &Silhouette) {
        self.frames += 1;
    }

    fn status(&mut self, text: &str) {
        self.statuses.push(text.to_string());
    }
}

fn controller() -> AnimationController<TimerQueue, Recorder> {
    let viewport = Viewport {
        radius: 12.0,
        center: Point2::new(13.0, 13.0),
    };
    AnimationController::new(
        LunarCycle::default(),
        viewport,
        TimerQueue::new(),
        Recorder::default(),
    )
}

#[test]
fn parses_every_command() {
    assert_eq!(
        parse_command("start 2025-10-21"),
        Ok(PlaybackCommand::Start("2025-10-21".to_string()))
    );
    assert_eq!(parse_command("pause"), Ok(PlaybackCommand::Pause));
    assert_eq!(parse_command("  RESUME "), Ok(PlaybackCommand::Resume));
    assert_eq!(parse_command("stop"), Ok(PlaybackCommand::Stop));
    assert_eq!(parse_command("fwd"), Ok(PlaybackCommand::Forward(None)));
    assert_eq!(parse_command("fwd 3.5"), Ok(PlaybackCommand::Forward(Some(3.5))));
    assert_eq!(parse_command("back 2"), Ok(PlaybackCommand::Backward(Some(2.0))));
    assert_eq!(parse_command("speed 250"), Ok(PlaybackCommand::Speed(250)));
    assert_eq!(
        parse_command("show 2026-01-01"),
        Ok(PlaybackCommand::Show("2026-01-01".to_string()))
    );
    assert_eq!(parse_command("q"), Ok(PlaybackCommand::Quit));
}

#[test]
fn rejects_malformed_commands() {
    assert!(parse_command("").is_err());
    assert!(parse_command("start").is_err());
    assert!(parse_command("speed fast").is_err());
    assert!(parse_command("fwd lots").is_err());
    assert!(parse_command("fwd inf").is_err());
    assert!(parse_command("rewind").is_err());
}

#[test]
fn stop_shows_the_selected_date() {
    let mut ctrl = controller();
    let mut selected = "2025-10-21".to_string();
    ctrl.start(&selected).unwrap();

    let keep_going = apply_command(&mut ctrl, PlaybackCommand::Stop, &mut selected, 1.0).unwrap();
    assert!(keep_going);
    assert_eq!(ctrl.state(), PlaybackState::Stopped);
    assert_eq!(
        ctrl.sink().statuses,
        vec!["Showing moon phase for 2025-10-21".to_string()]
    );
    assert_eq!(ctrl.sink().frames, 1);
}

#[test]
fn bare_skip_uses_configured_days() {
    let mut ctrl = controller();
    let mut selected = "2025-10-21".to_string();
    ctrl.start(&selected).unwrap();
    apply_command(&mut ctrl, PlaybackCommand::Pause, &mut selected, 1.0).unwrap();

    apply_command(&mut ctrl, PlaybackCommand::Forward(None), &mut selected, 2.5).unwrap();
    assert_eq!(ctrl.elapsed_days(), Some(2.5));
    apply_command(&mut ctrl, PlaybackCommand::Backward(Some(5.0)), &mut selected, 2.5).unwrap();
    assert_eq!(ctrl.elapsed_days(), Some(27.0));
}

#[test]
fn bad_start_date_keeps_previous_selection() {
    let mut ctrl = controller();
    let mut selected = "2025-10-21".to_string();
    let result = apply_command(
        &mut ctrl,
        PlaybackCommand::Start("2025-13-40".to_string()),
        &mut selected,
        1.0,
    );
    assert!(result.is_err());
    assert_eq!(selected, "2025-10-21");
    assert_eq!(ctrl.state(), PlaybackState::Idle);
}

#[test]
fn quit_ends_the_loop() {
    let mut ctrl = controller();
    let mut selected = "2025-10-21".to_string();
    assert!(!apply_command(&mut ctrl, PlaybackCommand::Quit, &mut selected, 1.0).unwrap());
}

/// The loop returns on the frame limit even while the command source is
/// still open and idle.
#[tokio::test(start_paused = true)]
async fn frame_limit_ends_loop_with_input_open() {
    let mut ctrl = controller();
    ctrl.start("2025-10-21").unwrap();
    let (_tx, mut commands) = mpsc::unbounded_channel::<String>();

    let run = run_animation(&mut ctrl, &mut commands, "2025-10-21".to_string(), Some(3), 1.0);
    timeout(Duration::from_secs(60), run)
        .await
        .expect("loop should stop at the frame limit")
        .unwrap();

    assert_eq!(ctrl.sink().frames, 3);
    assert_eq!(ctrl.state(), PlaybackState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn closed_input_ends_loop_once_paused() {
    let mut ctrl = controller();
    ctrl.start("2025-10-21").unwrap();
    let (tx, mut commands) = mpsc::unbounded_channel();
    tx.send("pause".to_string()).unwrap();
    drop(tx);

    let run = run_animation(&mut ctrl, &mut commands, "2025-10-21".to_string(), None, 1.0);
    timeout(Duration::from_secs(60), run)
        .await
        .expect("loop should stop when input closes")
        .unwrap();

    assert_eq!(ctrl.state(), PlaybackState::Stopped);
}
