//! # Phase Animation Controller
//!
//! Steps a virtual day offset forward in half-day increments and pushes a
//! silhouette plus a status line to a [`PhaseSink`] on every tick.
//!
//! ## Playback States
//!
//! ```text
//! Idle ──start──► Playing ──pause──► Paused ──resume──► Playing
//!                    │                  │
//!                    └──────stop────────┴──► Stopped ──start──► Playing
//! ```
//!
//! ## Timing
//!
//! Ticks are one-shot timers obtained from a [`Scheduler`]. The controller
//! keeps at most one pending [`TimerId`] and cancels it before every state
//! change or re-arm, so a tick that was already queued when the user hit
//! stop is recognised as stale and dropped in [`AnimationController::on_timer`].
//! Each tick updates state and emits output before scheduling the next one;
//! ticks never overlap.

use crate::geometry::{silhouette_on, Point2, Silhouette};
use crate::lunar::{offset_date, parse_date, LunarCycle, PhaseError};
use chrono::NaiveDate;
use std::time::Duration;

/// Days the animated offset advances per tick.
pub const DAYS_PER_TICK: f64 = 0.5;

/// Handle for one scheduled tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// Source of cancellable one-shot timers.
pub trait Scheduler {
    /// Arm a timer that fires once after `delay`.
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Disarm a timer. Unknown, fired and already cancelled ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

impl<T: Scheduler + ?Sized> Scheduler for &mut T {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        (**self).schedule(delay)
    }

    fn cancel(&mut self, id: TimerId) {
        (**self).cancel(id);
    }
}

/// Receiver of everything the core wants shown.
pub trait PhaseSink {
    fn draw(&mut self, silhouette: &Silhouette);
    fn status(&mut self, text: &str);
}

impl<T: PhaseSink + ?Sized> PhaseSink for &mut T {
    fn draw(&mut self, silhouette: &Silhouette) {
        (**self).draw(silhouette);
    }

    fn status(&mut self, text: &str) {
        (**self).status(text);
    }
}

impl<T: PhaseSink + ?Sized> PhaseSink for Box<T> {
    fn draw(&mut self, silhouette: &Silhouette) {
        (**self).draw(silhouette);
    }

    fn status(&mut self, text: &str) {
        (**self).status(text);
    }
}

/// Where the moon sits on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub radius: f64,
    pub center: Point2,
}

/// Tick timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackOptions {
    pub frame_interval: Duration,
    pub min_interval: Duration,
    pub max_interval: Duration,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(100),
            min_interval: Duration::from_millis(20),
            max_interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
struct AnimationSession {
    origin: NaiveDate,
    elapsed_days: f64,
}

/// Emit the silhouette of an externally selected date.
///
/// Used after a stop and whenever the user picks a date without animating.
pub fn show_date<K: PhaseSink + ?Sized>(
    cycle: &LunarCycle,
    viewport: Viewport,
    sink: &mut K,
    date: &str,
) -> Result<Silhouette, PhaseError> {
    let day = parse_date(date)?;
    let silhouette = silhouette_on(cycle, day, viewport.radius, viewport.center);
    sink.status(&format!("Showing moon phase for {day}"));
    sink.draw(&silhouette);
    Ok(silhouette)
}

/// Timer-driven playback over one lunar cycle.
pub struct AnimationController<S: Scheduler, K: PhaseSink> {
    cycle: LunarCycle,
    viewport: Viewport,
    options: PlaybackOptions,
    scheduler: S,
    sink: K,
    state: PlaybackState,
    session: Option<AnimationSession>,
    pending: Option<TimerId>,
}

impl<S: Scheduler, K: PhaseSink> AnimationController<S, K> {
    pub fn new(cycle: LunarCycle, viewport: Viewport, scheduler: S, sink: K) -> Self {
        Self {
            cycle,
            viewport,
            options: PlaybackOptions::default(),
            scheduler,
            sink,
            state: PlaybackState::Idle,
            session: None,
            pending: None,
        }
    }

    pub fn with_options(mut self, options: PlaybackOptions) -> Self {
        self.options = options;
        self.options.frame_interval = self.clamp_interval(options.frame_interval);
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn cycle(&self) -> &LunarCycle {
        &self.cycle
    }

    pub fn frame_interval(&self) -> Duration {
        self.options.frame_interval
    }

    pub fn origin(&self) -> Option<NaiveDate> {
        self.session.map(|s| s.origin)
    }

    /// Animated offset in days, or `None` before the first start.
    pub fn elapsed_days(&self) -> Option<f64> {
        self.session.map(|s| s.elapsed_days)
    }

    /// The tick currently armed, if any.
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending
    }

    /// Date the next frame would show.
    pub fn current_date(&self) -> Option<Result<NaiveDate, PhaseError>> {
        self.session.map(|s| session_date(&s))
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Begin playback from `origin`. Does nothing while already playing.
    pub fn start(&mut self, origin: &str) -> Result<(), PhaseError> {
        let origin = parse_date(origin)?;
        self.start_on(origin);
        Ok(())
    }

    pub fn start_on(&mut self, origin: NaiveDate) {
        if self.state == PlaybackState::Playing {
            return;
        }
        self.cancel_pending();
        self.session = Some(AnimationSession {
            origin,
            elapsed_days: 0.0,
        });
        self.state = PlaybackState::Playing;
        self.arm(Duration::ZERO);
        tracing::info!(%origin, "animation started");
    }

    pub fn pause(&mut self) {
        self.cancel_pending();
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            tracing::info!(elapsed = ?self.elapsed_days(), "animation paused");
        }
    }

    /// Continue a paused animation. Any other state is left alone.
    pub fn resume(&mut self) {
        if self.state != PlaybackState::Paused || self.session.is_none() {
            return;
        }
        self.cancel_pending();
        self.state = PlaybackState::Playing;
        self.arm(Duration::ZERO);
        tracing::info!("animation resumed");
    }

    /// Halt playback. Origin and offset survive; showing the selected
    /// date afterwards is up to the caller (see [`show_date`]).
    pub fn stop(&mut self) {
        self.cancel_pending();
        if self.state != PlaybackState::Idle {
            self.state = PlaybackState::Stopped;
            tracing::info!("animation stopped");
        }
    }

    /// Move the animated offset by `delta_days`, wrapping into the cycle.
    ///
    /// Outside of playback the new frame is emitted right away. Before the
    /// first start this is a no-op. An offset whose date falls outside the
    /// calendar is refused and the session is left as it was.
    pub fn seek(&mut self, delta_days: f64) -> Result<(), PhaseError> {
        let Some(mut session) = self.session else {
            return Ok(());
        };
        session.elapsed_days = self.cycle.wrap(session.elapsed_days + delta_days);
        let date = session_date(&session)?;
        self.session = Some(session);
        tracing::debug!(delta_days, elapsed = session.elapsed_days, "seek");

        if self.state != PlaybackState::Playing {
            let status = format!(
                "Showing: {date} (Day {})",
                session.elapsed_days.floor() as i64
            );
            self.emit(date, &status);
        }
        Ok(())
    }

    pub fn skip_forward(&mut self, days: f64) -> Result<(), PhaseError> {
        self.seek(days)
    }

    pub fn skip_backward(&mut self, days: f64) -> Result<(), PhaseError> {
        self.seek(-days)
    }

    /// Change the delay between future ticks. The tick already armed keeps
    /// its deadline. Returns the interval actually applied.
    pub fn set_speed(&mut self, interval_ms: u64) -> Duration {
        let interval = self.clamp_interval(Duration::from_millis(interval_ms));
        self.options.frame_interval = interval;
        tracing::debug!(?interval, "frame interval changed");
        interval
    }

    /// Host callback for a fired timer.
    ///
    /// Stale ids (cancelled by a pause, stop or restart before they were
    /// delivered) and ticks outside of playback are ignored.
    pub fn on_timer(&mut self, id: TimerId) -> Result<(), PhaseError> {
        if self.pending != Some(id) {
            tracing::debug!(?id, "dropping stale tick");
            return Ok(());
        }
        self.pending = None;
        if self.state != PlaybackState::Playing {
            return Ok(());
        }
        let Some(session) = self.session else {
            return Ok(());
        };

        let date = match session_date(&session) {
            Ok(date) => date,
            Err(err) => {
                tracing::warn!(%err, "skipping frame");
                self.arm(self.options.frame_interval);
                return Err(err);
            }
        };

        let status = format!(
            "Animating: {date} (Day {}/{})",
            session.elapsed_days,
            self.cycle.period_days().trunc()
        );
        self.emit(date, &status);

        let mut next = session;
        next.elapsed_days += DAYS_PER_TICK;
        if next.elapsed_days >= self.cycle.period_days() || session_date(&next).is_err() {
            // The origin itself is always a valid date.
            next.elapsed_days = 0.0;
        }
        self.session = Some(next);

        self.arm(self.options.frame_interval);
        Ok(())
    }

    /// Emit the externally selected date through this controller's sink.
    pub fn show_date(&mut self, date: &str) -> Result<Silhouette, PhaseError> {
        show_date(&self.cycle, self.viewport, &mut self.sink, date)
    }

    fn emit(&mut self, date: NaiveDate, status: &str) {
        let Viewport { radius, center } = self.viewport;
        let silhouette = silhouette_on(&self.cycle, date, radius, center);
        tracing::debug!(%date, days = silhouette.phase.days_into_cycle, "frame");
        self.sink.status(status);
        self.sink.draw(&silhouette);
    }

    fn arm(&mut self, delay: Duration) {
        self.cancel_pending();
        self.pending = Some(self.scheduler.schedule(delay));
    }

    fn cancel_pending(&mut self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel(id);
        }
    }

    fn clamp_interval(&self, interval: Duration) -> Duration {
        interval
            .max(self.options.min_interval)
            .min(self.options.max_interval)
    }
}

impl<S: Scheduler, K: PhaseSink> Drop for AnimationController<S, K> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

fn session_date(session: &AnimationSession) -> Result<NaiveDate, PhaseError> {
    offset_date(session.origin, session.elapsed_days.floor() as i64)
}
