//! # Moon Phase Core Library
//!
//! This library maps calendar dates to moon-phase silhouettes and animates
//! those silhouettes through a full lunar cycle. It has no opinion about the
//! UI: callers feed it dates and commands and receive shapes and status text
//! through the [`PhaseSink`] trait.
//!
//! ## Design Philosophy
//!
//! ### Pure Geometry
//! - **Stateless**: [`lunar`] and [`geometry`] are plain functions over a
//!   [`LunarCycle`] value (period + reference new moon)
//! - **Deterministic**: the same date, radius and center always produce the
//!   same points
//! - **Renderer-agnostic**: a [`Silhouette`] is a disc plus an optional
//!   polygon, each tagged light or dark
//!
//! ### Cooperative Animation
//! - **Single-threaded**: the [`AnimationController`] never spawns; it asks a
//!   [`Scheduler`] for one-shot timers and the host delivers them back
//! - **One pending tick**: every state change cancels the armed timer first,
//!   so stale ticks are dropped instead of double-advancing
//!
//! ## Data Flow
//! 1. **Date in**: ISO `YYYY-MM-DD` strings are validated by [`parse_date`]
//! 2. **Phase**: days since the epoch wrapped into `[0, period)`
//! 3. **Shape**: terminator offset slides `+R → -R` across each half cycle
//! 4. **Out**: [`PhaseSink::status`] then [`PhaseSink::draw`]
//!
//! # Example
//! ```
//! use moon_phase_lib::{compute_silhouette, LunarCycle, MoonPhase, Point2};
//!
//! let cycle = LunarCycle::default();
//! assert_eq!(cycle.classify("2025-10-28").unwrap(), MoonPhase::FirstQuarter);
//!
//! let new_moon = compute_silhouette(&cycle, "2025-10-21", 50.0, Point2::new(60.0, 60.0)).unwrap();
//! assert!(new_moon.terminator.is_none());
//! ```

pub mod animation;
pub mod config;
pub mod geometry;
pub mod lunar;
pub mod renderer;
pub mod timer;

pub use animation::{
    show_date, AnimationController, PhaseSink, PlaybackOptions, PlaybackState, Scheduler,
    TimerId, Viewport,
};
pub use geometry::{compute_silhouette, Point2, Shade, Silhouette};
pub use lunar::{parse_date, LunarCycle, MoonPhase, PhaseError, PhaseState, PhaseSummary};
pub use timer::TimerQueue;
