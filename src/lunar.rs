//! Moon-phase arithmetic over a fixed synodic period.
//!
//! The cycle is anchored at a reference epoch known to be a new moon and
//! assumes a constant period of 29.5 days. Accuracy is deliberately coarse:
//! ±1 day against real ephemerides, no eccentricity, no topocentric terms.
//!
//! Two classifications live here:
//! - [`PhaseState`]: continuous day-in-cycle plus the waxing flag, used to
//!   build silhouettes.
//! - [`MoonPhase`]: eight emoji buckets with integer-day edges, used for
//!   summaries and the legend.
//!
//! The two do not agree exactly at bucket edges (day 14 is "waxing gibbous"
//! while the continuous rule flips to waning at 14.75). Both are kept as-is.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Mean length of one phase cycle in days.
pub const LUNAR_PERIOD_DAYS: f64 = 29.5;

/// Reference new moon, 2025-10-21.
pub const REFERENCE_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(2025, 10, 21) {
    Some(date) => date,
    None => panic!("reference epoch is not a calendar date"),
};

/// ISO date layout accepted from callers.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised by phase arithmetic.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PhaseError {
    /// Input is not a real calendar date, or the offset date falls outside
    /// the representable calendar.
    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDateFormat(String),

    /// Period must be finite and strictly positive.
    #[error("invalid lunar period: {0}")]
    InvalidPeriod(f64),
}

/// Parse an ISO `YYYY-MM-DD` date.
///
/// Rejects malformed strings as well as dates that do not exist
/// (`2025-02-30`, month 13).
pub fn parse_date(text: &str) -> Result<NaiveDate, PhaseError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|_| PhaseError::InvalidDateFormat(text.to_string()))
}

/// Add a whole number of days (possibly negative) to `date`.
pub(crate) fn offset_date(date: NaiveDate, days: i64) -> Result<NaiveDate, PhaseError> {
    chrono::Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| PhaseError::InvalidDateFormat(format!("{date} {days:+} days")))
}

/// Position inside the cycle for one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseState {
    /// Days since the most recent new moon, always in `[0, period)`.
    pub days_into_cycle: f64,
    /// True during the first half of the cycle.
    pub waxing: bool,
}

/// The constants every phase computation shares.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LunarCycle {
    period_days: f64,
    epoch: NaiveDate,
}

impl Default for LunarCycle {
    fn default() -> Self {
        LunarCycle {
            period_days: LUNAR_PERIOD_DAYS,
            epoch: REFERENCE_EPOCH,
        }
    }
}

impl LunarCycle {
    pub fn new(period_days: f64, epoch: NaiveDate) -> Result<Self, PhaseError> {
        if !period_days.is_finite() || period_days <= 0.0 {
            return Err(PhaseError::InvalidPeriod(period_days));
        }
        Ok(Self { period_days, epoch })
    }

    pub fn period_days(&self) -> f64 {
        self.period_days
    }

    pub fn half_period(&self) -> f64 {
        self.period_days / 2.0
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// Fold any day offset into `[0, period)`.
    pub fn wrap(&self, days: f64) -> f64 {
        let wrapped = days.rem_euclid(self.period_days);
        // rem_euclid can round up to exactly `period` for tiny negatives.
        if wrapped >= self.period_days {
            0.0
        } else {
            wrapped
        }
    }

    /// Days into the cycle for `date`, before or after the epoch alike.
    pub fn days_into_cycle(&self, date: NaiveDate) -> f64 {
        let delta_days = date.signed_duration_since(self.epoch).num_days();
        self.wrap(delta_days as f64)
    }

    pub fn phase_state_on(&self, date: NaiveDate) -> PhaseState {
        let days_into_cycle = self.days_into_cycle(date);
        PhaseState {
            days_into_cycle,
            waxing: days_into_cycle < self.half_period(),
        }
    }

    /// Phase state for an ISO date string.
    pub fn phase_state(&self, date: &str) -> Result<PhaseState, PhaseError> {
        Ok(self.phase_state_on(parse_date(date)?))
    }

    pub fn classify_on(&self, date: NaiveDate) -> MoonPhase {
        MoonPhase::from_days(self.days_into_cycle(date))
    }

    /// Emoji bucket for an ISO date string.
    pub fn classify(&self, date: &str) -> Result<MoonPhase, PhaseError> {
        Ok(self.classify_on(parse_date(date)?))
    }

    pub fn summarize_on(&self, date: NaiveDate) -> PhaseSummary {
        let state = self.phase_state_on(date);
        PhaseSummary {
            date,
            days_into_cycle: state.days_into_cycle,
            waxing: state.waxing,
            phase: self.classify_on(date),
        }
    }

    pub fn summarize(&self, date: &str) -> Result<PhaseSummary, PhaseError> {
        Ok(self.summarize_on(parse_date(date)?))
    }
}

/// Eight coarse phase buckets, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoonPhase {
    NewMoon,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    FullMoon,
    WaningGibbous,
    LastQuarter,
    WaningCrescent,
}

impl MoonPhase {
    pub const ALL: [MoonPhase; 8] = [
        MoonPhase::NewMoon,
        MoonPhase::WaxingCrescent,
        MoonPhase::FirstQuarter,
        MoonPhase::WaxingGibbous,
        MoonPhase::FullMoon,
        MoonPhase::WaningGibbous,
        MoonPhase::LastQuarter,
        MoonPhase::WaningCrescent,
    ];

    /// Bucket a wrapped day value. Edges sit on whole days; anything from
    /// day 29 to the end of the cycle counts as new again.
    pub fn from_days(days: f64) -> Self {
        match days {
            d if d < 1.0 => MoonPhase::NewMoon,
            d if d < 7.0 => MoonPhase::WaxingCrescent,
            d if d < 8.0 => MoonPhase::FirstQuarter,
            d if d < 14.0 => MoonPhase::WaxingGibbous,
            d if d < 15.0 => MoonPhase::FullMoon,
            d if d < 21.0 => MoonPhase::WaningGibbous,
            d if d < 22.0 => MoonPhase::LastQuarter,
            d if d < 29.0 => MoonPhase::WaningCrescent,
            _ => MoonPhase::NewMoon,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            MoonPhase::NewMoon => "🌑",
            MoonPhase::WaxingCrescent => "🌒",
            MoonPhase::FirstQuarter => "🌓",
            MoonPhase::WaxingGibbous => "🌔",
            MoonPhase::FullMoon => "🌕",
            MoonPhase::WaningGibbous => "🌖",
            MoonPhase::LastQuarter => "🌗",
            MoonPhase::WaningCrescent => "🌘",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MoonPhase::NewMoon => "New Moon",
            MoonPhase::WaxingCrescent => "Waxing Crescent",
            MoonPhase::FirstQuarter => "First Quarter",
            MoonPhase::WaxingGibbous => "Waxing Gibbous",
            MoonPhase::FullMoon => "Full Moon",
            MoonPhase::WaningGibbous => "Waning Gibbous",
            MoonPhase::LastQuarter => "Last Quarter",
            MoonPhase::WaningCrescent => "Waning Crescent",
        }
    }

    /// Whole-day range `[start, end)` covered by the bucket. New moon
    /// reports its leading range only.
    pub fn day_range(self) -> (u32, u32) {
        match self {
            MoonPhase::NewMoon => (0, 1),
            MoonPhase::WaxingCrescent => (1, 7),
            MoonPhase::FirstQuarter => (7, 8),
            MoonPhase::WaxingGibbous => (8, 14),
            MoonPhase::FullMoon => (14, 15),
            MoonPhase::WaningGibbous => (15, 21),
            MoonPhase::LastQuarter => (21, 22),
            MoonPhase::WaningCrescent => (22, 29),
        }
    }
}

impl fmt::Display for MoonPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.glyph(), self.name())
    }
}

/// Everything the CLI prints about one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseSummary {
    pub date: NaiveDate,
    pub days_into_cycle: f64,
    pub waxing: bool,
    pub phase: MoonPhase,
}

impl fmt::Display for PhaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  day {:.1} ({})",
            self.date,
            self.phase,
            self.days_into_cycle,
            if self.waxing { "waxing" } else { "waning" }
        )
    }
}
