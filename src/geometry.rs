//! # Silhouette Geometry
//!
//! Converts a position in the lunar cycle into drawable 2-D shapes: an outer
//! disc and, except at exactly new or full moon, a terminator polygon layered
//! on top of it.
//!
//! ## Terminator Model
//!
//! The terminator is approximated by a vertical half-ellipse whose vertical
//! radius is the disc radius and whose signed horizontal radius
//! (`inner_offset`) slides linearly from `+R` to `-R` over each half cycle.
//! Both halves of the cycle share the same ramp; only the fill designations
//! swap between waxing and waning:
//!
//! | half    | disc  | terminator polygon |
//! |---------|-------|--------------------|
//! | waxing  | dark  | light              |
//! | waning  | light | dark               |
//!
//! The polygon outline is the outer arc walked bottom-to-top followed by the
//! inner arc walked top-to-bottom, so it closes without a jump.

use crate::lunar::{LunarCycle, PhaseError, PhaseState};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// First sampled angle of an arc, in degrees (inclusive).
const ARC_START_DEG: i32 = -90;
/// Last sampled angle of an arc, in degrees (exclusive).
const ARC_END_DEG: i32 = 90;

/// A point in canvas coordinates (x right, y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Fill designation handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shade {
    Light,
    Dark,
}

/// The full moon outline, drawn first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disc {
    pub center: Point2,
    pub radius: f64,
    pub shade: Shade,
}

/// Closed polygon between the outer limb and the terminator, drawn second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminator {
    pub points: Vec<Point2>,
    pub shade: Shade,
}

/// Everything needed to draw the moon for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Silhouette {
    pub phase: PhaseState,
    /// Signed horizontal radius of the terminator arc.
    pub inner_offset: f64,
    pub disc: Disc,
    /// `None` at new and full moon.
    pub terminator: Option<Terminator>,
}

impl Silhouette {
    /// Shapes in draw order.
    pub fn layers(&self) -> impl Iterator<Item = Layer<'_>> {
        std::iter::once(Layer::Disc(&self.disc))
            .chain(self.terminator.as_ref().map(Layer::Terminator))
    }
}

/// One drawable shape of a [`Silhouette`].
#[derive(Debug, Clone, Copy)]
pub enum Layer<'a> {
    Disc(&'a Disc),
    Terminator(&'a Terminator),
}

/// Sample a vertical half-ellipse spanning the disc height.
///
/// `x_radius` may be negative, which mirrors the arc to the left of center.
fn arc_points(center: Point2, radius: f64, x_radius: f64) -> Vec<Point2> {
    (ARC_START_DEG..ARC_END_DEG)
        .map(|deg| {
            let angle = (deg as f64).to_radians();
            Point2::new(
                center.x + x_radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

/// Signed horizontal radius of the terminator for a given phase.
pub fn inner_offset(cycle: &LunarCycle, phase: PhaseState, radius: f64) -> f64 {
    let half = cycle.half_period();
    let d = phase.days_into_cycle % half;
    let change_per_day = (2.0 * radius) / half;
    radius - change_per_day * d
}

/// Build the silhouette for a date already known to be valid.
pub fn silhouette_on(
    cycle: &LunarCycle,
    date: NaiveDate,
    radius: f64,
    center: Point2,
) -> Silhouette {
    let phase = cycle.phase_state_on(date);
    silhouette_for_phase(cycle, phase, radius, center)
}

/// Build the silhouette for an ISO date string.
pub fn compute_silhouette(
    cycle: &LunarCycle,
    date: &str,
    radius: f64,
    center: Point2,
) -> Result<Silhouette, PhaseError> {
    let phase = cycle.phase_state(date)?;
    Ok(silhouette_for_phase(cycle, phase, radius, center))
}

pub fn silhouette_for_phase(
    cycle: &LunarCycle,
    phase: PhaseState,
    radius: f64,
    center: Point2,
) -> Silhouette {
    let offset = inner_offset(cycle, phase, radius);

    let (disc_shade, terminator_shade) = if phase.waxing {
        (Shade::Dark, Shade::Light)
    } else {
        (Shade::Light, Shade::Dark)
    };

    // At new/full moon the polygon would collapse to a zero-width sliver
    // along the right limb.
    let terminator = if offset == radius {
        None
    } else {
        let mut points = arc_points(center, radius, radius);
        points.reverse();
        points.extend(arc_points(center, radius, offset));
        Some(Terminator {
            points,
            shade: terminator_shade,
        })
    };

    Silhouette {
        phase,
        inner_offset: offset,
        disc: Disc {
            center,
            radius,
            shade: disc_shade,
        },
        terminator,
    }
}
