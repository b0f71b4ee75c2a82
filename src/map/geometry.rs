//! Angle and radius math for the radial map.
//!
//! The map centre is the origin. Angles are radians measured from the
//! positive x axis; on a canvas (y pointing down) they run clockwise.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::error::{MapError, Result};
use super::types::{Group, LayerType, MapConfig};

/// Tolerance for angle and radius comparisons.
pub const EPSILON: f64 = 1e-9;

/// How far inside a sector boundary a clamped angle lands. Larger than
/// [`EPSILON`] so the result survives a polar round trip.
const BOUNDARY_INSET: f64 = 1e-6;

/// Wraps an angle into `[0, 2π)`.
pub fn normalize_angle(angle: f64) -> f64 {
	let a = angle.rem_euclid(TAU);
	// rem_euclid rounds tiny negative inputs up to TAU itself
	if a >= TAU { 0.0 } else { a }
}

/// A Cartesian point relative to the map centre.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn polar(radius: f64, angle: f64) -> Self {
		Self {
			x: radius * angle.cos(),
			y: radius * angle.sin(),
		}
	}

	pub fn radius(self) -> f64 {
		self.x.hypot(self.y)
	}

	/// Polar angle in `[0, 2π)`. The origin reports 0.
	pub fn angle(self) -> f64 {
		normalize_angle(self.y.atan2(self.x))
	}

	pub fn distance(self, other: Point) -> f64 {
		(other.x - self.x).hypot(other.y - self.y)
	}
}

/// A radial band `[inner, outer]` occupied by one layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Band {
	pub outer: f64,
	pub inner: f64,
}

impl Band {
	pub fn new(inner: f64, outer: f64) -> Self {
		Self { outer, inner }
	}

	pub fn width(self) -> f64 {
		self.outer - self.inner
	}

	pub fn is_valid(self) -> bool {
		self.inner.is_finite() && self.outer.is_finite() && self.inner >= 0.0 && self.inner < self.outer
	}

	pub fn contains_radius(self, radius: f64) -> bool {
		radius >= self.inner - EPSILON && radius <= self.outer + EPSILON
	}
}

/// An angular wedge `[start, end)`; may start anywhere and wrap past 2π.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sector {
	pub start: f64,
	pub end: f64,
}

impl Sector {
	/// The whole circle, used as the virtual sector of ungrouped bubbles.
	pub const FULL: Sector = Sector {
		start: 0.0,
		end: TAU,
	};

	pub fn new(start: f64, end: f64) -> Self {
		Self { start, end }
	}

	pub fn span(self) -> f64 {
		self.end - self.start
	}

	pub fn is_full(self) -> bool {
		self.span() >= TAU - EPSILON
	}

	/// Non-empty and no wider than one turn.
	pub fn is_valid(self) -> bool {
		self.start.is_finite() && self.end.is_finite() && self.end > self.start && self.span() <= TAU + EPSILON
	}

	/// Angular distance from `start` to `angle`, walking forward.
	fn offset_of(self, angle: f64) -> f64 {
		let off = normalize_angle(angle - self.start);
		if TAU - off < EPSILON { 0.0 } else { off }
	}

	/// Left-inclusive, right-exclusive membership.
	pub fn contains_angle(self, angle: f64) -> bool {
		self.is_full() || self.offset_of(angle) < self.span() - EPSILON
	}

	/// True when the two sectors share more than a boundary.
	pub fn overlaps(self, other: Sector) -> bool {
		if self.is_full() || other.is_full() {
			return true;
		}
		self.offset_of(other.start) < self.span() - EPSILON
			|| other.offset_of(self.start) < other.span() - EPSILON
	}

	/// Angle at fraction `t` of the span.
	pub fn lerp(self, t: f64) -> f64 {
		self.start + self.span() * t
	}

	/// Moves an outside angle onto the nearer boundary.
	pub fn clamp_angle(self, angle: f64) -> f64 {
		if self.contains_angle(angle) {
			return angle;
		}
		let off = self.offset_of(angle);
		let past_end = off - self.span();
		let before_start = TAU - off;
		if past_end <= before_start {
			self.end - BOUNDARY_INSET
		} else {
			self.start
		}
	}
}

/// The intersection of one layer band with one group sector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Region {
	pub band: Band,
	pub sector: Sector,
}

impl Region {
	pub fn contains(&self, point: Point) -> bool {
		self.band.contains_radius(point.radius()) && self.sector.contains_angle(point.angle())
	}
}

/// Placement region of a bubble in `layer` belonging to `group`
/// (`None` for ungrouped bubbles, which get the whole circle).
pub fn region_for(config: &MapConfig, layer: LayerType, group: Option<&Group>) -> Result<Region> {
	let band = config.layer_sizes.band(layer);
	if !band.is_valid() {
		return Err(MapError::InvalidBand {
			layer,
			inner: band.inner,
			outer: band.outer,
		});
	}
	let sector = match group {
		Some(g) => checked_sector(g)?,
		None => Sector::FULL,
	};
	Ok(Region { band, sector })
}

fn checked_sector(group: &Group) -> Result<Sector> {
	let sector = group.sector();
	if sector.is_valid() {
		Ok(sector)
	} else {
		Err(MapError::InvalidSector {
			group: group.id.clone(),
			start: group.start_angle,
			end: group.end_angle,
		})
	}
}

/// Projects `point` into `region`: radius first, then angle.
pub fn clamp_to_region(point: Point, region: &Region) -> Point {
	if region.contains(point) {
		return point;
	}
	let radius = point.radius().clamp(region.band.inner, region.band.outer);
	let angle = region.sector.clamp_angle(point.angle());
	Point::polar(radius, angle)
}

/// Id of the group whose sector contains the angle of `point`.
pub fn sector_of(point: Point, groups: &[Group]) -> Option<&str> {
	let angle = point.angle();
	groups
		.iter()
		.find(|g| g.sector().is_valid() && g.sector().contains_angle(angle))
		.map(|g| g.id.as_str())
}

/// Checks that every sector is well formed and that none overlap.
pub fn validate_sectors(groups: &[Group]) -> Result<()> {
	for (i, group) in groups.iter().enumerate() {
		let sector = checked_sector(group)?;
		if groups[..i].iter().any(|other| other.sector().overlaps(sector)) {
			return Err(MapError::InvalidSector {
				group: group.id.clone(),
				start: group.start_angle,
				end: group.end_angle,
			});
		}
	}
	Ok(())
}

/// An axis-aligned ellipse, the drawn shape of a bubble.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipse {
	pub center: Point,
	pub rx: f64,
	pub ry: f64,
}

impl Ellipse {
	pub fn new(center: Point, rx: f64, ry: f64) -> Self {
		Self { center, rx, ry }
	}

	/// Distance from the centre to the boundary in direction `angle`.
	pub fn extent_toward(&self, angle: f64) -> f64 {
		let (sin, cos) = angle.sin_cos();
		let denom = ((self.ry * cos).powi(2) + (self.rx * sin).powi(2)).sqrt();
		if denom < EPSILON { 0.0 } else { self.rx * self.ry / denom }
	}

	pub fn contains(&self, point: Point) -> bool {
		if self.rx <= 0.0 || self.ry <= 0.0 {
			return false;
		}
		let dx = (point.x - self.center.x) / self.rx;
		let dy = (point.y - self.center.y) / self.ry;
		dx * dx + dy * dy <= 1.0
	}

	/// Intersections of the line through `a` and `b` with the boundary,
	/// as parameters `t` of `a + t (b - a)`, smaller first.
	fn line_intersections(&self, a: Point, b: Point) -> Option<(f64, f64)> {
		if self.rx <= 0.0 || self.ry <= 0.0 {
			return None;
		}
		let (dx, dy) = ((b.x - a.x) / self.rx, (b.y - a.y) / self.ry);
		let (ox, oy) = ((a.x - self.center.x) / self.rx, (a.y - self.center.y) / self.ry);
		let qa = dx * dx + dy * dy;
		if qa < EPSILON {
			return None;
		}
		let qb = 2.0 * (ox * dx + oy * dy);
		let qc = ox * ox + oy * oy - 1.0;
		let disc = qb * qb - 4.0 * qa * qc;
		if disc < 0.0 {
			return None;
		}
		let root = disc.sqrt();
		Some(((-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa)))
	}

	/// Where the line from the centre to `toward` leaves the ellipse, taking
	/// the intersection nearer to `toward`.
	pub fn boundary_toward(&self, toward: Point) -> Option<Point> {
		let (t0, t1) = self.line_intersections(self.center, toward)?;
		let at = |t: f64| {
			Point::new(
				self.center.x + t * (toward.x - self.center.x),
				self.center.y + t * (toward.y - self.center.y),
			)
		};
		let (p0, p1) = (at(t0), at(t1));
		if p0.distance(toward) <= p1.distance(toward) {
			Some(p0)
		} else {
			Some(p1)
		}
	}

	/// Centre distance below which two ellipses plus `gap` touch.
	pub fn clearance(&self, other: &Ellipse, gap: f64) -> f64 {
		let angle = (other.center.y - self.center.y).atan2(other.center.x - self.center.x);
		self.extent_toward(angle) + other.extent_toward(angle) + gap
	}

	pub fn collides(&self, other: &Ellipse, gap: f64) -> bool {
		self.center.distance(other.center) < self.clearance(other, gap)
	}
}
