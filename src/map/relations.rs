//! Relationship checks and the edge geometry handed to renderers.

use std::collections::HashSet;

use log::warn;

use super::error::MapError;
use super::geometry::{Ellipse, Point};
use super::layout::Layout;
use super::types::{Bubble, RelationType, Relationship, ResultsMapData};

/// A relationship that failed validation, with the reason.
#[derive(Debug)]
pub struct InvalidRelationship<'a> {
	pub relationship: &'a Relationship,
	pub reason: MapError,
}

/// Relationships split by whether they can be drawn.
#[derive(Debug, Default)]
pub struct Validation<'a> {
	pub valid: Vec<&'a Relationship>,
	pub invalid: Vec<InvalidRelationship<'a>>,
}

impl Validation<'_> {
	pub fn is_clean(&self) -> bool {
		self.invalid.is_empty()
	}
}

/// Splits `relationships` into those whose ends both resolve to distinct
/// bubbles and those that do not. Nothing is dropped; the caller decides
/// what to do with the invalid ones.
pub fn validate<'a>(relationships: &'a [Relationship], bubbles: &[Bubble]) -> Validation<'a> {
	let ids: HashSet<&str> = bubbles.iter().map(|b| b.id.as_str()).collect();
	let mut out = Validation::default();
	for rel in relationships {
		match check(rel, &ids) {
			Ok(()) => out.valid.push(rel),
			Err(reason) => {
				warn!("{reason}");
				out.invalid.push(InvalidRelationship {
					relationship: rel,
					reason,
				});
			}
		}
	}
	out
}

fn check(rel: &Relationship, ids: &HashSet<&str>) -> Result<(), MapError> {
	if rel.source == rel.target {
		return Err(MapError::SelfReference {
			relationship: rel.id.clone(),
		});
	}
	for end in [&rel.source, &rel.target] {
		if !ids.contains(end.as_str()) {
			return Err(MapError::DanglingReference {
				relationship: rel.id.clone(),
				bubble: end.clone(),
			});
		}
	}
	Ok(())
}

/// Drawn endpoints of an edge between two bubble outlines: each end sits
/// where the centre-to-centre line crosses that bubble's boundary, on the
/// side facing the other bubble. `None` when the centres coincide.
pub fn edge_endpoints(from: &Ellipse, to: &Ellipse) -> Option<(Point, Point)> {
	if from.center.distance(to.center) < super::geometry::EPSILON {
		return None;
	}
	let start = from.boundary_toward(to.center)?;
	let end = to.boundary_toward(from.center)?;
	Some((start, end))
}

/// Everything a renderer needs to draw one relationship.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeGeometry {
	pub id: String,
	pub kind: RelationType,
	pub from: Point,
	pub to: Point,
	/// Draw an arrow head at `to`.
	pub directional: bool,
}

/// Geometry of every valid relationship whose two bubbles are laid out.
pub fn edge_geometry(data: &ResultsMapData, layout: &Layout) -> Vec<EdgeGeometry> {
	validate(&data.relationships, &data.bubbles)
		.valid
		.into_iter()
		.filter_map(|rel| {
			let from = layout.get(&rel.source)?;
			let to = layout.get(&rel.target)?;
			let (a, b) = edge_endpoints(&from.shape, &to.shape)?;
			Some(EdgeGeometry {
				id: rel.id.clone(),
				kind: rel.kind,
				from: a,
				to: b,
				directional: rel.kind.is_directional(),
			})
		})
		.collect()
}
