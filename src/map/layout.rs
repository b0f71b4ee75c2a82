//! Region-based placement of bubbles.
//!
//! Every visible bubble is placed inside the region formed by its layer band
//! and its group sector. Bubbles sharing a region are spread over the
//! sector's span on staggered rows; colliding bubbles move to the next free
//! slot, and when the sector runs out of slots they stack towards the outer
//! edge of the band and are reported as overflowing.

use std::collections::HashMap;

use log::{debug, warn};

use super::error::{MapError, Result};
use super::geometry::{Ellipse, Point, Region, clamp_to_region, region_for};
use super::types::{Bubble, Group, LayerType, MapConfig, ResultsMapData};

/// Tuning knobs of the layout engine.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutParameters {
	/// Minimum free space between two bubble outlines.
	pub gap: f64,
	/// Horizontal radius gained per character of text.
	pub char_width: f64,
	pub min_rx: f64,
	pub max_rx: f64,
	/// `ry / rx` for derived shapes.
	pub aspect: f64,
	/// Font size the derived radii are calibrated for.
	pub base_font_size: f64,
}

impl Default for LayoutParameters {
	fn default() -> Self {
		Self {
			gap: 8.0,
			char_width: 2.2,
			min_rx: 40.0,
			max_rx: 80.0,
			aspect: 0.6,
			base_font_size: 14.0,
		}
	}
}

impl LayoutParameters {
	/// Ellipse radii of a bubble: explicit `rx`/`ry` win, otherwise they
	/// grow with the text length.
	pub fn radii(&self, bubble: &Bubble) -> (f64, f64) {
		let scale = bubble.font_size.unwrap_or(self.base_font_size) / self.base_font_size;
		let chars = bubble.text.chars().count() as f64;
		let derived = (self.min_rx + chars * self.char_width * scale).min(self.max_rx);
		let rx = bubble.rx.unwrap_or(derived);
		let ry = bubble.ry.unwrap_or(rx * self.aspect);
		(rx, ry)
	}
}

/// How a bubble got its position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
	/// Computed by the engine.
	Placed,
	/// User coordinates, clamped into the region.
	Anchored,
	/// Locked bubble at its stored coordinates.
	Pinned,
	/// The sector had no free slot; stacked inside the band.
	Overflow,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BubbleLayout {
	pub id: String,
	pub layer: LayerType,
	/// Resolved group id, empty when the bubble floats in its band.
	pub group: String,
	pub shape: Ellipse,
	pub placement: Placement,
}

impl BubbleLayout {
	pub fn position(&self) -> Point {
		self.shape.center
	}
}

/// Positions of all visible bubbles, in document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
	bubbles: Vec<BubbleLayout>,
	index: HashMap<String, usize>,
}

impl Layout {
	pub fn get(&self, id: &str) -> Option<&BubbleLayout> {
		self.index.get(id).map(|&i| &self.bubbles[i])
	}

	pub fn iter(&self) -> impl Iterator<Item = &BubbleLayout> {
		self.bubbles.iter()
	}

	pub fn len(&self) -> usize {
		self.bubbles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bubbles.is_empty()
	}

	pub fn overflowed(&self) -> impl Iterator<Item = &BubbleLayout> {
		self.bubbles.iter().filter(|b| b.placement == Placement::Overflow)
	}

	/// One advisory [`MapError::Overflow`] per crowded region.
	pub fn diagnostics(&self) -> Vec<MapError> {
		let mut counts: Vec<((LayerType, &str), usize)> = Vec::new();
		for b in self.overflowed() {
			let key = (b.layer, b.group.as_str());
			match counts.iter_mut().find(|(k, _)| *k == key) {
				Some((_, n)) => *n += 1,
				None => counts.push((key, 1)),
			}
		}
		counts
			.into_iter()
			.map(|((layer, group), count)| MapError::Overflow {
				layer,
				group: group.to_string(),
				count,
			})
			.collect()
	}

	/// Topmost bubble whose outline contains `point`.
	pub fn bubble_at(&self, point: Point) -> Option<&BubbleLayout> {
		self.bubbles.iter().rev().find(|b| b.shape.contains(point))
	}
}

/// [`layout_with`] using [`LayoutParameters::default`].
pub fn layout(bubbles: &[Bubble], groups: &[Group], config: &MapConfig) -> Result<Layout> {
	layout_with(bubbles, groups, config, &LayoutParameters::default())
}

/// Computes a position for every visible bubble.
///
/// Fails only on malformed configuration (bands or a referenced sector).
/// A crowded sector is not an error: the affected bubbles come back marked
/// [`Placement::Overflow`]. Locked bubbles with stored coordinates are
/// returned exactly where they are. The result depends only on the inputs,
/// so running it twice gives the same positions.
pub fn layout_with(bubbles: &[Bubble], groups: &[Group], config: &MapConfig, params: &LayoutParameters) -> Result<Layout> {
	config.validate()?;
	let by_id: HashMap<&str, &Group> = groups.iter().map(|g| (g.id.as_str(), g)).collect();

	let visible: Vec<&Bubble> = bubbles.iter().filter(|b| b.visible).collect();
	let mut resolved: Vec<(&str, Region)> = Vec::with_capacity(visible.len());
	for bubble in &visible {
		let group = bubble.group().and_then(|id| by_id.get(id).copied());
		if let (Some(id), None) = (bubble.group(), group) {
			warn!("bubble {} references unknown group {id}, laying it out ungrouped", bubble.id);
		}
		let region = region_for(config, bubble.layer, group)?;
		resolved.push((group.map_or("", |g| g.id.as_str()), region));
	}

	let mut slots: Vec<Option<(Ellipse, Placement)>> = vec![None; visible.len()];
	let mut obstacles: Vec<Ellipse> = Vec::new();

	// stored coordinates first, they are obstacles for everything else
	for (i, bubble) in visible.iter().enumerate() {
		let Some(stored) = bubble.position() else {
			continue;
		};
		let (rx, ry) = params.radii(bubble);
		let (center, placement) = if bubble.locked {
			(stored, Placement::Pinned)
		} else {
			(clamp_to_region(stored, &resolved[i].1), Placement::Anchored)
		};
		let shape = Ellipse::new(center, rx, ry);
		obstacles.push(shape);
		slots[i] = Some((shape, placement));
	}

	let mut buckets: Vec<((LayerType, &str), Vec<usize>)> = Vec::new();
	for (i, bubble) in visible.iter().enumerate() {
		if slots[i].is_some() {
			continue;
		}
		let key = (bubble.layer, resolved[i].0);
		match buckets.iter_mut().find(|(k, _)| *k == key) {
			Some((_, members)) => members.push(i),
			None => buckets.push((key, vec![i])),
		}
	}

	for ((layer, group), members) in &buckets {
		let region = resolved[members[0]].1;
		let shapes: Vec<(f64, f64)> = members.iter().map(|&i| params.radii(visible[i])).collect();
		let placed = place_region(&region, &shapes, &mut obstacles, params.gap);
		let overflow = placed.iter().filter(|(_, p)| *p == Placement::Overflow).count();
		if overflow > 0 {
			warn!("{overflow} bubble(s) overflow layer {layer} group {group:?}");
		}
		for (&i, slot) in members.iter().zip(placed) {
			slots[i] = Some(slot);
		}
	}

	let mut result = Layout::default();
	for ((bubble, (group, _)), slot) in visible.iter().zip(resolved).zip(slots) {
		let Some((shape, placement)) = slot else {
			continue;
		};
		result.index.insert(bubble.id.clone(), result.bubbles.len());
		result.bubbles.push(BubbleLayout {
			id: bubble.id.clone(),
			layer: bubble.layer,
			group: group.to_string(),
			shape,
			placement,
		});
	}
	debug!("laid out {} bubble(s) in {} region(s)", result.len(), buckets.len());
	Ok(result)
}

/// Grid slots per row, per bubble of the region.
const MAX_SLOTS_PER_MEMBER: usize = 4;

/// Places the members of one region, in order. `shapes` holds their radii.
fn place_region(region: &Region, shapes: &[(f64, f64)], obstacles: &mut Vec<Ellipse>, gap: f64) -> Vec<(Ellipse, Placement)> {
	let (band, sector) = (region.band, region.sector);
	let widest = shapes.iter().fold(0.0_f64, |m, &(rx, _)| m.max(rx));
	let tallest = shapes.iter().fold(0.0_f64, |m, &(_, ry)| m.max(ry));
	let n = shapes.len();
	// more rows or slots than members never helps, and degenerate sizes
	// would otherwise saturate the counts
	let rows = ((band.width() / (2.0 * tallest + gap)).floor() as usize).clamp(1, n.max(1));
	let row_radius = |k: usize| band.inner + band.width() * (k + 1) as f64 / (rows + 1) as f64;

	let mut grid = Vec::new();
	for k in 0..rows {
		let r = row_radius(k);
		let count = ((sector.span() * r / (2.0 * widest + gap)).floor() as usize).clamp(1, MAX_SLOTS_PER_MEMBER * n.max(1));
		grid.extend((0..count).map(|j| Point::polar(r, sector.lerp((j as f64 + 0.5) / count as f64))));
	}

	let mut stacked = 0;
	let mut out = Vec::with_capacity(n);
	for (i, &(rx, ry)) in shapes.iter().enumerate() {
		let angle = sector.lerp((i as f64 + 0.5) / n as f64);
		let preferred = Point::polar(row_radius(i % rows), angle);
		let free = std::iter::once(preferred)
			.chain(grid.iter().copied())
			.map(|c| Ellipse::new(c, rx, ry))
			.find(|e| !obstacles.iter().any(|o| o.collides(e, gap)));
		let slot = match free {
			Some(shape) => (shape, Placement::Placed),
			None => {
				stacked += 1;
				let r = band.inner + band.width() * (1.0 - 1.0 / (stacked as f64 + 1.0));
				(Ellipse::new(Point::polar(r, angle), rx, ry), Placement::Overflow)
			}
		};
		obstacles.push(slot.0);
		out.push(slot);
	}
	out
}

impl ResultsMapData {
	/// Lays out this map's bubbles with default parameters.
	pub fn layout(&self) -> Result<Layout> {
		layout(&self.bubbles, &self.groups, &self.map_config)
	}
}
