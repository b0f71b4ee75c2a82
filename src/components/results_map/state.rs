use std::collections::HashSet;

use log::warn;

use crate::map::{EdgeGeometry, Layout, Point, ResultsMapData, edge_geometry};

/// Screen pixels kept free around the outermost band.
pub const MARGIN: f64 = 48.0;

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub bubble: Option<String>,
	pub start_x: f64,
	pub start_y: f64,
	pub bubble_start: Point,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub bubble: Option<String>,
	pub neighbors: HashSet<String>,
	pub highlight_t: f64,
}

/// Everything the canvas needs between frames: a working copy of the map,
/// its layout and the view.
pub struct ResultsMapState {
	pub data: ResultsMapData,
	pub layout: Layout,
	pub edges: Vec<EdgeGeometry>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
}

impl ResultsMapState {
	pub fn new(data: ResultsMapData, width: f64, height: f64) -> Self {
		let mut state = Self {
			data: ResultsMapData::default(),
			layout: Layout::default(),
			edges: Vec::new(),
			transform: ViewTransform::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
		};
		state.sync(data);
		state.fit();
		state
	}

	/// Adopts a new version of the map and lays it out again.
	pub fn sync(&mut self, data: ResultsMapData) {
		self.data = data;
		self.relayout();
	}

	fn relayout(&mut self) {
		match self.data.layout() {
			Ok(layout) => {
				for diagnostic in layout.diagnostics() {
					warn!("{diagnostic}");
				}
				self.edges = edge_geometry(&self.data, &layout);
				self.layout = layout;
			}
			Err(err) => {
				warn!("cannot lay out results map: {err}");
				self.layout = Layout::default();
				self.edges.clear();
			}
		}
	}

	/// Centres the map and scales it to fit the canvas.
	pub fn fit(&mut self) {
		let radius = self.data.map_config.layer_sizes.outermost().max(1.0);
		let k = ((self.width.min(self.height) - 2.0 * MARGIN) / (2.0 * radius)).max(0.05);
		self.transform = ViewTransform {
			x: self.width / 2.0,
			y: self.height / 2.0,
			k,
		};
	}

	pub fn screen_to_map(&self, sx: f64, sy: f64) -> Point {
		Point::new(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn bubble_at_position(&self, sx: f64, sy: f64) -> Option<String> {
		self.layout
			.bubble_at(self.screen_to_map(sx, sy))
			.map(|b| b.id.clone())
	}

	/// Starts dragging the bubble under the cursor, unless it is locked.
	pub fn begin_drag(&mut self, id: String, sx: f64, sy: f64) -> bool {
		let locked = self.data.bubble(&id).is_none_or(|b| b.locked);
		let Some(at) = self.layout.get(&id).map(|b| b.position()) else {
			return false;
		};
		if locked {
			return false;
		}
		self.drag = DragState {
			active: true,
			bubble: Some(id),
			start_x: sx,
			start_y: sy,
			bubble_start: at,
		};
		true
	}

	/// Moves the dragged bubble through the map's own edit operation, so the
	/// region constraint applies while dragging.
	pub fn drag_to(&mut self, sx: f64, sy: f64) {
		let Some(id) = self.drag.bubble.clone() else {
			return;
		};
		let to = Point::new(
			self.drag.bubble_start.x + (sx - self.drag.start_x) / self.transform.k,
			self.drag.bubble_start.y + (sy - self.drag.start_y) / self.transform.k,
		);
		match self.data.move_bubble(&id, to) {
			Ok(_) => self.relayout(),
			Err(err) => warn!("cannot move bubble {id}: {err}"),
		}
	}

	/// Ends a drag; true when the map changed.
	pub fn end_drag(&mut self) -> bool {
		let moved = self.drag.active && self.drag.bubble.is_some();
		self.drag = DragState::default();
		self.pan.active = false;
		moved
	}

	pub fn set_hover(&mut self, bubble: Option<String>) {
		if self.hover.bubble == bubble {
			return;
		}
		self.hover.neighbors.clear();
		if let Some(id) = &bubble {
			for rel in &self.data.relationships {
				if &rel.source == id {
					self.hover.neighbors.insert(rel.target.clone());
				} else if &rel.target == id {
					self.hover.neighbors.insert(rel.source.clone());
				}
			}
		}
		self.hover.bubble = bubble;
	}

	pub fn is_highlighted(&self, id: &str) -> bool {
		self.hover.bubble.as_deref() == Some(id) || self.hover.neighbors.contains(id)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.bubble.is_some()
	}

	pub fn tick(&mut self, dt: f64) {
		let (target, speed) = if self.hover.bubble.is_some() {
			(1.0, 6.0)
		} else {
			(0.0, 4.0)
		};
		self.hover.highlight_t += (target - self.hover.highlight_t) * (speed * dt).min(1.0);
		if self.hover.bubble.is_none() && self.hover.highlight_t < 0.01 {
			self.hover.highlight_t = 0.0;
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.fit();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::map::{LayerType, RelationType};

	fn state() -> ResultsMapState {
		let mut data = ResultsMapData::default();
		data.add_group("G1", 0.0, 2.0).unwrap();
		data.add_bubble("fires are prevented", LayerType::Strategic, "1").unwrap();
		data.add_bubble("less injury", LayerType::Mission, "1").unwrap();
		data.add_relationship("1", "2", RelationType::CauseEffect).unwrap();
		ResultsMapState::new(data, 800.0, 600.0)
	}

	#[test]
	fn test_fit_centres_the_map() {
		let s = state();
		assert_eq!(s.transform.x, 400.0);
		assert_eq!(s.transform.y, 300.0);
		assert!(s.transform.k * 650.0 * 2.0 <= 600.0);
		assert_eq!(s.edges.len(), 1);
	}

	#[test]
	fn test_drag_keeps_bubble_in_region() {
		let mut s = state();
		let at = s.layout.get("1").unwrap().position();
		let (sx, sy) = (s.transform.x + at.x * s.transform.k, s.transform.y + at.y * s.transform.k);
		assert_eq!(s.bubble_at_position(sx, sy).as_deref(), Some("1"));
		assert!(s.begin_drag("1".into(), sx, sy));
		s.drag_to(sx + 5000.0, sy);
		assert!(s.end_drag());
		let moved = s.layout.get("1").unwrap().position();
		let region = s.data.region_for(LayerType::Strategic, "1").unwrap();
		assert!(region.contains(moved));
	}

	#[test]
	fn test_locked_bubbles_do_not_drag() {
		let mut s = state();
		s.data.set_bubble_locked("2", true).unwrap();
		assert!(!s.begin_drag("2".into(), 0.0, 0.0));
		assert!(!s.end_drag());
	}

	#[test]
	fn test_hover_collects_neighbours() {
		let mut s = state();
		s.set_hover(Some("2".into()));
		assert!(s.is_highlighted("1"));
		assert!(s.is_highlighted("2"));
		s.tick(0.1);
		assert!(s.hover.highlight_t > 0.0);
		s.set_hover(None);
		assert!(!s.has_active_highlight());
	}
}
