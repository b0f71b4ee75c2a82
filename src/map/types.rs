//! The results map document model.
//!
//! Entities reference each other by string id only. Every struct keeps the
//! fields it does not know about in `extra`, so documents written by newer
//! editors survive a load/save cycle.

use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::geometry::{Band, Point, Sector};

/// Opaque fields carried through untouched.
pub type Extra = Map<String, Value>;

fn default_true() -> bool {
	true
}

fn discard<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
	IgnoredAny::deserialize(deserializer)?;
	Ok(false)
}

/// One of the four radial strata, innermost first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
	Mission,
	Strategic,
	Process,
	Operational,
}

impl LayerType {
	/// Band order, innermost to outermost.
	pub const ALL: [Self; 4] = [Self::Mission, Self::Strategic, Self::Process, Self::Operational];

	pub fn key(self) -> &'static str {
		match self {
			Self::Mission => "mission",
			Self::Strategic => "strategic",
			Self::Process => "process",
			Self::Operational => "operational",
		}
	}

	/// Legend caption.
	pub fn label(self) -> &'static str {
		match self {
			Self::Mission => "Mission",
			Self::Strategic => "Strategic",
			Self::Process => "Process",
			Self::Operational => "Operational",
		}
	}
}

impl fmt::Display for LayerType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.key())
	}
}

/// Which layer, if any, currently defines the group sectors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupLevel {
	#[default]
	#[serde(rename = "None")]
	None,
	Mission,
	Strategic,
	Process,
	Operational,
}

impl GroupLevel {
	pub fn layer(self) -> Option<LayerType> {
		match self {
			Self::None => None,
			Self::Mission => Some(LayerType::Mission),
			Self::Strategic => Some(LayerType::Strategic),
			Self::Process => Some(LayerType::Process),
			Self::Operational => Some(LayerType::Operational),
		}
	}
}

impl From<Option<LayerType>> for GroupLevel {
	fn from(layer: Option<LayerType>) -> Self {
		match layer {
			None => Self::None,
			Some(LayerType::Mission) => Self::Mission,
			Some(LayerType::Strategic) => Self::Strategic,
			Some(LayerType::Process) => Self::Process,
			Some(LayerType::Operational) => Self::Operational,
		}
	}
}

/// Kind of association between two bubbles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationType {
	CauseEffect,
	Companion,
	Conflict,
	LeadLag,
}

impl RelationType {
	pub const ALL: [Self; 4] = [Self::CauseEffect, Self::Companion, Self::Conflict, Self::LeadLag];

	/// Whether the edge is drawn with an arrow head at the target.
	pub fn is_directional(self) -> bool {
		matches!(self, Self::CauseEffect | Self::LeadLag)
	}

	/// Legend caption, also the `type` of the matching legend line.
	pub fn label(self) -> &'static str {
		match self {
			Self::CauseEffect => "Cause-Effect",
			Self::Companion => "Companion",
			Self::Conflict => "Conflict",
			Self::LeadLag => "Lead-Lag",
		}
	}

	/// Parses a legend caption or wire name, ignoring case.
	pub fn from_label(label: &str) -> Option<Self> {
		Self::ALL
			.into_iter()
			.find(|t| t.label().eq_ignore_ascii_case(label))
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerColors {
	pub mission: String,
	pub strategic: String,
	pub process: String,
	pub operational: String,
	#[serde(flatten)]
	pub extra: Extra,
}

impl LayerColors {
	pub fn color(&self, layer: LayerType) -> &str {
		match layer {
			LayerType::Mission => &self.mission,
			LayerType::Strategic => &self.strategic,
			LayerType::Process => &self.process,
			LayerType::Operational => &self.operational,
		}
	}
}

/// Persisted radii of one layer. Geometry works on the [`Band`] it
/// describes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerBand {
	pub outer: f64,
	pub inner: f64,
	#[serde(flatten)]
	pub extra: Extra,
}

impl LayerBand {
	pub fn band(&self) -> Band {
		Band::new(self.inner, self.outer)
	}
}

impl From<Band> for LayerBand {
	fn from(band: Band) -> Self {
		Self {
			outer: band.outer,
			inner: band.inner,
			extra: Extra::new(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerSizes {
	pub mission: LayerBand,
	pub strategic: LayerBand,
	pub process: LayerBand,
	pub operational: LayerBand,
	#[serde(flatten)]
	pub extra: Extra,
}

impl LayerSizes {
	pub fn band(&self, layer: LayerType) -> Band {
		match layer {
			LayerType::Mission => self.mission.band(),
			LayerType::Strategic => self.strategic.band(),
			LayerType::Process => self.process.band(),
			LayerType::Operational => self.operational.band(),
		}
	}

	pub fn outermost(&self) -> f64 {
		self.operational.outer
	}
}

/// Global rendering configuration of a map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
	pub title: String,
	pub title_font_size: f64,
	pub title_color: String,
	pub title_font_weight: String,
	pub layer_colors: LayerColors,
	pub layer_sizes: LayerSizes,
	pub divider_color: String,
	pub divider_width: f64,
	#[serde(flatten)]
	pub extra: Extra,
}

impl MapConfig {
	/// Bands must be non-empty, start at the centre and be contiguous.
	pub fn validate(&self) -> super::Result<()> {
		let mut expected_inner = 0.0;
		for layer in LayerType::ALL {
			let band = self.layer_sizes.band(layer);
			if !band.is_valid() || (band.inner - expected_inner).abs() > super::geometry::EPSILON {
				return Err(super::MapError::InvalidBand {
					layer,
					inner: band.inner,
					outer: band.outer,
				});
			}
			expected_inner = band.outer;
		}
		Ok(())
	}
}

/// Manual placement of a group's caption.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelPosition {
	pub x: f64,
	pub y: f64,
	#[serde(flatten)]
	pub extra: Extra,
}

/// A named angular sector of the map.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
	pub id: String,
	pub name: String,
	pub start_angle: f64,
	pub end_angle: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub label_position: Option<LabelPosition>,
	/// Excluded from automatic re-layout.
	#[serde(default)]
	pub locked: bool,
	#[serde(default = "default_true")]
	pub visible: bool,
	/// Set while the user drags a sector boundary; never persisted. A stray
	/// `isDragging` in a document is read and dropped.
	#[serde(default, skip_serializing, deserialize_with = "discard")]
	pub is_dragging: bool,
	#[serde(flatten)]
	pub extra: Extra,
}

// is_dragging is UI state and takes no part in document equality
impl PartialEq for Group {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
			&& self.name == other.name
			&& self.start_angle == other.start_angle
			&& self.end_angle == other.end_angle
			&& self.label_position == other.label_position
			&& self.locked == other.locked
			&& self.visible == other.visible
			&& self.extra == other.extra
	}
}

impl Group {
	pub fn new(id: impl Into<String>, name: impl Into<String>, start_angle: f64, end_angle: f64) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			start_angle,
			end_angle,
			label_position: None,
			locked: false,
			visible: true,
			is_dragging: false,
			extra: Extra::new(),
		}
	}

	pub fn sector(&self) -> Sector {
		Sector::new(self.start_angle, self.end_angle)
	}
}

/// A statement placed on the map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bubble {
	pub id: String,
	pub text: String,
	pub layer: LayerType,
	/// Empty for bubbles that float in their band.
	#[serde(default)]
	pub group_id: String,
	#[serde(default)]
	pub locked: bool,
	#[serde(default = "default_true")]
	pub visible: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub x: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub y: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rx: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub ry: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub font_size: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub font_color: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub font_weight: Option<String>,
	#[serde(flatten)]
	pub extra: Extra,
}

impl Bubble {
	pub fn new(id: impl Into<String>, text: impl Into<String>, layer: LayerType) -> Self {
		Self {
			id: id.into(),
			text: text.into(),
			layer,
			group_id: String::new(),
			locked: false,
			visible: true,
			x: None,
			y: None,
			rx: None,
			ry: None,
			font_size: None,
			font_color: None,
			font_weight: None,
			extra: Extra::new(),
		}
	}

	pub fn in_group(mut self, group_id: impl Into<String>) -> Self {
		self.group_id = group_id.into();
		self
	}

	pub fn at(mut self, point: Point) -> Self {
		self.set_position(point);
		self
	}

	/// The group id, or `None` when ungrouped.
	pub fn group(&self) -> Option<&str> {
		(!self.group_id.is_empty()).then_some(self.group_id.as_str())
	}

	/// Explicit coordinates, when both are set.
	pub fn position(&self) -> Option<Point> {
		match (self.x, self.y) {
			(Some(x), Some(y)) => Some(Point::new(x, y)),
			_ => None,
		}
	}

	pub fn set_position(&mut self, point: Point) {
		self.x = Some(point.x);
		self.y = Some(point.y);
	}
}

/// A typed edge between two bubbles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
	pub id: String,
	pub source: String,
	pub target: String,
	#[serde(rename = "type")]
	pub kind: RelationType,
	#[serde(flatten)]
	pub extra: Extra,
}

impl Relationship {
	pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>, kind: RelationType) -> Self {
		Self {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			kind,
			extra: Extra::new(),
		}
	}
}

/// Legend exemplar of one layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegendBubble {
	pub cx: f64,
	pub cy: f64,
	pub rx: f64,
	pub ry: f64,
	pub track: LayerType,
	pub text: String,
	#[serde(flatten)]
	pub extra: Extra,
}

/// Legend exemplar of one relationship type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LegendLine {
	pub x: f64,
	pub y: f64,
	pub length: f64,
	pub color: String,
	#[serde(rename = "type")]
	pub kind: String,
	pub text: String,
	#[serde(default = "default_true")]
	pub visible: bool,
	#[serde(flatten)]
	pub extra: Extra,
}

impl LegendLine {
	pub fn relation_type(&self) -> Option<RelationType> {
		RelationType::from_label(&self.kind)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Legends {
	pub legend_bubbles: Vec<LegendBubble>,
	pub legend_lines: Vec<LegendLine>,
	#[serde(flatten)]
	pub extra: Extra,
}

/// The whole map: configuration, bubbles, edges, groups and legend.
///
/// The schema version is a property of the persisted document, not of this
/// value; `schema::serialize` stamps the current one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsMapData {
	pub map_config: MapConfig,
	pub bubbles: Vec<Bubble>,
	pub relationships: Vec<Relationship>,
	pub groups: Vec<Group>,
	pub group_level: GroupLevel,
	pub legends: Legends,
	#[serde(flatten)]
	pub extra: Extra,
}

impl ResultsMapData {
	pub fn bubble(&self, id: &str) -> Option<&Bubble> {
		self.bubbles.iter().find(|b| b.id == id)
	}

	pub fn bubble_mut(&mut self, id: &str) -> Option<&mut Bubble> {
		self.bubbles.iter_mut().find(|b| b.id == id)
	}

	pub fn group(&self, id: &str) -> Option<&Group> {
		self.groups.iter().find(|g| g.id == id)
	}

	pub fn group_mut(&mut self, id: &str) -> Option<&mut Group> {
		self.groups.iter_mut().find(|g| g.id == id)
	}

	pub fn relationship(&self, id: &str) -> Option<&Relationship> {
		self.relationships.iter().find(|r| r.id == id)
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn test_wire_names() {
		assert_eq!(json!(RelationType::CauseEffect), json!("cause-effect"));
		assert_eq!(json!(RelationType::LeadLag), json!("lead-lag"));
		assert_eq!(json!(GroupLevel::None), json!("None"));
		assert_eq!(json!(GroupLevel::Strategic), json!("strategic"));
		assert_eq!(json!(LayerType::Operational), json!("operational"));
	}

	#[test]
	fn test_relation_direction_and_labels() {
		assert!(RelationType::CauseEffect.is_directional());
		assert!(RelationType::LeadLag.is_directional());
		assert!(!RelationType::Companion.is_directional());
		assert!(!RelationType::Conflict.is_directional());
		assert_eq!(RelationType::from_label("lead-lag"), Some(RelationType::LeadLag));
		assert_eq!(RelationType::from_label("Cause-Effect"), Some(RelationType::CauseEffect));
		assert_eq!(RelationType::from_label("other"), None);
	}

	#[test]
	fn test_bubble_defaults_and_unknown_fields() {
		let bubble: Bubble = serde_json::from_value(json!({
			"id": "1",
			"text": "fires are prevented",
			"layer": "strategic",
			"groupId": "",
			"note": {"by": "alice"}
		}))
		.unwrap();
		assert!(!bubble.locked);
		assert!(bubble.visible);
		assert_eq!(bubble.group(), None);
		assert_eq!(bubble.position(), None);
		assert_eq!(bubble.extra.get("note"), Some(&json!({"by": "alice"})));

		let back = serde_json::to_value(&bubble).unwrap();
		assert_eq!(back["note"], json!({"by": "alice"}));
		assert!(back.get("x").is_none());
	}

	#[test]
	fn test_group_equality_ignores_dragging() {
		let a = Group::new("1", "G1", 0.0, 2.0);
		let mut b = a.clone();
		b.is_dragging = true;
		assert_eq!(a, b);
		let value = serde_json::to_value(&b).unwrap();
		assert!(value.get("isDragging").is_none());
	}

	#[test]
	fn test_config_validate_bands() {
		let mut config = ResultsMapData::default().map_config;
		assert!(config.validate().is_ok());
		config.layer_sizes.process.inner = 340.0;
		assert!(matches!(
			config.validate(),
			Err(crate::map::MapError::InvalidBand { layer: LayerType::Process, .. })
		));
	}
}
