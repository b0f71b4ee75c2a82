//! Persisted document format and the upgrade chain between its revisions.
//!
//! A document enters as raw JSON, is tagged with the revision it was written
//! in (declared `schemaVersion`, or inferred from which fields are present),
//! walks the upgrade chain one revision at a time and is finally typed as a
//! [`ResultsMapData`]. Upgraders work on the raw object so fields this crate
//! does not know about ride along untouched.
//!
//! Revisions seen in the wild:
//!
//! | rev | shape |
//! |-----|-------|
//! | 1 | `mapConfig {title, titleFontSize}`, groups listed by `layers`, 3 relation types |
//! | 2 | adds `mapConfig.layerColors` |
//! | 3 | adds `legends`; groups carry `startAngle`/`endAngle` |
//! | 4 | adds `locked`/`visible` on bubbles and groups, `lead-lag`, legend line `visible` |
//! | 5 | adds `mapConfig.layerSizes`, title color/weight, divider style, `schemaVersion` |

use std::f64::consts::TAU;
use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::defaults;
use super::error::{MapError, MigrationError, Result};
use super::geometry::{EPSILON, normalize_angle};
use super::types::{RelationType, ResultsMapData};

const VERSION_KEY: &str = "schemaVersion";

/// A revision of the persisted document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum SchemaVersion {
	V1 = 1,
	V2 = 2,
	V3 = 3,
	V4 = 4,
	V5 = 5,
}

impl SchemaVersion {
	pub const CURRENT: Self = Self::V5;

	pub fn number(self) -> u64 {
		self as u64
	}

	pub fn next(self) -> Option<Self> {
		match self {
			Self::V1 => Some(Self::V2),
			Self::V2 => Some(Self::V3),
			Self::V3 => Some(Self::V4),
			Self::V4 => Some(Self::V5),
			Self::V5 => None,
		}
	}
}

impl TryFrom<u64> for SchemaVersion {
	type Error = MapError;

	fn try_from(n: u64) -> Result<Self> {
		match n {
			1 => Ok(Self::V1),
			2 => Ok(Self::V2),
			3 => Ok(Self::V3),
			4 => Ok(Self::V4),
			5 => Ok(Self::V5),
			_ => Err(MapError::UnsupportedSchema(format!("unknown schema version {n}"))),
		}
	}
}

impl From<SchemaVersion> for u64 {
	fn from(v: SchemaVersion) -> u64 {
		v.number()
	}
}

impl fmt::Display for SchemaVersion {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "v{}", self.number())
	}
}

/// Raw top-level JSON object of a document.
pub type Document = Map<String, Value>;

/// A raw document tagged with the revision it currently conforms to.
#[derive(Clone, Debug, PartialEq)]
pub enum VersionedDocument {
	V1(Document),
	V2(Document),
	V3(Document),
	V4(Document),
	V5(Document),
}

impl VersionedDocument {
	fn tag(version: SchemaVersion, doc: Document) -> Self {
		match version {
			SchemaVersion::V1 => Self::V1(doc),
			SchemaVersion::V2 => Self::V2(doc),
			SchemaVersion::V3 => Self::V3(doc),
			SchemaVersion::V4 => Self::V4(doc),
			SchemaVersion::V5 => Self::V5(doc),
		}
	}

	/// Tags `value` with `declared`, else its own `schemaVersion`, else the
	/// revision whose field signature it matches.
	pub fn detect(value: Value, declared: Option<SchemaVersion>) -> Result<Self> {
		let Value::Object(doc) = value else {
			return Err(MapError::UnsupportedSchema("document is not a JSON object".into()));
		};
		let version = match (declared, doc.get(VERSION_KEY)) {
			(Some(v), _) => v,
			(None, Some(marker)) => match marker.as_u64() {
				Some(n) if n > SchemaVersion::CURRENT.number() => newer(n, &doc)?,
				Some(n) => SchemaVersion::try_from(n)?,
				None => {
					return Err(MapError::UnsupportedSchema(format!(
						"schemaVersion {marker} is not a revision number"
					)));
				}
			},
			(None, None) => infer(&doc)?,
		};
		Ok(Self::tag(version, doc))
	}

	pub fn version(&self) -> SchemaVersion {
		match self {
			Self::V1(_) => SchemaVersion::V1,
			Self::V2(_) => SchemaVersion::V2,
			Self::V3(_) => SchemaVersion::V3,
			Self::V4(_) => SchemaVersion::V4,
			Self::V5(_) => SchemaVersion::V5,
		}
	}

	pub fn into_inner(self) -> Document {
		match self {
			Self::V1(d) | Self::V2(d) | Self::V3(d) | Self::V4(d) | Self::V5(d) => d,
		}
	}

	/// Runs exactly one upgrade step; the current revision is returned as is.
	pub fn upgrade(self) -> Result<Self> {
		let next = match self {
			Self::V1(d) => Self::V2(v1_to_v2(d)?),
			Self::V2(d) => Self::V3(v2_to_v3(d)?),
			Self::V3(d) => Self::V4(v3_to_v4(d)?),
			Self::V4(d) => Self::V5(v4_to_v5(d)?),
			current @ Self::V5(_) => return Ok(current),
		};
		debug!("upgraded document to schema {}", next.version());
		Ok(next.stamped())
	}

	fn stamped(mut self) -> Self {
		let version = self.version();
		match &mut self {
			Self::V1(d) | Self::V2(d) | Self::V3(d) | Self::V4(d) | Self::V5(d) => {
				d.insert(VERSION_KEY.into(), json!(version.number()));
			}
		}
		self
	}

	/// Upgrades all the way to [`SchemaVersion::CURRENT`].
	pub fn into_current(self) -> Result<Self> {
		let mut doc = self;
		while doc.version() < SchemaVersion::CURRENT {
			doc = doc.upgrade()?;
		}
		Ok(doc)
	}
}

/// A document from a newer editor loads when it still has the current
/// shape; what this crate does not know stays in the opaque fields.
fn newer(declared: u64, doc: &Document) -> Result<SchemaVersion> {
	let inferred = infer(doc)?;
	if inferred != SchemaVersion::CURRENT {
		return Err(MapError::UnsupportedSchema(format!(
			"schema version {declared} is newer than {} and the document does not have its shape",
			SchemaVersion::CURRENT
		)));
	}
	warn!("document declares schema version {declared}, reading it as {inferred}");
	Ok(inferred)
}

/// The earliest revision whose additions the document still lacks. Every
/// upgrader only fills in what is missing, so a document that mixes
/// revisions starts the chain early and keeps everything it has.
fn infer(doc: &Document) -> Result<SchemaVersion> {
	let Some(config) = doc.get("mapConfig").and_then(Value::as_object) else {
		return Err(MapError::UnsupportedSchema("no mapConfig object".into()));
	};
	if !doc.get("bubbles").is_some_and(Value::is_array) {
		return Err(MapError::UnsupportedSchema("no bubbles array".into()));
	}
	let has_all = |obj: &Document, keys: &[&str]| keys.iter().all(|k| obj.contains_key(*k));
	let has_any = |key: &str, fields: &[&str]| {
		items(doc, key).any(|item| fields.iter().any(|f| item.contains_key(*f)))
	};
	let has_lead_lag = items(doc, "relationships").any(|r| r.get("type").and_then(Value::as_str) == Some("lead-lag"));
	let has_line_visibility = doc
		.get("legends")
		.and_then(Value::as_object)
		.is_some_and(|legends| items(legends, "legendLines").any(|l| l.contains_key("visible")));

	let version = if !config.contains_key("layerColors") || !has_all(doc, &["relationships", "groups"]) {
		SchemaVersion::V1
	} else if !has_all(doc, &["legends", "groupLevel"]) {
		SchemaVersion::V2
	} else if has_all(
		config,
		&["layerSizes", "titleColor", "titleFontWeight", "dividerColor", "dividerWidth"],
	) {
		SchemaVersion::V5
	} else if has_any("bubbles", &["locked", "visible"])
		|| has_any("groups", &["locked", "visible"])
		|| has_lead_lag
		|| has_line_visibility
	{
		SchemaVersion::V4
	} else {
		SchemaVersion::V3
	};
	debug!("inferred schema {version} from document fields");
	Ok(version)
}

fn items<'a>(doc: &'a Document, key: &str) -> impl Iterator<Item = &'a Document> {
	doc.get(key)
		.and_then(Value::as_array)
		.into_iter()
		.flatten()
		.filter_map(Value::as_object)
}

fn items_mut<'a>(doc: &'a mut Document, key: &str) -> impl Iterator<Item = &'a mut Document> {
	doc.get_mut(key)
		.and_then(Value::as_array_mut)
		.into_iter()
		.flatten()
		.filter_map(Value::as_object_mut)
}

fn map_config_mut(doc: &mut Document) -> Result<&mut Document> {
	doc.get_mut("mapConfig")
		.and_then(Value::as_object_mut)
		.ok_or_else(|| MapError::UnsupportedSchema("no mapConfig object".into()))
}

fn fill(obj: &mut Document, key: &str, value: Value) {
	obj.entry(key).or_insert(value);
}

/// Adds layer colors; makes the optional collections explicit.
fn v1_to_v2(mut doc: Document) -> Result<Document> {
	fill(map_config_mut(&mut doc)?, "layerColors", serde_json::to_value(defaults::layer_colors())?);
	fill(&mut doc, "relationships", json!([]));
	fill(&mut doc, "groups", json!([]));
	Ok(doc)
}

/// Adds the legend and the grouping level. Groups still described by
/// `layers` get their sectors when the document is normalized.
fn v2_to_v3(mut doc: Document) -> Result<Document> {
	if !doc.contains_key("legends") {
		let lines = [RelationType::CauseEffect, RelationType::Conflict, RelationType::Companion]
			.into_iter()
			.map(|kind| -> Result<Value> {
				let mut line = serde_json::to_value(defaults::legend_line(kind))?;
				if let Some(obj) = line.as_object_mut() {
					obj.remove("visible");
				}
				Ok(line)
			})
			.collect::<Result<Vec<_>>>()?;
		doc.insert(
			"legends".into(),
			json!({
				"legendBubbles": serde_json::to_value(defaults::legend_bubbles())?,
				"legendLines": lines,
			}),
		);
	}
	fill(&mut doc, "groupLevel", json!("None"));
	Ok(doc)
}

/// Gives every group a complete sector, whatever revision it came from.
///
/// A group with one stored angle keeps it; the missing side gets an even
/// share of the circle, cut short at the nearest other stored boundary.
/// Groups with no angles at all split the arc no other group covers, in
/// document order. Their `layers` list stays on the group.
fn assign_sectors(doc: &mut Document) -> Result<()> {
	let total = items(doc, "groups").count();
	if total == 0 {
		return Ok(());
	}
	let share = TAU / total as f64;
	let boundaries: Vec<f64> = items(doc, "groups")
		.flat_map(|g| [angle(g, "startAngle"), angle(g, "endAngle")])
		.flatten()
		.collect();
	for group in items_mut(doc, "groups") {
		match (angle(group, "startAngle"), angle(group, "endAngle")) {
			(Some(start), None) => {
				let end = boundaries
					.iter()
					.map(|&b| start + normalize_angle(b - start))
					.filter(|&b| b > start + EPSILON)
					.fold(start + share, f64::min);
				group.insert("endAngle".into(), json!(end));
			}
			(None, Some(end)) => {
				let start = boundaries
					.iter()
					.map(|&b| end - normalize_angle(end - b))
					.filter(|&b| b < end - EPSILON)
					.fold(end - share, f64::max);
				group.insert("startAngle".into(), json!(start));
			}
			_ => {}
		}
	}

	let angled: Vec<(f64, f64)> = items(doc, "groups")
		.filter_map(|g| Some((angle(g, "startAngle")?, angle(g, "endAngle")?)))
		.collect();
	let pending = total - angled.len();
	if pending == 0 {
		return Ok(());
	}
	let (free_start, free_end) = if angled.is_empty() {
		(0.0, TAU)
	} else {
		let first = angled.iter().map(|a| a.0).fold(f64::INFINITY, f64::min);
		let last = angled.iter().map(|a| a.1).fold(f64::NEG_INFINITY, f64::max);
		(last, first + TAU)
	};
	let width = (free_end - free_start) / pending as f64;
	if width.is_nan() || width <= EPSILON {
		return Err(MapError::UnsupportedSchema(format!(
			"no free arc left for {pending} group(s) without angles"
		)));
	}
	let unplaced = items_mut(doc, "groups").filter(|g| angle(g, "startAngle").is_none());
	for (i, group) in unplaced.enumerate() {
		let start = free_start + width * i as f64;
		group.insert("startAngle".into(), json!(start));
		group.insert("endAngle".into(), json!(start + width));
	}
	Ok(())
}

fn angle(group: &Document, key: &str) -> Option<f64> {
	group.get(key).and_then(Value::as_f64)
}

/// Adds lock and visibility flags and the lead-lag legend entry. Existing
/// relationships keep their types.
fn v3_to_v4(mut doc: Document) -> Result<Document> {
	for key in ["bubbles", "groups"] {
		for item in items_mut(&mut doc, key) {
			fill(item, "locked", json!(false));
			fill(item, "visible", json!(true));
		}
	}
	if let Some(legends) = doc.get_mut("legends").and_then(Value::as_object_mut) {
		for line in items_mut(legends, "legendLines") {
			fill(line, "visible", json!(true));
		}
		let has_lead_lag = items(legends, "legendLines").any(|l| {
			l.get("type")
				.and_then(Value::as_str)
				.and_then(RelationType::from_label)
				== Some(RelationType::LeadLag)
		});
		if !has_lead_lag {
			let line = serde_json::to_value(defaults::legend_line(RelationType::LeadLag))?;
			if let Some(lines) = legends.get_mut("legendLines").and_then(Value::as_array_mut) {
				lines.push(line);
			}
		}
	}
	Ok(doc)
}

/// Adds layer sizes, title styling and divider styling.
fn v4_to_v5(mut doc: Document) -> Result<Document> {
	let config = map_config_mut(&mut doc)?;
	fill(config, "layerSizes", serde_json::to_value(defaults::layer_sizes())?);
	fill(config, "titleColor", json!(defaults::TITLE_COLOR));
	fill(config, "titleFontWeight", json!(defaults::TITLE_FONT_WEIGHT));
	fill(config, "dividerColor", json!(defaults::DIVIDER_COLOR));
	fill(config, "dividerWidth", json!(defaults::DIVIDER_WIDTH));
	Ok(doc)
}

/// Brings a document of any known revision to the current model.
pub fn normalize(document: Value, declared: Option<SchemaVersion>) -> Result<ResultsMapData> {
	let tagged = VersionedDocument::detect(document, declared)?;
	let from = tagged.version();
	let mut doc = tagged.into_current()?.into_inner();
	doc.remove(VERSION_KEY);
	assign_sectors(&mut doc)?;
	if from != SchemaVersion::CURRENT {
		info!("migrated results map from schema {from} to {}", SchemaVersion::CURRENT);
	}
	Ok(serde_json::from_value(Value::Object(doc))?)
}

#[derive(Serialize)]
struct Envelope<'a> {
	#[serde(rename = "schemaVersion")]
	schema_version: SchemaVersion,
	#[serde(flatten)]
	data: &'a ResultsMapData,
}

/// Writes `data` as a current-revision document.
pub fn serialize(data: &ResultsMapData) -> Result<String> {
	let text = serde_json::to_string_pretty(&Envelope {
		schema_version: SchemaVersion::CURRENT,
		data,
	})?;
	Ok(text)
}

/// Parses and migrates a document. On failure the input text is handed
/// back inside the error.
pub fn deserialize(text: &str) -> std::result::Result<ResultsMapData, MigrationError> {
	let fail = |error: MapError| MigrationError {
		error,
		original: text.to_string(),
	};
	let value: Value = serde_json::from_str(text).map_err(|e| fail(e.into()))?;
	let data = normalize(value, None).map_err(fail)?;
	info!(
		"loaded results map {:?}: {} bubble(s), {} relationship(s), {} group(s)",
		data.map_config.title,
		data.bubbles.len(),
		data.relationships.len(),
		data.groups.len()
	);
	Ok(data)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn v1() -> Value {
		json!({
			"mapConfig": { "title": "Fire service", "titleFontSize": 24 },
			"bubbles": [
				{ "id": "1", "text": "fires are prevented", "layer": "strategic", "groupId": "1" },
				{ "id": "2", "text": "less injury", "layer": "mission", "groupId": "" }
			],
			"relationships": [
				{ "id": "1", "source": "1", "target": "2", "type": "cause-effect" },
				{ "id": "2", "source": "2", "target": "1", "type": "conflict" }
			],
			"groups": [
				{ "id": "1", "name": "G1", "layers": ["strategic"] },
				{ "id": "2", "name": "G2", "layers": ["strategic", "process"] }
			]
		})
	}

	#[test]
	fn test_infers_each_revision() {
		let mut doc = v1();
		let detect = |d: &Value| VersionedDocument::detect(d.clone(), None).unwrap().version();
		assert_eq!(detect(&doc), SchemaVersion::V1);
		doc["mapConfig"]["layerColors"] = serde_json::to_value(defaults::layer_colors()).unwrap();
		assert_eq!(detect(&doc), SchemaVersion::V2);
		doc["legends"] = json!({ "legendBubbles": [], "legendLines": [] });
		assert_eq!(detect(&doc), SchemaVersion::V2);
		doc["groupLevel"] = json!("None");
		assert_eq!(detect(&doc), SchemaVersion::V3);
		doc["bubbles"][0]["locked"] = json!(true);
		assert_eq!(detect(&doc), SchemaVersion::V4);
		doc["mapConfig"]["layerSizes"] = serde_json::to_value(defaults::layer_sizes()).unwrap();
		assert_eq!(detect(&doc), SchemaVersion::V4);
		doc["mapConfig"]["titleColor"] = json!("#000");
		doc["mapConfig"]["titleFontWeight"] = json!("bold");
		doc["mapConfig"]["dividerColor"] = json!("#fff");
		doc["mapConfig"]["dividerWidth"] = json!(1);
		assert_eq!(detect(&doc), SchemaVersion::V5);

		// later additions without the earlier ones start the chain early
		let mut mixed = v1();
		mixed["groups"][0]["startAngle"] = json!(0.5);
		mixed["mapConfig"]["layerSizes"] = serde_json::to_value(defaults::layer_sizes()).unwrap();
		assert_eq!(detect(&mixed), SchemaVersion::V1);
	}

	#[test]
	fn test_declared_version_wins() {
		let mut doc = v1();
		doc["schemaVersion"] = json!(3);
		assert_eq!(VersionedDocument::detect(doc.clone(), None).unwrap().version(), SchemaVersion::V3);
		assert_eq!(
			VersionedDocument::detect(doc, Some(SchemaVersion::V2)).unwrap().version(),
			SchemaVersion::V2
		);
	}

	#[test]
	fn test_unrecognized_documents_are_rejected() {
		let unsupported = |v: Value| matches!(normalize(v, None), Err(MapError::UnsupportedSchema(_)));
		assert!(unsupported(json!([1, 2, 3])));
		assert!(unsupported(json!({ "bubbles": [] })));
		assert!(unsupported(json!({ "mapConfig": {}, "nodes": [] })));
		let mut future = v1();
		future["schemaVersion"] = json!(9);
		assert!(unsupported(future));
		let mut garbled = v1();
		garbled["schemaVersion"] = json!("five");
		assert!(unsupported(garbled));
	}

	#[test]
	fn test_each_step_stamps_its_revision() {
		let mut doc = VersionedDocument::detect(v1(), None).unwrap();
		for expected in [SchemaVersion::V2, SchemaVersion::V3, SchemaVersion::V4, SchemaVersion::V5] {
			doc = doc.upgrade().unwrap();
			assert_eq!(doc.version(), expected);
			let inner = doc.clone().into_inner();
			assert_eq!(inner[VERSION_KEY], json!(expected.number()));
		}
		assert_eq!(doc.clone().upgrade().unwrap(), doc);
	}

	#[test]
	fn test_v1_migrates_without_loss() {
		let data = normalize(v1(), None).unwrap();
		assert_eq!(data.map_config.title, "Fire service");
		assert_eq!(data.map_config.title_font_size, 24.0);
		assert_eq!(data.map_config.layer_colors, defaults::layer_colors());
		assert_eq!(data.map_config.layer_sizes, defaults::layer_sizes());
		let kinds: Vec<RelationType> = data.relationships.iter().map(|r| r.kind).collect();
		assert_eq!(kinds, vec![RelationType::CauseEffect, RelationType::Conflict]);
		assert!(data.bubbles.iter().all(|b| !b.locked && b.visible));
		assert_eq!(data.bubbles[0].group_id, "1");

		// groups listed by layers split the circle and keep their layer list
		assert_eq!(data.groups[0].start_angle, 0.0);
		assert!((data.groups[0].end_angle - std::f64::consts::PI).abs() < 1e-12);
		assert!((data.groups[1].end_angle - TAU).abs() < 1e-12);
		assert_eq!(data.groups[1].extra["layers"], json!(["strategic", "process"]));
		assert!(crate::map::geometry::validate_sectors(&data.groups).is_ok());

		// the legend grows to four lines, three from v3 plus lead-lag in v4
		let lines: Vec<&str> = data.legends.legend_lines.iter().map(|l| l.kind.as_str()).collect();
		assert_eq!(lines, vec!["Cause-Effect", "Conflict", "Companion", "Lead-Lag"]);
		assert_eq!(data.legends.legend_bubbles.len(), 4);
		assert_eq!(data.group_level, crate::map::GroupLevel::None);
	}

	#[test]
	fn test_groups_without_angles_fill_the_free_arc() {
		let mut doc = v1();
		doc["groups"] = json!([
			{ "id": "a", "name": "A", "startAngle": 0.0, "endAngle": 3.0 },
			{ "id": "b", "name": "B", "layers": ["process"] },
			{ "id": "c", "name": "C", "layers": ["process"] }
		]);
		let data = normalize(doc, None).unwrap();
		let b = &data.groups[1];
		let c = &data.groups[2];
		assert_eq!(b.start_angle, 3.0);
		assert!((c.end_angle - TAU).abs() < 1e-12);
		assert!((b.end_angle - c.start_angle).abs() < 1e-12);

		let mut full = v1();
		full["groups"] = json!([
			{ "id": "a", "name": "A", "startAngle": 0.0, "endAngle": TAU },
			{ "id": "b", "name": "B", "layers": ["process"] }
		]);
		assert!(matches!(normalize(full, None), Err(MapError::UnsupportedSchema(_))));
	}

	#[test]
	fn test_unknown_fields_survive_migration_and_round_trip() {
		let mut doc = v1();
		doc["author"] = json!("planning office");
		doc["bubbles"][0]["comment"] = json!("check wording");
		doc["mapConfig"]["background"] = json!("#fafafa");
		let data = normalize(doc, None).unwrap();
		assert_eq!(data.extra["author"], json!("planning office"));
		assert_eq!(data.bubbles[0].extra["comment"], json!("check wording"));
		assert_eq!(data.map_config.extra["background"], json!("#fafafa"));
		assert!(!data.extra.contains_key(VERSION_KEY));

		let text = serialize(&data).unwrap();
		assert_eq!(deserialize(&text).unwrap(), data);
	}

	#[test]
	fn test_serialize_stamps_current_version() {
		let text = serialize(&ResultsMapData::default()).unwrap();
		let value: Value = serde_json::from_str(&text).unwrap();
		assert_eq!(value[VERSION_KEY], json!(5));
		assert_eq!(value["groupLevel"], json!("strategic"));
		assert_eq!(value["mapConfig"]["layerSizes"]["strategic"], json!({ "outer": 350.0, "inner": 190.0 }));
	}

	#[test]
	fn test_failed_load_keeps_original_text() {
		for text in ["{ not json", r#"{"mapConfig": 3, "bubbles": []}"#, r#"{"schemaVersion": 5, "bubbles": []}"#] {
			let err = deserialize(text).unwrap_err();
			assert_eq!(err.original, text);
		}
		let err = deserialize("{ not json").unwrap_err();
		assert!(matches!(err.error, MapError::Malformed(_)));
	}

	#[test]
	fn test_current_shape_groups_without_angles_load() {
		// shaped like a map saved by the editor before layer sizes existed
		let doc = json!({
			"mapConfig": {
				"title": "Results Map",
				"titleFontSize": 28,
				"layerColors": serde_json::to_value(defaults::layer_colors()).unwrap()
			},
			"bubbles": [],
			"relationships": [],
			"groups": [{ "id": "1", "name": "G1" }],
			"groupLevel": "strategic",
			"legends": serde_json::to_value(defaults::legends()).unwrap()
		});
		assert_eq!(VersionedDocument::detect(doc.clone(), None).unwrap().version(), SchemaVersion::V4);
		let data = normalize(doc, None).unwrap();
		assert_eq!(data.groups[0].start_angle, 0.0);
		assert!((data.groups[0].end_angle - TAU).abs() < 1e-12);
		assert_eq!(data.group_level, crate::map::GroupLevel::Strategic);
	}

	#[test]
	fn test_a_single_stored_angle_is_kept() {
		let mut doc = v1();
		doc["groups"] = json!([
			{ "id": "a", "name": "A", "startAngle": 1.0 },
			{ "id": "b", "name": "B", "startAngle": 4.0, "endAngle": 5.0 },
			{ "id": "c", "name": "C", "endAngle": 6.0 }
		]);
		let data = normalize(doc, None).unwrap();
		let sectors: Vec<(f64, f64)> = data.groups.iter().map(|g| (g.start_angle, g.end_angle)).collect();
		// an even third of the circle, short of the next boundary at 4.0
		assert_eq!(sectors[0].0, 1.0);
		assert!((sectors[0].1 - (1.0 + TAU / 3.0)).abs() < 1e-12);
		assert_eq!(sectors[1], (4.0, 5.0));
		// cut short at the end of B
		assert_eq!(sectors[2], (5.0, 6.0));
		assert!(crate::map::geometry::validate_sectors(&data.groups).is_ok());
	}

	#[test]
	fn test_newer_revision_with_current_shape_loads() {
		let mut doc: Value = serde_json::from_str(&serialize(&ResultsMapData::default()).unwrap()).unwrap();
		doc[VERSION_KEY] = json!(6);
		doc["newThing"] = json!(true);
		let data = normalize(doc, None).unwrap();
		assert_eq!(data.extra["newThing"], json!(true));
		assert!(!data.extra.contains_key(VERSION_KEY));
		assert_eq!(data.map_config, defaults::map_config());
	}

	#[test]
	fn test_nested_unknown_fields_round_trip() {
		let mut doc: Value = serde_json::from_str(&serialize(&ResultsMapData::default()).unwrap()).unwrap();
		doc["mapConfig"]["layerColors"]["accent"] = json!("#123456");
		doc["mapConfig"]["layerSizes"]["mission"]["padding"] = json!(4);
		doc["mapConfig"]["layerSizes"]["ring"] = json!("thin");
		doc["groups"] = json!([{
			"id": "1", "name": "G1", "startAngle": 0.0, "endAngle": 2.0,
			"labelPosition": { "x": 10.0, "y": 20.0, "anchor": "start" }
		}]);
		let data = deserialize(&doc.to_string()).unwrap();
		let saved: Value = serde_json::from_str(&serialize(&data).unwrap()).unwrap();
		assert_eq!(saved["mapConfig"]["layerColors"]["accent"], json!("#123456"));
		assert_eq!(saved["mapConfig"]["layerSizes"]["mission"]["padding"], json!(4));
		assert_eq!(saved["mapConfig"]["layerSizes"]["ring"], json!("thin"));
		assert_eq!(saved["groups"][0]["labelPosition"]["anchor"], json!("start"));
		assert_eq!(deserialize(&saved.to_string()).unwrap(), data);
	}

	#[test]
	fn test_drag_flag_is_not_persisted() {
		let mut doc: Value = serde_json::from_str(&serialize(&ResultsMapData::default()).unwrap()).unwrap();
		doc["groups"] = json!([{ "id": "1", "name": "G1", "startAngle": 0.0, "endAngle": 2.0, "isDragging": true }]);
		let data = normalize(doc, None).unwrap();
		assert!(!data.groups[0].is_dragging);
		assert!(!data.groups[0].extra.contains_key("isDragging"));
		let saved: Value = serde_json::from_str(&serialize(&data).unwrap()).unwrap();
		assert!(saved["groups"][0].get("isDragging").is_none());
	}
}
