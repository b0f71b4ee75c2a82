//! The persisted document contract: loading every revision, saving, and the
//! layout and edge guarantees on loaded maps.

use pretty_assertions::assert_eq;
use results_map::map::{
	Band, LayerType, MapError, Placement, RelationType, ResultsMapData, SchemaVersion, deserialize, edge_geometry, serialize,
	validate,
};

const V1: &str = r#"{
	"mapConfig": { "title": "Fire and rescue", "titleFontSize": 24 },
	"bubbles": [
		{ "id": "1", "text": "fires are prevented", "layer": "strategic", "groupId": "1" },
		{ "id": "2", "text": "less injury from fire incidents", "layer": "mission", "groupId": "1" },
		{ "id": "3", "text": "crews arrive at emergencies quickly", "layer": "process", "groupId": "2" }
	],
	"relationships": [
		{ "id": "1", "source": "1", "target": "2", "type": "cause-effect" },
		{ "id": "2", "source": "3", "target": "1", "type": "companion" },
		{ "id": "3", "source": "1", "target": "3", "type": "conflict" }
	],
	"groups": [
		{ "id": "1", "name": "Prevention", "layers": ["strategic"] },
		{ "id": "2", "name": "Response", "layers": ["process"] }
	]
}"#;

const V4: &str = r##"{
	"mapConfig": {
		"title": "Results Map",
		"titleFontSize": 28,
		"layerColors": { "mission": "#ffcdd2", "strategic": "#c8e6c9", "process": "#bbdefb", "operational": "#ffe0b2" }
	},
	"bubbles": [
		{ "id": "1", "text": "pinned", "layer": "strategic", "groupId": "1", "locked": true, "visible": true, "x": 12.5, "y": -900 },
		{ "id": "2", "text": "hidden", "layer": "process", "groupId": "1", "locked": false, "visible": false }
	],
	"relationships": [
		{ "id": "1", "source": "1", "target": "2", "type": "lead-lag" }
	],
	"groups": [
		{ "id": "1", "name": "G1", "startAngle": 0, "endAngle": 2, "locked": false, "visible": true }
	],
	"groupLevel": "strategic",
	"legends": {
		"legendBubbles": [],
		"legendLines": [
			{ "x": 30, "y": 310, "length": 32, "color": "#666", "type": "Cause-Effect", "text": "Cause-Effect", "visible": false }
		]
	}
}"##;

fn kinds(data: &ResultsMapData) -> Vec<RelationType> {
	data.relationships.iter().map(|r| r.kind).collect()
}

#[test]
fn test_v1_document_loads_as_current() {
	let data = deserialize(V1).unwrap();
	assert_eq!(data.map_config.title, "Fire and rescue");
	assert_eq!(data.map_config.title_font_size, 24.0);
	assert_eq!(
		kinds(&data),
		vec![RelationType::CauseEffect, RelationType::Companion, RelationType::Conflict]
	);
	assert_eq!(data.bubbles.len(), 3);
	assert!(data.bubbles.iter().all(|b| b.visible && !b.locked));
	assert_eq!(data.groups.len(), 2);
	assert!(data.groups.iter().all(|g| g.end_angle > g.start_angle));
	assert_eq!(data.map_config.layer_sizes.band(LayerType::Strategic), Band::new(190.0, 350.0));

	// loaded maps are saved in the current revision and load back unchanged
	let saved = serialize(&data).unwrap();
	assert!(saved.contains("\"schemaVersion\": 5"));
	assert_eq!(deserialize(&saved).unwrap(), data);
}

#[test]
fn test_v4_document_keeps_flags() {
	let data = deserialize(V4).unwrap();
	assert!(data.bubbles[0].locked);
	assert!(!data.bubbles[1].visible);
	assert_eq!(kinds(&data), vec![RelationType::LeadLag]);
	assert!(!data.legends.legend_lines[0].visible);
	assert_eq!(data.map_config.divider_width, 2.0);
}

#[test]
fn test_locked_and_hidden_bubbles_on_load() {
	let data = deserialize(V4).unwrap();
	let layout = data.layout().unwrap();
	let pinned = layout.get("1").unwrap();
	assert_eq!(pinned.placement, Placement::Pinned);
	assert_eq!((pinned.position().x, pinned.position().y), (12.5, -900.0));
	assert!(layout.get("2").is_none());
	// the hidden end is not laid out, so the edge is not drawn
	assert!(edge_geometry(&data, &layout).is_empty());
}

#[test]
fn test_future_version_without_current_shape_is_rejected() {
	let text = r#"{ "schemaVersion": 9, "mapConfig": {}, "bubbles": [] }"#;
	let err = deserialize(text).unwrap_err();
	assert!(matches!(err.error, MapError::UnsupportedSchema(_)));
	assert_eq!(err.original, text);
}

#[test]
fn test_future_version_with_current_shape_keeps_its_fields() {
	let saved = serialize(&ResultsMapData::default()).unwrap();
	let mut doc: serde_json::Value = serde_json::from_str(&saved).unwrap();
	doc["schemaVersion"] = 7.into();
	doc["mapConfig"]["layerColors"]["accent"] = "#123456".into();
	doc["mapConfig"]["layerSizes"]["process"]["padding"] = 4.into();

	let data = deserialize(&doc.to_string()).unwrap();
	assert_eq!(data.map_config.layer_colors.extra["accent"], "#123456");
	assert_eq!(data.map_config.layer_sizes.process.extra["padding"], 4);
	assert_eq!(data.map_config.layer_sizes.band(LayerType::Process), Band::new(350.0, 500.0));

	let resaved: serde_json::Value = serde_json::from_str(&serialize(&data).unwrap()).unwrap();
	assert_eq!(resaved["schemaVersion"], 5);
	assert_eq!(resaved["mapConfig"]["layerSizes"]["process"]["padding"], 4);
}

#[test]
fn test_garbage_is_rejected_with_original_text() {
	let err = deserialize("{ not json").unwrap_err();
	assert!(matches!(err.error, MapError::Malformed(_)));
	assert_eq!(err.original, "{ not json");
	assert!(deserialize(r#"{ "hello": "world" }"#).is_err());
}

#[test]
fn test_strategic_bubble_lands_inside_its_band() {
	let mut data = ResultsMapData::default();
	let id = data.add_bubble("fires are prevented", LayerType::Strategic, "").unwrap();
	let layout = data.layout().unwrap();
	let radius = layout.get(&id).unwrap().position().radius();
	assert!(radius > 190.0 && radius < 350.0, "radius {radius}");
}

#[test]
fn test_shared_sector_bubbles_get_different_angles() {
	let mut data = ResultsMapData::default();
	let g1 = data.add_group("G1", 0.0, 1.57).unwrap();
	let a = data.add_bubble("first", LayerType::Process, &g1).unwrap();
	let b = data.add_bubble("second", LayerType::Process, &g1).unwrap();
	let layout = data.layout().unwrap();
	let (pa, pb) = (layout.get(&a).unwrap().position(), layout.get(&b).unwrap().position());
	assert!((pa.angle() - pb.angle()).abs() > 1e-6);
	for p in [pa, pb] {
		assert!(data.region_for(LayerType::Process, &g1).unwrap().contains(p));
	}
	assert_eq!(data.layout().unwrap(), layout);
}

#[test]
fn test_self_and_dangling_edges_are_flagged() {
	let text = r##"{
		"schemaVersion": 5,
		"mapConfig": {
			"title": "t", "titleFontSize": 20, "titleColor": "#000", "titleFontWeight": "bold",
			"layerColors": { "mission": "a", "strategic": "b", "process": "c", "operational": "d" },
			"layerSizes": {
				"mission": { "inner": 0, "outer": 190 },
				"strategic": { "inner": 190, "outer": 350 },
				"process": { "inner": 350, "outer": 500 },
				"operational": { "inner": 500, "outer": 650 }
			},
			"dividerColor": "#fff", "dividerWidth": 2
		},
		"bubbles": [ { "id": "1", "text": "a", "layer": "mission" } ],
		"relationships": [
			{ "id": "1", "source": "1", "target": "1", "type": "conflict" },
			{ "id": "2", "source": "7", "target": "1", "type": "companion" }
		],
		"groups": [],
		"groupLevel": "None",
		"legends": { "legendBubbles": [], "legendLines": [] }
	}"##;
	let data = deserialize(text).unwrap();
	let checked = validate(&data.relationships, &data.bubbles);
	assert!(checked.valid.is_empty());
	assert_eq!(checked.invalid.len(), 2);
	assert!(matches!(checked.invalid[0].reason, MapError::SelfReference { .. }));
	match &checked.invalid[1].reason {
		MapError::DanglingReference { bubble, .. } => assert_eq!(bubble, "7"),
		other => panic!("unexpected {other}"),
	}
	// flagged, never silently dropped
	assert_eq!(data.relationships.len(), 2);
	assert_eq!(SchemaVersion::CURRENT.number(), 5);
}
