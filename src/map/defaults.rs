//! The template a fresh map starts from, and the defaults the schema
//! upgraders fill in for fields older documents lack.

use super::geometry::Band;
use super::types::{
	Extra, GroupLevel, LayerColors, LayerSizes, LayerType, LegendBubble, LegendLine, Legends, MapConfig,
	RelationType, ResultsMapData,
};

pub const TITLE: &str = "Results Map";
pub const TITLE_FONT_SIZE: f64 = 28.0;
pub const TITLE_COLOR: &str = "#333333";
pub const TITLE_FONT_WEIGHT: &str = "bold";
pub const DIVIDER_COLOR: &str = "#ffffff";
pub const DIVIDER_WIDTH: f64 = 2.0;
pub const LEGEND_LINE_COLOR: &str = "#666";

pub fn layer_colors() -> LayerColors {
	LayerColors {
		mission: "#ffcdd2".into(),     // pink
		strategic: "#c8e6c9".into(),   // green
		process: "#bbdefb".into(),     // blue
		operational: "#ffe0b2".into(), // orange
		extra: Extra::new(),
	}
}

pub fn layer_sizes() -> LayerSizes {
	LayerSizes {
		mission: Band::new(0.0, 190.0).into(),
		strategic: Band::new(190.0, 350.0).into(),
		process: Band::new(350.0, 500.0).into(),
		operational: Band::new(500.0, 650.0).into(),
		extra: Extra::new(),
	}
}

pub fn map_config() -> MapConfig {
	MapConfig {
		title: TITLE.into(),
		title_font_size: TITLE_FONT_SIZE,
		title_color: TITLE_COLOR.into(),
		title_font_weight: TITLE_FONT_WEIGHT.into(),
		layer_colors: layer_colors(),
		layer_sizes: layer_sizes(),
		divider_color: DIVIDER_COLOR.into(),
		divider_width: DIVIDER_WIDTH,
		extra: Extra::new(),
	}
}

/// One exemplar per layer, outermost at the bottom.
pub fn legend_bubbles() -> Vec<LegendBubble> {
	LayerType::ALL
		.iter()
		.rev()
		.zip([250.0, 170.0, 90.0, 10.0])
		.map(|(&layer, cy)| LegendBubble {
			cx: 30.0,
			cy,
			rx: 40.0,
			ry: 34.0,
			track: layer,
			text: layer.label().into(),
			extra: Extra::new(),
		})
		.collect()
}

pub fn legend_line(kind: RelationType) -> LegendLine {
	let y = match kind {
		RelationType::CauseEffect => 310.0,
		RelationType::Conflict => 344.0,
		RelationType::Companion => 378.0,
		RelationType::LeadLag => 412.0,
	};
	LegendLine {
		x: 30.0,
		y,
		length: 32.0,
		color: LEGEND_LINE_COLOR.into(),
		kind: kind.label().into(),
		text: kind.label().into(),
		visible: true,
		extra: Extra::new(),
	}
}

pub fn legend_lines() -> Vec<LegendLine> {
	[
		RelationType::CauseEffect,
		RelationType::Conflict,
		RelationType::Companion,
		RelationType::LeadLag,
	]
	.into_iter()
	.map(legend_line)
	.collect()
}

pub fn legends() -> Legends {
	Legends {
		legend_bubbles: legend_bubbles(),
		legend_lines: legend_lines(),
		extra: Extra::new(),
	}
}

impl Default for ResultsMapData {
	fn default() -> Self {
		Self {
			map_config: map_config(),
			bubbles: Vec::new(),
			relationships: Vec::new(),
			groups: Vec::new(),
			group_level: GroupLevel::Strategic,
			legends: legends(),
			extra: Extra::new(),
		}
	}
}
