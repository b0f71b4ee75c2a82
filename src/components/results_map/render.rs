use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::ResultsMapState;
use crate::map::{LayerType, Placement, Point, RelationType};

const BACKGROUND: &str = "#ffffff";
const BUBBLE_FILL: &str = "#ffffff";
const BUBBLE_STROKE: &str = "#555555";
const OVERFLOW_STROKE: &str = "#e65100";
const EDGE_COLOR: &str = "#666666";
const TEXT_COLOR: &str = "#222222";
const LEGEND_ORIGIN: (f64, f64) = (16.0, 72.0);

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

fn dash_pattern(kind: RelationType) -> &'static [f64] {
	match kind {
		RelationType::CauseEffect => &[],
		RelationType::Conflict => &[12.0, 3.0, 3.0, 3.0],
		RelationType::Companion => &[2.0, 4.0],
		RelationType::LeadLag => &[8.0, 4.0],
	}
}

fn set_dash(ctx: &CanvasRenderingContext2d, pattern: &[f64], scale: f64) {
	let segments = js_sys::Array::new();
	for length in pattern {
		segments.push(&JsValue::from_f64(length / scale));
	}
	let _ = ctx.set_line_dash(&segments);
}

/// Splits `text` into lines of at most `max_chars` characters, breaking at
/// spaces. Words longer than a line get a line of their own.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
	let max_chars = max_chars.max(1);
	let mut lines = Vec::new();
	let mut line = String::new();
	for word in text.split_whitespace() {
		let needed = line.chars().count() + word.chars().count() + usize::from(!line.is_empty());
		if !line.is_empty() && needed > max_chars {
			lines.push(std::mem::take(&mut line));
		}
		if !line.is_empty() {
			line.push(' ');
		}
		line.push_str(word);
	}
	if !line.is_empty() {
		lines.push(line);
	}
	lines
}

pub fn render(state: &ResultsMapState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_layers(state, ctx);
	draw_groups(state, ctx);
	draw_edges(state, ctx);
	draw_bubbles(state, ctx);
	ctx.restore();
	draw_title(state, ctx);
	draw_legend(state, ctx);
}

fn draw_layers(state: &ResultsMapState, ctx: &CanvasRenderingContext2d) {
	let config = &state.data.map_config;
	// outermost first, each inner disc paints over the previous one
	for layer in LayerType::ALL.iter().rev() {
		let band = config.layer_sizes.band(*layer);
		ctx.begin_path();
		let _ = ctx.arc(0.0, 0.0, band.outer, 0.0, TAU);
		ctx.set_fill_style_str(config.layer_colors.color(*layer));
		ctx.fill();
	}
	ctx.set_stroke_style_str(&config.divider_color);
	ctx.set_line_width(config.divider_width / state.transform.k);
	for layer in LayerType::ALL {
		ctx.begin_path();
		let _ = ctx.arc(0.0, 0.0, config.layer_sizes.band(layer).outer, 0.0, TAU);
		ctx.stroke();
	}
}

fn draw_groups(state: &ResultsMapState, ctx: &CanvasRenderingContext2d) {
	let config = &state.data.map_config;
	let k = state.transform.k;
	let outer = config.layer_sizes.outermost();
	let inner = state
		.data
		.group_level
		.layer()
		.map_or(0.0, |layer| config.layer_sizes.band(layer).inner);

	ctx.set_stroke_style_str(&config.divider_color);
	ctx.set_line_width(config.divider_width / k);
	ctx.set_font(&format!("bold {}px sans-serif", 14.0 / k.max(0.5)));
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for group in state.data.groups.iter().filter(|g| g.visible) {
		for angle in [group.start_angle, group.end_angle] {
			let (from, to) = (Point::polar(inner, angle), Point::polar(outer, angle));
			ctx.begin_path();
			ctx.move_to(from.x, from.y);
			ctx.line_to(to.x, to.y);
			ctx.stroke();
		}
		let label = match &group.label_position {
			Some(at) => Point::new(at.x, at.y),
			None => Point::polar(outer + 20.0 / k.max(0.5), group.sector().lerp(0.5)),
		};
		ctx.set_fill_style_str(TEXT_COLOR);
		let _ = ctx.fill_text(&group.name, label.x, label.y);
	}
}

fn draw_edges(state: &ResultsMapState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, arrow_size) = (1.5 / k, 10.0 / k);
	let t = ease_out_cubic(state.hover.highlight_t);

	for edge in &state.edges {
		let (dx, dy) = (edge.to.x - edge.from.x, edge.to.y - edge.from.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let source_target = state.data.relationship(&edge.id).map(|r| (r.source.as_str(), r.target.as_str()));
		let is_highlighted =
			source_target.is_some_and(|(s, d)| state.is_highlighted(s) && state.is_highlighted(d));
		let alpha = if is_highlighted { 0.8 + 0.2 * t } else { 0.8 - 0.6 * t };

		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(EDGE_COLOR);
		ctx.set_line_width(line_width);
		set_dash(ctx, dash_pattern(edge.kind), k);

		let (ux, uy) = (dx / dist, dy / dist);
		let shorten = if edge.directional { arrow_size } else { 0.0 };
		ctx.begin_path();
		ctx.move_to(edge.from.x, edge.from.y);
		ctx.line_to(edge.to.x - ux * shorten, edge.to.y - uy * shorten);
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());

		if edge.directional {
			ctx.set_fill_style_str(EDGE_COLOR);
			let (back_x, back_y) = (edge.to.x - ux * arrow_size, edge.to.y - uy * arrow_size);
			let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
			ctx.begin_path();
			ctx.move_to(edge.to.x, edge.to.y);
			ctx.line_to(back_x + px, back_y + py);
			ctx.line_to(back_x - px, back_y - py);
			ctx.close_path();
			ctx.fill();
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_bubbles(state: &ResultsMapState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (has_highlight, t) = (state.has_active_highlight(), ease_out_cubic(state.hover.highlight_t));

	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for placed in state.layout.iter() {
		let Some(bubble) = state.data.bubble(&placed.id) else {
			continue;
		};
		let shape = &placed.shape;
		let highlighted = state.is_highlighted(&placed.id);
		let alpha = if has_highlight && !highlighted { 1.0 - 0.6 * t } else { 1.0 };

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.ellipse(shape.center.x, shape.center.y, shape.rx, shape.ry, 0.0, 0.0, TAU);
		ctx.set_fill_style_str(BUBBLE_FILL);
		ctx.fill();

		if placed.placement == Placement::Overflow {
			ctx.set_stroke_style_str(OVERFLOW_STROKE);
			set_dash(ctx, &[6.0, 3.0], k);
		} else {
			ctx.set_stroke_style_str(BUBBLE_STROKE);
		}
		let emphasis = if state.hover.bubble.as_deref() == Some(placed.id.as_str()) { 1.0 + t } else { 1.0 };
		let width = if bubble.locked { 2.5 } else { 1.5 };
		ctx.set_line_width(width * emphasis / k);
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());

		let font_size = bubble.font_size.unwrap_or(12.0);
		ctx.set_font(&format!(
			"{} {}px sans-serif",
			bubble.font_weight.as_deref().unwrap_or("normal"),
			font_size
		));
		ctx.set_fill_style_str(bubble.font_color.as_deref().unwrap_or(TEXT_COLOR));
		let max_chars = (2.0 * shape.rx * 0.8 / (font_size * 0.55)).floor() as usize;
		let lines = wrap_text(&bubble.text, max_chars);
		let line_height = font_size * 1.15;
		let top = shape.center.y - line_height * (lines.len() as f64 - 1.0) / 2.0;
		for (i, line) in lines.iter().enumerate() {
			let _ = ctx.fill_text(line, shape.center.x, top + line_height * i as f64);
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_title(state: &ResultsMapState, ctx: &CanvasRenderingContext2d) {
	let config = &state.data.map_config;
	ctx.set_font(&format!(
		"{} {}px sans-serif",
		config.title_font_weight, config.title_font_size
	));
	ctx.set_fill_style_str(&config.title_color);
	ctx.set_text_align("center");
	ctx.set_text_baseline("top");
	let _ = ctx.fill_text(&config.title, state.width / 2.0, 16.0);
}

fn draw_legend(state: &ResultsMapState, ctx: &CanvasRenderingContext2d) {
	let (ox, oy) = LEGEND_ORIGIN;
	let legends = &state.data.legends;
	let colors = &state.data.map_config.layer_colors;

	ctx.set_font("12px sans-serif");
	ctx.set_text_baseline("middle");
	for item in &legends.legend_bubbles {
		let (cx, cy) = (ox + item.cx, oy + item.cy);
		ctx.begin_path();
		let _ = ctx.ellipse(cx, cy, item.rx, item.ry, 0.0, 0.0, TAU);
		ctx.set_fill_style_str(colors.color(item.track));
		ctx.fill();
		ctx.set_stroke_style_str(BUBBLE_STROKE);
		ctx.set_line_width(1.0);
		ctx.stroke();
		ctx.set_fill_style_str(TEXT_COLOR);
		ctx.set_text_align("left");
		let _ = ctx.fill_text(&item.text, cx + item.rx + 8.0, cy);
	}

	for line in legends.legend_lines.iter().filter(|l| l.visible) {
		let (x, y) = (ox + line.x, oy + line.y);
		ctx.set_stroke_style_str(&line.color);
		ctx.set_line_width(1.5);
		set_dash(ctx, line.relation_type().map(dash_pattern).unwrap_or_default(), 1.0);
		ctx.begin_path();
		ctx.move_to(x, y);
		ctx.line_to(x + line.length, y);
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());
		if line.relation_type().is_some_and(RelationType::is_directional) {
			ctx.set_fill_style_str(&line.color);
			ctx.begin_path();
			ctx.move_to(x + line.length, y);
			ctx.line_to(x + line.length - 8.0, y - 4.0);
			ctx.line_to(x + line.length - 8.0, y + 4.0);
			ctx.close_path();
			ctx.fill();
		}
		ctx.set_fill_style_str(TEXT_COLOR);
		ctx.set_text_align("left");
		let _ = ctx.fill_text(&line.text, x + line.length + 8.0, y);
	}
}
