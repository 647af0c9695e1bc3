//! Canvas rendering for the traffic graph.
//!
//! This is the only module that touches the canvas. It reads the latest
//! [`Frame`](super::frame::Frame) from the state and draws, in order:
//! 1. Background, or the empty-state message (screen space)
//! 2. Edge lines, arrowheads, and labels (world space)
//! 3. Node circles, icons, and titles (world space)

use std::collections::HashMap;
use std::f64::consts::PI;

use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::frame::EdgeGeometry;
use super::icons::NodeIcon;
use super::state::ForceGraphState;
use super::theme::Theme;
use super::tooltip::Selection;

/// Lazily loaded icon images, keyed by icon.
///
/// Images load asynchronously; a node is drawn without its icon until the
/// image is complete.
#[derive(Default)]
pub struct IconCache {
	images: HashMap<NodeIcon, HtmlImageElement>,
}

impl IconCache {
	fn get(&mut self, icon: NodeIcon) -> Option<&HtmlImageElement> {
		if !self.images.contains_key(&icon) {
			let image = HtmlImageElement::new().ok()?;
			image.set_src(icon.asset_path());
			self.images.insert(icon, image);
		}
		self.images
			.get(&icon)
			.filter(|image| image.complete() && image.natural_width() > 0)
	}
}

/// Renders the complete graph to the canvas.
pub fn render(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	icons: &mut IconCache,
) {
	clear(ctx, theme, state.width, state.height);

	if state.graph.is_empty() {
		draw_empty_state(state, ctx, theme);
		return;
	}

	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);

	for geometry in &state.frame.edges {
		draw_edge(state, ctx, theme, geometry);
	}
	for idx in 0..state.frame.nodes.len() {
		draw_node(state, ctx, theme, icons, idx);
	}

	ctx.restore();
}

/// Fill the canvas with the background color.
pub fn clear(ctx: &CanvasRenderingContext2d, theme: &Theme, width: f64, height: f64) {
	ctx.set_fill_style_str(&theme.background.to_css());
	ctx.fill_rect(0.0, 0.0, width, height);
}

fn draw_empty_state(state: &ForceGraphState, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	ctx.set_fill_style_str(&theme.empty_text.to_css());
	ctx.set_font("16px sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text("Graph is empty", state.width / 2.0, state.height / 2.0);
}

fn draw_edge(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	geometry: &EdgeGeometry,
) {
	let Some(edge) = state.graph.edges.get(geometry.edge) else {
		return;
	};
	let selected = state.selection == Some(Selection::Edge(geometry.edge));
	let stroke = if selected {
		theme.edge.selected_stroke
	} else {
		theme.edge.stroke
	};
	let line = &geometry.line;

	ctx.set_stroke_style_str(&stroke.to_css());
	ctx.set_line_width(geometry.thickness);
	ctx.begin_path();
	ctx.move_to(line.start.x, line.start.y);
	ctx.line_to(line.end.x, line.end.y);
	ctx.stroke();

	// Arrowhead: base centered on `end`, point at `tip`.
	let half = state.scale.edge.arrow_half_width;
	let (px, py) = (-line.uy * half, line.ux * half);
	ctx.set_fill_style_str(&theme.edge.arrow.to_css());
	ctx.begin_path();
	ctx.move_to(line.tip.x, line.tip.y);
	ctx.line_to(line.end.x + px, line.end.y + py);
	ctx.line_to(line.end.x - px, line.end.y - py);
	ctx.close_path();
	ctx.fill();

	ctx.save();
	let _ = ctx.translate(geometry.label_anchor.x, geometry.label_anchor.y);
	let _ = ctx.rotate(geometry.label_angle);
	ctx.set_fill_style_str(&theme.edge.label.to_css());
	ctx.set_font(&state.scale.label_font());
	ctx.set_text_align("center");
	ctx.set_text_baseline("alphabetic");
	let _ = ctx.fill_text(&edge.label(), 0.0, state.scale.edge.label_offset);
	ctx.restore();
}

fn draw_node(
	state: &ForceGraphState,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
	icons: &mut IconCache,
	idx: usize,
) {
	let (Some(node), Some(center)) = (state.graph.nodes.get(idx), state.frame.node(idx)) else {
		return;
	};
	let config = &state.scale.node;
	let radius = state.node_radius(idx);
	let stroke = if state.selection == Some(Selection::Node(idx)) {
		theme.node.selected_stroke
	} else {
		theme.node.stroke
	};

	ctx.begin_path();
	let _ = ctx.arc(center.x, center.y, radius, 0.0, PI * 2.0);
	ctx.set_fill_style_str(&theme.node.fill.to_css());
	ctx.fill();
	ctx.set_stroke_style_str(&stroke.to_css());
	ctx.set_line_width(config.stroke_width);
	ctx.stroke();

	let icon = NodeIcon::for_node(node.protocol.as_deref(), &node.title);
	if let Some(image) = icons.get(icon) {
		let side = radius * 2.0 * config.icon_fraction;
		let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
			image,
			center.x - side / 2.0,
			center.y - side * 0.75,
			side,
			side,
		);
	}

	ctx.set_fill_style_str(&theme.node.title.to_css());
	ctx.set_font(&state.scale.title_font());
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text_with_max_width(
		&node.title,
		center.x,
		center.y + radius * config.title_offset,
		config.title_max_width,
	);
}
