//! Sizing configuration for graph visuals and interaction.
//!
//! # Coordinate Spaces
//!
//! - **World-space**: The coordinate system of the simulation. Node radii,
//!   arrow lengths, and label fonts are world-space and grow when zoomed in.
//! - **Screen-space**: Pixel coordinates on the canvas. Pointer positions,
//!   click slop, and tooltip offsets are screen-space and ignore zoom.

/// Node glyph sizing (world-space).
#[derive(Clone, Debug)]
pub struct NodeScaleConfig {
	/// Circle radius; also the perimeter edges are clipped to.
	pub radius: f64,
	/// Extra radius for the selected node.
	pub selected_growth: f64,
	/// Outline width.
	pub stroke_width: f64,
	/// Icon side length as a fraction of the diameter.
	pub icon_fraction: f64,
	/// Title font size in world units.
	pub title_size: f64,
	/// Maximum title width before it is squeezed.
	pub title_max_width: f64,
	/// Title baseline offset below the center, as a fraction of the radius.
	pub title_offset: f64,
}

/// Edge glyph sizing (world-space).
#[derive(Clone, Debug)]
pub struct EdgeScaleConfig {
	/// Stroke width for edges without latency data, and the floor for all.
	pub min_thickness: f64,
	/// Length of the arrowhead at the target end.
	pub arrow_length: f64,
	/// Half-width of the arrowhead at its base.
	pub arrow_half_width: f64,
	/// Label font size in world units.
	pub label_size: f64,
	/// Label baseline offset perpendicular to the edge (negative is above).
	pub label_offset: f64,
	/// Approximate glyph advance used for label hit-testing.
	pub label_char_width: f64,
}

/// Pan/zoom limits.
#[derive(Clone, Debug)]
pub struct ZoomConfig {
	/// Smallest zoom factor.
	pub min_scale: f64,
	/// Largest zoom factor.
	pub max_scale: f64,
	/// Scale multiplier per wheel notch.
	pub wheel_step: f64,
}

/// Pointer interaction tuning (screen-space).
#[derive(Clone, Debug)]
pub struct InteractionConfig {
	/// A press released within this many pixels of where it started is a click.
	pub click_slop: f64,
	/// Horizontal offset of a node tooltip from its anchor (7rem at 16px).
	pub tooltip_offset: f64,
}

/// Complete scale configuration for all graph elements.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	/// Node glyphs.
	pub node: NodeScaleConfig,
	/// Edge glyphs.
	pub edge: EdgeScaleConfig,
	/// Pan/zoom limits.
	pub zoom: ZoomConfig,
	/// Pointer handling.
	pub interaction: InteractionConfig,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node: NodeScaleConfig {
				radius: 70.0,
				selected_growth: 5.0,
				stroke_width: 5.0,
				icon_fraction: 0.45,
				title_size: 12.0,
				title_max_width: 110.0,
				title_offset: 0.45,
			},
			edge: EdgeScaleConfig {
				min_thickness: 2.0,
				arrow_length: 10.0,
				arrow_half_width: 6.0,
				label_size: 10.0,
				label_offset: -7.0,
				label_char_width: 5.5,
			},
			zoom: ZoomConfig {
				min_scale: 0.1,
				max_scale: 4.0,
				wheel_step: 1.1,
			},
			interaction: InteractionConfig {
				click_slop: 3.0,
				tooltip_offset: 7.0 * 16.0,
			},
		}
	}
}

impl ScaleConfig {
	/// Canvas font for node titles.
	pub fn title_font(&self) -> String {
		format!("{}px sans-serif", self.node.title_size)
	}

	/// Canvas font for edge labels.
	pub fn label_font(&self) -> String {
		format!("{}px sans-serif", self.edge.label_size)
	}

	/// Approximate rendered width of an edge label, in world units.
	pub fn label_width(&self, text: &str) -> f64 {
		text.chars().count() as f64 * self.edge.label_char_width
	}

	/// Clamp a zoom factor to the configured range.
	pub fn clamp_zoom(&self, k: f64) -> f64 {
		k.clamp(self.zoom.min_scale, self.zoom.max_scale)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zoom_is_clamped_to_range() {
		let config = ScaleConfig::default();
		assert_eq!(config.clamp_zoom(0.01), 0.1);
		assert_eq!(config.clamp_zoom(1.5), 1.5);
		assert_eq!(config.clamp_zoom(12.0), 4.0);
	}

	#[test]
	fn label_width_counts_characters() {
		let config = ScaleConfig::default();
		assert_eq!(config.label_width("10 calls"), 8.0 * 5.5);
		assert_eq!(config.title_font(), "12px sans-serif");
	}
}
