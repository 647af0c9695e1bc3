//! Visual theming for the traffic graph.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
	/// Opacity in [0, 1].
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Same color with a different opacity.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// CSS color string: hex when opaque, `rgba(..)` otherwise.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Node glyph colors.
#[derive(Clone, Debug)]
pub struct NodeStyle {
	/// Circle fill.
	pub fill: Color,
	/// Circle outline.
	pub stroke: Color,
	/// Stroke of the currently selected node.
	pub selected_stroke: Color,
	/// Title text.
	pub title: Color,
}

/// Edge glyph colors.
#[derive(Clone, Debug)]
pub struct EdgeStyle {
	/// Line stroke.
	pub stroke: Color,
	/// Arrowhead fill.
	pub arrow: Color,
	/// Label text.
	pub label: Color,
	/// Stroke of the currently selected edge.
	pub selected_stroke: Color,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Canvas background.
	pub background: Color,
	/// Node colors.
	pub node: NodeStyle,
	/// Edge colors.
	pub edge: EdgeStyle,
	/// Color of the empty-state message.
	pub empty_text: Color,
}

impl Default for Theme {
	fn default() -> Self {
		Self::dark()
	}
}

impl Theme {
	/// Dark slate theme.
	pub fn dark() -> Self {
		let gray_600 = Color::rgb(75, 85, 99);
		let gray_200 = Color::rgb(229, 231, 235);
		Self {
			background: Color::rgb(17, 24, 39),
			node: NodeStyle {
				fill: Color::rgb(31, 41, 55),
				stroke: gray_600,
				selected_stroke: Color::rgb(96, 165, 250),
				title: gray_200,
			},
			edge: EdgeStyle {
				stroke: gray_600.with_alpha(0.7),
				arrow: gray_600,
				label: gray_200,
				selected_stroke: Color::rgb(96, 165, 250).with_alpha(0.9),
			},
			empty_text: Color::rgb(156, 163, 175),
		}
	}
}
