//! Edge geometry in world space: perimeter clipping, arrowhead offset,
//! stroke thickness, and label orientation.

/// Below this center-to-center distance an edge has no usable direction.
pub const MIN_DISTANCE: f64 = 1e-3;

/// A 2-D point in world or screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean distance to `other`.
	pub fn distance(self, other: Point) -> f64 {
		(other.x - self.x).hypot(other.y - self.y)
	}

	/// Point halfway to `other`.
	pub fn midpoint(self, other: Point) -> Point {
		Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
	}

	/// This point shifted by `(dx, dy)`.
	pub fn offset(self, dx: f64, dy: f64) -> Point {
		Point::new(self.x + dx, self.y + dy)
	}
}

/// An edge line clipped to the node circles at both ends.
///
/// The stroke runs `start..end`; the arrowhead runs `end..tip`, with `tip`
/// on the target's perimeter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClippedLine {
	/// Stroke start on the source perimeter.
	pub start: Point,
	/// Stroke end, where the arrowhead begins.
	pub end: Point,
	/// Arrowhead tip on the target perimeter.
	pub tip: Point,
	/// Unit direction from source to target, horizontal part.
	pub ux: f64,
	/// Unit direction from source to target, vertical part.
	pub uy: f64,
}

/// Clip the center-to-center line between two nodes of radius `radius`.
///
/// Returns `None` when the centers (nearly) coincide, since the direction is
/// undefined there.
pub fn clip_to_perimeter(
	source: Point,
	target: Point,
	radius: f64,
	arrow_length: f64,
) -> Option<ClippedLine> {
	let (dx, dy) = (target.x - source.x, target.y - source.y);
	let dist = dx.hypot(dy);
	if !dist.is_finite() || dist < MIN_DISTANCE {
		return None;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let tip = target.offset(-ux * radius, -uy * radius);

	Some(ClippedLine {
		start: source.offset(ux * radius, uy * radius),
		end: tip.offset(-ux * arrow_length, -uy * arrow_length),
		tip,
		ux,
		uy,
	})
}

/// Stroke width for an edge from its average round-trip time (microseconds).
///
/// `ln(avg_rrt) + 1`, floored at `min_thickness`. Missing, zero, negative, or
/// non-finite latencies render at `min_thickness`.
pub fn edge_thickness(avg_rrt: Option<f64>, min_thickness: f64) -> f64 {
	match avg_rrt {
		Some(rrt) if rrt.is_finite() && rrt > 0.0 => (rrt.ln() + 1.0).max(min_thickness),
		_ => min_thickness,
	}
}

/// Rotation (radians) for a label laid along `source -> target`, flipped by
/// half a turn when needed so text never renders upside down.
pub fn label_angle(source: Point, target: Point) -> f64 {
	use std::f64::consts::{FRAC_PI_2, PI};

	let angle = (target.y - source.y).atan2(target.x - source.x);
	if angle > FRAC_PI_2 {
		angle - PI
	} else if angle < -FRAC_PI_2 {
		angle + PI
	} else {
		angle
	}
}
