//! Graph simulation state and interaction tracking.
//!
//! Pairs the canonical [`Graph`] with its [`Simulation`], the latest
//! [`Frame`], and the pointer state for pan/zoom, node dragging, and
//! click selection. All pointer coordinates are canvas screen pixels.

use url::Url;

use super::frame::{Frame, compute_frame};
use super::geometry::Point;
use super::scale::ScaleConfig;
use super::simulation::{Simulation, SimulationConfig};
use super::tooltip::{Selection, Tooltip};
use crate::graph::Graph;

/// Pan and zoom transform applied to the entire graph view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal pan, in screen pixels.
	pub x: f64,
	/// Vertical pan, in screen pixels.
	pub y: f64,
	/// Zoom factor (1.0 = 100%).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// Map a canvas pixel to simulation coordinates.
	pub fn screen_to_world(&self, p: Point) -> Point {
		Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
	}

	/// Map simulation coordinates to a canvas pixel.
	pub fn world_to_screen(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}
}

/// Tracks an in-progress node drag. The node stays pinned until release.
#[derive(Clone, Debug)]
pub struct DragState {
	/// Index of the dragged node.
	pub node: usize,
	/// Screen position of the press.
	pub start: Point,
	/// World offset from the pointer to the node center at grab time.
	grab_offset: Point,
	/// Whether the pointer left the click slop.
	pub moved: bool,
}

/// Tracks an in-progress canvas pan.
#[derive(Clone, Debug)]
pub struct PanState {
	/// Screen position of the press.
	pub start: Point,
	transform_start: ViewTransform,
	/// Edge whose label was under the pointer at press time.
	pub edge_label: Option<usize>,
	/// Whether the pointer left the click slop.
	pub moved: bool,
}

/// Current pointer gesture.
#[derive(Clone, Debug, Default)]
pub enum Gesture {
	/// No button held.
	#[default]
	Idle,
	/// Dragging a node.
	Drag(DragState),
	/// Panning the canvas.
	Pan(PanState),
}

/// Core graph state combining the layout with interaction tracking.
///
/// Created once per loaded graph, then mutated each frame by the animation
/// loop and by pointer events.
pub struct ForceGraphState {
	/// Graph being shown.
	pub graph: Graph,
	/// Layout driving node positions.
	pub simulation: Simulation,
	/// Geometry of the latest tick.
	pub frame: Frame,
	/// Sizing configuration.
	pub scale: ScaleConfig,
	/// Current pan and zoom.
	pub transform: ViewTransform,
	/// Gesture in progress.
	pub gesture: Gesture,
	/// Selected node or edge, if any.
	pub selection: Option<Selection>,
	/// Screen position the detail tooltip is anchored at.
	tooltip_anchor: Point,
	/// Canvas width in pixels.
	pub width: f64,
	/// Canvas height in pixels.
	pub height: f64,
}

impl ForceGraphState {
	/// Lay out `graph` on a `width` x `height` canvas.
	pub fn new(
		graph: Graph,
		width: f64,
		height: f64,
		config: SimulationConfig,
		scale: ScaleConfig,
	) -> Self {
		let simulation = Simulation::new(&graph, Point::new(width / 2.0, height / 2.0), config);
		let frame = compute_frame(&simulation, &graph, &scale);
		Self {
			graph,
			simulation,
			frame,
			scale,
			transform: ViewTransform::default(),
			gesture: Gesture::Idle,
			selection: None,
			tooltip_anchor: Point::default(),
			width,
			height,
		}
	}

	/// Advance the layout one step and refresh the frame. Returns `false`
	/// once the layout is at rest and nothing changed.
	pub fn tick(&mut self) -> bool {
		if self.simulation.is_settled() {
			return false;
		}
		self.simulation.tick();
		self.frame = compute_frame(&self.simulation, &self.graph, &self.scale);
		self.follow_dragged_node();
		true
	}

	/// Whether a node is being dragged.
	pub fn is_dragging(&self) -> bool {
		matches!(self.gesture, Gesture::Drag(_))
	}

	/// Radius a node is drawn and hit-tested at.
	pub fn node_radius(&self, idx: usize) -> f64 {
		if self.selection == Some(Selection::Node(idx)) {
			self.scale.node.radius + self.scale.node.selected_growth
		} else {
			self.scale.node.radius
		}
	}

	/// Topmost node under a screen position.
	pub fn node_at_position(&self, screen: Point) -> Option<usize> {
		let world = self.transform.screen_to_world(screen);
		self.frame
			.nodes
			.iter()
			.enumerate()
			.rev()
			.find(|(idx, center)| center.distance(world) <= self.node_radius(*idx))
			.map(|(idx, _)| idx)
	}

	/// Edge whose label box contains a screen position.
	pub fn edge_label_at_position(&self, screen: Point) -> Option<usize> {
		let world = self.transform.screen_to_world(screen);
		let edge_scale = &self.scale.edge;
		self.frame.edges.iter().rev().find_map(|g| {
			let label = self.graph.edges.get(g.edge)?.label();
			let half_width = self.scale.label_width(&label) / 2.0;
			// Into the label's rotated frame, origin at the anchor.
			let (dx, dy) = (world.x - g.label_anchor.x, world.y - g.label_anchor.y);
			let (sin, cos) = g.label_angle.sin_cos();
			let lx = dx * cos + dy * sin;
			let ly = -dx * sin + dy * cos;
			let top = edge_scale.label_offset - edge_scale.label_size;
			let bottom = edge_scale.label_offset + edge_scale.label_size * 0.25;
			(lx.abs() <= half_width && (top..=bottom).contains(&ly)).then_some(g.edge)
		})
	}

	/// Press: grab a node (pinning it and reheating the layout) or start a pan.
	pub fn pointer_down(&mut self, screen: Point) {
		if let Some(node) = self.node_at_position(screen) {
			let Some(center) = self.frame.node(node) else {
				return;
			};
			let world = self.transform.screen_to_world(screen);
			self.simulation.pin(node, center);
			self.simulation.reheat();
			self.gesture = Gesture::Drag(DragState {
				node,
				start: screen,
				grab_offset: Point::new(center.x - world.x, center.y - world.y),
				moved: false,
			});
		} else {
			self.gesture = Gesture::Pan(PanState {
				start: screen,
				transform_start: self.transform,
				edge_label: self.edge_label_at_position(screen),
				moved: false,
			});
		}
	}

	/// Move: update the pinned position or the pan offset.
	pub fn pointer_move(&mut self, screen: Point) {
		let slop = self.scale.interaction.click_slop;
		match &mut self.gesture {
			Gesture::Idle => {}
			Gesture::Drag(drag) => {
				drag.moved |= drag.start.distance(screen) > slop;
				let world = self.transform.screen_to_world(screen);
				let target = world.offset(drag.grab_offset.x, drag.grab_offset.y);
				let node = drag.node;
				self.simulation.pin(node, target);
			}
			Gesture::Pan(pan) => {
				pan.moved |= pan.start.distance(screen) > slop;
				self.transform.x = pan.transform_start.x + (screen.x - pan.start.x);
				self.transform.y = pan.transform_start.y + (screen.y - pan.start.y);
			}
		}
	}

	/// Release: unpin a dragged node and resolve clicks. Returns `true` when
	/// the press counted as a click and the selection was updated.
	pub fn pointer_up(&mut self, screen: Point) -> bool {
		match std::mem::take(&mut self.gesture) {
			Gesture::Idle => false,
			Gesture::Drag(drag) => {
				self.simulation.unpin(drag.node);
				self.simulation.release_heat();
				if drag.moved {
					return false;
				}
				self.selection = Some(Selection::Node(drag.node));
				self.tooltip_anchor = screen.offset(self.scale.interaction.tooltip_offset, 0.0);
				true
			}
			Gesture::Pan(pan) => {
				if pan.moved {
					return false;
				}
				self.selection = pan.edge_label.map(Selection::Edge);
				self.tooltip_anchor = screen;
				true
			}
		}
	}

	/// Pointer left the canvas: end the gesture without a click.
	pub fn pointer_cancel(&mut self) {
		if let Gesture::Drag(drag) = std::mem::take(&mut self.gesture) {
			self.simulation.unpin(drag.node);
			self.simulation.release_heat();
		}
	}

	/// Zoom by one wheel notch around a screen position. Negative `delta_y`
	/// zooms in.
	pub fn zoom_at(&mut self, screen: Point, delta_y: f64) {
		let step = self.scale.zoom.wheel_step;
		let factor = if delta_y > 0.0 { 1.0 / step } else { step };
		let new_k = self.scale.clamp_zoom(self.transform.k * factor);
		let ratio = new_k / self.transform.k;
		self.transform.x = screen.x - (screen.x - self.transform.x) * ratio;
		self.transform.y = screen.y - (screen.y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Deselect, closing the tooltip.
	pub fn clear_selection(&mut self) {
		self.selection = None;
	}

	/// Tooltip for the current selection, if it still refers to something.
	pub fn tooltip(&self, page: Option<&Url>) -> Option<Tooltip> {
		let selection = self.selection?;
		Tooltip::for_selection(&self.graph, selection, self.tooltip_anchor, page)
	}

	/// Follow a canvas resize, recentering the layout.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.simulation
			.set_center(Point::new(width / 2.0, height / 2.0));
	}

	fn follow_dragged_node(&mut self) {
		let Gesture::Drag(drag) = &self.gesture else {
			return;
		};
		if self.selection != Some(Selection::Node(drag.node)) {
			return;
		}
		if let Some(center) = self.frame.node(drag.node) {
			self.tooltip_anchor = self
				.transform
				.world_to_screen(center)
				.offset(self.scale.interaction.tooltip_offset, 0.0);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Edge, GraphKind, Node};

	fn pair() -> Graph {
		let node = |id: &str| Node {
			id: id.into(),
			title: id.into(),
			service: Some(format!("{id}-svc")),
			..Default::default()
		};
		Graph {
			kind: GraphKind::Service,
			nodes: vec![node("a"), node("b")],
			edges: vec![Edge {
				id: "ab".into(),
				source: "a".into(),
				target: "b".into(),
				num_requests: Some(10.0),
				avg_rrt: Some(500.0),
			}],
		}
	}

	fn settled() -> ForceGraphState {
		let mut state = ForceGraphState::new(
			pair(),
			800.0,
			600.0,
			SimulationConfig::default(),
			ScaleConfig::default(),
		);
		while state.tick() {}
		state
	}

	#[test]
	fn transform_round_trips_points() {
		let t = ViewTransform {
			x: 40.0,
			y: -10.0,
			k: 2.0,
		};
		let p = Point::new(13.0, 7.5);
		assert_eq!(t.screen_to_world(t.world_to_screen(p)), p);
	}

	#[test]
	fn tick_stops_once_settled() {
		let mut state = settled();
		assert!(state.simulation.is_settled());
		assert!(!state.tick());
	}

	#[test]
	fn hit_testing_respects_radius() {
		let state = settled();
		let a = state.frame.nodes[0];
		assert_eq!(state.node_at_position(a.offset(69.0, 0.0)), Some(0));
		let away = Point::new(a.x - 200.0, a.y - 200.0);
		assert_eq!(state.node_at_position(away), None);
	}

	#[test]
	fn click_on_node_selects_it() {
		let mut state = settled();
		let a = state.frame.nodes[0];
		state.pointer_down(a);
		assert!(state.simulation.nodes()[0].is_pinned());
		assert!(state.pointer_up(a.offset(1.0, 1.0)));
		assert_eq!(state.selection, Some(Selection::Node(0)));
		assert!(!state.simulation.nodes()[0].is_pinned());

		let tip = state.tooltip(None).unwrap();
		assert_eq!(tip.anchor, a.offset(1.0, 1.0).offset(112.0, 0.0));
		assert_eq!(tip.entries[0].value, "a");
		assert_eq!(state.node_radius(0), 75.0);
	}

	#[test]
	fn dragging_pins_then_releases() {
		let mut state = settled();
		let a = state.frame.nodes[0];
		state.pointer_down(a);
		assert!(state.is_dragging());
		let target = a.offset(50.0, 20.0);
		state.pointer_move(target);
		assert!(state.tick(), "drag reheats the layout");
		assert_eq!(state.frame.nodes[0], target);
		assert_eq!(state.simulation.nodes()[0].fx, Some(target.x));

		assert!(!state.pointer_up(target), "a drag is not a click");
		assert_eq!(state.selection, None);
		assert!(!state.simulation.nodes()[0].is_pinned());
		for _ in 0..400 {
			state.tick();
		}
		assert!(state.simulation.is_settled());
	}

	#[test]
	fn tooltip_follows_the_selected_node_while_dragged() {
		let mut state = settled();
		state.transform = ViewTransform {
			x: 40.0,
			y: -25.0,
			k: 2.0,
		};
		let a = state.transform.world_to_screen(state.frame.nodes[0]);
		state.pointer_down(a);
		assert!(state.pointer_up(a));
		assert_eq!(state.selection, Some(Selection::Node(0)));

		state.pointer_down(a);
		state.pointer_move(a.offset(50.0, 20.0));
		assert!(state.tick());
		let expected = state
			.transform
			.world_to_screen(state.frame.nodes[0])
			.offset(112.0, 0.0);
		assert_ne!(expected, a.offset(112.0, 0.0));
		assert_eq!(state.tooltip(None).unwrap().anchor, expected);

		assert!(!state.pointer_up(a.offset(50.0, 20.0)));
		assert_eq!(state.selection, Some(Selection::Node(0)));
		assert_eq!(state.tooltip(None).unwrap().anchor, expected);
	}

	#[test]
	fn dragging_another_node_leaves_the_tooltip_in_place() {
		let mut state = settled();
		let a = state.frame.nodes[0];
		state.pointer_down(a);
		assert!(state.pointer_up(a));
		let anchor = state.tooltip(None).unwrap().anchor;
		assert_eq!(anchor, a.offset(112.0, 0.0));

		let b = state.frame.nodes[1];
		state.pointer_down(b);
		assert!(state.is_dragging());
		state.pointer_move(b.offset(-40.0, 30.0));
		assert!(state.tick());
		assert_eq!(state.frame.nodes[1], b.offset(-40.0, 30.0));
		assert_eq!(state.tooltip(None).unwrap().anchor, anchor);

		assert!(!state.pointer_up(b.offset(-40.0, 30.0)));
		assert_eq!(state.selection, Some(Selection::Node(0)));
		assert_eq!(state.tooltip(None).unwrap().anchor, anchor);
	}

	#[test]
	fn clicking_background_clears_and_panning_moves_view() {
		let mut state = settled();
		state.selection = Some(Selection::Node(1));
		let empty = Point::new(-500.0, -500.0);
		state.pointer_down(empty);
		assert!(state.pointer_up(empty));
		assert_eq!(state.selection, None);

		state.pointer_down(empty);
		state.pointer_move(empty.offset(30.0, -12.0));
		assert!(!state.pointer_up(empty.offset(30.0, -12.0)));
		assert_eq!((state.transform.x, state.transform.y), (30.0, -12.0));
	}

	#[test]
	fn clicking_edge_label_selects_edge() {
		let mut state = settled();
		let g = state.frame.edges[0].clone();
		let (sin, cos) = g.label_angle.sin_cos();
		// Just above the label baseline, in the rotated label frame.
		let (lx, ly) = (0.0, ScaleConfig::default().edge.label_offset - 3.0);
		let at = Point::new(
			g.label_anchor.x + lx * cos - ly * sin,
			g.label_anchor.y + lx * sin + ly * cos,
		);
		assert_eq!(state.edge_label_at_position(at), Some(0));
		state.pointer_down(at);
		assert!(state.pointer_up(at));
		assert_eq!(state.selection, Some(Selection::Edge(0)));
		assert_eq!(state.tooltip(None).unwrap().entries[0].label, "Calls");
	}

	#[test]
	fn zoom_is_bounded_and_keeps_pointer_fixed() {
		let mut state = settled();
		let pointer = Point::new(200.0, 150.0);
		let before = state.transform.screen_to_world(pointer);
		state.zoom_at(pointer, -1.0);
		let after = state.transform.screen_to_world(pointer);
		assert!((before.x - after.x).abs() < 1e-9 && (before.y - after.y).abs() < 1e-9);

		for _ in 0..100 {
			state.zoom_at(pointer, -1.0);
		}
		assert_eq!(state.transform.k, 4.0);
		for _ in 0..200 {
			state.zoom_at(pointer, 1.0);
		}
		assert_eq!(state.transform.k, 0.1);
	}

	#[test]
	fn cancel_releases_pin_without_selecting() {
		let mut state = settled();
		let b = state.frame.nodes[1];
		state.pointer_down(b);
		state.pointer_cancel();
		assert!(!state.is_dragging());
		assert!(!state.simulation.nodes()[1].is_pinned());
		assert_eq!(state.selection, None);
	}
}
