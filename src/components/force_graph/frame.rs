//! Per-tick scene geometry, computed from simulation state without touching
//! the canvas.
//!
//! A [`Frame`] is what the renderer draws: node centers and, for every
//! drawable edge, its perimeter-clipped line, arrowhead, stroke width, and
//! label placement.

use super::geometry::{self, Point};
use super::scale::ScaleConfig;
use super::simulation::Simulation;
use crate::graph::Graph;

/// Placement of one edge in world space.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeGeometry {
	/// Index into `graph.edges`.
	pub edge: usize,
	/// Index of the source node.
	pub source: usize,
	/// Index of the target node.
	pub target: usize,
	/// Stroke and arrowhead endpoints, clipped to the node circles.
	pub line: geometry::ClippedLine,
	/// Stroke width in world units.
	pub thickness: f64,
	/// Midpoint between the two node centers.
	pub label_anchor: Point,
	/// Upright rotation of the label, in radians.
	pub label_angle: f64,
}

/// Everything the renderer needs for one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
	/// Node centers, aligned with `graph.nodes`.
	pub nodes: Vec<Point>,
	/// Drawable edges. Self-loops and edges between coincident nodes are
	/// left out until their endpoints separate.
	pub edges: Vec<EdgeGeometry>,
}

impl Frame {
	/// Center of node `idx`.
	pub fn node(&self, idx: usize) -> Option<Point> {
		self.nodes.get(idx).copied()
	}

	/// Geometry of edge `edge`, if it is drawable this tick.
	pub fn edge(&self, edge: usize) -> Option<&EdgeGeometry> {
		self.edges.iter().find(|g| g.edge == edge)
	}
}

/// Snapshot the simulation into render geometry.
pub fn compute_frame(sim: &Simulation, graph: &Graph, scale: &ScaleConfig) -> Frame {
	let nodes: Vec<Point> = sim.nodes().iter().map(|n| n.position()).collect();

	let edges = graph
		.edges
		.iter()
		.enumerate()
		.filter_map(|(idx, edge)| {
			let (source, target) = sim.endpoints(idx)?;
			let (s, t) = (nodes[source], nodes[target]);
			let line = geometry::clip_to_perimeter(
				s,
				t,
				scale.node.radius,
				scale.edge.arrow_length,
			)?;
			Some(EdgeGeometry {
				edge: idx,
				source,
				target,
				line,
				thickness: geometry::edge_thickness(edge.avg_rrt, scale.edge.min_thickness),
				label_anchor: s.midpoint(t),
				label_angle: geometry::label_angle(s, t),
			})
		})
		.collect();

	Frame { nodes, edges }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::simulation::SimulationConfig;
	use crate::graph::{Edge, GraphKind, Node};

	fn sample() -> Graph {
		let node = |id: &str| Node {
			id: id.into(),
			title: id.into(),
			..Default::default()
		};
		Graph {
			kind: GraphKind::Api,
			nodes: vec![node("a"), node("b")],
			edges: vec![
				Edge {
					id: "ab".into(),
					source: "a".into(),
					target: "b".into(),
					num_requests: Some(3.0),
					avg_rrt: Some(500.0),
				},
				Edge {
					id: "aa".into(),
					source: "a".into(),
					target: "a".into(),
					..Default::default()
				},
			],
		}
	}

	#[test]
	fn frame_clips_edges_after_layout() {
		let graph = sample();
		let scale = ScaleConfig::default();
		let mut sim = Simulation::new(&graph, Point::default(), SimulationConfig::default());
		while !sim.is_settled() {
			sim.tick();
		}
		let frame = compute_frame(&sim, &graph, &scale);

		assert_eq!(frame.nodes.len(), 2);
		assert_eq!(frame.edges.len(), 1, "self-loop is not drawable");
		let g = frame.edge(0).unwrap();
		let (a, b) = (frame.nodes[0], frame.nodes[1]);
		assert!((g.line.start.distance(a) - 70.0).abs() < 1e-9);
		assert!((g.line.tip.distance(b) - 70.0).abs() < 1e-9);
		assert!((g.line.end.distance(b) - 80.0).abs() < 1e-9);
		assert_eq!(g.thickness, 500f64.ln() + 1.0);
		assert_eq!(g.label_anchor, a.midpoint(b));
	}

	#[test]
	fn frame_matches_live_positions() {
		let graph = sample();
		let scale = ScaleConfig::default();
		let mut sim = Simulation::new(&graph, Point::new(50.0, 50.0), SimulationConfig::default());
		for _ in 0..3 {
			sim.tick();
			let frame = compute_frame(&sim, &graph, &scale);
			assert_eq!(frame.node(0), sim.position(0));
			assert_eq!(frame.node(1), sim.position(1));
		}
	}
}
