//! Force-directed layout simulation.
//!
//! A [`Simulation`] owns the transient layout state for one [`Graph`]:
//! position, velocity, and pin overrides for every node, links resolved to
//! node indices, and the cooling parameter `alpha`. It has no scheduling of
//! its own; the caller drives it with [`Simulation::tick`] until
//! [`Simulation::is_settled`] reports that the layout has cooled down.
//!
//! Each tick applies, in order:
//! 1. link springs pulling each edge's endpoints toward `link_distance`
//! 2. pairwise charge repulsion with inverse-square falloff
//! 3. a centering translation toward the viewport center
//! 4. collision separation keeping node circles from overlapping
//!
//! then integrates velocities with friction. Forces scale with `alpha`
//! (except collision, which is a hard constraint), and `alpha` decays
//! geometrically toward `alpha_target`.

use std::collections::HashMap;
use std::f64::consts::PI;

use log::{debug, warn};

use super::geometry::Point;
use crate::graph::Graph;

/// Physical constants for the layout.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
	/// Rest length of edge springs, in world units.
	pub link_distance: f64,
	/// Many-body strength; negative values repel.
	pub charge_strength: f64,
	/// Collision radius of every node.
	pub collide_radius: f64,
	/// Fraction of the centroid offset removed each tick.
	pub center_strength: f64,
	/// Initial `alpha`, and the level a reheat restores.
	pub alpha_start: f64,
	/// The simulation idles once `alpha` falls below this.
	pub alpha_min: f64,
	/// Per-tick fraction of the gap between `alpha` and its target closed.
	pub alpha_decay: f64,
	/// `alpha` target while a node is being dragged.
	pub drag_alpha_target: f64,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
	/// Floor on pairwise distance in the charge force.
	pub min_distance: f64,
	/// Spacing of the initial phyllotaxis placement.
	pub initial_spacing: f64,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		let alpha_min: f64 = 0.001;
		Self {
			link_distance: 300.0,
			charge_strength: -3000.0,
			collide_radius: 70.0,
			center_strength: 1.0,
			alpha_start: 1.0,
			alpha_min,
			// Cools from 1.0 to alpha_min in ~300 ticks.
			alpha_decay: 1.0 - alpha_min.powf(1.0 / 300.0),
			drag_alpha_target: 0.3,
			velocity_decay: 0.4,
			min_distance: 1.0,
			initial_spacing: 10.0,
		}
	}
}

/// Layout state of a single node. `fx`/`fy` override the simulated position
/// while the node is pinned.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeState {
	/// Horizontal position.
	pub x: f64,
	/// Vertical position.
	pub y: f64,
	/// Horizontal velocity.
	pub vx: f64,
	/// Vertical velocity.
	pub vy: f64,
	/// Pinned horizontal position.
	pub fx: Option<f64>,
	/// Pinned vertical position.
	pub fy: Option<f64>,
}

impl NodeState {
	/// Current position.
	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}

	/// Whether the node is pinned on either axis.
	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

/// An edge spring between two resolved node indices.
#[derive(Clone, Debug)]
struct Link {
	source: usize,
	target: usize,
	strength: f64,
	/// Share of the correction applied to the target.
	bias: f64,
}

/// Deterministic generator used to separate exactly coincident nodes.
#[derive(Clone, Debug)]
struct Jiggle(u64);

impl Jiggle {
	fn next(&mut self) -> f64 {
		const M: u64 = 1 << 32;
		self.0 = (1_664_525 * self.0 + 1_013_904_223) % M;
		(self.0 as f64 / M as f64 - 0.5) * 1e-6
	}
}

/// Explicit simulation context for one graph.
pub struct Simulation {
	config: SimulationConfig,
	nodes: Vec<NodeState>,
	index: HashMap<String, usize>,
	/// Resolved `(source, target)` per graph edge, aligned with `graph.edges`.
	endpoints: Vec<Option<(usize, usize)>>,
	links: Vec<Link>,
	center: Point,
	alpha: f64,
	alpha_target: f64,
	ticks: u64,
	jiggle: Jiggle,
}

impl Simulation {
	/// Build a simulation for `graph`, resolving edge endpoints to node
	/// indices once. Nodes start free, spread on a phyllotaxis spiral around
	/// `center`.
	pub fn new(graph: &Graph, center: Point, config: SimulationConfig) -> Self {
		let index: HashMap<String, usize> = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();

		let golden_angle = PI * (3.0 - 5f64.sqrt());
		let nodes = (0..graph.nodes.len())
			.map(|i| {
				let radius = config.initial_spacing * (0.5 + i as f64).sqrt();
				let angle = i as f64 * golden_angle;
				NodeState {
					x: center.x + radius * angle.cos(),
					y: center.y + radius * angle.sin(),
					..Default::default()
				}
			})
			.collect();

		let endpoints: Vec<Option<(usize, usize)>> = graph
			.edges
			.iter()
			.map(|edge| {
				let resolved = index
					.get(&edge.source)
					.copied()
					.zip(index.get(&edge.target).copied());
				if resolved.is_none() {
					warn!("edge {} has an unknown endpoint, leaving it out of the layout", edge.id);
				}
				resolved
			})
			.collect();

		let mut degree = vec![0usize; graph.nodes.len()];
		for &(s, t) in endpoints.iter().flatten().filter(|(s, t)| s != t) {
			degree[s] += 1;
			degree[t] += 1;
		}
		let links = endpoints
			.iter()
			.flatten()
			.filter(|(s, t)| s != t)
			.map(|&(source, target)| {
				let (ds, dt) = (degree[source] as f64, degree[target] as f64);
				Link {
					source,
					target,
					strength: 1.0 / ds.min(dt),
					bias: ds / (ds + dt),
				}
			})
			.collect();

		Self {
			alpha: config.alpha_start,
			alpha_target: 0.0,
			config,
			nodes,
			index,
			endpoints,
			links,
			center,
			ticks: 0,
			jiggle: Jiggle(1),
		}
	}

	/// Force parameters.
	pub fn config(&self) -> &SimulationConfig {
		&self.config
	}

	/// Current cooling level.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Ticks run so far.
	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	/// True once the layout has cooled below `alpha_min` and nothing is
	/// holding it warm.
	pub fn is_settled(&self) -> bool {
		self.alpha < self.config.alpha_min && self.alpha_target < self.config.alpha_min
	}

	/// Per-node state, aligned with `graph.nodes`.
	pub fn nodes(&self) -> &[NodeState] {
		&self.nodes
	}

	/// Index of the node with id `id`.
	pub fn node_index(&self, id: &str) -> Option<usize> {
		self.index.get(id).copied()
	}

	/// Position of node `idx`.
	pub fn position(&self, idx: usize) -> Option<Point> {
		self.nodes.get(idx).map(NodeState::position)
	}

	/// Resolved endpoints of the graph edge at `edge_idx`.
	pub fn endpoints(&self, edge_idx: usize) -> Option<(usize, usize)> {
		self.endpoints.get(edge_idx).copied().flatten()
	}

	/// Move the centering target, e.g. after a viewport resize.
	pub fn set_center(&mut self, center: Point) {
		self.center = center;
	}

	/// Keep the layout warm (dragging). `alpha` climbs toward the drag target.
	pub fn reheat(&mut self) {
		self.alpha_target = self.config.drag_alpha_target;
	}

	/// Let the layout cool back down to rest.
	pub fn release_heat(&mut self) {
		self.alpha_target = 0.0;
	}

	/// Fix a node at `pos`; forces no longer move it.
	pub fn pin(&mut self, idx: usize, pos: Point) -> bool {
		let Some(node) = self.nodes.get_mut(idx) else {
			return false;
		};
		node.fx = Some(pos.x);
		node.fy = Some(pos.y);
		true
	}

	/// Hand a node back to the forces. Its velocity is kept.
	pub fn unpin(&mut self, idx: usize) -> bool {
		let Some(node) = self.nodes.get_mut(idx) else {
			return false;
		};
		node.fx = None;
		node.fy = None;
		true
	}

	/// Advance the layout by one step.
	pub fn tick(&mut self) {
		let was_settled = self.is_settled();
		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		self.ticks += 1;

		self.apply_links();
		self.apply_charge();
		self.apply_center();
		self.apply_collision();

		let friction = 1.0 - self.config.velocity_decay;
		for node in &mut self.nodes {
			match node.fx {
				Some(fx) => {
					node.x = fx;
					node.vx = 0.0;
				}
				None => {
					node.vx *= friction;
					node.x += node.vx;
				}
			}
			match node.fy {
				Some(fy) => {
					node.y = fy;
					node.vy = 0.0;
				}
				None => {
					node.vy *= friction;
					node.y += node.vy;
				}
			}
		}

		if !was_settled && self.is_settled() {
			debug!("layout settled after {} ticks", self.ticks);
		}
	}

	fn apply_links(&mut self) {
		let alpha = self.alpha;
		for link in &self.links {
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = self.jiggle.next();
			}
			if y == 0.0 {
				y = self.jiggle.next();
			}
			let len = x.hypot(y).max(f64::MIN_POSITIVE);
			let k = (len - self.config.link_distance) / len * alpha * link.strength;
			let (x, y) = (x * k, y * k);

			let t = &mut self.nodes[link.target];
			t.vx -= x * link.bias;
			t.vy -= y * link.bias;
			let s = &mut self.nodes[link.source];
			s.vx += x * (1.0 - link.bias);
			s.vy += y * (1.0 - link.bias);
		}
	}

	fn apply_charge(&mut self) {
		let strength = self.config.charge_strength * self.alpha;
		if strength == 0.0 {
			return;
		}
		let min_d2 = self.config.min_distance * self.config.min_distance;
		let n = self.nodes.len();
		for i in 0..n {
			let (mut dvx, mut dvy) = (0.0, 0.0);
			for j in 0..n {
				if i == j {
					continue;
				}
				let mut x = self.nodes[j].x - self.nodes[i].x;
				let mut y = self.nodes[j].y - self.nodes[i].y;
				if x == 0.0 {
					x = self.jiggle.next();
				}
				if y == 0.0 {
					y = self.jiggle.next();
				}
				let w = strength / (x * x + y * y).max(min_d2);
				dvx += x * w;
				dvy += y * w;
			}
			self.nodes[i].vx += dvx;
			self.nodes[i].vy += dvy;
		}
	}

	fn apply_center(&mut self) {
		if self.nodes.is_empty() {
			return;
		}
		let n = self.nodes.len() as f64;
		let (sx, sy) = self
			.nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let shift_x = (sx / n - self.center.x) * self.config.center_strength;
		let shift_y = (sy / n - self.center.y) * self.config.center_strength;
		for node in &mut self.nodes {
			node.x -= shift_x;
			node.y -= shift_y;
		}
	}

	fn apply_collision(&mut self) {
		let reach = 2.0 * self.config.collide_radius;
		let reach2 = reach * reach;
		let n = self.nodes.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let (a, b) = (&self.nodes[i], &self.nodes[j]);
				let mut x = a.x + a.vx - b.x - b.vx;
				let mut y = a.y + a.vy - b.y - b.vy;
				let mut len2 = x * x + y * y;
				if len2 >= reach2 {
					continue;
				}
				if x == 0.0 {
					x = self.jiggle.next();
					len2 += x * x;
				}
				if y == 0.0 {
					y = self.jiggle.next();
					len2 += y * y;
				}
				let len = len2.sqrt().max(f64::MIN_POSITIVE);
				let k = (reach - len) / len;
				let (x, y) = (x * k * 0.5, y * k * 0.5);
				self.nodes[i].vx += x;
				self.nodes[i].vy += y;
				self.nodes[j].vx -= x;
				self.nodes[j].vy -= y;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{Edge, GraphKind, Node};

	fn graph(ids: &[&str], edges: &[(&str, &str)]) -> Graph {
		Graph {
			kind: GraphKind::Service,
			nodes: ids
				.iter()
				.map(|id| Node {
					id: id.to_string(),
					title: id.to_uppercase(),
					..Default::default()
				})
				.collect(),
			edges: edges
				.iter()
				.enumerate()
				.map(|(i, (s, t))| Edge {
					id: format!("e{}", i),
					source: s.to_string(),
					target: t.to_string(),
					..Default::default()
				})
				.collect(),
		}
	}

	fn run_until_settled(sim: &mut Simulation) {
		for _ in 0..2000 {
			if sim.is_settled() {
				return;
			}
			sim.tick();
		}
		panic!("simulation did not settle");
	}

	fn distance(sim: &Simulation, a: usize, b: usize) -> f64 {
		sim.position(a).unwrap().distance(sim.position(b).unwrap())
	}

	#[test]
	fn alpha_decreases_every_tick_until_settled() {
		let g = graph(&["a", "b"], &[("a", "b")]);
		let mut sim = Simulation::new(&g, Point::new(400.0, 300.0), SimulationConfig::default());
		let mut last = sim.alpha();
		while !sim.is_settled() {
			sim.tick();
			assert!(sim.alpha() < last);
			last = sim.alpha();
			assert!(sim.ticks() < 1000);
		}
		assert!(sim.alpha() < sim.config().alpha_min);
	}

	#[test]
	fn spring_converges_to_link_distance() {
		let g = graph(&["a", "b"], &[("a", "b")]);
		let config = SimulationConfig {
			charge_strength: 0.0,
			..Default::default()
		};
		let mut sim = Simulation::new(&g, Point::new(0.0, 0.0), config);
		run_until_settled(&mut sim);
		assert!((distance(&sim, 0, 1) - 300.0).abs() < 0.5);
	}

	#[test]
	fn spring_converges_from_arbitrary_start() {
		let g = graph(&["a", "b"], &[("a", "b")]);
		let config = SimulationConfig {
			charge_strength: 0.0,
			..Default::default()
		};
		for (a, b) in [
			(Point::new(0.0, 0.0), Point::new(900.0, 40.0)),
			(Point::new(-50.0, 10.0), Point::new(-49.0, 10.0)),
			(Point::new(3.0, 3.0), Point::new(3.0, 3.0)),
		] {
			let mut sim = Simulation::new(&g, Point::new(0.0, 0.0), config.clone());
			sim.nodes[0].x = a.x;
			sim.nodes[0].y = a.y;
			sim.nodes[1].x = b.x;
			sim.nodes[1].y = b.y;
			run_until_settled(&mut sim);
			let d = distance(&sim, 0, 1);
			assert!((d - 300.0).abs() < 0.5, "settled at {}", d);
		}
	}

	#[test]
	fn charge_pushes_the_pair_slightly_past_the_rest_length() {
		let g = graph(&["a", "b"], &[("a", "b")]);
		let mut sim = Simulation::new(&g, Point::new(400.0, 300.0), SimulationConfig::default());
		run_until_settled(&mut sim);
		// Spring and charge balance where 0.5 (d - 300) = 3000 / d, d ~ 318.8.
		let d = distance(&sim, 0, 1);
		assert!(d > 300.0 && d < 325.0, "settled at {}", d);

		let mid = sim.position(0).unwrap().midpoint(sim.position(1).unwrap());
		assert!((mid.x - 400.0).abs() < 1e-6 && (mid.y - 300.0).abs() < 1e-6);
	}

	#[test]
	fn collision_keeps_unlinked_nodes_apart() {
		let g = graph(&["a", "b", "c", "d", "e"], &[]);
		let config = SimulationConfig {
			charge_strength: 0.0,
			..Default::default()
		};
		let mut sim = Simulation::new(&g, Point::new(0.0, 0.0), config);
		for _ in 0..300 {
			sim.tick();
		}
		for i in 0..5 {
			for j in (i + 1)..5 {
				assert!(distance(&sim, i, j) > 2.0 * 70.0 - 1.0);
			}
		}
	}

	#[test]
	fn coincident_nodes_never_produce_nan() {
		let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c")]);
		let mut sim = Simulation::new(&g, Point::new(0.0, 0.0), SimulationConfig::default());
		for node in &mut sim.nodes {
			node.x = 10.0;
			node.y = 10.0;
		}
		for _ in 0..400 {
			sim.tick();
			assert!(sim.nodes().iter().all(|n| n.x.is_finite() && n.y.is_finite()));
		}
		assert!(distance(&sim, 0, 1) > 100.0);
	}

	#[test]
	fn pinned_node_follows_the_pin_and_reheats() {
		let g = graph(&["a", "b", "c"], &[("a", "b"), ("a", "c")]);
		let mut sim = Simulation::new(&g, Point::new(0.0, 0.0), SimulationConfig::default());
		run_until_settled(&mut sim);

		sim.reheat();
		assert!(!sim.is_settled());
		let target = Point::new(500.0, -200.0);
		assert!(sim.pin(0, target));
		for _ in 0..50 {
			sim.tick();
			assert_eq!(sim.position(0), Some(target));
		}
		assert!(sim.alpha() > sim.config().alpha_min);
		assert_eq!(sim.nodes()[0].vx, 0.0);

		assert!(sim.unpin(0));
		sim.release_heat();
		assert!(!sim.nodes()[0].is_pinned());
		run_until_settled(&mut sim);
		assert_ne!(sim.position(0), Some(target));
	}

	#[test]
	fn pin_rejects_unknown_index() {
		let g = graph(&["a"], &[]);
		let mut sim = Simulation::new(&g, Point::default(), SimulationConfig::default());
		assert!(!sim.pin(3, Point::default()));
		assert!(!sim.unpin(3));
	}

	#[test]
	fn resolves_edges_once_and_skips_unknown_endpoints() {
		let g = graph(&["a", "b"], &[("a", "b"), ("a", "ghost"), ("b", "b")]);
		let sim = Simulation::new(&g, Point::default(), SimulationConfig::default());
		assert_eq!(sim.endpoints(0), Some((0, 1)));
		assert_eq!(sim.endpoints(1), None);
		assert_eq!(sim.endpoints(2), Some((1, 1)));
		assert_eq!(sim.links.len(), 1);
		assert_eq!(sim.node_index("b"), Some(1));
	}

	#[test]
	fn empty_graph_ticks_quietly() {
		let g = graph(&[], &[]);
		let mut sim = Simulation::new(&g, Point::default(), SimulationConfig::default());
		run_until_settled(&mut sim);
		assert!(sim.nodes().is_empty());
	}
}
