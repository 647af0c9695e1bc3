//! Canonical graph model and the raw backend payload it is normalized from.
//!
//! The canonical types carry only domain fields. Positions and velocities live
//! in the simulation, keyed by node index, and are joined with these records at
//! render time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Node identifier, unique within a [`Graph`].
pub type NodeId = String;

/// Whether nodes represent whole services or individual API endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphKind {
	/// Nodes are services.
	#[default]
	Service,
	/// Nodes are API endpoints.
	Api,
}

impl GraphKind {
	/// Classify a requested granularity. Only the exact string `"service"`
	/// selects [`GraphKind::Service`]; anything else is API-level.
	pub fn from_granularity(granularity: &str) -> Self {
		if granularity == "service" {
			GraphKind::Service
		} else {
			GraphKind::Api
		}
	}

	/// Heading shown above the canvas.
	pub fn title(self) -> &'static str {
		match self {
			GraphKind::Service => "Service Graph",
			GraphKind::Api => "API Graph",
		}
	}
}

/// A service or endpoint in the traffic graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
	/// Unique node id.
	pub id: NodeId,
	/// Display name.
	pub title: String,
	/// Secondary display line.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subtitle: Option<String>,
	/// Clusters the service runs in.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub clusters: Option<String>,
	/// Kubernetes namespaces.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub namespaces: Option<String>,
	/// Owning service name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub service: Option<String>,
	/// Transport protocol, e.g. `gRPC`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub protocol: Option<String>,
	/// Service addresses.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub addresses: Option<String>,
	/// API endpoint path.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub endpoint: Option<String>,
	/// Inbound request count (display only).
	#[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
	pub requests_in: Option<f64>,
	/// Outbound request count (display only).
	#[serde(rename = "out", default, skip_serializing_if = "Option::is_none")]
	pub requests_out: Option<f64>,
}

impl Node {
	/// Populated display fields in canonical order, as `(field name, value)`.
	///
	/// The id is an internal key and is not listed.
	pub fn display_fields(&self) -> Vec<(&'static str, String)> {
		let strings = [
			("title", Some(&self.title)),
			("subtitle", self.subtitle.as_ref()),
			("clusters", self.clusters.as_ref()),
			("namespaces", self.namespaces.as_ref()),
			("service", self.service.as_ref()),
			("protocol", self.protocol.as_ref()),
			("addresses", self.addresses.as_ref()),
			("endpoint", self.endpoint.as_ref()),
		];
		let mut fields: Vec<(&'static str, String)> = strings
			.into_iter()
			.filter_map(|(name, value)| value.filter(|v| !v.is_empty()).map(|v| (name, v.clone())))
			.collect();
		if let Some(n) = self.requests_in {
			fields.push(("in", format_stat(n)));
		}
		if let Some(n) = self.requests_out {
			fields.push(("out", format_stat(n)));
		}
		fields
	}
}

/// A directed traffic edge between two nodes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	/// Unique edge id.
	pub id: String,
	/// Calling node.
	pub source: NodeId,
	/// Called node.
	pub target: NodeId,
	/// Request count.
	#[serde(
		rename = "numRequests",
		default,
		skip_serializing_if = "Option::is_none"
	)]
	pub num_requests: Option<f64>,
	/// Average round-trip time in microseconds.
	#[serde(rename = "avgRRT", default, skip_serializing_if = "Option::is_none")]
	pub avg_rrt: Option<f64>,
}

impl Edge {
	/// Average round-trip time in milliseconds, when recorded and non-zero.
	pub fn latency_ms(&self) -> Option<f64> {
		self.avg_rrt.filter(|v| *v != 0.0).map(|us| us / 1000.0)
	}

	/// Short label drawn along the edge, e.g. `"10 calls, 0.50ms"`.
	pub fn label(&self) -> String {
		let calls = self
			.num_requests
			.filter(|n| *n != 0.0)
			.map(format_stat)
			.unwrap_or_else(|| "N/A".into());
		match self.latency_ms() {
			Some(ms) => format!("{} calls, {:.2}ms", calls, ms),
			None => format!("{} calls", calls),
		}
	}
}

/// Normalized graph handed to the simulator. Produced fresh for every query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
	/// Service or API level.
	#[serde(rename = "type")]
	pub kind: GraphKind,
	/// Nodes, in payload order.
	pub nodes: Vec<Node>,
	/// Edges between known nodes.
	pub edges: Vec<Edge>,
}

impl Graph {
	/// True when there are no nodes.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Node with id `id`.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Edge with id `id`.
	pub fn edge(&self, id: &str) -> Option<&Edge> {
		self.edges.iter().find(|e| e.id == id)
	}
}

/// Backend response envelope: `{ result: { nodes: [...], edges: [...] } }`.
///
/// Records are kept as loose JSON so one malformed entry cannot fail the
/// whole payload; [`super::normalize`] validates them one at a time.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiResponse {
	/// Payload body.
	pub result: ApiResult,
}

/// Node and edge records of a response.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApiResult {
	/// Raw node records.
	#[serde(default)]
	pub nodes: Vec<Value>,
	/// Raw edge records.
	#[serde(default)]
	pub edges: Vec<Value>,
}

/// A single node record as the backend sends it.
///
/// Fields are kept as loose JSON; [`super::normalize`] checks their types one
/// at a time so a badly typed optional field costs only that field.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawNode {
	/// `id`
	pub id: Option<Value>,
	/// `title`
	pub title: Option<Value>,
	/// `subtitle`
	pub subtitle: Option<Value>,
	/// `detail__service`
	#[serde(rename = "detail__service")]
	pub service: Option<Value>,
	/// `detail__clusters`
	#[serde(rename = "detail__clusters")]
	pub clusters: Option<Value>,
	/// `detail__namespaces`
	#[serde(rename = "detail__namespaces")]
	pub namespaces: Option<Value>,
	/// `detail__addresses`
	#[serde(rename = "detail__addresses")]
	pub addresses: Option<Value>,
	/// `detail__protocol`
	#[serde(rename = "detail__protocol")]
	pub protocol: Option<Value>,
	/// `detail__endpoint`
	#[serde(rename = "detail__endpoint")]
	pub endpoint: Option<Value>,
	/// `mainstat`: inbound requests.
	pub mainstat: Option<Value>,
	/// `secondarystat`: outbound requests.
	pub secondarystat: Option<Value>,
}

/// A single edge record as the backend sends it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawEdge {
	/// `id`
	pub id: Option<Value>,
	/// `source` node id.
	pub source: Option<Value>,
	/// `target` node id.
	pub target: Option<Value>,
	/// `mainstat`: request count.
	pub mainstat: Option<Value>,
	/// `secondarystat`: average round-trip time.
	pub secondarystat: Option<Value>,
}

/// Render a stat without a trailing `.0` for whole numbers.
pub fn format_stat(value: f64) -> String {
	if value.fract() == 0.0 && value.abs() < 1e15 {
		format!("{}", value as i64)
	} else {
		format!("{}", value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn granularity_classification() {
		assert_eq!(GraphKind::from_granularity("service"), GraphKind::Service);
		assert_eq!(GraphKind::from_granularity("api"), GraphKind::Api);
		assert_eq!(GraphKind::from_granularity("Service"), GraphKind::Api);
		assert_eq!(GraphKind::from_granularity(""), GraphKind::Api);
	}

	#[test]
	fn serializes_with_wire_names_and_omits_absent_fields() {
		let graph = Graph {
			kind: GraphKind::Api,
			nodes: vec![Node {
				id: "a".into(),
				title: "A".into(),
				requests_in: Some(0.0),
				..Default::default()
			}],
			edges: vec![Edge {
				id: "e".into(),
				source: "a".into(),
				target: "a".into(),
				num_requests: None,
				avg_rrt: Some(12.5),
			}],
		};
		let json = serde_json::to_value(&graph).unwrap();
		assert_eq!(
			json,
			serde_json::json!({
				"type": "api",
				"nodes": [{"id": "a", "title": "A", "in": 0.0}],
				"edges": [{"id": "e", "source": "a", "target": "a", "avgRRT": 12.5}],
			})
		);
	}

	#[test]
	fn edge_label_formats_calls_and_latency() {
		let mut edge = Edge {
			id: "e".into(),
			source: "a".into(),
			target: "b".into(),
			num_requests: Some(10.0),
			avg_rrt: Some(500.0),
		};
		assert_eq!(edge.label(), "10 calls, 0.50ms");
		edge.avg_rrt = None;
		edge.num_requests = None;
		assert_eq!(edge.label(), "N/A calls");
	}

	#[test]
	fn display_fields_skip_absent_values() {
		let node = Node {
			id: "svc-1".into(),
			title: "checkout".into(),
			protocol: Some("gRPC".into()),
			requests_out: Some(3.0),
			..Default::default()
		};
		assert_eq!(
			node.display_fields(),
			vec![
				("title", "checkout".to_string()),
				("protocol", "gRPC".to_string()),
				("out", "3".to_string()),
			]
		);
	}
}
