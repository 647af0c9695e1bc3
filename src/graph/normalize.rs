//! Payload normalization: raw backend records to a canonical [`Graph`].
//!
//! Each record is validated on its own. A bad record is skipped and reported
//! as a [`NormalizeWarning`]; the rest of the payload still loads.

use std::collections::HashSet;

use serde_json::Value;

use super::types::{ApiResponse, Edge, Graph, GraphKind, Node, RawEdge, RawNode};

/// A record, or a field of one, that was dropped during normalization.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum NormalizeWarning {
	/// A required field is absent or empty; the record is skipped.
	#[error("{kind} record #{index} is missing required field `{field}`")]
	MissingField {
		/// Node or edge.
		kind: RecordKind,
		/// Position in the payload array.
		index: usize,
		/// Wire name of the field.
		field: &'static str,
	},

	/// A field has the wrong JSON type. Required fields skip the record;
	/// optional ones are dropped on their own.
	#[error("{kind} record #{index} has a `{field}` that is not {expected}")]
	InvalidField {
		/// Node or edge.
		kind: RecordKind,
		/// Position in the payload array.
		index: usize,
		/// Wire name of the field.
		field: &'static str,
		/// Expected JSON type.
		expected: &'static str,
	},

	/// The record is not a JSON object.
	#[error("{kind} record #{index} is malformed: {message}")]
	InvalidRecord {
		/// Node or edge.
		kind: RecordKind,
		/// Position in the payload array.
		index: usize,
		/// What was found instead.
		message: String,
	},

	/// A later node reused an id.
	#[error("duplicate node id `{id}` (record #{index}), keeping the first occurrence")]
	DuplicateNodeId {
		/// The reused id.
		id: String,
		/// Position of the dropped record.
		index: usize,
	},

	/// A later edge reused an id.
	#[error("duplicate edge id `{id}` (record #{index}), keeping the first occurrence")]
	DuplicateEdgeId {
		/// The reused id.
		id: String,
		/// Position of the dropped record.
		index: usize,
	},

	/// An edge endpoint names no loaded node; the edge is dropped.
	#[error("edge `{id}` references unknown node `{missing}`")]
	DanglingEdge {
		/// Id of the dropped edge.
		id: String,
		/// The endpoint id that matched no node.
		missing: String,
	},
}

/// Which record list a warning refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
	/// `result.nodes`
	Node,
	/// `result.edges`
	Edge,
}

impl std::fmt::Display for RecordKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			RecordKind::Node => "node",
			RecordKind::Edge => "edge",
		})
	}
}

/// Failure to read a payload at all (as opposed to a single bad record).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
	/// The body is not a JSON response envelope.
	#[error("graph payload is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),
}

/// Result of normalization: the graph plus every record that was dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Normalized {
	/// The canonical graph built from every usable record.
	pub graph: Graph,
	/// Problems found, in record order (nodes first).
	pub warnings: Vec<NormalizeWarning>,
}

/// Normalize raw node and edge records for the given query granularity.
///
/// Guarantees on the output: node ids are unique, every edge endpoint names
/// a node in the output, and optional fields absent (or empty) in the input
/// are `None`.
pub fn normalize(raw_nodes: &[Value], raw_edges: &[Value], granularity: &str) -> Normalized {
	let mut warnings = Vec::new();
	let mut seen_nodes: HashSet<String> = HashSet::new();
	let mut nodes = Vec::with_capacity(raw_nodes.len());

	for (index, value) in raw_nodes.iter().enumerate() {
		let raw = match serde_json::from_value::<RawNode>(value.clone()) {
			Ok(raw) => raw,
			Err(e) => {
				warnings.push(NormalizeWarning::InvalidRecord {
					kind: RecordKind::Node,
					index,
					message: e.to_string(),
				});
				continue;
			}
		};
		let node = match node_from_raw(raw, index, &mut warnings) {
			Ok(node) => node,
			Err(w) => {
				warnings.push(w);
				continue;
			}
		};
		if !seen_nodes.insert(node.id.clone()) {
			warnings.push(NormalizeWarning::DuplicateNodeId { id: node.id, index });
			continue;
		}
		nodes.push(node);
	}

	let mut seen_edges: HashSet<String> = HashSet::new();
	let mut edges = Vec::with_capacity(raw_edges.len());

	for (index, value) in raw_edges.iter().enumerate() {
		let raw = match serde_json::from_value::<RawEdge>(value.clone()) {
			Ok(raw) => raw,
			Err(e) => {
				warnings.push(NormalizeWarning::InvalidRecord {
					kind: RecordKind::Edge,
					index,
					message: e.to_string(),
				});
				continue;
			}
		};
		let edge = match edge_from_raw(raw, index, &mut warnings) {
			Ok(edge) => edge,
			Err(w) => {
				warnings.push(w);
				continue;
			}
		};
		if let Some(missing) = [&edge.source, &edge.target]
			.into_iter()
			.find(|id| !seen_nodes.contains(id.as_str()))
		{
			warnings.push(NormalizeWarning::DanglingEdge {
				id: edge.id.clone(),
				missing: missing.clone(),
			});
			continue;
		}
		if !seen_edges.insert(edge.id.clone()) {
			warnings.push(NormalizeWarning::DuplicateEdgeId { id: edge.id, index });
			continue;
		}
		edges.push(edge);
	}

	Normalized {
		graph: Graph {
			kind: GraphKind::from_granularity(granularity),
			nodes,
			edges,
		},
		warnings,
	}
}

/// Normalize a decoded backend response.
pub fn normalize_response(response: &ApiResponse, granularity: &str) -> Normalized {
	normalize(&response.result.nodes, &response.result.edges, granularity)
}

/// Parse a JSON response body and normalize it.
pub fn normalize_json(body: &str, granularity: &str) -> Result<Normalized, LoadError> {
	let response: ApiResponse = serde_json::from_str(body)?;
	Ok(normalize_response(&response, granularity))
}

fn node_from_raw(
	raw: RawNode,
	index: usize,
	warnings: &mut Vec<NormalizeWarning>,
) -> Result<Node, NormalizeWarning> {
	let mut fields = FieldReader {
		kind: RecordKind::Node,
		index,
		warnings,
	};
	let id = fields.required(raw.id, "id")?;
	let title = fields.required(raw.title, "title")?;

	Ok(Node {
		id,
		title,
		subtitle: fields.text(raw.subtitle, "subtitle"),
		clusters: fields.text(raw.clusters, "detail__clusters"),
		namespaces: fields.text(raw.namespaces, "detail__namespaces"),
		service: fields.text(raw.service, "detail__service"),
		protocol: fields.text(raw.protocol, "detail__protocol"),
		addresses: fields.text(raw.addresses, "detail__addresses"),
		endpoint: fields.text(raw.endpoint, "detail__endpoint"),
		requests_in: fields.number(raw.mainstat, "mainstat"),
		requests_out: fields.number(raw.secondarystat, "secondarystat"),
	})
}

fn edge_from_raw(
	raw: RawEdge,
	index: usize,
	warnings: &mut Vec<NormalizeWarning>,
) -> Result<Edge, NormalizeWarning> {
	let mut fields = FieldReader {
		kind: RecordKind::Edge,
		index,
		warnings,
	};
	Ok(Edge {
		id: fields.required(raw.id, "id")?,
		source: fields.required(raw.source, "source")?,
		target: fields.required(raw.target, "target")?,
		num_requests: fields.number(raw.mainstat, "mainstat"),
		avg_rrt: fields.number(raw.secondarystat, "secondarystat"),
	})
}

/// Typed access to one record's loose fields.
///
/// A required field that is absent or empty skips the record. An optional
/// field of the wrong type is dropped on its own and reported.
struct FieldReader<'a> {
	kind: RecordKind,
	index: usize,
	warnings: &'a mut Vec<NormalizeWarning>,
}

impl FieldReader<'_> {
	fn invalid(&self, field: &'static str, expected: &'static str) -> NormalizeWarning {
		NormalizeWarning::InvalidField {
			kind: self.kind,
			index: self.index,
			field,
			expected,
		}
	}

	fn required(
		&self,
		value: Option<Value>,
		field: &'static str,
	) -> Result<String, NormalizeWarning> {
		match value {
			Some(Value::String(s)) if !s.is_empty() => Ok(s),
			None | Some(Value::Null) | Some(Value::String(_)) => {
				Err(NormalizeWarning::MissingField {
					kind: self.kind,
					index: self.index,
					field,
				})
			}
			Some(_) => Err(self.invalid(field, "a string")),
		}
	}

	/// Empty strings mean "no data" on the wire.
	fn text(&mut self, value: Option<Value>, field: &'static str) -> Option<String> {
		match value? {
			Value::String(s) => Some(s).filter(|s| !s.is_empty()),
			Value::Null => None,
			_ => {
				let warning = self.invalid(field, "a string");
				self.warnings.push(warning);
				None
			}
		}
	}

	fn number(&mut self, value: Option<Value>, field: &'static str) -> Option<f64> {
		match value? {
			Value::Number(n) => n.as_f64(),
			Value::Null => None,
			_ => {
				let warning = self.invalid(field, "a number");
				self.warnings.push(warning);
				None
			}
		}
	}
}
