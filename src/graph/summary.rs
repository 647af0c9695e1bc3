//! Plain-text description of a graph, consumed by the summary generator.

use super::types::{Graph, format_stat};

/// One line per node, then one line per edge.
pub fn describe(graph: &Graph) -> String {
	let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".into());
	let stat = |v: Option<f64>| format_stat(v.unwrap_or(0.0));

	let nodes = graph.nodes.iter().map(|node| {
		format!(
			"Node: {} (Service: {}, Service Protocol: {}, Service Address(es): {}, API(s): {}) in Namespace(s): {}, part of {} cluster, handled {} requests (IN) and {} requests (OUT).",
			node.title,
			or_na(&node.service),
			or_na(&node.protocol),
			or_na(&node.addresses),
			or_na(&node.endpoint),
			or_na(&node.namespaces),
			or_na(&node.clusters),
			stat(node.requests_in),
			stat(node.requests_out),
		)
	});
	let edges = graph.edges.iter().map(|edge| {
		format!(
			"Edge from {} to {} processed {} requests with an average round trip time of {} microseconds.",
			edge.source,
			edge.target,
			stat(edge.num_requests),
			stat(edge.avg_rrt),
		)
	});

	format!(
		"Nodes:\n{}\n\nConnections (Edges):\n{}",
		nodes.collect::<Vec<_>>().join("\n"),
		edges.collect::<Vec<_>>().join("\n")
	)
}
