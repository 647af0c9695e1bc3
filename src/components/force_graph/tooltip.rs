//! Detail tooltip content and placement.
//!
//! Content is derived from the canonical node or edge only, so simulation
//! fields (positions, velocities, pins) can never leak into it.

use url::Url;

use super::geometry::Point;
use crate::graph::{Edge, FilterField, Graph, Node, deep_link, types::format_stat};

/// What the user clicked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
	/// Index into `graph.nodes`.
	Node(usize),
	/// Index into `graph.edges`.
	Edge(usize),
}

/// One labelled row in the tooltip.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipEntry {
	/// Capitalized field name.
	pub label: String,
	/// Displayed value.
	pub value: String,
	/// Re-query link for filterable fields.
	pub link: Option<String>,
}

/// Tooltip content anchored at a screen position.
#[derive(Clone, Debug, PartialEq)]
pub struct Tooltip {
	/// What the tooltip describes.
	pub selection: Selection,
	/// Top-left corner, in canvas screen pixels.
	pub anchor: Point,
	/// Rows, in display order.
	pub entries: Vec<TooltipEntry>,
}

impl Tooltip {
	/// Build the tooltip for a selection. `page` is the current page URL, used
	/// for service/endpoint deep links; without it no links are produced.
	pub fn for_selection(
		graph: &Graph,
		selection: Selection,
		anchor: Point,
		page: Option<&Url>,
	) -> Option<Self> {
		let entries = match selection {
			Selection::Node(idx) => node_entries(graph.nodes.get(idx)?, page),
			Selection::Edge(idx) => edge_entries(graph.edges.get(idx)?),
		};
		Some(Self {
			selection,
			anchor,
			entries,
		})
	}
}

fn node_entries(node: &Node, page: Option<&Url>) -> Vec<TooltipEntry> {
	node.display_fields()
		.into_iter()
		.map(|(field, value)| {
			let filter = match field {
				"service" => Some(FilterField::Service),
				"endpoint" => Some(FilterField::Endpoint),
				_ => None,
			};
			let link = filter
				.zip(page)
				.map(|(filter, page)| deep_link(page, filter, &value));
			TooltipEntry {
				label: capitalize(field),
				value,
				link,
			}
		})
		.collect()
}

fn edge_entries(edge: &Edge) -> Vec<TooltipEntry> {
	let calls = edge
		.num_requests
		.filter(|n| *n != 0.0)
		.map(format_stat)
		.unwrap_or_else(|| "N/A".into());
	let latency = edge
		.latency_ms()
		.map(|ms| format!("{:.2}ms", ms))
		.unwrap_or_else(|| "0".into());
	vec![
		TooltipEntry {
			label: "Calls".into(),
			value: calls,
			link: None,
		},
		TooltipEntry {
			label: "Latency".into(),
			value: latency,
			link: None,
		},
	]
}

fn capitalize(field: &str) -> String {
	let mut chars = field.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
