//! service-graph: Interactive service and API traffic graph.
//!
//! This crate provides a WASM-based visualization that normalizes a
//! backend traffic payload into a canonical graph and renders it with a
//! force-directed layout, pan/zoom, node dragging, and detail tooltips.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use url::Url;
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

pub mod components;
pub mod graph;

pub use components::force_graph::ServiceGraphCanvas;
pub use graph::{Graph, GraphKind, QueryParams};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("service-graph: logging initialized");
}

/// Graph currently on screen, shared with collaborators (query form, summary
/// generator) through context. `None` until a payload has been loaded.
#[derive(Clone, Copy)]
pub struct CurrentGraph(pub RwSignal<Option<Graph>>);

impl CurrentGraph {
	/// Textual description of the loaded graph, if any.
	pub fn describe(&self) -> Option<String> {
		self.0.with(|graph| graph.as_ref().map(graph::summary::describe))
	}
}

/// Query parameters of the current page.
fn page_query() -> QueryParams {
	web_sys::window()
		.and_then(|w| w.location().href().ok())
		.and_then(|href| Url::parse(&href).ok())
		.map(|url| QueryParams::from_url(&url))
		.unwrap_or_default()
}

/// Load the traffic payload from a script element with id="graph-data".
/// Expected format: JSON with { result: { nodes: [...], edges: [...] } }
///
/// Returns `None` when no payload is embedded. A payload that fails to parse
/// yields an empty graph, so the page shows the empty state.
fn load_graph(granularity: &str) -> Option<Graph> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id("graph-data")?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	let json_text = script.text().ok()?;

	match graph::normalize_json(&json_text, granularity) {
		Ok(normalized) => {
			for warning in &normalized.warnings {
				warn!("service-graph: {}", warning);
			}
			info!(
				"service-graph: loaded {} nodes, {} edges ({} skipped records)",
				normalized.graph.nodes.len(),
				normalized.graph.edges.len(),
				normalized.warnings.len()
			);
			Some(normalized.graph)
		}
		Err(e) => {
			warn!("service-graph: failed to load graph data: {}", e);
			Some(Graph {
				kind: GraphKind::from_granularity(granularity),
				..Graph::default()
			})
		}
	}
}

fn header_title(graph: Option<&Graph>) -> &'static str {
	graph.map_or("Graph Loading...", |g| g.kind.title())
}

/// Main application component.
/// Loads the traffic payload from the DOM and renders the graph.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let query = page_query();
	let current = CurrentGraph(RwSignal::new(load_graph(&query.granularity)));
	provide_context(current);
	let graph_signal = Signal::derive(move || current.0.get());

	let title = move || current.0.with(|g| header_title(g.as_ref()));
	let is_empty = move || current.0.with(|g| g.as_ref().is_some_and(Graph::is_empty));

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Service Graph" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<ServiceGraphCanvas graph=graph_signal fullscreen=true />
			<div class="graph-overlay">
				<h1>{title}</h1>
				<Show
					when=is_empty
					fallback=|| view! {
						<p class="subtitle">
							"Drag nodes to reposition. Scroll to zoom. "
							"Click a node or edge label for details."
						</p>
					}
				>
					<p class="subtitle">"Graph is empty"</p>
				</Show>
			</div>
		</div>
	}
}
