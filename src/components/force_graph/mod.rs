//! Service/API traffic graph visualization component.
//!
//! Renders an interactive force-directed traffic graph on an HTML canvas with:
//! - A deterministic force layout ([`simulation`]) driven one tick per frame
//! - Pure per-tick edge geometry ([`frame`]) kept apart from canvas drawing
//! - Pan, zoom, node dragging, and click-to-inspect selection
//! - Protocol icons and latency-weighted edges
//!
//! # Example
//!
//! ```ignore
//! use service_graph::{ServiceGraphCanvas, graph::normalize_json};
//!
//! let graph = normalize_json(body, "service").ok().map(|n| n.graph);
//! view! { <ServiceGraphCanvas graph=Signal::derive(move || graph.clone()) fullscreen=true /> }
//! ```

mod component;
pub mod frame;
pub mod geometry;
pub mod icons;
mod render;
pub mod scale;
pub mod simulation;
pub mod state;
pub mod theme;
pub mod tooltip;

pub use component::ServiceGraphCanvas;
pub use frame::{EdgeGeometry, Frame, compute_frame};
pub use simulation::{Simulation, SimulationConfig};
pub use theme::Theme;
pub use tooltip::{Selection, Tooltip, TooltipEntry};
