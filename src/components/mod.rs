//! UI components.

pub mod force_graph;
pub mod tooltip_overlay;
