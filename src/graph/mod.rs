//! Canonical traffic graph: model, normalization, and query plumbing.

pub mod filters;
pub mod normalize;
pub mod summary;
pub mod types;

pub use filters::{FilterField, GraphFilters, QueryParams, deep_link};
pub use normalize::{LoadError, NormalizeWarning, Normalized, normalize, normalize_json};
pub use types::{ApiResponse, Edge, Graph, GraphKind, Node, NodeId};
