//! Generic conflict-graph coloring and the shared error type used by the
//! plan improver. Kept dependency-light and free of any plan-specific types
//! so it can be unit-tested in isolation, the same role `calyx_utils` plays
//! for the compiler passes that build on it.

mod error;
mod graph_coloring;
mod weight_graph;

pub use error::{Error, Result};
pub use graph_coloring::GraphColoring;
pub use weight_graph::WeightGraph;
