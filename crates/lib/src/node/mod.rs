//! Build graph description.
//!
//! A packaging request produces a graph of [`BuildNode`]s. Each node is an
//! immutable description of one lazy step ([`BuildStep`]) over the trees
//! produced by its inputs. Construction performs no I/O; evaluating the graph
//! is the job of an executor.
//!
//! # Submodules
//!
//! - [`graph`] - petgraph view used for ordering and diagnostics

pub mod graph;
mod types;

pub use graph::NodeGraph;
pub use types::*;
