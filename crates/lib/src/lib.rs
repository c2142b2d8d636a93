//! assetpack-lib: asset packaging core
//!
//! This crate builds the lazy node graph that packages an application's
//! styles into their distributable form:
//! - `node`: immutable build steps shared through `Arc`, plus a petgraph view
//! - `registry`: per-extension transformer chains
//! - `compose`: application styles, ordered vendor fragments, output paths
//! - `hooks`: addon preprocess/postprocess hook chains
//! - `minify`: the optional minification stage
//! - `packager`: orchestration and per-instance memoization
//! - `execute`: a reference evaluator that writes the graph to disk

pub mod compose;
pub mod config;
pub mod consts;
pub mod error;
pub mod execute;
pub mod hooks;
pub mod minify;
pub mod node;
pub mod packager;
pub mod phase;
pub mod registry;
pub mod tree;
pub mod util;

pub use config::PackagerConfig;
pub use error::PackageError;
pub use packager::Packager;
pub use phase::Phase;
