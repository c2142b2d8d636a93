//! Error and result types for materialization.

use std::path::PathBuf;

use thiserror::Error;

use crate::minify::MinifyError;
use crate::node::NodeId;
use crate::node::graph::CycleError;
use crate::registry::TransformError;
use crate::util::hash::ContentHash;

/// Errors that can only be observed while evaluating a node graph.
#[derive(Debug, Error)]
pub enum MaterializeError {
  /// Reading an input or writing an output failed.
  #[error("io error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Walking a source directory failed.
  #[error("failed to walk source tree: {0}")]
  Walk(#[from] walkdir::Error),

  /// Two inputs of a merge (or two relocated files) produced the same path.
  #[error("output conflict: {path} is produced more than once")]
  Conflict { path: String },

  #[error(transparent)]
  Minify(#[from] MinifyError),

  /// A registered transformer failed. Its own error is kept as the source.
  #[error("transformer {transformer} failed")]
  Transform {
    transformer: String,
    #[source]
    source: TransformError,
  },

  /// A blocking task panicked or was cancelled.
  #[error("background task failed: {0}")]
  Join(#[from] tokio::task::JoinError),

  #[error(transparent)]
  Cycle(#[from] CycleError),

  /// A node was evaluated before one of its inputs.
  #[error("input {0} was not evaluated")]
  MissingInput(NodeId),

  /// An output path would land outside the output directory.
  #[error("refusing to write {path} outside the output directory")]
  UnsafePath { path: String },
}

impl MaterializeError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    MaterializeError::Io {
      path: path.into(),
      source,
    }
  }
}

/// A file written by [`write_tree`](super::write_tree).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
  /// Path relative to the output directory, `/`-separated.
  pub path: String,
  /// Absolute (or caller-relative) path on disk.
  pub location: PathBuf,
  pub bytes: usize,
  pub hash: ContentHash,
}
