//! Errors raised while constructing a packaging graph.
//!
//! Everything here is detected before any node is returned to the caller, so
//! nothing is cached when one of these is produced. Errors that can only be
//! observed while evaluating the graph live in
//! [`execute::MaterializeError`](crate::execute::MaterializeError).

use thiserror::Error;

use crate::config::ConfigError;
use crate::hooks::{HookError, HookStage};
use crate::phase::Phase;

#[derive(Debug, Error)]
pub enum PackageError {
  /// Missing or malformed configuration, most often output paths.
  #[error("configuration error: {0}")]
  Configuration(#[from] ConfigError),

  /// Two logical targets declare the same physical output path.
  #[error("output conflict: {path} is produced by both {first} and {second}")]
  Conflict { path: String, first: String, second: String },

  /// An addon hook returned no tree.
  #[error("addon {addon} returned no tree from its {stage} hook for {phase}")]
  InvalidHookResult { addon: String, phase: Phase, stage: HookStage },

  /// An addon hook failed. The addon's own error is kept as the source.
  #[error("addon {addon} failed in its {stage} hook")]
  Hook {
    addon: String,
    stage: HookStage,
    #[source]
    source: HookError,
  },
}
