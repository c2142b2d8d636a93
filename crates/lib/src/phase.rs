//! Asset classes that can be packaged.

use serde::{Deserialize, Serialize};

use crate::consts::PACKAGED_STYLES_ANNOTATION;

/// An asset class being packaged.
///
/// Each phase has its own cache key space in the
/// [`Packager`](crate::packager::Packager) and is passed to addon hooks so
/// they can decide whether to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum Phase {
  Styles,
}

impl Phase {
  /// The tree type name handed to addon hooks.
  pub fn hook_type(self) -> &'static str {
    match self {
      Phase::Styles => "css",
    }
  }

  /// Extension of the files this phase packages.
  pub fn extension(self) -> &'static str {
    match self {
      Phase::Styles => "css",
    }
  }

  /// Annotation of the top-level node returned for this phase.
  pub fn annotation(self) -> &'static str {
    match self {
      Phase::Styles => PACKAGED_STYLES_ANNOTATION,
    }
  }
}

impl std::fmt::Display for Phase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Phase::Styles => write!(f, "styles"),
    }
  }
}
