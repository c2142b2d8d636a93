//! Packager configuration.
//!
//! Configuration is plain data, deserialized from JSON with camelCase keys:
//!
//! ```json
//! {
//!   "name": "the-best-app-ever",
//!   "env": "development",
//!   "distPaths": {
//!     "appOutput": { "app": "/assets/the-best-app-ever.css" },
//!     "vendorOutput": "/assets/vendor.css"
//!   },
//!   "minify": { "enabled": false, "options": { "processImport": false } },
//!   "fragmentOrder": { "/assets/vendor.css": ["vendor/1.css", "vendor/2.css"] },
//!   "registry": { "scss": [{ "renameExtension": { "to": "css" } }] }
//! }
//! ```
//!
//! Output paths are validated and normalized by [`PackagerConfig::resolve_paths`]
//! before any node is built.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::DEFAULT_SUB_TARGET;
use crate::minify::MinifyConfig;
use crate::registry::TransformerSpec;
use crate::tree::{normalize_path, parent_dir};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse config: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("missing required output path distPaths.{0}")]
  MissingPath(&'static str),

  #[error("malformed output path {field}: {value:?} ({reason})")]
  MalformedPath {
    field: String,
    value: String,
    reason: &'static str,
  },

  #[error("distPaths.appOutput fan-out mapping is empty")]
  EmptyFanOut,
}

/// Where one logical output target is written.
///
/// Either a single physical path, or a fan-out mapping from sub-target name
/// to physical path. A value mixing both forms does not deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputTarget {
  Single(String),
  FanOut(BTreeMap<String, String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistPaths {
  #[serde(default)]
  pub app_output: Option<OutputTarget>,
  #[serde(default)]
  pub vendor_output: Option<String>,
  /// Directory for app style files that are not sub-targets. Defaults to the
  /// directory of the primary app output.
  #[serde(default)]
  pub app_output_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackagerConfig {
  pub name: String,
  #[serde(default = "default_env")]
  pub env: String,
  pub dist_paths: DistPaths,
  #[serde(default)]
  pub minify: MinifyConfig,
  /// Output path → input fragments, concatenated in exactly this order.
  #[serde(default)]
  pub fragment_order: BTreeMap<String, Vec<String>>,
  #[serde(default)]
  pub registry: BTreeMap<String, Vec<TransformerSpec>>,
}

fn default_env() -> String {
  "development".to_string()
}

/// Output paths after validation: `/`-separated and relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
  /// Sub-target name → physical path.
  pub app: BTreeMap<String, String>,
  /// Directory remaining app style files are written under.
  pub app_dir: String,
  pub vendor: String,
  /// Output path → ordered input fragments.
  pub fragment_order: BTreeMap<String, Vec<String>>,
}

impl PackagerConfig {
  pub fn new(name: impl Into<String>, dist_paths: DistPaths) -> Self {
    Self {
      name: name.into(),
      env: default_env(),
      dist_paths,
      minify: MinifyConfig::default(),
      fragment_order: BTreeMap::new(),
      registry: BTreeMap::new(),
    }
  }

  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(json)?)
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json(&content)
  }

  /// Validate and normalize every configured path.
  pub fn resolve_paths(&self) -> Result<ResolvedPaths, ConfigError> {
    let app = match &self.dist_paths.app_output {
      None => return Err(ConfigError::MissingPath("appOutput")),
      Some(OutputTarget::Single(path)) => {
        BTreeMap::from([(DEFAULT_SUB_TARGET.to_string(), output_path("distPaths.appOutput", path)?)])
      }
      Some(OutputTarget::FanOut(map)) if map.is_empty() => return Err(ConfigError::EmptyFanOut),
      Some(OutputTarget::FanOut(map)) => map
        .iter()
        .map(|(sub, path)| {
          if sub.is_empty() || sub.contains('/') {
            return Err(ConfigError::MalformedPath {
              field: "distPaths.appOutput".to_string(),
              value: sub.clone(),
              reason: "sub-target names must be non-empty file stems",
            });
          }
          Ok((sub.clone(), output_path(&format!("distPaths.appOutput.{}", sub), path)?))
        })
        .collect::<Result<_, _>>()?,
    };

    let vendor = match &self.dist_paths.vendor_output {
      None => return Err(ConfigError::MissingPath("vendorOutput")),
      Some(path) => output_path("distPaths.vendorOutput", path)?,
    };

    let app_dir = match &self.dist_paths.app_output_dir {
      Some(dir) => normalize_path(dir).ok_or_else(|| ConfigError::MalformedPath {
        field: "distPaths.appOutputDir".to_string(),
        value: dir.clone(),
        reason: "escapes the output root",
      })?,
      None => {
        let primary = app
          .get(DEFAULT_SUB_TARGET)
          .or_else(|| app.values().next())
          .map(String::as_str)
          .unwrap_or_default();
        parent_dir(primary).to_string()
      }
    };

    let fragment_order = self
      .fragment_order
      .iter()
      .map(|(output, fragments)| {
        let field = format!("fragmentOrder[{}]", output);
        let fragments = fragments
          .iter()
          .map(|f| output_path(&field, f))
          .collect::<Result<Vec<_>, _>>()?;
        Ok((output_path(&field, output)?, fragments))
      })
      .collect::<Result<_, ConfigError>>()?;

    Ok(ResolvedPaths {
      app,
      app_dir,
      vendor,
      fragment_order,
    })
  }
}

/// Normalize a path naming a file relative to the output (or input) root.
fn output_path(field: &str, value: &str) -> Result<String, ConfigError> {
  let malformed = |reason| ConfigError::MalformedPath {
    field: field.to_string(),
    value: value.to_string(),
    reason,
  };

  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(malformed("empty path"));
  }
  if trimmed.contains('\\') {
    return Err(malformed("use `/` as the path separator"));
  }
  if trimmed.ends_with('/') {
    return Err(malformed("must name a file, not a directory"));
  }

  let normalized = normalize_path(trimmed).ok_or_else(|| malformed("escapes the output root"))?;
  if normalized.is_empty() {
    return Err(malformed("empty path"));
  }
  Ok(normalized)
}
