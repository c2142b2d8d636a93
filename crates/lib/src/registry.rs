//! Processor registry: per-extension transformer chains.
//!
//! The registry maps a file extension to the ordered list of transformers
//! that preprocess files with that extension. It is populated before any
//! packaging call and only read afterwards; the
//! [`Packager`](crate::packager::Packager) takes ownership of it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tree::{FileTree, with_extension};

/// Error returned by a transformer at materialization time.
pub type TransformError = Box<dyn std::error::Error + Send + Sync>;

/// Options handed to every transformer in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
  /// The extension this chain was registered for.
  pub extension: String,
  /// Directory of the input tree the subtree was taken from.
  pub input_dir: String,
  /// Directory remaining files are written under.
  pub output_dir: String,
  /// Resolved physical path per sub-target.
  pub output_paths: BTreeMap<String, String>,
  pub env: String,
}

/// A tree-to-tree transformation applied to files of one extension.
///
/// `apply` only runs when the graph is materialized; graph construction just
/// records the transformer and its options in a node.
pub trait Transformer: fmt::Debug + Send + Sync {
  fn name(&self) -> &str;

  /// Configuration that distinguishes this transformer from others with the
  /// same name. Feeds node fingerprints.
  fn describe(&self) -> serde_json::Value {
    serde_json::Value::Null
  }

  fn apply(&self, tree: FileTree, options: &TransformOptions) -> Result<FileTree, TransformError>;
}

/// One registered extension and its transformer chain.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorEntry<'a> {
  pub extension: &'a str,
  pub transformers: &'a [Arc<dyn Transformer>],
}

#[derive(Debug, Clone, Default)]
pub struct ProcessorRegistry {
  entries: BTreeMap<String, Vec<Arc<dyn Transformer>>>,
}

impl ProcessorRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a registry from declarative transformer specs.
  pub fn from_specs(specs: &BTreeMap<String, Vec<TransformerSpec>>) -> Self {
    let mut registry = Self::new();
    for (extension, chain) in specs {
      for spec in chain {
        registry.register(extension, spec.build());
      }
    }
    registry
  }

  /// Append `transformer` to the chain for `extension`.
  pub fn register(&mut self, extension: &str, transformer: Arc<dyn Transformer>) {
    let extension = normalize_extension(extension);
    debug!(extension = %extension, transformer = transformer.name(), "registering transformer");
    self.entries.entry(extension).or_default().push(transformer);
  }

  pub fn with(mut self, extension: &str, transformer: Arc<dyn Transformer>) -> Self {
    self.register(extension, transformer);
    self
  }

  /// Transformers registered for `extension`, in registration order.
  pub fn load(&self, extension: &str) -> &[Arc<dyn Transformer>] {
    self
      .entries
      .get(normalize_extension(extension).as_str())
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  /// Registered extensions in sorted order.
  pub fn entries(&self) -> impl Iterator<Item = ProcessorEntry<'_>> {
    self.entries.iter().map(|(extension, transformers)| ProcessorEntry {
      extension,
      transformers,
    })
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

fn normalize_extension(extension: &str) -> String {
  extension.trim_start_matches('.').to_string()
}

/// Declarative form of the built-in transformers, as found in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformerSpec {
  RenameExtension { to: String },
  Banner { text: String },
}

impl TransformerSpec {
  pub fn build(&self) -> Arc<dyn Transformer> {
    match self {
      TransformerSpec::RenameExtension { to } => Arc::new(RenameExtension::new(to)),
      TransformerSpec::Banner { text } => Arc::new(Banner::new(text)),
    }
  }
}

/// Rewrites the extension of every file, e.g. precompiled `scss` into `css`.
#[derive(Debug, Clone)]
pub struct RenameExtension {
  to: String,
}

impl RenameExtension {
  pub fn new(to: impl AsRef<str>) -> Self {
    Self {
      to: normalize_extension(to.as_ref()),
    }
  }
}

impl Transformer for RenameExtension {
  fn name(&self) -> &str {
    "rename-extension"
  }

  fn describe(&self) -> serde_json::Value {
    serde_json::json!({ "to": self.to })
  }

  fn apply(&self, tree: FileTree, _options: &TransformOptions) -> Result<FileTree, TransformError> {
    Ok(
      tree
        .into_iter()
        .map(|(path, contents)| (with_extension(&path, &self.to), contents))
        .collect(),
    )
  }
}

/// Prepends a comment banner to every file.
#[derive(Debug, Clone)]
pub struct Banner {
  text: String,
}

impl Banner {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into() }
  }
}

impl Transformer for Banner {
  fn name(&self) -> &str {
    "banner"
  }

  fn describe(&self) -> serde_json::Value {
    serde_json::json!({ "text": self.text })
  }

  fn apply(&self, tree: FileTree, _options: &TransformOptions) -> Result<FileTree, TransformError> {
    if self.text.contains("*/") {
      return Err(format!("banner text must not contain `*/`: {:?}", self.text).into());
    }

    let header = format!("/* {} */\n", self.text);
    Ok(
      tree
        .into_iter()
        .map(|(path, contents)| {
          let mut out = header.clone().into_bytes();
          out.extend_from_slice(&contents);
          (path, out)
        })
        .collect(),
    )
  }
}
