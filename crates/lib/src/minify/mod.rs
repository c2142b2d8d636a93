//! Minifier stage.
//!
//! Minification is the optional last step of packaging. It only ever wraps
//! the fully merged output: decisions such as inlining `@import`s need to see
//! every file that will be shipped.
//!
//! # Submodules
//!
//! - [`css`] - the default CSS minifier

pub mod css;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::node::{BuildNode, BuildStep, Node};
use crate::tree::{FileTree, extension_of};

pub use css::CssMinifier;

/// Minifier options, as accepted in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MinifyOptions {
  /// Inline local `@import`s whose target is part of the merged output.
  pub process_import: bool,
  /// Directory (relative to the output root) that imports resolve against.
  /// Defaults to the importing file's directory.
  pub relative_to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MinifyConfig {
  pub enabled: bool,
  pub options: MinifyOptions,
}

/// Malformed minifier input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to minify {path}: {message}")]
pub struct MinifyError {
  pub path: String,
  pub message: String,
}

impl MinifyError {
  pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      message: message.into(),
    }
  }
}

pub trait Minifier: fmt::Debug + Send + Sync {
  fn name(&self) -> &str;

  /// Extensions of the files this minifier rewrites. Others pass through.
  fn extensions(&self) -> &[&str];

  /// Minify the file at `path`. `tree` is the whole merged output.
  fn minify(&self, path: &str, tree: &FileTree, options: &MinifyOptions) -> Result<String, MinifyError>;
}

/// Minify every file of `tree` the minifier handles.
pub fn minify_tree(minifier: &dyn Minifier, tree: FileTree, options: &MinifyOptions) -> Result<FileTree, MinifyError> {
  let mut out = FileTree::new();
  for (path, contents) in tree.iter() {
    let handled = extension_of(path).is_some_and(|ext| minifier.extensions().contains(&ext));
    if handled {
      let minified = minifier.minify(path, &tree, options)?;
      debug!(path, before = contents.len(), after = minified.len(), "minified");
      out.insert(path, minified);
    } else {
      out.insert(path, contents);
    }
  }
  Ok(out)
}

/// Conditionally appends a minify step to the merged output.
#[derive(Debug, Clone)]
pub struct MinifierStage {
  config: MinifyConfig,
  minifier: Arc<dyn Minifier>,
}

impl MinifierStage {
  pub fn new(config: MinifyConfig, minifier: Arc<dyn Minifier>) -> Self {
    Self { config, minifier }
  }

  pub fn is_enabled(&self) -> bool {
    self.config.enabled
  }

  /// Disabled: returns `merged` untouched. Enabled: wraps it in a minify node.
  pub fn apply(&self, merged: Node) -> Node {
    if !self.config.enabled {
      return merged;
    }

    BuildNode::new(BuildStep::Minify {
      input: merged,
      minifier: self.minifier.clone(),
      options: self.config.options.clone(),
    })
  }
}
