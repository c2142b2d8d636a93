//! Tree composition.
//!
//! Turns the (preprocessed) input tree into one node per logical output
//! target:
//!
//! - `app`: application styles under `app/styles`, each registered extension
//!   folded through its transformer chain, merged with the untouched
//!   remainder and moved to the configured output paths
//! - `vendor`: the declared vendor fragments in exactly their declared
//!   order, followed by add-on styles from `addon-tree-output`
//! - one further target per additional `fragmentOrder` output
//!
//! Composition only builds nodes. Missing inputs are empty contributions and
//! path collisions between real files surface when the graph is evaluated.
//!
//! # Submodules
//!
//! - [`manifest`] - the composed targets and their physical paths

pub mod manifest;

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::ResolvedPaths;
use crate::consts::{ADDON_TREE_DIR, APP_STYLES_DIR, FRAGMENT_SEPARATOR};
use crate::error::PackageError;
use crate::node::{BuildNode, ConcatSpec, Node, RelocateSpec, Selection};
use crate::phase::Phase;
use crate::registry::{ProcessorRegistry, TransformOptions};

pub use manifest::{OutputManifest, TargetOutput};

/// Name of the application styles target.
pub const APP_TARGET: &str = "app";
/// Name of the main vendor target.
pub const VENDOR_TARGET: &str = "vendor";

#[derive(Debug, Clone, Copy)]
pub struct TreeComposer<'a> {
  phase: Phase,
  registry: &'a ProcessorRegistry,
  paths: &'a ResolvedPaths,
  env: &'a str,
}

impl<'a> TreeComposer<'a> {
  pub fn new(phase: Phase, registry: &'a ProcessorRegistry, paths: &'a ResolvedPaths, env: &'a str) -> Self {
    Self {
      phase,
      registry,
      paths,
      env,
    }
  }

  pub fn compose(&self, input: &Node) -> Result<OutputManifest, PackageError> {
    let mut targets = vec![TargetOutput::new(APP_TARGET, self.app_styles(input), self.paths.app.clone())];

    targets.push(TargetOutput::single(
      VENDOR_TARGET,
      self.vendor(input),
      self.paths.vendor.clone(),
    ));

    for (output, fragments) in &self.paths.fragment_order {
      if *output == self.paths.vendor {
        continue;
      }
      let node = BuildNode::concat(
        input,
        ConcatSpec {
          output: output.clone(),
          headers: fragments.clone(),
          include: None,
          separator: FRAGMENT_SEPARATOR.to_string(),
        },
      );
      targets.push(TargetOutput::single(format!("fragments:{}", output), node, output.clone()));
    }

    let manifest = OutputManifest::new(targets)?;
    debug!(
      phase = %self.phase,
      targets = manifest.targets().len(),
      paths = ?manifest.physical_paths(),
      "composed output manifest"
    );
    Ok(manifest)
  }

  fn app_styles(&self, input: &Node) -> Node {
    let mut parts = Vec::new();
    let mut transformed_extensions = Vec::new();

    for entry in self.registry.entries() {
      if entry.transformers.is_empty() {
        continue;
      }

      let options = TransformOptions {
        extension: entry.extension.to_string(),
        input_dir: APP_STYLES_DIR.to_string(),
        output_dir: self.paths.app_dir.clone(),
        output_paths: self.paths.app.clone(),
        env: self.env.to_string(),
      };

      let subtree = BuildNode::select(input, Selection::dir(APP_STYLES_DIR).with_extension(entry.extension));
      let folded = entry
        .transformers
        .iter()
        .fold(subtree, |tree, transformer| {
          BuildNode::transform(&tree, transformer.clone(), options.clone())
        });

      debug!(
        extension = entry.extension,
        transformers = entry.transformers.len(),
        "folded extension through registry"
      );
      parts.push(folded);
      transformed_extensions.push(entry.extension);
    }

    parts.push(BuildNode::select(
      input,
      Selection::dir(APP_STYLES_DIR).without_extensions(transformed_extensions),
    ));

    let merged = BuildNode::merge(parts);

    let extension = self.phase.extension();
    let mappings: BTreeMap<String, String> = self
      .paths
      .app
      .iter()
      .map(|(sub, path)| (format!("{}.{}", sub, extension), path.clone()))
      .collect();

    BuildNode::relocate(
      &merged,
      RelocateSpec {
        mappings,
        dest_dir: self.paths.app_dir.clone(),
      },
    )
  }

  fn vendor(&self, input: &Node) -> Node {
    let headers = self
      .paths
      .fragment_order
      .get(&self.paths.vendor)
      .cloned()
      .unwrap_or_default();

    BuildNode::concat(
      input,
      ConcatSpec {
        output: self.paths.vendor.clone(),
        headers,
        include: Some(Selection::dir(ADDON_TREE_DIR).with_extension(self.phase.extension())),
        separator: FRAGMENT_SEPARATOR.to_string(),
      },
    )
  }
}
