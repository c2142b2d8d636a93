//! Addon hook chains around composition.
//!
//! Addons may contribute a preprocess hook (run on the input tree before
//! composition) and a postprocess hook (run on the composed tree after it).
//! Hooks of each stage run in addon registration order, each receiving the
//! tree returned by the previous one. The chain never looks inside the trees
//! it passes along.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::PackageError;
use crate::node::Node;
use crate::phase::Phase;

/// Error type third-party hooks report failures with.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Capability: rewrite the input tree before composition.
///
/// Returning `Ok(None)` means the hook produced no tree, which fails
/// packaging with [`PackageError::InvalidHookResult`].
pub trait PreprocessHook: Send + Sync {
  fn preprocess_tree(&self, phase: Phase, tree: Node) -> Result<Option<Node>, HookError>;
}

/// Capability: rewrite the composed tree after composition.
pub trait PostprocessHook: Send + Sync {
  fn postprocess_tree(&self, phase: Phase, tree: Node) -> Result<Option<Node>, HookError>;
}

/// A third-party extension participating in packaging.
///
/// Addons advertise hook capabilities by overriding the accessors; the
/// defaults opt out.
pub trait Addon: Send + Sync {
  fn name(&self) -> &str;

  fn preprocess(&self) -> Option<&dyn PreprocessHook> {
    None
  }

  fn postprocess(&self) -> Option<&dyn PostprocessHook> {
    None
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
  Preprocess,
  Postprocess,
}

impl fmt::Display for HookStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HookStage::Preprocess => write!(f, "preprocess"),
      HookStage::Postprocess => write!(f, "postprocess"),
    }
  }
}

/// What one addon contributes to the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookContribution<'a> {
  pub addon: &'a str,
  pub preprocess: bool,
  pub postprocess: bool,
}

#[derive(Clone, Default)]
pub struct HookChain {
  addons: Vec<Arc<dyn Addon>>,
}

impl HookChain {
  pub fn new(addons: Vec<Arc<dyn Addon>>) -> Self {
    Self { addons }
  }

  pub fn push(&mut self, addon: Arc<dyn Addon>) {
    self.addons.push(addon);
  }

  pub fn len(&self) -> usize {
    self.addons.len()
  }

  pub fn is_empty(&self) -> bool {
    self.addons.is_empty()
  }

  /// Per-addon capabilities, in registration order.
  pub fn contributions(&self) -> Vec<HookContribution<'_>> {
    self
      .addons
      .iter()
      .map(|addon| HookContribution {
        addon: addon.name(),
        preprocess: addon.preprocess().is_some(),
        postprocess: addon.postprocess().is_some(),
      })
      .collect()
  }

  /// Fold `tree` through every preprocess hook in registration order.
  pub fn apply_preprocess(&self, phase: Phase, tree: Node) -> Result<Node, PackageError> {
    self.fold(phase, HookStage::Preprocess, tree, |addon, tree| {
      addon.preprocess().map(|hook| hook.preprocess_tree(phase, tree))
    })
  }

  /// Fold `tree` through every postprocess hook in registration order.
  pub fn apply_postprocess(&self, phase: Phase, tree: Node) -> Result<Node, PackageError> {
    self.fold(phase, HookStage::Postprocess, tree, |addon, tree| {
      addon.postprocess().map(|hook| hook.postprocess_tree(phase, tree))
    })
  }

  fn fold<F>(&self, phase: Phase, stage: HookStage, mut tree: Node, invoke: F) -> Result<Node, PackageError>
  where
    F: Fn(&dyn Addon, Node) -> Option<Result<Option<Node>, HookError>>,
  {
    for addon in &self.addons {
      let Some(result) = invoke(addon.as_ref(), tree.clone()) else {
        continue;
      };

      debug!(addon = addon.name(), phase = %phase, stage = %stage, "ran addon hook");

      tree = match result {
        Ok(Some(next)) => next,
        Ok(None) => {
          return Err(PackageError::InvalidHookResult {
            addon: addon.name().to_string(),
            phase,
            stage,
          });
        }
        Err(source) => {
          return Err(PackageError::Hook {
            addon: addon.name().to_string(),
            stage,
            source,
          });
        }
      };
    }

    Ok(tree)
  }
}

impl fmt::Debug for HookChain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.addons.iter().map(|a| a.name())).finish()
  }
}
