//! Packaging orchestration and memoization.
//!
//! A [`Packager`] owns the registry, the addon list and the minifier stage,
//! and builds one top-level node per [`CacheKey`]:
//!
//! ```text
//! source -> preprocess hooks -> composition -> postprocess hooks -> minify
//! ```
//!
//! The first request for a key builds the graph and caches it; later requests
//! return the cached node without running hooks, composition or minification
//! again. Nothing is cached when construction fails.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use crate::compose::TreeComposer;
use crate::config::{DistPaths, PackagerConfig};
use crate::error::PackageError;
use crate::hooks::{Addon, HookChain};
use crate::minify::{CssMinifier, Minifier, MinifierStage};
use crate::node::{BuildNode, Node};
use crate::phase::Phase;
use crate::registry::{ProcessorRegistry, Transformer};

/// Everything that determines the node built for a packaging request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  pub phase: Phase,
  pub name: String,
  pub env: String,
  pub dist_paths: DistPaths,
  pub input_root: PathBuf,
}

pub struct Packager {
  config: PackagerConfig,
  registry: ProcessorRegistry,
  hooks: HookChain,
  minifier: MinifierStage,
  cache: Mutex<HashMap<CacheKey, Node>>,
}

impl Packager {
  /// A packager using the registry declared in `config` and no addons.
  pub fn new(config: PackagerConfig) -> Self {
    Self::builder(config).build()
  }

  pub fn builder(config: PackagerConfig) -> PackagerBuilder {
    PackagerBuilder::new(config)
  }

  pub fn config(&self) -> &PackagerConfig {
    &self.config
  }

  pub fn registry(&self) -> &ProcessorRegistry {
    &self.registry
  }

  pub fn hooks(&self) -> &HookChain {
    &self.hooks
  }

  /// The packaged styles node for the inputs under `input_root`, labelled
  /// `"Packaged Styles"`.
  pub fn package_styles(&self, input_root: impl AsRef<Path>) -> Result<Node, PackageError> {
    self.package(Phase::Styles, input_root)
  }

  pub fn package(&self, phase: Phase, input_root: impl AsRef<Path>) -> Result<Node, PackageError> {
    let key = self.cache_key(phase, input_root.as_ref());

    // Held across construction so concurrent first requests build once.
    let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(node) = cache.get(&key) {
      debug!(phase = %phase, name = %key.name, node = %node.id(), "packager cache hit");
      return Ok(node.clone());
    }

    let node = self.build(phase, &key.input_root)?;
    info!(
      phase = %phase,
      name = %key.name,
      node = %node.id(),
      input = %key.input_root.display(),
      "packaged {}",
      phase
    );
    cache.insert(key, node.clone());
    Ok(node)
  }

  pub fn cache_key(&self, phase: Phase, input_root: &Path) -> CacheKey {
    CacheKey {
      phase,
      name: self.config.name.clone(),
      env: self.config.env.clone(),
      dist_paths: self.config.dist_paths.clone(),
      input_root: input_root.to_path_buf(),
    }
  }

  pub fn is_cached(&self, phase: Phase, input_root: impl AsRef<Path>) -> bool {
    let key = self.cache_key(phase, input_root.as_ref());
    self
      .cache
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .contains_key(&key)
  }

  pub fn cache_len(&self) -> usize {
    self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  fn build(&self, phase: Phase, input_root: &Path) -> Result<Node, PackageError> {
    let paths = self.config.resolve_paths()?;

    let source = BuildNode::source(input_root);
    let preprocessed = self.hooks.apply_preprocess(phase, source)?;

    let manifest = TreeComposer::new(phase, &self.registry, &paths, &self.config.env).compose(&preprocessed)?;
    let composed = manifest.into_node();

    let postprocessed = self.hooks.apply_postprocess(phase, composed)?;
    let output = self.minifier.apply(postprocessed);

    debug!(
      phase = %phase,
      addons = self.hooks.len(),
      minify = self.minifier.is_enabled(),
      "built packaging graph"
    );
    Ok(output.relabel(phase.annotation()))
  }
}

impl std::fmt::Debug for Packager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Packager")
      .field("name", &self.config.name)
      .field("registry", &self.registry)
      .field("hooks", &self.hooks)
      .field("cached", &self.cache_len())
      .finish()
  }
}

/// Populates the registry and addon list before the packager is used.
pub struct PackagerBuilder {
  config: PackagerConfig,
  registry: ProcessorRegistry,
  hooks: HookChain,
  minifier: Arc<dyn Minifier>,
}

impl PackagerBuilder {
  fn new(config: PackagerConfig) -> Self {
    let registry = ProcessorRegistry::from_specs(&config.registry);
    Self {
      config,
      registry,
      hooks: HookChain::default(),
      minifier: Arc::new(CssMinifier),
    }
  }

  /// Replace the registry declared in configuration.
  pub fn registry(mut self, registry: ProcessorRegistry) -> Self {
    self.registry = registry;
    self
  }

  /// Append a transformer for `extension` after those already registered.
  pub fn register(mut self, extension: &str, transformer: Arc<dyn Transformer>) -> Self {
    self.registry.register(extension, transformer);
    self
  }

  /// Register an addon. Hooks run in registration order.
  pub fn addon(mut self, addon: Arc<dyn Addon>) -> Self {
    self.hooks.push(addon);
    self
  }

  pub fn minifier(mut self, minifier: Arc<dyn Minifier>) -> Self {
    self.minifier = minifier;
    self
  }

  pub fn build(self) -> Packager {
    let minifier = MinifierStage::new(self.config.minify.clone(), self.minifier);
    Packager {
      config: self.config,
      registry: self.registry,
      hooks: self.hooks,
      minifier,
      cache: Mutex::new(HashMap::new()),
    }
  }
}
