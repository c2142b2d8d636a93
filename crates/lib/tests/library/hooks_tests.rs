//! Addon hooks around composition.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use assetpack_lib::hooks::{Addon, HookError, HookStage, PostprocessHook, PreprocessHook};
use assetpack_lib::node::{BuildNode, BuildStep, Node};
use assetpack_lib::{PackageError, Packager, Phase};

use super::common::{SCENARIO_FILES, app_config, evaluate, input_tree, write_file};

type Log = Arc<Mutex<Vec<String>>>;

/// Records what each hook was given.
struct Tracer {
  name: &'static str,
  log: Log,
}

impl Tracer {
  fn new(name: &'static str, log: &Log) -> Arc<dyn Addon> {
    Arc::new(Self { name, log: log.clone() })
  }

  fn record(&self, stage: &str, tree: &Node) {
    self
      .log
      .lock()
      .unwrap()
      .push(format!("{}:{}:{}", self.name, stage, tree.step().kind()));
  }
}

impl PreprocessHook for Tracer {
  fn preprocess_tree(&self, _phase: Phase, tree: Node) -> Result<Option<Node>, HookError> {
    self.record("pre", &tree);
    Ok(Some(BuildNode::merge(vec![tree])))
  }
}

impl PostprocessHook for Tracer {
  fn postprocess_tree(&self, _phase: Phase, tree: Node) -> Result<Option<Node>, HookError> {
    self.record("post", &tree);
    Ok(Some(tree))
  }
}

impl Addon for Tracer {
  fn name(&self) -> &str {
    self.name
  }

  fn preprocess(&self) -> Option<&dyn PreprocessHook> {
    Some(self)
  }

  fn postprocess(&self) -> Option<&dyn PostprocessHook> {
    Some(self)
  }
}

/// Contributes its own styles by merging another directory into the input.
struct Theme {
  root: PathBuf,
}

impl PreprocessHook for Theme {
  fn preprocess_tree(&self, _phase: Phase, tree: Node) -> Result<Option<Node>, HookError> {
    Ok(Some(BuildNode::merge(vec![tree, BuildNode::source(&self.root)])))
  }
}

impl Addon for Theme {
  fn name(&self) -> &str {
    "theme"
  }

  fn preprocess(&self) -> Option<&dyn PreprocessHook> {
    Some(self)
  }
}

struct Forgetful;

impl PostprocessHook for Forgetful {
  fn postprocess_tree(&self, _phase: Phase, _tree: Node) -> Result<Option<Node>, HookError> {
    Ok(None)
  }
}

impl Addon for Forgetful {
  fn name(&self) -> &str {
    "forgetful"
  }

  fn postprocess(&self) -> Option<&dyn PostprocessHook> {
    Some(self)
  }
}

struct Failing;

impl PreprocessHook for Failing {
  fn preprocess_tree(&self, _phase: Phase, _tree: Node) -> Result<Option<Node>, HookError> {
    Err(std::io::Error::other("theme compiler crashed").into())
  }
}

impl Addon for Failing {
  fn name(&self) -> &str {
    "failing"
  }

  fn preprocess(&self) -> Option<&dyn PreprocessHook> {
    Some(self)
  }
}

#[test]
fn hooks_run_in_registration_order_around_composition() {
  let log: Log = Arc::default();
  let packager = Packager::builder(app_config(false))
    .addon(Tracer::new("p", &log))
    .addon(Tracer::new("q", &log))
    .build();

  packager.package_styles("in").unwrap();

  assert_eq!(
    *log.lock().unwrap(),
    vec![
      // q receives p's result, not the raw source
      "p:pre:source",
      "q:pre:merge",
      // postprocess hooks see the composed tree
      "p:post:merge",
      "q:post:merge",
    ]
  );
}

#[test]
fn hooks_never_run_on_cache_hits() {
  let log: Log = Arc::default();
  let packager = Packager::builder(app_config(false))
    .addon(Tracer::new("p", &log))
    .build();

  packager.package_styles("in").unwrap();
  packager.package_styles("in").unwrap();
  packager.package_styles("in").unwrap();

  assert_eq!(log.lock().unwrap().len(), 2);
}

#[test]
fn postprocess_output_is_what_gets_minified() {
  let log: Log = Arc::default();
  let node = Packager::builder(app_config(true))
    .addon(Tracer::new("p", &log))
    .build()
    .package_styles("in")
    .unwrap();

  assert!(matches!(node.step(), BuildStep::Minify { .. }));
  assert_eq!(log.lock().unwrap().last().map(String::as_str), Some("p:post:merge"));
}

#[tokio::test]
async fn preprocess_hook_can_contribute_files() {
  let input = input_tree(SCENARIO_FILES);
  let theme = input_tree(&[]);
  write_file(theme.path(), "app/styles/theme.css", ".dark{}");

  let node = Packager::builder(app_config(false))
    .addon(Arc::new(Theme {
      root: theme.path().to_path_buf(),
    }))
    .build()
    .package_styles(input.path())
    .unwrap();

  let tree = evaluate(&node).await;
  assert_eq!(tree.get_str("assets/theme.css"), Some(".dark{}"));
  assert!(tree.contains("assets/the-best-app-ever.css"));
}

#[test]
fn missing_tree_is_rejected_and_not_cached() {
  let packager = Packager::builder(app_config(false)).addon(Arc::new(Forgetful)).build();

  let err = packager.package_styles("in").unwrap_err();
  assert!(matches!(
    err,
    PackageError::InvalidHookResult {
      ref addon,
      phase: Phase::Styles,
      stage: HookStage::Postprocess,
    } if addon == "forgetful"
  ));
  assert_eq!(packager.cache_len(), 0);
  assert!(!packager.is_cached(Phase::Styles, "in"));
}

#[test]
fn hook_errors_propagate_with_addon_identity() {
  let packager = Packager::builder(app_config(false)).addon(Arc::new(Failing)).build();

  let err = packager.package_styles("in").unwrap_err();
  assert!(err.to_string().contains("failing"));
  let source = std::error::Error::source(&err).unwrap();
  assert_eq!(source.to_string(), "theme compiler crashed");
  assert_eq!(packager.cache_len(), 0);
}
