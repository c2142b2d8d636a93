//! Per-extension transformer chains applied during packaging.

use std::sync::Arc;

use assetpack_lib::Packager;
use assetpack_lib::execute::{MaterializeError, materialize};
use assetpack_lib::registry::{Banner, ProcessorRegistry, TransformError, TransformOptions, Transformer};
use assetpack_lib::tree::FileTree;

use super::common::{SCENARIO_FILES, app_config, config, evaluate, input_tree};

/// Upper-cases file contents and records the options it was handed.
#[derive(Debug, Default)]
struct Shout {
  seen: std::sync::Mutex<Vec<TransformOptions>>,
}

impl Transformer for Shout {
  fn name(&self) -> &str {
    "shout"
  }

  fn apply(&self, tree: FileTree, options: &TransformOptions) -> Result<FileTree, TransformError> {
    self.seen.lock().unwrap().push(options.clone());
    Ok(
      tree
        .into_iter()
        .map(|(path, contents)| (path, contents.to_ascii_uppercase()))
        .collect(),
    )
  }
}

#[tokio::test]
async fn transformer_applies_only_to_its_extension() {
  let input = input_tree(&[
    ("app/styles/app.scss", "html{}"),
    ("app/styles/other.css", "body{}"),
    ("app/styles/notes.txt", "keep me"),
  ]);
  let cfg = config(
    r#"{
      "name": "app",
      "env": "production",
      "distPaths": {"appOutput": "/assets/app.css", "vendorOutput": "/assets/vendor.css"},
      "registry": {"scss": [{"renameExtension": {"to": "css"}}, {"banner": {"text": "compiled"}}]}
    }"#,
  );

  let tree = evaluate(&Packager::new(cfg).package_styles(input.path()).unwrap()).await;
  assert_eq!(tree.get_str("assets/app.css"), Some("/* compiled */\nhtml{}"));
  assert_eq!(tree.get_str("assets/other.css"), Some("body{}"));
  assert_eq!(tree.get_str("assets/notes.txt"), Some("keep me"));
}

#[tokio::test]
async fn transformers_receive_resolved_output_options() {
  let input = input_tree(&[("app/styles/app.css", "html{}")]);
  let shout = Arc::new(Shout::default());

  let node = Packager::builder(app_config(false))
    .registry(ProcessorRegistry::new().with("css", shout.clone()))
    .build()
    .package_styles(input.path())
    .unwrap();

  assert!(shout.seen.lock().unwrap().is_empty(), "transformers run lazily");

  let tree = evaluate(&node).await;
  assert_eq!(tree.get_str("assets/the-best-app-ever.css"), Some("HTML{}"));

  let seen = shout.seen.lock().unwrap();
  assert_eq!(seen.len(), 1);
  assert_eq!(seen[0].extension, "css");
  assert_eq!(seen[0].input_dir, "app/styles");
  assert_eq!(seen[0].output_dir, "assets");
  assert_eq!(seen[0].output_paths["app"], "assets/the-best-app-ever.css");
  assert_eq!(seen[0].env, "development");
}

/// Writes the `app` entry file straight to its declared output path, with a
/// `.zss` extension.
#[derive(Debug)]
struct EmitZss;

impl Transformer for EmitZss {
  fn name(&self) -> &str {
    "emit-zss"
  }

  fn apply(&self, tree: FileTree, options: &TransformOptions) -> Result<FileTree, TransformError> {
    Ok(
      tree
        .into_iter()
        .map(|(path, contents)| {
          if path == "app.css" {
            (options.output_paths["app"].replace(".css", ".zss"), contents)
          } else {
            (path, contents)
          }
        })
        .collect(),
    )
  }
}

#[tokio::test]
async fn transformer_output_at_declared_path_is_not_moved_again() {
  let input = input_tree(SCENARIO_FILES);
  let node = Packager::builder(app_config(false))
    .register("css", Arc::new(EmitZss))
    .build()
    .package_styles(input.path())
    .unwrap();

  let tree = evaluate(&node).await;
  assert_eq!(
    tree.paths().collect::<Vec<_>>(),
    vec!["assets/extra.css", "assets/the-best-app-ever.zss", "assets/vendor.css"]
  );
  assert_eq!(
    tree.get_str("assets/the-best-app-ever.zss"),
    Some("@import 'extra.css'; html{height:100%}")
  );
}

#[tokio::test]
async fn chains_run_in_registration_order() {
  let input = input_tree(&[("app/styles/app.css", "x")]);
  let node = Packager::builder(app_config(false))
    .register("css", Arc::new(Banner::new("one")))
    .register("css", Arc::new(Banner::new("two")))
    .build()
    .package_styles(input.path())
    .unwrap();

  let tree = evaluate(&node).await;
  assert_eq!(
    tree.get_str("assets/the-best-app-ever.css"),
    Some("/* two */\n/* one */\nx")
  );
}

#[tokio::test]
async fn transformed_file_colliding_with_untouched_file_conflicts() {
  let input = input_tree(&[("app/styles/app.scss", "a"), ("app/styles/app.css", "b")]);
  let cfg = config(
    r#"{
      "name": "app",
      "distPaths": {"appOutput": "/assets/app.css", "vendorOutput": "/assets/vendor.css"},
      "registry": {"scss": [{"renameExtension": {"to": "css"}}]}
    }"#,
  );

  let node = Packager::new(cfg).package_styles(input.path()).unwrap();
  let err = materialize(&node).await.unwrap_err();
  assert!(matches!(err, MaterializeError::Conflict { ref path } if path == "app.css"));
}

#[tokio::test]
async fn registered_extension_absent_from_inputs_is_empty() {
  let input = input_tree(&[("app/styles/app.css", "html{}")]);
  let cfg = config(
    r#"{
      "name": "app",
      "distPaths": {"appOutput": "/assets/app.css", "vendorOutput": "/assets/vendor.css"},
      "registry": {"less": [{"banner": {"text": "never"}}]}
    }"#,
  );

  let tree = evaluate(&Packager::new(cfg).package_styles(input.path()).unwrap()).await;
  assert_eq!(tree.get_str("assets/app.css"), Some("html{}"));
}
