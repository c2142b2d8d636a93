//! End-to-end packaging: graph construction, caching and materialization.

use std::sync::Arc;

use assetpack_lib::Packager;
use assetpack_lib::execute::{MaterializeError, materialize, materialize_to};
use assetpack_lib::minify::MinifyOptions;
use tempfile::TempDir;

use super::common::{SCENARIO_FILES, app_config, config, evaluate, input_tree};

mod scenario {
  use super::*;

  #[tokio::test]
  async fn unminified_output_is_verbatim() {
    let input = input_tree(SCENARIO_FILES);
    let node = Packager::new(app_config(false)).package_styles(input.path()).unwrap();

    let tree = evaluate(&node).await;
    assert_eq!(
      tree.get_str("assets/the-best-app-ever.css"),
      Some("@import 'extra.css'; html{height:100%}")
    );
    assert_eq!(tree.get_str("assets/extra.css"), Some("body{position:relative}"));
    assert_eq!(
      tree.get_str("assets/vendor.css"),
      Some(".first{}\n.second{}\n.third{position:absolute}")
    );
  }

  #[tokio::test]
  async fn writes_outputs_to_disk() {
    let input = input_tree(SCENARIO_FILES);
    let out = TempDir::new().unwrap();
    let node = Packager::new(app_config(false)).package_styles(input.path()).unwrap();

    let written = materialize_to(&node, out.path()).await.unwrap();
    let paths: Vec<_> = written.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
      paths,
      vec!["assets/extra.css", "assets/the-best-app-ever.css", "assets/vendor.css"]
    );
    assert_eq!(
      std::fs::read_to_string(out.path().join("assets/vendor.css")).unwrap(),
      ".first{}\n.second{}\n.third{position:absolute}"
    );
  }

  #[test]
  fn repeated_calls_share_one_node() {
    let input = input_tree(SCENARIO_FILES);
    let packager = Packager::new(app_config(false));
    assert_eq!(packager.cache_len(), 0);

    let first = packager.package_styles(input.path()).unwrap();
    let second = packager.package_styles(input.path()).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(packager.cache_len(), 1);
    assert_eq!(first.annotation(), Some("Packaged Styles"));
  }

  #[test]
  fn independent_instances_agree_structurally() {
    let input = input_tree(SCENARIO_FILES);
    let a = Packager::new(app_config(false)).package_styles(input.path()).unwrap();
    let b = Packager::new(app_config(false)).package_styles(input.path()).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

    let minified = Packager::new(app_config(true)).package_styles(input.path()).unwrap();
    assert_ne!(a.fingerprint().unwrap(), minified.fingerprint().unwrap());
  }
}

mod vendor {
  use super::*;

  #[tokio::test]
  async fn declared_order_beats_filesystem_order() {
    let input = input_tree(&[("vendor/a.css", "A"), ("vendor/b.css", "B"), ("vendor/c.css", "C")]);
    let cfg = config(
      r#"{
        "name": "app",
        "distPaths": {"appOutput": "/assets/app.css", "vendorOutput": "/assets/vendor.css"},
        "fragmentOrder": {"/assets/vendor.css": ["vendor/c.css", "vendor/a.css", "vendor/b.css"]}
      }"#,
    );

    let tree = evaluate(&Packager::new(cfg).package_styles(input.path()).unwrap()).await;
    assert_eq!(tree.get_str("assets/vendor.css"), Some("C\nA\nB"));
  }

  #[tokio::test]
  async fn addon_styles_follow_declared_fragments() {
    let input = input_tree(&[
      ("vendor/1.css", "V"),
      ("addon-tree-output/zeta/z.css", "Z"),
      ("addon-tree-output/alpha/a.css", "A"),
      ("addon-tree-output/alpha/a.js", "ignored"),
    ]);
    let cfg = config(
      r#"{
        "name": "app",
        "distPaths": {"appOutput": "/assets/app.css", "vendorOutput": "/assets/vendor.css"},
        "fragmentOrder": {"/assets/vendor.css": ["vendor/1.css"]}
      }"#,
    );

    let tree = evaluate(&Packager::new(cfg).package_styles(input.path()).unwrap()).await;
    assert_eq!(tree.get_str("assets/vendor.css"), Some("V\nA\nZ"));
  }

  #[tokio::test]
  async fn missing_inputs_are_empty_contributions() {
    let input = TempDir::new().unwrap();
    let tree = evaluate(&Packager::new(app_config(false)).package_styles(input.path()).unwrap()).await;

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get_str("assets/vendor.css"), Some(""));
  }

  #[tokio::test]
  async fn extra_fragment_outputs_are_concatenated() {
    let input = input_tree(&[("vendor/x.css", "X"), ("vendor/y.css", "Y")]);
    let cfg = config(
      r#"{
        "name": "app",
        "distPaths": {"appOutput": "/assets/app.css", "vendorOutput": "/assets/vendor.css"},
        "fragmentOrder": {"/assets/test-support.css": ["vendor/y.css", "vendor/x.css"]}
      }"#,
    );

    let tree = evaluate(&Packager::new(cfg).package_styles(input.path()).unwrap()).await;
    assert_eq!(tree.get_str("assets/test-support.css"), Some("Y\nX"));
    assert_eq!(tree.get_str("assets/vendor.css"), Some(""));
  }
}

mod fan_out {
  use super::*;

  #[tokio::test]
  async fn each_sub_target_gets_only_its_content() {
    let input = input_tree(&[
      ("app/styles/app.css", "html{}"),
      ("app/styles/print.css", "@media print{body{}}"),
    ]);
    let cfg = config(
      r#"{
        "name": "app",
        "distPaths": {
          "appOutput": {"app": "/assets/app.css", "print": "/assets/print/app-print.css"},
          "vendorOutput": "/assets/vendor.css"
        }
      }"#,
    );

    let tree = evaluate(&Packager::new(cfg).package_styles(input.path()).unwrap()).await;
    assert_eq!(tree.get_str("assets/app.css"), Some("html{}"));
    assert_eq!(tree.get_str("assets/print/app-print.css"), Some("@media print{body{}}"));
    assert!(!tree.contains("assets/print.css"));
  }

  #[tokio::test]
  async fn missing_sub_target_source_produces_nothing() {
    let input = input_tree(&[("app/styles/app.css", "html{}")]);
    let cfg = config(
      r#"{
        "name": "app",
        "distPaths": {
          "appOutput": {"app": "/assets/app.css", "print": "/assets/print.css"},
          "vendorOutput": "/assets/vendor.css"
        }
      }"#,
    );

    let tree = evaluate(&Packager::new(cfg).package_styles(input.path()).unwrap()).await;
    assert!(tree.contains("assets/app.css"));
    assert!(!tree.contains("assets/print.css"));
  }

  #[test]
  fn two_sub_targets_on_one_path_conflict() {
    let cfg = config(
      r#"{
        "name": "app",
        "distPaths": {
          "appOutput": {"app": "/assets/app.css", "print": "/assets/app.css"},
          "vendorOutput": "/assets/vendor.css"
        }
      }"#,
    );
    let packager = Packager::new(cfg);
    let err = packager.package_styles("in").unwrap_err();
    assert!(err.to_string().contains("assets/app.css"));
    assert_eq!(packager.cache_len(), 0);
  }
}

mod minify {
  use super::*;

  #[tokio::test]
  async fn enabled_minification_only_changes_whitespace() {
    let input = input_tree(&[
      ("app/styles/app.css", "html {\n  height: 100%;\n}\n\n/* layout */\nbody > main { margin: 0 }"),
      ("vendor/1.css", ".first { }"),
    ]);
    let cfg = config(
      r#"{
        "name": "app",
        "distPaths": {"appOutput": "/assets/app.css", "vendorOutput": "/assets/vendor.css"},
        "minify": {"enabled": true},
        "fragmentOrder": {"/assets/vendor.css": ["vendor/1.css"]}
      }"#,
    );

    let tree = evaluate(&Packager::new(cfg).package_styles(input.path()).unwrap()).await;
    assert_eq!(tree.get_str("assets/app.css"), Some("html{height:100%}body>main{margin:0}"));
    assert_eq!(tree.get_str("assets/vendor.css"), Some(".first{}"));
  }

  #[tokio::test]
  async fn process_import_inlines_merged_files() {
    let input = input_tree(SCENARIO_FILES);
    let mut cfg = app_config(true);
    cfg.minify.options = MinifyOptions {
      process_import: true,
      relative_to: None,
    };

    let tree = evaluate(&Packager::new(cfg).package_styles(input.path()).unwrap()).await;
    assert_eq!(
      tree.get_str("assets/the-best-app-ever.css"),
      Some("body{position:relative}html{height:100%}")
    );
  }

  #[tokio::test]
  async fn malformed_css_fails_at_materialization() {
    let input = input_tree(&[("app/styles/app.css", "html { height: 100%;")]);
    let node = Packager::new(app_config(true)).package_styles(input.path()).unwrap();

    let err = materialize(&node).await.unwrap_err();
    assert!(matches!(err, MaterializeError::Minify(ref e) if e.path == "assets/the-best-app-ever.css"));
  }
}
