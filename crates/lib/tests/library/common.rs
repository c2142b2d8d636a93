//! Shared fixtures for library integration tests.

use std::path::Path;

use assetpack_lib::PackagerConfig;
use assetpack_lib::execute::materialize;
use assetpack_lib::node::Node;
use assetpack_lib::tree::FileTree;
use tempfile::TempDir;

/// Create an input directory holding `files`.
pub fn input_tree(files: &[(&str, &str)]) -> TempDir {
  let temp = TempDir::new().unwrap();
  for (rel, contents) in files {
    write_file(temp.path(), rel, contents);
  }
  temp
}

pub fn write_file(root: &Path, rel: &str, contents: &str) {
  let path = root.join(rel);
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  std::fs::write(path, contents).unwrap();
}

pub fn config(json: &str) -> PackagerConfig {
  PackagerConfig::from_json(json).unwrap()
}

/// Single app output plus a vendor output with three ordered fragments.
pub fn app_config(minify: bool) -> PackagerConfig {
  config(&format!(
    r#"{{
      "name": "the-best-app-ever",
      "distPaths": {{
        "appOutput": "/assets/the-best-app-ever.css",
        "vendorOutput": "/assets/vendor.css"
      }},
      "minify": {{ "enabled": {} }},
      "fragmentOrder": {{
        "/assets/vendor.css": ["vendor/1.css", "vendor/2.css", "vendor/3.css"]
      }}
    }}"#,
    minify
  ))
}

pub const SCENARIO_FILES: &[(&str, &str)] = &[
  ("app/styles/app.css", "@import 'extra.css'; html{height:100%}"),
  ("app/styles/extra.css", "body{position:relative}"),
  ("vendor/1.css", ".first{}"),
  ("vendor/2.css", ".second{}"),
  ("vendor/3.css", ".third{position:absolute}"),
];

pub async fn evaluate(node: &Node) -> FileTree {
  materialize(node).await.unwrap()
}
