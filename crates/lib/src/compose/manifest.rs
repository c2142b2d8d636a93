use std::collections::{BTreeMap, HashMap};

use crate::error::PackageError;
use crate::node::{BuildNode, Node};

/// One logical output target and the physical paths it is written to.
#[derive(Debug, Clone)]
pub struct TargetOutput {
  pub name: String,
  pub node: Node,
  /// Declared physical paths, keyed by sub-target (`app`, `print`, ...) or by
  /// the target name for single-file targets.
  pub paths: BTreeMap<String, String>,
}

impl TargetOutput {
  pub fn new(name: impl Into<String>, node: Node, paths: BTreeMap<String, String>) -> Self {
    Self {
      name: name.into(),
      node,
      paths,
    }
  }

  /// A target written to exactly one path.
  pub fn single(name: impl Into<String>, node: Node, path: impl Into<String>) -> Self {
    let name = name.into();
    let paths = BTreeMap::from([(name.clone(), path.into())]);
    Self { name, node, paths }
  }
}

/// Everything composition produced, in target order.
#[derive(Debug, Clone)]
pub struct OutputManifest {
  targets: Vec<TargetOutput>,
}

impl OutputManifest {
  /// Build a manifest, failing if two targets declare one physical path.
  pub fn new(targets: Vec<TargetOutput>) -> Result<Self, PackageError> {
    let mut owners: HashMap<&str, String> = HashMap::new();
    for target in &targets {
      for (sub, path) in &target.paths {
        let owner = if *sub == target.name {
          target.name.clone()
        } else {
          format!("{}:{}", target.name, sub)
        };

        if let Some(first) = owners.get(path.as_str()) {
          return Err(PackageError::Conflict {
            path: path.clone(),
            first: first.clone(),
            second: owner,
          });
        }
        owners.insert(path, owner);
      }
    }

    Ok(Self { targets })
  }

  pub fn targets(&self) -> &[TargetOutput] {
    &self.targets
  }

  pub fn target(&self, name: &str) -> Option<&TargetOutput> {
    self.targets.iter().find(|t| t.name == name)
  }

  /// Every declared physical path, in target order.
  pub fn physical_paths(&self) -> Vec<&str> {
    self
      .targets
      .iter()
      .flat_map(|t| t.paths.values().map(String::as_str))
      .collect()
  }

  /// Merge every target into the single composed tree.
  pub fn into_node(self) -> Node {
    BuildNode::merge(self.targets.into_iter().map(|t| t.node).collect())
  }
}
