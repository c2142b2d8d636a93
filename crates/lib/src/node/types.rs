use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::minify::{Minifier, MinifyOptions};
use crate::registry::{TransformOptions, Transformer};
use crate::tree::extension_of;
use crate::util::hash::{Fingerprint, HashError, Hashable};

/// Shared handle to an immutable build node.
///
/// Identity is by reference: two handles denote the same node iff
/// [`Arc::ptr_eq`] holds (equivalently, their [`NodeId`]s are equal).
pub type Node = Arc<BuildNode>;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier assigned when a node is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
  fn next() -> Self {
    NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
  }
}

impl std::fmt::Display for NodeId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Restricts a tree to a subdirectory and/or a set of extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
  /// Re-root the tree at this directory; files outside it are dropped.
  pub src_dir: Option<String>,
  /// Keep only files with one of these extensions (all files if empty).
  pub include_extensions: Vec<String>,
  /// Drop files with one of these extensions.
  pub exclude_extensions: Vec<String>,
}

impl Selection {
  pub fn dir(dir: impl Into<String>) -> Self {
    Self {
      src_dir: Some(dir.into()),
      ..Self::default()
    }
  }

  pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
    self.include_extensions.push(extension.into());
    self
  }

  pub fn without_extensions<I, S>(mut self, extensions: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.exclude_extensions.extend(extensions.into_iter().map(Into::into));
    self
  }

  /// Returns the path relative to `src_dir` if `path` is selected.
  pub fn matches<'a>(&self, path: &'a str) -> Option<&'a str> {
    let rel = match &self.src_dir {
      Some(dir) => path.strip_prefix(dir.as_str())?.strip_prefix('/')?,
      None => path,
    };

    let ext = extension_of(rel);
    if !self.include_extensions.is_empty() && !ext.is_some_and(|e| self.include_extensions.iter().any(|i| i == e)) {
      return None;
    }
    if ext.is_some_and(|e| self.exclude_extensions.iter().any(|x| x == e)) {
      return None;
    }

    Some(rel)
  }
}

/// Concatenates files of a tree into a single output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcatSpec {
  /// Path of the produced file.
  pub output: String,
  /// Files placed first, in exactly this order. Missing files contribute nothing.
  pub headers: Vec<String>,
  /// Further files appended after the headers, in path order.
  pub include: Option<Selection>,
  pub separator: String,
}

/// Moves files to their physical output paths.
///
/// Files named in `mappings` move to the mapped path; every other file lands
/// under `dest_dir` at its relative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocateSpec {
  pub mappings: BTreeMap<String, String>,
  pub dest_dir: String,
}

/// The kind of work a [`BuildNode`] describes.
#[derive(Debug, Clone)]
pub enum BuildStep {
  /// Every file under `root`. A missing root is an empty tree.
  Source { root: PathBuf },
  /// The subset of `input` matched by `selection`.
  Select { input: Node, selection: Selection },
  /// `input` passed through a registered transformer.
  Transform {
    input: Node,
    transformer: Arc<dyn Transformer>,
    options: TransformOptions,
  },
  /// Union of `inputs`. Two inputs producing the same path is a conflict.
  Merge { inputs: Vec<Node> },
  Concat { input: Node, spec: ConcatSpec },
  Relocate { input: Node, spec: RelocateSpec },
  Minify {
    input: Node,
    minifier: Arc<dyn Minifier>,
    options: MinifyOptions,
  },
}

impl BuildStep {
  pub fn kind(&self) -> &'static str {
    match self {
      BuildStep::Source { .. } => "source",
      BuildStep::Select { .. } => "select",
      BuildStep::Transform { .. } => "transform",
      BuildStep::Merge { .. } => "merge",
      BuildStep::Concat { .. } => "concat",
      BuildStep::Relocate { .. } => "relocate",
      BuildStep::Minify { .. } => "minify",
    }
  }

  /// Direct inputs, in evaluation order.
  pub fn inputs(&self) -> Vec<&Node> {
    match self {
      BuildStep::Source { .. } => Vec::new(),
      BuildStep::Merge { inputs } => inputs.iter().collect(),
      BuildStep::Select { input, .. }
      | BuildStep::Transform { input, .. }
      | BuildStep::Concat { input, .. }
      | BuildStep::Relocate { input, .. }
      | BuildStep::Minify { input, .. } => vec![input],
    }
  }

  fn params(&self) -> Result<serde_json::Value, HashError> {
    use serde_json::json;

    Ok(match self {
      BuildStep::Source { root } => json!({ "root": root.to_string_lossy() }),
      BuildStep::Select { selection, .. } => serde_json::to_value(selection)?,
      BuildStep::Transform {
        transformer, options, ..
      } => json!({
        "transformer": transformer.name(),
        "config": transformer.describe(),
        "options": options,
      }),
      BuildStep::Merge { .. } => serde_json::Value::Null,
      BuildStep::Concat { spec, .. } => serde_json::to_value(spec)?,
      BuildStep::Relocate { spec, .. } => serde_json::to_value(spec)?,
      BuildStep::Minify { minifier, options, .. } => json!({
        "minifier": minifier.name(),
        "options": options,
      }),
    })
  }
}

/// Immutable description of one lazy transformation step.
///
/// Nodes never touch the filesystem; an executor such as
/// [`materialize`](crate::execute::materialize) evaluates them later.
#[derive(Debug)]
pub struct BuildNode {
  id: NodeId,
  annotation: Option<String>,
  step: BuildStep,
}

impl BuildNode {
  pub fn new(step: BuildStep) -> Node {
    Arc::new(Self {
      id: NodeId::next(),
      annotation: None,
      step,
    })
  }

  pub fn annotated(step: BuildStep, annotation: impl Into<String>) -> Node {
    Arc::new(Self {
      id: NodeId::next(),
      annotation: Some(annotation.into()),
      step,
    })
  }

  /// A new node performing the same step under a different annotation.
  pub fn relabel(&self, annotation: impl Into<String>) -> Node {
    Self::annotated(self.step.clone(), annotation)
  }

  pub fn source(root: impl Into<PathBuf>) -> Node {
    Self::new(BuildStep::Source { root: root.into() })
  }

  pub fn select(input: &Node, selection: Selection) -> Node {
    Self::new(BuildStep::Select {
      input: input.clone(),
      selection,
    })
  }

  pub fn transform(input: &Node, transformer: Arc<dyn Transformer>, options: TransformOptions) -> Node {
    Self::new(BuildStep::Transform {
      input: input.clone(),
      transformer,
      options,
    })
  }

  pub fn merge(inputs: Vec<Node>) -> Node {
    Self::new(BuildStep::Merge { inputs })
  }

  pub fn concat(input: &Node, spec: ConcatSpec) -> Node {
    Self::new(BuildStep::Concat {
      input: input.clone(),
      spec,
    })
  }

  pub fn relocate(input: &Node, spec: RelocateSpec) -> Node {
    Self::new(BuildStep::Relocate {
      input: input.clone(),
      spec,
    })
  }

  pub fn id(&self) -> NodeId {
    self.id
  }

  pub fn annotation(&self) -> Option<&str> {
    self.annotation.as_deref()
  }

  pub fn step(&self) -> &BuildStep {
    &self.step
  }

  pub fn inputs(&self) -> Vec<&Node> {
    self.step.inputs()
  }

  /// Annotation if present, otherwise the step kind.
  pub fn label(&self) -> &str {
    self.annotation.as_deref().unwrap_or(self.step.kind())
  }

  /// Structural hash of this node and everything it depends on.
  ///
  /// Annotations and node ids are excluded, so identically configured graphs
  /// built independently share a fingerprint.
  pub fn fingerprint(&self) -> Result<Fingerprint, HashError> {
    self.fingerprint_with(&mut HashMap::new())
  }

  pub(crate) fn fingerprint_with(&self, seen: &mut HashMap<NodeId, Fingerprint>) -> Result<Fingerprint, HashError> {
    if let Some(hash) = seen.get(&self.id) {
      return Ok(hash.clone());
    }

    let inputs = self
      .inputs()
      .into_iter()
      .map(|input| input.fingerprint_with(seen))
      .collect::<Result<Vec<_>, _>>()?;

    let hash = NodeDescriptor {
      kind: self.step.kind(),
      params: self.step.params()?,
      inputs,
    }
    .compute_hash()?;

    seen.insert(self.id, hash.clone());
    Ok(hash)
  }
}

impl std::fmt::Display for BuildNode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {}", self.id, self.label())
  }
}

#[derive(Serialize)]
struct NodeDescriptor {
  kind: &'static str,
  params: serde_json::Value,
  inputs: Vec<Fingerprint>,
}

impl Hashable for NodeDescriptor {}
