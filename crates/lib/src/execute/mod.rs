//! Reference materializer.
//!
//! Evaluates a node graph into a [`FileTree`] and writes it to disk. Nodes
//! are evaluated once each in topological order; a node's tree is dropped as
//! soon as its last consumer has run. Source directories are read on the
//! blocking pool.

pub mod steps;
pub mod types;

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::minify::minify_tree;
use crate::node::{BuildStep, Node, NodeGraph, NodeId};
use crate::tree::{FileTree, normalize_path};
use crate::util::hash::hash_bytes;

pub use types::{MaterializeError, WrittenFile};

/// Evaluate `root` and everything it depends on.
pub async fn materialize(root: &Node) -> Result<FileTree, MaterializeError> {
  let graph = NodeGraph::from_root(root);
  let order = graph.topological()?;

  info!(root = %root, nodes = order.len(), "materializing node graph");

  // Consumers still waiting on each node's tree.
  let mut pending: HashMap<NodeId, usize> = HashMap::new();
  for node in &order {
    for input in node.inputs() {
      *pending.entry(input.id()).or_default() += 1;
    }
  }

  let mut evaluated: HashMap<NodeId, FileTree> = HashMap::new();
  for node in &order {
    let inputs = node
      .inputs()
      .into_iter()
      .map(|input| take_input(&mut evaluated, &mut pending, input.id()))
      .collect::<Result<Vec<_>, _>>()?;

    let tree = evaluate(node, inputs).await?;
    debug!(node = %node, files = tree.len(), "evaluated node");
    evaluated.insert(node.id(), tree);
  }

  evaluated
    .remove(&root.id())
    .ok_or(MaterializeError::MissingInput(root.id()))
}

fn take_input(
  evaluated: &mut HashMap<NodeId, FileTree>,
  pending: &mut HashMap<NodeId, usize>,
  id: NodeId,
) -> Result<FileTree, MaterializeError> {
  let remaining = pending.entry(id).or_default();
  *remaining = remaining.saturating_sub(1);

  let tree = if *remaining == 0 {
    evaluated.remove(&id)
  } else {
    evaluated.get(&id).cloned()
  };
  tree.ok_or(MaterializeError::MissingInput(id))
}

async fn evaluate(node: &Node, inputs: Vec<FileTree>) -> Result<FileTree, MaterializeError> {
  match node.step() {
    BuildStep::Source { root } => {
      let root = root.clone();
      tokio::task::spawn_blocking(move || read_source(&root)).await?
    }
    BuildStep::Select { selection, .. } => Ok(steps::select(single(inputs), selection)),
    BuildStep::Transform {
      transformer, options, ..
    } => transformer
      .apply(single(inputs), options)
      .map_err(|source| MaterializeError::Transform {
        transformer: transformer.name().to_string(),
        source,
      }),
    BuildStep::Merge { .. } => steps::merge(inputs),
    BuildStep::Concat { spec, .. } => Ok(steps::concat(&single(inputs), spec)),
    BuildStep::Relocate { spec, .. } => steps::relocate(single(inputs), spec),
    BuildStep::Minify {
      minifier, options, ..
    } => Ok(minify_tree(minifier.as_ref(), single(inputs), options)?),
  }
}

fn single(inputs: Vec<FileTree>) -> FileTree {
  inputs.into_iter().next().unwrap_or_default()
}

/// Every file under `root`, keyed by its `/`-separated relative path.
///
/// A missing root is an empty tree.
pub fn read_source(root: &Path) -> Result<FileTree, MaterializeError> {
  let mut tree = FileTree::new();
  if !root.exists() {
    debug!(root = %root.display(), "source root missing, treating as empty");
    return Ok(tree);
  }

  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry?;
    if !entry.file_type().is_file() {
      continue;
    }

    let path = entry.path();
    let rel = path
      .strip_prefix(root)
      .unwrap_or(path)
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/");
    let contents = std::fs::read(path).map_err(|e| MaterializeError::io(path, e))?;
    tree.insert(rel, contents);
  }

  Ok(tree)
}

/// Write every file of `tree` under `out_dir`, creating directories as needed.
pub async fn write_tree(tree: &FileTree, out_dir: &Path) -> Result<Vec<WrittenFile>, MaterializeError> {
  let mut written = Vec::with_capacity(tree.len());

  for (path, contents) in tree.iter() {
    let location = output_location(out_dir, path)?;
    if let Some(parent) = location.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| MaterializeError::io(parent, e))?;
    }
    tokio::fs::write(&location, contents)
      .await
      .map_err(|e| MaterializeError::io(&location, e))?;

    debug!(path, bytes = contents.len(), "wrote output file");
    written.push(WrittenFile {
      path: path.to_string(),
      location,
      bytes: contents.len(),
      hash: hash_bytes(contents),
    });
  }

  info!(files = written.len(), out_dir = %out_dir.display(), "wrote packaged output");
  Ok(written)
}

/// Materialize `root` and write the result under `out_dir`.
pub async fn materialize_to(root: &Node, out_dir: &Path) -> Result<Vec<WrittenFile>, MaterializeError> {
  let tree = materialize(root).await?;
  write_tree(&tree, out_dir).await
}

fn output_location(out_dir: &Path, path: &str) -> Result<PathBuf, MaterializeError> {
  let unsafe_path = || MaterializeError::UnsafePath { path: path.to_string() };

  let normalized = normalize_path(path).ok_or_else(unsafe_path)?;
  if normalized.is_empty() {
    return Err(unsafe_path());
  }

  let rel = PathBuf::from(normalized);
  if rel.components().any(|c| !matches!(c, Component::Normal(_))) {
    return Err(unsafe_path());
  }
  Ok(out_dir.join(rel))
}
