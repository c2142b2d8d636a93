//! Pure tree operations backing the non-I/O build steps.

use crate::node::{ConcatSpec, RelocateSpec, Selection};
use crate::tree::{FileTree, join_path};

use super::types::MaterializeError;

pub fn select(tree: FileTree, selection: &Selection) -> FileTree {
  let mut out = FileTree::new();
  for (path, contents) in tree {
    if let Some(rel) = selection.matches(&path) {
      out.insert(rel, contents);
    }
  }
  out
}

/// Union of `inputs`. A path present in more than one input is a conflict.
pub fn merge(inputs: Vec<FileTree>) -> Result<FileTree, MaterializeError> {
  let mut out = FileTree::new();
  for tree in inputs {
    for (path, contents) in tree {
      if out.contains(&path) {
        return Err(MaterializeError::Conflict { path });
      }
      out.insert(path, contents);
    }
  }
  Ok(out)
}

/// Concatenate headers (in declared order) and then included files (in path
/// order) into the single file `spec.output`. Missing headers are skipped.
pub fn concat(tree: &FileTree, spec: &ConcatSpec) -> FileTree {
  let mut parts: Vec<&[u8]> = spec.headers.iter().filter_map(|header| tree.get(header)).collect();

  if let Some(include) = &spec.include {
    parts.extend(
      tree
        .iter()
        .filter(|(path, _)| include.matches(path).is_some() && !spec.headers.iter().any(|h| h.as_str() == *path))
        .map(|(_, contents)| contents),
    );
  }

  let mut joined = Vec::new();
  for (idx, part) in parts.iter().enumerate() {
    if idx > 0 {
      joined.extend_from_slice(spec.separator.as_bytes());
    }
    joined.extend_from_slice(part);
  }

  let mut out = FileTree::new();
  out.insert(spec.output.clone(), joined);
  out
}

/// Move sub-target files onto their mapped paths and everything else under
/// `dest_dir`.
///
/// Files a transformer already wrote to a physical output location (a mapped
/// path, or anywhere under `dest_dir`) keep their path.
pub fn relocate(tree: FileTree, spec: &RelocateSpec) -> Result<FileTree, MaterializeError> {
  let mut out = FileTree::new();
  for (path, contents) in tree {
    let dest = match spec.mappings.get(&path) {
      Some(mapped) => mapped.clone(),
      None if is_placed(&path, spec) => path,
      None => join_path(&spec.dest_dir, &path),
    };
    if out.contains(&dest) {
      return Err(MaterializeError::Conflict { path: dest });
    }
    out.insert(dest, contents);
  }
  Ok(out)
}

fn is_placed(path: &str, spec: &RelocateSpec) -> bool {
  if spec.mappings.values().any(|mapped| mapped == path) {
    return true;
  }
  let dest_dir = spec.dest_dir.trim_end_matches('/');
  !dest_dir.is_empty()
    && path
      .strip_prefix(dest_dir)
      .is_some_and(|rest| rest.starts_with('/'))
}
