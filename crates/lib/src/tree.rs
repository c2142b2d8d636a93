//! Materialized file sets.
//!
//! A [`FileTree`] is what a [`BuildNode`](crate::node::BuildNode) evaluates to:
//! a sorted map from `/`-separated relative paths to file contents. Nodes only
//! describe how a tree will be produced; trees exist only during
//! materialization.

use std::collections::BTreeMap;

use crate::util::hash::{ContentHash, hash_bytes};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
  files: BTreeMap<String, Vec<u8>>,
}

impl FileTree {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a file, returning the previous contents if the path was taken.
  pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<Vec<u8>>) -> Option<Vec<u8>> {
    self.files.insert(path.into(), contents.into())
  }

  pub fn get(&self, path: &str) -> Option<&[u8]> {
    self.files.get(path).map(Vec::as_slice)
  }

  /// Contents of `path` as UTF-8, or `None` if absent or not valid UTF-8.
  pub fn get_str(&self, path: &str) -> Option<&str> {
    self.get(path).and_then(|bytes| std::str::from_utf8(bytes).ok())
  }

  pub fn contains(&self, path: &str) -> bool {
    self.files.contains_key(path)
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  /// Paths in sorted order.
  pub fn paths(&self) -> impl Iterator<Item = &str> {
    self.files.keys().map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
    self.files.iter().map(|(path, contents)| (path.as_str(), contents.as_slice()))
  }

  /// Hash of every path and its contents, in path order.
  pub fn content_hash(&self) -> ContentHash {
    let mut buf = Vec::new();
    for (path, contents) in &self.files {
      buf.extend_from_slice(path.as_bytes());
      buf.push(0);
      buf.extend_from_slice(hash_bytes(contents).0.as_bytes());
      buf.push(b'\n');
    }
    hash_bytes(&buf)
  }
}

impl IntoIterator for FileTree {
  type Item = (String, Vec<u8>);
  type IntoIter = std::collections::btree_map::IntoIter<String, Vec<u8>>;

  fn into_iter(self) -> Self::IntoIter {
    self.files.into_iter()
  }
}

impl<P: Into<String>, C: Into<Vec<u8>>> FromIterator<(P, C)> for FileTree {
  fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
    Self {
      files: iter.into_iter().map(|(p, c)| (p.into(), c.into())).collect(),
    }
  }
}

/// Extension of the file named by `path`, without the leading dot.
///
/// Dotfiles such as `.keep` have no extension.
pub fn extension_of(path: &str) -> Option<&str> {
  let file_name = path.rsplit('/').next().unwrap_or(path);
  match file_name.rfind('.') {
    Some(0) | None => None,
    Some(idx) => Some(&file_name[idx + 1..]),
  }
}

/// Replace the extension of `path` (or append one if it has none).
pub fn with_extension(path: &str, extension: &str) -> String {
  match extension_of(path) {
    Some(current) => format!("{}{}", &path[..path.len() - current.len()], extension),
    None => format!("{}.{}", path, extension),
  }
}

/// Join a directory and a relative path. An empty directory is the root.
pub fn join_path(dir: &str, rel: &str) -> String {
  if dir.is_empty() {
    rel.to_string()
  } else {
    format!("{}/{}", dir.trim_end_matches('/'), rel)
  }
}

/// Parent directory of `path`, or `""` for top-level files.
pub fn parent_dir(path: &str) -> &str {
  path.rfind('/').map(|idx| &path[..idx]).unwrap_or("")
}

/// Lexically normalize a relative path: strips leading `/`, drops `.` and
/// empty segments, and resolves `..` against preceding segments.
///
/// Returns `None` if `..` would climb above the root.
pub fn normalize_path(path: &str) -> Option<String> {
  let mut segments: Vec<&str> = Vec::new();
  for segment in path.split('/') {
    match segment {
      "" | "." => {}
      ".." => {
        segments.pop()?;
      }
      other => segments.push(other),
    }
  }
  Some(segments.join("/"))
}
