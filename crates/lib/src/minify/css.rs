//! Whitespace- and comment-stripping CSS minifier.
//!
//! The minifier is deliberately conservative: it never reorders or merges
//! rules, and only removes whitespace where CSS grammar makes it
//! insignificant. Strings are copied byte for byte and `/*! ... */` comments
//! survive.

use tracing::trace;

use super::{Minifier, MinifyError, MinifyOptions};
use crate::tree::{FileTree, join_path, normalize_path, parent_dir};

#[derive(Debug, Clone, Copy, Default)]
pub struct CssMinifier;

impl Minifier for CssMinifier {
  fn name(&self) -> &str {
    "css"
  }

  fn extensions(&self) -> &[&str] {
    &["css"]
  }

  fn minify(&self, path: &str, tree: &FileTree, options: &MinifyOptions) -> Result<String, MinifyError> {
    let mut stack = vec![path.to_string()];
    minify_file(path, tree, options, &mut stack)
  }
}

fn minify_file(path: &str, tree: &FileTree, options: &MinifyOptions, stack: &mut Vec<String>) -> Result<String, MinifyError> {
  let bytes = tree
    .get(path)
    .ok_or_else(|| MinifyError::new(path, "file not found in merged output"))?;
  let source = std::str::from_utf8(bytes).map_err(|e| MinifyError::new(path, format!("invalid UTF-8: {}", e)))?;

  let minified = minify_css(path, source)?;
  if options.process_import {
    inline_imports(path, &minified, tree, options, stack)
  } else {
    Ok(minified)
  }
}

/// Characters after which whitespace never matters.
const NO_SPACE_AFTER: &[char] = &['{', '}', ';', ',', '>', ':', '('];
/// Characters before which whitespace never matters.
const NO_SPACE_BEFORE: &[char] = &['{', '}', ';', ',', '>', ')'];

/// Minify a single stylesheet.
pub fn minify_css(path: &str, source: &str) -> Result<String, MinifyError> {
  let mut out = String::with_capacity(source.len());
  let mut chars = source.chars().peekable();
  let mut depth = 0usize;
  let mut pending_space = false;

  while let Some(c) = chars.next() {
    match c {
      '/' if chars.peek() == Some(&'*') => {
        chars.next();
        let keep = chars.peek() == Some(&'!');
        let mut comment = String::from("/*");
        let mut prev = '\0';
        let mut closed = false;
        for c in chars.by_ref() {
          comment.push(c);
          if prev == '*' && c == '/' {
            closed = true;
            break;
          }
          prev = c;
        }
        if !closed {
          return Err(MinifyError::new(path, "unterminated comment"));
        }
        if keep {
          flush_space(&mut out, &mut pending_space, '/');
          out.push_str(&comment);
        } else {
          pending_space = true;
        }
      }
      '"' | '\'' => {
        flush_space(&mut out, &mut pending_space, c);
        out.push(c);
        loop {
          match chars.next() {
            None | Some('\n') => return Err(MinifyError::new(path, "unterminated string")),
            Some('\\') => {
              out.push('\\');
              if let Some(escaped) = chars.next() {
                out.push(escaped);
              }
            }
            Some(q) if q == c => {
              out.push(q);
              break;
            }
            Some(other) => out.push(other),
          }
        }
      }
      c if c.is_whitespace() => pending_space = true,
      _ => {
        flush_space(&mut out, &mut pending_space, c);
        match c {
          '{' => depth += 1,
          '}' => {
            depth = depth
              .checked_sub(1)
              .ok_or_else(|| MinifyError::new(path, "unexpected `}`"))?;
            if out.ends_with(';') {
              out.pop();
            }
          }
          _ => {}
        }
        out.push(c);
      }
    }
  }

  if depth > 0 {
    return Err(MinifyError::new(path, format!("{} unclosed block(s)", depth)));
  }

  Ok(out)
}

fn flush_space(out: &mut String, pending: &mut bool, next: char) {
  if !*pending {
    return;
  }
  *pending = false;
  match out.chars().last() {
    None => {}
    Some(prev) if NO_SPACE_AFTER.contains(&prev) || NO_SPACE_BEFORE.contains(&next) => {}
    Some(_) => out.push(' '),
  }
}

/// Replace top-level `@import`s of files present in `tree` with their
/// minified contents. Imports that cannot be inlined are kept verbatim.
fn inline_imports(
  path: &str,
  css: &str,
  tree: &FileTree,
  options: &MinifyOptions,
  stack: &mut Vec<String>,
) -> Result<String, MinifyError> {
  let bytes = css.as_bytes();
  let mut out = String::with_capacity(css.len());
  let mut depth = 0usize;
  let mut i = 0;
  let mut statement_start = true;

  while i < bytes.len() {
    let b = bytes[i];

    if depth == 0 && statement_start && css[i..].starts_with("@import") {
      let end = statement_end(bytes, i);
      let statement = &css[i..end];
      match resolve_import(path, statement, tree, options, stack) {
        Some(target) => {
          trace!(from = path, import = %target, "inlining import");
          stack.push(target.clone());
          let inlined = minify_file(&target, tree, options, stack)?;
          stack.pop();
          out.push_str(&inlined);
        }
        None => {
          out.push_str(statement);
          if end < bytes.len() {
            out.push(';');
          }
        }
      }
      i = (end + 1).min(bytes.len());
      statement_start = true;
      continue;
    }

    match b {
      b'"' | b'\'' => {
        let close = skip_string(bytes, i);
        out.push_str(&css[i..close]);
        i = close;
        statement_start = false;
        continue;
      }
      b'{' => depth += 1,
      b'}' => depth = depth.saturating_sub(1),
      _ => {}
    }

    statement_start = matches!(b, b';' | b'}');
    let ch_len = utf8_len(b);
    out.push_str(&css[i..i + ch_len]);
    i += ch_len;
  }

  Ok(out)
}

/// Index of the `;` ending the statement starting at `start`, or the end of input.
fn statement_end(bytes: &[u8], start: usize) -> usize {
  let mut i = start;
  while i < bytes.len() {
    match bytes[i] {
      b'"' | b'\'' => i = skip_string(bytes, i),
      b';' => return i,
      _ => i += 1,
    }
  }
  bytes.len()
}

/// Index just past the string literal opening at `start`.
fn skip_string(bytes: &[u8], start: usize) -> usize {
  let quote = bytes[start];
  let mut i = start + 1;
  while i < bytes.len() {
    match bytes[i] {
      b'\\' => i += 2,
      b if b == quote => return i + 1,
      _ => i += 1,
    }
  }
  bytes.len()
}

fn utf8_len(first: u8) -> usize {
  match first {
    b if b < 0x80 => 1,
    b if b >= 0xF0 => 4,
    b if b >= 0xE0 => 3,
    _ => 2,
  }
}

/// Resolve the target of an `@import` statement to a path in `tree`.
///
/// Returns `None` for remote or media-qualified imports, missing targets,
/// and imports that would form a cycle.
fn resolve_import(
  path: &str,
  statement: &str,
  tree: &FileTree,
  options: &MinifyOptions,
  stack: &[String],
) -> Option<String> {
  let target = import_target(statement.strip_prefix("@import")?.trim())?;

  if target.contains("://") || target.starts_with("//") || target.starts_with("data:") {
    return None;
  }

  let base = match (&options.relative_to, target.starts_with('/')) {
    (_, true) => "",
    (Some(dir), false) => dir.as_str(),
    (None, false) => parent_dir(path),
  };
  let resolved = normalize_path(&join_path(base, target))?;

  if !tree.contains(&resolved) || stack.contains(&resolved) {
    return None;
  }
  Some(resolved)
}

/// The URL of `"x"`, `'x'`, `url(x)` or `url("x")`, provided nothing (such
/// as a media query) follows it.
fn import_target(rest: &str) -> Option<&str> {
  let (target, tail) = if let Some(inner) = rest.strip_prefix("url(") {
    let close = inner.find(')')?;
    let raw = inner[..close].trim();
    (unquote(raw).unwrap_or(raw), &inner[close + 1..])
  } else {
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let close = rest[1..].find(quote)? + 1;
    (&rest[1..close], &rest[close + 1..])
  };

  if tail.trim().is_empty() && !target.is_empty() {
    Some(target)
  } else {
    None
  }
}

fn unquote(s: &str) -> Option<&str> {
  let first = s.chars().next()?;
  if (first == '"' || first == '\'') && s.len() >= 2 && s.ends_with(first) {
    Some(&s[1..s.len() - 1])
  } else {
    None
  }
}
