//! Implementation of the `assetpack package` command.
//!
//! Builds the packaged styles node for the input directory and materializes
//! it into the output directory.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use assetpack_lib::Packager;
use assetpack_lib::execute::{materialize, write_tree};

use super::{input_root, load_config};
use crate::output::{OutputFormat, format_duration, print_json, print_packaged, print_stat, print_written, short_hash};

#[derive(Debug, Serialize)]
struct PackageOutput {
  name: String,
  node: String,
  fingerprint: String,
  content_hash: String,
  files: Vec<PackagedFile>,
}

#[derive(Debug, Serialize)]
struct PackagedFile {
  path: String,
  bytes: usize,
  sha256: String,
}

pub fn cmd_package(config: &Path, input: &Path, out_dir: &Path, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let config = load_config(config)?;
  let name = config.name.clone();
  let packager = Packager::new(config);

  let root = input_root(input);
  let node = packager
    .package_styles(&root)
    .with_context(|| format!("Failed to package styles for {}", name))?;
  let fingerprint = node.fingerprint().context("Failed to fingerprint packaged node")?;
  info!(node = %node, fingerprint = %fingerprint, "packaged styles node");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let tree = rt
    .block_on(materialize(&node))
    .with_context(|| format!("Failed to materialize {}", node))?;
  let written = rt
    .block_on(write_tree(&tree, out_dir))
    .with_context(|| format!("Failed to write packaged styles to {}", out_dir.display()))?;

  if output.is_json() {
    print_json(&PackageOutput {
      name,
      node: node.to_string(),
      fingerprint: fingerprint.to_string(),
      content_hash: tree.content_hash().to_string(),
      files: written
        .iter()
        .map(|f| PackagedFile {
          path: f.path.clone(),
          bytes: f.bytes,
          sha256: f.hash.to_string(),
        })
        .collect(),
    })?;
  } else {
    let width = written.iter().map(|f| f.path.len()).max().unwrap_or(0);
    for file in &written {
      print_written(file, width);
    }
    println!();
    print_packaged(&format!("Packaged {} file(s) for {}", written.len(), name));
    print_stat("Fingerprint", &fingerprint.to_string());
    print_stat("Content", &short_hash(&tree.content_hash()));
    print_stat("Duration", &format_duration(start.elapsed()));
  }

  Ok(())
}
