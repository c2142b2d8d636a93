//! Implementation of the `assetpack inspect` command.
//!
//! Prints the packaging graph in evaluation order without touching the
//! output directory.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use assetpack_lib::Packager;
use assetpack_lib::node::NodeGraph;

use super::{input_root, load_config};
use crate::output::{print_graph_header, short_hash, symbols};

pub fn cmd_inspect(config: &Path, input: &Path, dot: bool) -> Result<()> {
  let config = load_config(config)?;
  let name = config.name.clone();
  let packager = Packager::new(config);

  let node = packager
    .package_styles(input_root(input))
    .with_context(|| format!("Failed to package styles for {}", name))?;
  let graph = NodeGraph::from_root(&node);

  if dot {
    println!("{}", graph.to_dot());
    return Ok(());
  }

  print_graph_header(&format!("{} ({} nodes)", node.label(), graph.len()));
  for step in graph.topological().context("Packaging graph is not acyclic")? {
    let fingerprint = step.fingerprint().context("Failed to fingerprint node")?;
    let inputs: Vec<String> = step.inputs().iter().map(|input| input.id().to_string()).collect();
    println!(
      "  {} {} {} {}",
      step.id().to_string().if_supports_color(Stream::Stdout, |s| s.dimmed()),
      step.label(),
      short_hash(&fingerprint).if_supports_color(Stream::Stdout, |s| s.cyan()),
      if inputs.is_empty() {
        String::new()
      } else {
        format!("{} {}", symbols::INPUTS, inputs.join(", "))
      }
    );
  }

  Ok(())
}
