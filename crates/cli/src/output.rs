//! Terminal rendering for `assetpack` commands.

use std::fmt::Display;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use assetpack_lib::execute::WrittenFile;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const PACKAGED: &str = "✓";
  pub const GRAPH: &str = "•";
  pub const INPUTS: &str = "←";
}

/// Digits of a fingerprint or content hash shown in text output.
const SHORT_HASH_LEN: usize = 8;

/// Leading digits of a hex digest.
pub fn short_hash(hash: &impl Display) -> String {
  hash.to_string().chars().take(SHORT_HASH_LEN).collect()
}

/// Output file sizes, in whole bytes below 1 KiB.
pub fn format_size(bytes: usize) -> String {
  const KIB: f64 = 1024.0;

  match bytes {
    0..1024 => format!("{} B", bytes),
    1024..1_048_576 => format!("{:.1} KiB", bytes as f64 / KIB),
    _ => format!("{:.1} MiB", bytes as f64 / (KIB * KIB)),
  }
}

/// Millisecond-precision duration, e.g. `1s 250ms`.
pub fn format_duration(duration: Duration) -> String {
  let millis = Duration::from_millis(duration.as_millis() as u64);
  if millis.is_zero() {
    return "0ms".to_string();
  }
  humantime::format_duration(millis).to_string()
}

/// One written output file: path, size and short content hash.
pub fn print_written(file: &WrittenFile, path_width: usize) {
  println!(
    "  {:<width$}  {:>10}  {}",
    file.path,
    format_size(file.bytes),
    short_hash(&file.hash).if_supports_color(Stream::Stdout, |s| s.dimmed()),
    width = path_width
  );
}

pub fn print_packaged(message: &str) {
  println!(
    "{} {}",
    symbols::PACKAGED.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_graph_header(message: &str) {
  println!(
    "{} {}",
    symbols::GRAPH.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
  println!("{}", json);
  Ok(())
}
