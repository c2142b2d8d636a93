mod inspect;
mod package;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use assetpack_lib::PackagerConfig;

pub use inspect::cmd_inspect;
pub use package::cmd_package;

fn load_config(path: &Path) -> Result<PackagerConfig> {
  PackagerConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

/// Canonical input root, so equivalent spellings share one cache key.
fn input_root(input: &Path) -> PathBuf {
  dunce::canonicalize(input).unwrap_or_else(|_| input.to_path_buf())
}
