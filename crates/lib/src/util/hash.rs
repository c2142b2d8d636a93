//! Hashing utilities for node fingerprints and output verification.
//!
//! This module provides:
//! - `Fingerprint`: A truncated 20-character hash identifying a graph description
//! - `ContentHash`: A full 64-character hash for materialized content
//! - `hash_bytes()`: Arbitrary byte hashing

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::consts::FINGERPRINT_LEN;

pub type HashError = serde_json::Error;

/// A hash identifying the structure of a build node and all of its inputs.
///
/// The hash is a 20-character truncated SHA-256 of the JSON-serialized
/// descriptor. Two packagers configured identically produce nodes with equal
/// fingerprints even though the nodes themselves are distinct allocations.
///
/// # Format
///
/// The hash is a lowercase hexadecimal string, e.g., `"a1b2c3d4e5f6789012ab"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl std::fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

pub trait Hashable: Serialize {
  fn compute_hash(&self) -> Result<Fingerprint, HashError> {
    let serialized = serde_json::to_string(self)?;
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    let full = format!("{:x}", hasher.finalize());
    Ok(Fingerprint(full[..FINGERPRINT_LEN].to_string()))
  }
}

/// A full 64-character SHA256 hash for content verification.
///
/// Unlike `Fingerprint`, which describes *how* output will be produced,
/// `ContentHash` describes *what* was produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl std::fmt::Display for ContentHash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Hash arbitrary bytes.
///
/// Returns the full 64-character SHA256 hash.
pub fn hash_bytes(data: &[u8]) -> ContentHash {
  let mut hasher = Sha256::new();
  hasher.update(data);
  ContentHash(format!("{:x}", hasher.finalize()))
}
