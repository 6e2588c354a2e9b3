//! SHA-256 content digests
//!
//! One canonical digest format (`sha256:<hex>`) is used for every change
//! comparison the engine makes, so rendered text can be checked against a
//! file on disk without re-reading either into a common form.

use sha2::{Digest, Sha256};
use std::path::Path;

const PREFIX: &str = "sha256:";

/// Digest of rendered text, in the canonical `"sha256:<hex>"` format.
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Digest of a file's bytes, in the canonical `"sha256:<hex>"` format.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn file_digest(path: &Path) -> crate::Result<String> {
    let content = std::fs::read(path).map_err(|e| crate::Error::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{}{:x}", PREFIX, hasher.finalize()))
}
