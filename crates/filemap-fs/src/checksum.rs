//! SHA-256 checksum utilities
//!
//! Provides the canonical checksum format (`sha256:<hex>`) the engine uses to
//! tell whether re-serialized content differs from what was read at load.

use sha2::{Digest, Sha256};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of raw bytes as `"sha256:<hex>"`.
pub fn compute_checksum(bytes: &[u8]) -> String {
    format!("{}{:x}", PREFIX, Sha256::digest(bytes))
}

/// Compute the SHA-256 checksum of string content as `"sha256:<hex>"`.
pub fn compute_content_checksum(content: &str) -> String {
    compute_checksum(content.as_bytes())
}
