//! Content hashing for stable object ids.

use sha2::{Digest, Sha256};

/// Prefix of ids derived from element lines.
pub const DERIVED_ID_PREFIX: &str = "satellite-";

/// Hex-encoded SHA-256 of `content`.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stable id for an element set submitted without one: `satellite-`
/// followed by the first 16 hex digits of the hash of both lines.
pub fn derive_object_id(line1: &str, line2: &str) -> String {
    let digest = calculate_checksum(&format!("{}{}", line1.trim(), line2.trim()));
    format!("{}{}", DERIVED_ID_PREFIX, &digest[..16])
}
