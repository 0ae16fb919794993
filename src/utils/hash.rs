//! Content hashing of uploaded files

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the raw uploaded bytes.
///
/// Hashing the bytes rather than the parsed content means a re-upload of
/// identical content is rejected even after a parser change.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
