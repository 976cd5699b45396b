//! Stable hex digests for cache keys and content fingerprints.

// crates.io
use sha2::{Digest, Sha256};

/// Returns the lower-case hex SHA-256 digest of `message`'s UTF-8 bytes.
pub fn sha256_hex(message: &str) -> String {
	hex::encode(Sha256::digest(message.as_bytes()))
}
