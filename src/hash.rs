//! BLAKE3 hashing utilities for scratch workspace naming

use std::path::Path;

use blake3::Hasher;

/// Number of hex characters kept from the digest
const SHORT_HASH_LEN: usize = 12;

/// Short, stable hash of a project root.
///
/// Used as part of the scratch workspace prefix so a leftover directory can be
/// traced back to the project that created it.
pub fn short_path_hash(path: &Path) -> String {
    let mut hasher = Hasher::new();
    hasher.update(path.as_os_str().as_encoded_bytes());
    let hex = hasher.finalize().to_hex();
    hex[..SHORT_HASH_LEN].to_string()
}
