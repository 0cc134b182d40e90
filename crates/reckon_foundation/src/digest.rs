//! Stable content identifiers for generated blank nodes.

use sha2::{Digest, Sha256};

/// Hashes `parts` into a 64-bit identifier rendered as 16 hex digits.
///
/// Each part is length-prefixed, so `["ab", "c"]` and `["a", "bc"]` differ.
/// The result depends only on the bytes, never on the process or platform.
#[must_use]
pub fn content_id<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut hasher = Sha256::new();
    for part in parts {
        let bytes = part.as_ref().as_bytes();
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(bytes);
    }
    let hash = hasher.finalize();
    let mut prefix = [0_u8; 8];
    prefix.copy_from_slice(&hash[..8]);
    format!("{:016x}", u64::from_be_bytes(prefix))
}
