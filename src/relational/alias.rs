//! Deterministic join aliases.
//!
//! An alias is `t{salt}_{hash}_{table}` where `hash` is a hex prefix of
//! `sha256(salt ␟ prefix)`. The same salt and path prefix always map to the same
//! alias, so structurally identical paths share one join; a different salt gives a
//! different alias and therefore an independent join.

use sha2::{Digest, Sha256};

const UNIT_SEPARATOR: u8 = 0x1f;

/// Alias of the entity reached by walking `prefix` (with `salt`) and landing in `table`.
pub fn join_alias<S: AsRef<str>>(salt: &str, prefix: &[S], table: &str, hash_length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update([UNIT_SEPARATOR]);
    for (i, segment) in prefix.iter().enumerate() {
        if i > 0 {
            hasher.update(b".");
        }
        hasher.update(segment.as_ref().as_bytes());
    }
    let digest = hex::encode(hasher.finalize());
    let hash = &digest[..hash_length.min(digest.len())];

    format!("t{}_{}_{}", salt, hash, sanitize(table))
}

/// Keep table names usable inside an identifier (`schema.table` -> `schema_table`).
fn sanitize(table: &str) -> String {
    table
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
