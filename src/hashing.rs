//! Deterministic hashing helpers.
//!
//! The hashing data structures in the standard library are randomly seeded, which would make the
//! iteration order of any map we keep differ from run to run. We use `rustc_hash` maps instead and
//! `xxh3` for the one place a stable string hash is needed: deriving a per-stream seed offset in
//! `crate::random`.

use xxhash_rust::xxh3::xxh3_64;

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

/// A convenience method to compute the hash of a `&str`.
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_strings() {
        let a = hash_str("ExposureRng");
        let b = hash_str("ExposureRng");
        let c = hash_str("SeverityRng");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
