//! Deterministic cache key generation.
//!
//! Key format: `{operation}:{hash}` where `operation` is one of `query`,
//! `cursor`, `search`. The hash is a SHA-256 digest over the operation's
//! parameters, sorted by key so that the same parameters in any order
//! produce the same key.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Build the canonical `operation:hash` cache key for a set of parameters.
///
/// `params` is order-independent: callers may build it in any order and
/// still land on the same key, because it's sorted internally before
/// hashing.
pub fn generate_hash_key(operation: &str, params: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in params {
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
        hasher.update(b"&");
    }
    let digest = hasher.finalize();
    format!("{}:{}", operation, hex::encode(digest))
}

/// Extract the operation prefix from a generated key, for metrics labeling.
pub fn operation_of(key: &str) -> Option<&str> {
    key.split(':').next().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn same_params_same_key() {
        let a = generate_hash_key("query", &params(&[("userId", "u1"), ("limit", "10")]));
        let b = generate_hash_key("query", &params(&[("limit", "10"), ("userId", "u1")]));
        assert_eq!(a, b, "param order must not affect the resulting key");
    }

    #[test]
    fn different_params_different_key() {
        let a = generate_hash_key("query", &params(&[("userId", "u1")]));
        let b = generate_hash_key("query", &params(&[("userId", "u2")]));
        assert_ne!(a, b);
    }

    #[test]
    fn key_carries_operation_prefix() {
        let key = generate_hash_key("cursor", &params(&[("postId", "p1")]));
        assert!(key.starts_with("cursor:"));
        assert_eq!(operation_of(&key), Some("cursor"));
    }

    #[test]
    fn operation_of_rejects_empty() {
        assert_eq!(operation_of(""), None);
    }
}
