//! HMAC-SHA256 signing and verification for service-to-service requests.
//!
//! The canonical string signed is:
//!
//! ```text
//! METHOD\nPATH\nQUERY\nSHA256(BODY)_HEX\nUID\nTIMESTAMP
//! ```
//!
//! The signature travels in the `X-Telar-Signature` header alongside the
//! caller's `uid` and `X-Timestamp`. Verification rejects requests whose
//! timestamp falls outside the allowed clock-skew window.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum HmacError {
    #[error("invalid secret key length")]
    InvalidKeyLength,
    #[error("timestamp outside allowed clock skew")]
    ClockSkew,
    #[error("signature mismatch")]
    Mismatch,
    #[error("timestamp header is not a valid integer")]
    InvalidTimestamp,
}

/// Builds the canonical string that gets signed/verified.
pub fn canonical_string(
    method: &str,
    path: &str,
    query: &str,
    body_sha256_hex: &str,
    uid: &str,
    timestamp: &str,
) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.to_uppercase(),
        path,
        query,
        body_sha256_hex,
        uid,
        timestamp
    )
}

/// Computes the hex-encoded HMAC-SHA256 signature of `canonical`.
pub fn sign(secret: &[u8], canonical: &str) -> Result<String, HmacError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| HmacError::InvalidKeyLength)?;
    mac.update(canonical.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies `signature_hex` against `canonical` using constant-time
/// comparison, and checks `timestamp` falls within `max_skew_seconds` of
/// `now`.
pub fn verify(
    secret: &[u8],
    canonical: &str,
    signature_hex: &str,
    timestamp: i64,
    now: i64,
    max_skew_seconds: i64,
) -> Result<(), HmacError> {
    if (now - timestamp).abs() > max_skew_seconds {
        return Err(HmacError::ClockSkew);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| HmacError::InvalidKeyLength)?;
    mac.update(canonical.as_bytes());
    let expected = hex::decode(signature_hex).map_err(|_| HmacError::Mismatch)?;
    mac.verify_slice(&expected).map_err(|_| HmacError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_succeeds() {
        let secret = b"test-secret";
        let canonical = canonical_string("POST", "/api/v1/posts/actions/score", "", "abc123", "u-1", "1000");
        let sig = sign(secret, &canonical).unwrap();
        assert!(verify(secret, &canonical, &sig, 1000, 1005, 300).is_ok());
    }

    #[test]
    fn verify_rejects_tampered_signature() {
        let secret = b"test-secret";
        let canonical = canonical_string("POST", "/x", "", "abc", "u-1", "1000");
        let sig = sign(secret, &canonical).unwrap();
        let mut tampered = sig.clone();
        tampered.replace_range(0..2, "ff");
        assert!(matches!(
            verify(secret, &canonical, &tampered, 1000, 1000, 300),
            Err(HmacError::Mismatch)
        ));
    }

    #[test]
    fn verify_rejects_outside_clock_skew() {
        let secret = b"test-secret";
        let canonical = canonical_string("POST", "/x", "", "abc", "u-1", "1000");
        let sig = sign(secret, &canonical).unwrap();
        assert!(matches!(
            verify(secret, &canonical, &sig, 1000, 1400, 300),
            Err(HmacError::ClockSkew)
        ));
    }
}
