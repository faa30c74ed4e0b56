//! JWT verification and content hashing shared by every service.

// RS256 JWT signing and verification
pub mod jwt;

// Content hashing helpers
pub mod hash;

// HMAC-SHA256 service-to-service request signing
pub mod hmac;
