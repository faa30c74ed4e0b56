//! Content Service Library
//!
//! Posts, comments, and votes for the social platform core, with
//! cross-service consistency against a co-hosted or remote comments core
//! via HMAC-signed adapters.
//!
//! # Modules
//!
//! - `handlers`: Posts/Comments/Votes HTTP request handlers
//! - `models`: Data structures for posts, comments, and votes
//! - `services`: Business logic layer
//! - `db`: Database access layer and repositories
//! - `cache`: Content caching and tagged invalidation
//! - `middleware`: JWT auth and HMAC service-to-service verification
//! - `error`: Error types and handling
//! - `config`: Configuration management
//! - `metrics`: Observability and metrics collection
//! - `cursor`: Opaque pagination cursor encoding
pub mod cache;
pub mod config;
pub mod cursor;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
