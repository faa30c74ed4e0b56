//! Social Service Library
//!
//! Hosts the Comments core when the platform is deployed in
//! `DEPLOYMENT_MODE=microservices`: reply threading, the like toggle, and
//! the `CommentCounter` side of the cross-service adapter pair. Talks back
//! to `content-service`'s `PostStatsUpdater` over HMAC-signed HTTP rather
//! than in-process, since the two are independently deployed processes in
//! this mode.
//!
//! # Modules
//!
//! - `handlers`: Comments HTTP request handlers
//! - `models`: Comment + UserContext data structures
//! - `services`: Comment business logic
//! - `db`: Comment/CommentLike repositories
//! - `middleware`: JWT auth and HMAC service-to-service verification
//! - `error`: Error types and handling
//! - `config`: Configuration management
//! - `metrics`: Observability and metrics collection
//! - `cursor`: Opaque pagination cursor encoding, scoped to comments
//! - `openapi`: Swagger/OpenAPI documentation
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
