//! Database access layer: one repository module per domain entity, plus
//! pool creation. Callers reach entity operations through the module path
//! (e.g. `db::post_repo::find_by_id`) rather than a blanket re-export,
//! since several repositories share operation names like `create`.

pub mod bookmark_repo;
pub mod comment_like_repo;
pub mod comment_repo;
pub mod post_repo;
pub mod vote_repo;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Create database connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}
