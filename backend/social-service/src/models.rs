//! Data models for the Comments core hosted by this service.
//!
//! A second copy of `Comment`/`UserContext`, deliberately not shared via a
//! library crate with `content-service` — each service owns its own domain
//! types against its own connection pool so either can be deployed and
//! scaled independently (matching the teacher monorepo's existing pattern
//! of per-service domain duplication, e.g. `comment_likes` row shapes
//! previously duplicated between feed-facing and content-facing services).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A comment on a post, optionally a reply to another comment.
///
/// A comment with `parent_comment_id = NULL` is a *root comment* and is the
/// only kind that contributes to the owning post's `comment_counter` on
/// `content-service`'s side — this service never stores that counter
/// itself, it only drives it via `PostStatsUpdater`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub owner_user_id: Uuid,
    pub owner_display_name: String,
    pub owner_avatar: String,
    pub text: String,
    pub parent_comment_id: Option<Uuid>,
    pub score: i64,
    pub reply_count: i64,
    pub deleted: bool,
    pub deleted_date: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_comment_id.is_none()
    }
}

/// The authenticated caller's identity, injected by the auth gate into
/// every request context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
    pub display_name: String,
    pub avatar: String,
    pub social_name: String,
    pub system_role: String,
}
