//! Data models shared by the posts, comments, and votes services.
//!
//! These are the wire/storage shapes for the core: `Post`, `Comment`, and
//! `Vote`. Query-shaping types (`PostFilter`, sort options) live alongside
//! them since the repository layer treats them as the sole interface
//! between service and storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

/// A social media post.
///
/// `id`, `owner_user_id`, and `created_date` are immutable after creation.
/// `deleted` is a soft-delete flag; a deleted post is excluded from list
/// queries unless the filter explicitly asks for it (see [`PostFilter`]).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub owner_display_name: String,
    pub owner_avatar: String,
    pub post_type_id: i32,
    pub body: String,
    pub tags: Vec<String>,
    pub score: i64,
    pub view_count: i64,
    pub comment_counter: i64,
    pub image: Option<String>,
    pub video: Option<String>,
    pub thumbnail: Option<String>,
    pub url_key: Option<String>,
    pub album_title: Option<String>,
    pub album_cover: Option<String>,
    pub album_photos: Option<serde_json::Value>,
    pub permission: String,
    pub disable_comments: bool,
    pub disable_sharing: bool,
    pub deleted: bool,
    pub deleted_date: Option<DateTime<Utc>>,
    pub created_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Optional album sub-record accepted on create/update, flattened into the
/// `album_*` columns of [`Post`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Album {
    #[serde(default)]
    pub photos: Vec<String>,
    pub cover: Option<String>,
    pub title: Option<String>,
}

/// A comment on a post, optionally a reply to another comment.
///
/// A comment with `parent_comment_id = NULL` is a *root comment* and is the
/// only kind that contributes to the owning post's `comment_counter`.
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

/// The state of a single `(user_id, post_id)` vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "int4")]
#[repr(i32)]
pub enum VoteType {
    None = 0,
    Up = 1,
    Down = 2,
}

impl VoteType {
    pub fn from_i32(v: i32) -> Self {
        match v {
            1 => VoteType::Up,
            2 => VoteType::Down,
            _ => VoteType::None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl Default for VoteType {
    fn default() -> Self {
        VoteType::None
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Vote {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub vote_type: i32,
    pub created_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// A user's saved-post marker. Not part of the core spec's data model but
/// required by `PostService`'s bulk-enrichment step (`isBookmarked`).
#[derive(Debug, Clone, FromRow)]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub bookmarked_at: DateTime<Utc>,
}

/// The sole interface between a service and the repository layer for
/// list-style post queries. The repository decides indexing; the service
/// only ever hands over a filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFilter {
    pub owner_user_id: Option<Uuid>,
    pub post_type_id: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub deleted: Option<bool>,
    pub created_after: Option<DateTime<Utc>>,
    pub search_text: Option<String>,
}

impl PostFilter {
    /// Canonical ordered key/value pairs used for cache key hashing.
    /// Only fields that influence the result set are included.
    pub fn cache_params(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(id) = self.owner_user_id {
            params.insert("ownerUserId".to_string(), id.to_string());
        }
        if let Some(t) = self.post_type_id {
            params.insert("postTypeId".to_string(), t.to_string());
        }
        if let Some(tags) = &self.tags {
            let mut sorted = tags.clone();
            sorted.sort();
            params.insert("tags".to_string(), sorted.join(","));
        }
        if let Some(d) = self.deleted {
            params.insert("deleted".to_string(), d.to_string());
        }
        if let Some(after) = self.created_after {
            params.insert("createdAfter".to_string(), after.timestamp().to_string());
        }
        if let Some(search) = &self.search_text {
            params.insert("searchText".to_string(), search.to_lowercase());
        }
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Desc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    CreatedDate,
    Score,
    ViewCount,
    CommentCounter,
}

impl Default for SortField {
    fn default() -> Self {
        SortField::CreatedDate
    }
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedDate => "created_date",
            SortField::Score => "score",
            SortField::ViewCount => "view_count",
            SortField::CommentCounter => "comment_counter",
        }
    }
}

/// The authenticated caller's identity, injected by the auth gate into
/// every request context. Mirrors the JWT claims issued by the auth
/// service, which this core never mints, only verifies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Uuid,
    pub display_name: String,
    pub avatar: String,
    pub social_name: String,
    pub system_role: String,
}

/// Per-viewer enrichment attached to a post in a list/search response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostEnrichment {
    pub vote_type: VoteType,
    pub is_bookmarked: bool,
}

impl Default for PostEnrichment {
    fn default() -> Self {
        Self {
            vote_type: VoteType::None,
            is_bookmarked: false,
        }
    }
}
