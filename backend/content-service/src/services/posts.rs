//! `PostService`: ownership-enforced Post CRUD, dual pagination (offset +
//! cursor), cascading soft-delete, and the lazy `commentCounter` correction
//! path described in the posts operation table.
//!
//! `PostService` itself implements [`PostStatsUpdater`] — the Direct
//! adapter is just an `Arc<PostService>` handed to a co-hosted
//! `CommentService`; the RPC adapter (`social_core::adapters::RpcPostStatsUpdater`)
//! is a separate type that calls this service's HMAC-signed HTTP surface
//! instead.

use crate::cache::ContentCache;
use crate::cursor::Cursor;
use crate::db::{bookmark_repo, comment_repo, post_repo, vote_repo};
use crate::error::{AppError, Result};
use crate::models::{Post, PostEnrichment, PostFilter, SortDirection, SortField, UserContext};
use async_trait::async_trait;
use chrono::Utc;
use social_core::adapters::{AdapterError, CommentCounter, PostStatsUpdater};
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_LIMIT: i64 = 10;
const LAZY_COUNTER_READ_DEADLINE: Duration = Duration::from_secs(2);
const LAZY_COUNTER_WRITE_DEADLINE: Duration = Duration::from_secs(5);
const MAX_LAZY_CORRECTIONS_IN_FLIGHT: usize = 8;

/// Fields accepted on `CreatePost`; everything else (id, owner fields,
/// counters, timestamps) is derived by the service.
#[derive(Debug, Clone, Default, serde::Deserialize, validator::Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub post_type_id: i32,
    #[validate(length(min = 1, max = 20000))]
    pub body: String,
    #[serde(default)]
    #[validate(length(max = 32))]
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub video: Option<String>,
    pub thumbnail: Option<String>,
    pub album_title: Option<String>,
    pub album_cover: Option<String>,
    pub album_photos: Option<serde_json::Value>,
    pub permission: Option<String>,
    pub disable_comments: Option<bool>,
    pub disable_sharing: Option<bool>,
}

/// Fields accepted on `UpdatePost`; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostRequest {
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
    pub video: Option<String>,
    pub thumbnail: Option<String>,
    pub album_title: Option<String>,
    pub album_cover: Option<String>,
    pub album_photos: Option<serde_json::Value>,
    pub permission: Option<String>,
    pub disable_comments: Option<bool>,
    pub disable_sharing: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub limit: i64,
    pub page: i64,
}

#[derive(Debug, Clone)]
pub struct PostWithEnrichment {
    pub post: Post,
    pub enrichment: PostEnrichment,
}

#[derive(Debug, Clone)]
pub struct OffsetPage {
    pub posts: Vec<PostWithEnrichment>,
    pub total_count: i64,
    pub page: i64,
    pub limit: i64,
    pub has_next: bool,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CursorPage {
    pub posts: Vec<PostWithEnrichment>,
    pub next_cursor: Option<String>,
    pub has_next: bool,
}

/// The cache-shaped payload for an offset page: raw rows, not per-viewer
/// enrichment, since enrichment is always recomputed against the live
/// viewer on every request regardless of whether the underlying list hit
/// or missed cache.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CachedOffsetPage {
    posts: Vec<Post>,
    total_count: i64,
    has_next: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct CachedCursorPage {
    posts: Vec<Post>,
    next_cursor: Option<String>,
    has_next: bool,
}

pub struct PostService {
    pool: PgPool,
    cache: Arc<ContentCache>,
    comment_counter: Arc<dyn CommentCounter>,
    lazy_correction_limiter: Arc<tokio::sync::Semaphore>,
}

impl PostService {
    pub fn new(pool: PgPool, cache: Arc<ContentCache>, comment_counter: Arc<dyn CommentCounter>) -> Self {
        Self {
            pool,
            cache,
            comment_counter,
            lazy_correction_limiter: Arc::new(tokio::sync::Semaphore::new(
                MAX_LAZY_CORRECTIONS_IN_FLIGHT,
            )),
        }
    }

    pub async fn create_post(&self, req: CreatePostRequest, user: &UserContext) -> Result<Post> {
        if req.body.trim().is_empty() {
            return Err(AppError::ValidationError("body must not be empty".to_string()));
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let url_key = derive_url_key(&user.social_name, &req.body, id);

        let post = Post {
            id,
            owner_user_id: user.user_id,
            owner_display_name: user.display_name.clone(),
            owner_avatar: user.avatar.clone(),
            post_type_id: req.post_type_id,
            body: req.body,
            tags: req.tags,
            score: 0,
            view_count: 0,
            comment_counter: 0,
            image: req.image,
            video: req.video,
            thumbnail: req.thumbnail,
            url_key: Some(url_key),
            album_title: req.album_title,
            album_cover: req.album_cover,
            album_photos: req.album_photos,
            permission: req.permission.unwrap_or_else(|| "Public".to_string()),
            disable_comments: req.disable_comments.unwrap_or(false),
            disable_sharing: req.disable_sharing.unwrap_or(false),
            deleted: false,
            deleted_date: None,
            created_date: now,
            last_updated: now,
        };

        let mut tx = self.pool.begin().await?;
        post_repo::create(&mut tx, &post).await?;
        tx.commit().await?;

        self.cache.invalidate_for_post_write(user.user_id).await;
        Ok(post)
    }

    /// Does not filter deleted posts. Applies the lazy `commentCounter`
    /// correction when the stored counter reads zero.
    pub async fn get_post(&self, id: Uuid) -> Result<Post> {
        let mut post = post_repo::find_by_id(&self.pool, id).await?;
        if post.deleted {
            return Err(AppError::NotFound(format!("post {id} not found")));
        }
        if post.comment_counter == 0 {
            self.apply_lazy_counter_correction(&mut post).await;
        }
        Ok(post)
    }

    pub async fn get_post_by_url_key(&self, key: &str) -> Result<Post> {
        let mut post = post_repo::find_by_url_key(&self.pool, key).await?;
        if post.comment_counter == 0 {
            self.apply_lazy_counter_correction(&mut post).await;
        }
        Ok(post)
    }

    /// Attempts a bounded (≤2s) read of the true root-comment count via the
    /// `CommentCounter` adapter; on a positive result the in-memory post is
    /// corrected immediately and a fire-and-forget background task persists
    /// it. Correction never fails the read, and background write-back is
    /// dropped (not queued) once `MAX_LAZY_CORRECTIONS_IN_FLIGHT` tasks are
    /// already in flight.
    async fn apply_lazy_counter_correction(&self, post: &mut Post) {
        let post_id = post.id;
        let counter = self.comment_counter.clone();
        let lookup = resilience::timeout::with_timeout_result(LAZY_COUNTER_READ_DEADLINE, async move {
            counter.get_root_comment_count(post_id).await
        })
        .await;

        let count = match lookup {
            Ok(count) if count > 0 => count,
            _ => return,
        };
        post.comment_counter = count;

        let pool = self.pool.clone();
        let limiter = self.lazy_correction_limiter.clone();
        tokio::spawn(async move {
            let Ok(_permit) = limiter.try_acquire_owned() else {
                tracing::debug!(post_id = %post_id, "dropping lazy commentCounter write-back, worker pool saturated");
                return;
            };
            let write = resilience::timeout::with_timeout_result(LAZY_COUNTER_WRITE_DEADLINE, async {
                post_repo::set_comment_counter(&pool, post_id, count)
                    .await
                    .map_err(|e| e.to_string())
            })
            .await;
            if let Err(e) = write {
                tracing::debug!(post_id = %post_id, error = %e, "lazy commentCounter write-back failed");
            }
        });
    }

    async fn enrich(&self, posts: Vec<Post>, viewer: Option<Uuid>) -> Vec<PostWithEnrichment> {
        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();

        let (votes, bookmarks) = match viewer {
            Some(viewer_id) => {
                let votes = vote_repo::get_votes_for_posts(&self.pool, &post_ids, viewer_id)
                    .await
                    .unwrap_or_default();
                let bookmarks =
                    bookmark_repo::get_map_by_user_and_posts(&self.pool, viewer_id, &post_ids)
                        .await
                        .unwrap_or_default();
                (votes, bookmarks)
            }
            None => Default::default(),
        };

        posts
            .into_iter()
            .map(|post| {
                let enrichment = PostEnrichment {
                    vote_type: votes.get(&post.id).copied().unwrap_or_default(),
                    is_bookmarked: bookmarks.get(&post.id).copied().unwrap_or(false),
                };
                PostWithEnrichment { post, enrichment }
            })
            .collect()
    }

    async fn list_offset(
        &self,
        filter: &PostFilter,
        page_req: &PageRequest,
        viewer: Option<Uuid>,
        cache_key: String,
        ttl: Duration,
    ) -> Result<OffsetPage> {
        let limit = if page_req.limit > 0 { page_req.limit } else { DEFAULT_LIMIT };
        let page = if page_req.page > 0 { page_req.page } else { 1 };
        let offset = (page - 1) * limit;

        if let Some(cached) = self.cache.get_cached::<CachedOffsetPage>(&cache_key).await? {
            let posts = self.enrich(cached.posts, viewer).await;
            return Ok(OffsetPage {
                posts,
                total_count: cached.total_count,
                page,
                limit,
                has_next: cached.has_next,
                next_cursor: cached.next_cursor,
            });
        }

        let posts = post_repo::find(&self.pool, filter, limit, offset).await?;
        let total_count = post_repo::count(&self.pool, filter).await?;
        let has_next = page * limit < total_count;
        let next_cursor = if has_next {
            posts.last().map(|p| {
                Cursor {
                    id: p.id,
                    value: serde_json::json!(p.created_date),
                    sort_field: SortField::CreatedDate,
                    direction: SortDirection::Desc,
                }
                .encode()
            })
        } else {
            None
        };

        let cacheable = CachedOffsetPage {
            posts: posts.clone(),
            total_count,
            has_next,
            next_cursor: next_cursor.clone(),
        };
        let _ = self.cache.cache_data(&cache_key, &cacheable, ttl).await;

        let posts = self.enrich(posts, viewer).await;
        Ok(OffsetPage { posts, total_count, page, limit, has_next, next_cursor })
    }

    pub async fn query_posts(
        &self,
        filter: &PostFilter,
        page_req: &PageRequest,
        viewer: Option<Uuid>,
    ) -> Result<OffsetPage> {
        let mut params: BTreeMap<String, String> = filter.cache_params().into_iter().collect();
        params.insert("limit".to_string(), page_req.limit.to_string());
        params.insert("page".to_string(), page_req.page.to_string());
        let cache_key = self.cache.query_key(&params);
        self.list_offset(filter, page_req, viewer, cache_key, self.cache.query_ttl()).await
    }

    /// Like `QueryPosts`, but scopes the filter to `searchText` and uses the
    /// `search:` cache namespace. Queries under three characters (after
    /// trimming) never touch the database.
    pub async fn search_posts(
        &self,
        query: &str,
        filter: &PostFilter,
        page_req: &PageRequest,
        viewer: Option<Uuid>,
    ) -> Result<OffsetPage> {
        let trimmed = query.trim();
        if trimmed.chars().count() < 3 {
            let limit = if page_req.limit > 0 { page_req.limit } else { DEFAULT_LIMIT };
            let page = if page_req.page > 0 { page_req.page } else { 1 };
            return Ok(OffsetPage { posts: vec![], total_count: 0, page, limit, has_next: false, next_cursor: None });
        }

        let mut scoped = filter.clone();
        scoped.search_text = Some(trimmed.to_string());
        scoped.deleted.get_or_insert(false);

        let mut params: BTreeMap<String, String> = scoped.cache_params().into_iter().collect();
        params.insert("limit".to_string(), page_req.limit.to_string());
        params.insert("page".to_string(), page_req.page.to_string());
        let cache_key = self.cache.search_key(&params);
        self.list_offset(&scoped, page_req, viewer, cache_key, self.cache.search_ttl()).await
    }

    async fn list_cursor(
        &self,
        filter: &PostFilter,
        cursor_token: Option<&str>,
        sort_field: SortField,
        sort_direction: SortDirection,
        limit: i64,
        viewer: Option<Uuid>,
        cache_key: String,
        ttl: Duration,
    ) -> Result<CursorPage> {
        let cursor = cursor_token.map(Cursor::decode).transpose()?;

        if let Some(cached) = self.cache.get_cached::<CachedCursorPage>(&cache_key).await? {
            let posts = self.enrich(cached.posts, viewer).await;
            return Ok(CursorPage { posts, next_cursor: cached.next_cursor, has_next: cached.has_next });
        }

        let (posts, has_more) =
            post_repo::find_with_cursor(&self.pool, filter, cursor.as_ref(), sort_field, sort_direction, limit)
                .await?;

        let next_cursor = if has_more {
            posts.last().map(|p| {
                Cursor {
                    id: p.id,
                    value: sort_value_json(p, sort_field),
                    sort_field,
                    direction: sort_direction,
                }
                .encode()
            })
        } else {
            None
        };

        let cacheable = CachedCursorPage { posts: posts.clone(), next_cursor: next_cursor.clone(), has_next: has_more };
        let _ = self.cache.cache_data(&cache_key, &cacheable, ttl).await;

        let posts = self.enrich(posts, viewer).await;
        Ok(CursorPage { posts, next_cursor, has_next: has_more })
    }

    pub async fn query_posts_with_cursor(
        &self,
        filter: &PostFilter,
        cursor_token: Option<&str>,
        sort_field: SortField,
        sort_direction: SortDirection,
        limit: i64,
        viewer: Option<Uuid>,
    ) -> Result<CursorPage> {
        let limit = if limit > 0 { limit } else { DEFAULT_LIMIT };
        let mut params: BTreeMap<String, String> = filter.cache_params().into_iter().collect();
        params.insert("limit".to_string(), limit.to_string());
        params.insert("sortField".to_string(), format!("{sort_field:?}"));
        params.insert("sortDirection".to_string(), format!("{sort_direction:?}"));
        if let Some(token) = cursor_token {
            params.insert("cursor".to_string(), token.to_string());
        }
        let cache_key = self.cache.cursor_key(&params);
        self.list_cursor(filter, cursor_token, sort_field, sort_direction, limit, viewer, cache_key, self.cache.cursor_ttl()).await
    }

    pub async fn search_posts_with_cursor(
        &self,
        query: &str,
        filter: &PostFilter,
        cursor_token: Option<&str>,
        sort_field: SortField,
        sort_direction: SortDirection,
        limit: i64,
        viewer: Option<Uuid>,
    ) -> Result<CursorPage> {
        let limit = if limit > 0 { limit } else { DEFAULT_LIMIT };
        let trimmed = query.trim();
        if trimmed.chars().count() < 3 {
            return Ok(CursorPage { posts: vec![], next_cursor: None, has_next: false });
        }

        let mut scoped = filter.clone();
        scoped.search_text = Some(trimmed.to_string());
        scoped.deleted.get_or_insert(false);

        let mut params: BTreeMap<String, String> = scoped.cache_params().into_iter().collect();
        params.insert("limit".to_string(), limit.to_string());
        params.insert("sortField".to_string(), format!("{sort_field:?}"));
        params.insert("sortDirection".to_string(), format!("{sort_direction:?}"));
        if let Some(token) = cursor_token {
            params.insert("cursor".to_string(), token.to_string());
        }
        let cache_key = self.cache.search_key(&params);
        self.list_cursor(&scoped, cursor_token, sort_field, sort_direction, limit, viewer, cache_key, self.cache.search_ttl()).await
    }

    pub async fn cursor_info(
        &self,
        id: Uuid,
        sort_field: SortField,
        sort_direction: SortDirection,
    ) -> Result<(String, i64)> {
        let post = post_repo::find_by_id(&self.pool, id).await?;
        let cursor = Cursor {
            id: post.id,
            value: sort_value_json(&post, sort_field),
            sort_field,
            direction: sort_direction,
        };
        let position = post_repo::cursor_position(&self.pool, id, sort_field, sort_direction).await?;
        Ok((cursor.encode(), position))
    }

    pub async fn update_post(&self, id: Uuid, req: UpdatePostRequest, user: &UserContext) -> Result<Post> {
        let mut post = post_repo::find_by_id(&self.pool, id).await?;
        if post.deleted || post.owner_user_id != user.user_id {
            return Err(AppError::NotFound(format!("post {id} not found")));
        }

        if let Some(body) = req.body {
            post.body = body;
        }
        if let Some(tags) = req.tags {
            post.tags = tags;
        }
        if req.image.is_some() {
            post.image = req.image;
        }
        if req.video.is_some() {
            post.video = req.video;
        }
        if req.thumbnail.is_some() {
            post.thumbnail = req.thumbnail;
        }
        if req.album_title.is_some() {
            post.album_title = req.album_title;
        }
        if req.album_cover.is_some() {
            post.album_cover = req.album_cover;
        }
        if req.album_photos.is_some() {
            post.album_photos = req.album_photos;
        }
        if let Some(permission) = req.permission {
            post.permission = permission;
        }
        if let Some(disable_comments) = req.disable_comments {
            post.disable_comments = disable_comments;
        }
        if let Some(disable_sharing) = req.disable_sharing {
            post.disable_sharing = disable_sharing;
        }
        post.last_updated = Utc::now();

        let mut tx = self.pool.begin().await?;
        post_repo::update(&mut tx, &post).await?;
        tx.commit().await?;

        self.cache.invalidate_for_post_write(user.user_id).await;
        Ok(post)
    }

    /// Ownership-checked, non-idempotent soft-delete. Not wired to the
    /// public HTTP surface (which uses the idempotent `SoftDeletePost`
    /// below) but kept as the strict form the operation table names.
    pub async fn delete_post(&self, id: Uuid, user: &UserContext) -> Result<()> {
        let post = post_repo::find_by_id(&self.pool, id).await?;
        if post.owner_user_id != user.user_id {
            return Err(AppError::NotFound(format!("post {id} not found")));
        }

        let mut tx = self.pool.begin().await?;
        post_repo::delete(&mut tx, id).await?;
        tx.commit().await?;

        self.cache.invalidate_for_post_write(user.user_id).await;
        Ok(())
    }

    /// Idempotent soft-delete with a transactional comment cascade. Missing
    /// post, unowned post, and already-deleted post all resolve to success
    /// rather than an error — this is `DELETE /posts/:id`'s behavior.
    pub async fn soft_delete_post(&self, id: Uuid, user: &UserContext) -> Result<()> {
        let post = match post_repo::find_by_id(&self.pool, id).await {
            Ok(post) => post,
            Err(AppError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };
        if post.owner_user_id != user.user_id || post.deleted {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        post_repo::delete(&mut tx, id).await?;
        comment_repo::delete_by_post_id(&mut tx, id).await?;
        tx.commit().await?;

        self.cache.invalidate_for_post_write(user.user_id).await;
        Ok(())
    }

    /// Voting is universal — no ownership check.
    pub async fn increment_score(&self, id: Uuid, delta: i64) -> Result<()> {
        post_repo::increment_score(&self.pool, id, delta).await?;
        self.cache.invalidate_for_counter_write().await;
        Ok(())
    }

    pub async fn increment_view_count(&self, id: Uuid) -> Result<()> {
        post_repo::increment_view_count(&self.pool, id).await?;
        Ok(())
    }

    /// User-facing variant: checks ownership before delegating to the same
    /// atomic counter update the service-to-service variant uses.
    pub async fn increment_comment_count(&self, id: Uuid, delta: i64, user: &UserContext) -> Result<()> {
        let post = post_repo::find_by_id(&self.pool, id).await?;
        if post.owner_user_id != user.user_id {
            return Err(AppError::Forbidden(format!("user {} does not own post {id}", user.user_id)));
        }
        post_repo::increment_comment_count(&self.pool, id, delta).await?;
        self.cache.invalidate_for_counter_write().await;
        Ok(())
    }

    pub async fn set_comment_disabled(&self, id: Uuid, disabled: bool, user: &UserContext) -> Result<()> {
        post_repo::set_comment_disabled(&self.pool, id, disabled, user.user_id).await?;
        self.cache.invalidate_for_post_write(user.user_id).await;
        Ok(())
    }

    pub async fn set_sharing_disabled(&self, id: Uuid, disabled: bool, user: &UserContext) -> Result<()> {
        post_repo::set_sharing_disabled(&self.pool, id, disabled, user.user_id).await?;
        self.cache.invalidate_for_post_write(user.user_id).await;
        Ok(())
    }

    /// Idempotent: returns the existing `urlKey` if one is already set.
    pub async fn generate_url_key(&self, id: Uuid, user: &UserContext) -> Result<String> {
        let post = post_repo::find_by_id(&self.pool, id).await?;
        if post.owner_user_id != user.user_id {
            return Err(AppError::Forbidden(format!("user {} does not own post {id}", user.user_id)));
        }
        if let Some(key) = post.url_key.filter(|k| !k.is_empty()) {
            return Ok(key);
        }

        let key = derive_url_key(&user.social_name, &post.body, post.id);
        post_repo::set_url_key(&self.pool, id, &key).await?;
        Ok(key)
    }
}

/// `IncrementCommentCountForService`: the `PostStatsUpdater` contract,
/// called by a co-hosted `CommentService` directly (serverless mode) or
/// invoked over HMAC-signed HTTP by a remote one (microservices mode, via
/// the `/posts/actions/comment/count` handler delegating to this method).
#[async_trait]
impl PostStatsUpdater for PostService {
    async fn increment_comment_count_for_service(
        &self,
        post_id: Uuid,
        delta: i64,
    ) -> std::result::Result<(), AdapterError> {
        post_repo::increment_comment_count(&self.pool, post_id, delta)
            .await
            .map_err(|e| AdapterError::Network(e.to_string()))?;
        self.cache.invalidate_for_counter_write().await;
        Ok(())
    }
}

fn sort_value_json(post: &Post, sort_field: SortField) -> serde_json::Value {
    match sort_field {
        SortField::CreatedDate => serde_json::json!(post.created_date),
        SortField::Score => serde_json::json!(post.score),
        SortField::ViewCount => serde_json::json!(post.view_count),
        SortField::CommentCounter => serde_json::json!(post.comment_counter),
    }
}

/// Derives a URL-safe slug from the owner's social name and post body,
/// disambiguated with an 8-character id suffix so collisions across users
/// posting identical text are impossible.
fn derive_url_key(social_name: &str, body: &str, id: Uuid) -> String {
    let slug_source = format!("{social_name} {body}");
    let mut slug: String = slug_source
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .take(8)
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        slug = "post".to_string();
    }
    format!("{slug}-{}", &id.simple().to_string()[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_url_key_is_slug_then_id_suffix() {
        let id = Uuid::new_v4();
        let key = derive_url_key("alice", "Hello, World! This is a post.", id);
        assert!(key.starts_with("alice-hello-world-this"));
        assert!(key.ends_with(&id.simple().to_string()[..8]));
    }

    #[test]
    fn derive_url_key_handles_empty_body() {
        let id = Uuid::new_v4();
        let key = derive_url_key("", "!!!", id);
        assert!(key.starts_with("post-"));
    }
}
