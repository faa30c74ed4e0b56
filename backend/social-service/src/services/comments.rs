//! `CommentService`: root/reply comments, like toggling, and the
//! `GetRootCommentCount` side of the cross-service adapter pair — the
//! same operation table as `content-service::services::comments::CommentService`,
//! hosted here instead when `DEPLOYMENT_MODE=microservices`.
//!
//! Every mutation that changes a post's visible comment count (root-comment
//! create/delete) calls `Arc<dyn PostStatsUpdater>`, which in this service
//! is always `social_core::adapters::RpcPostStatsUpdater` — there is no
//! Direct adapter here, since this service only exists in the deployment
//! mode where Posts and Comments are split across processes. Adapter
//! failures are logged, never propagated: the comment mutation that
//! triggered them has already committed.

use crate::cursor::Cursor;
use crate::db::{comment_like_repo, comment_repo};
use crate::error::{AppError, Result};
use crate::models::{Comment, UserContext};
use async_trait::async_trait;
use chrono::Utc;
use social_core::adapters::{AdapterError, CommentCounter, PostStatsUpdater};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CommentWithLiked {
    pub comment: Comment,
    pub is_liked: bool,
}

#[derive(Debug, Clone)]
pub struct CommentPage {
    pub comments: Vec<CommentWithLiked>,
    pub next_cursor: Option<String>,
    pub has_next: bool,
}

pub struct CommentService {
    pool: PgPool,
    post_stats: Arc<dyn PostStatsUpdater>,
}

impl CommentService {
    pub fn new(pool: PgPool, post_stats: Arc<dyn PostStatsUpdater>) -> Self {
        Self { pool, post_stats }
    }

    /// Root comments increment the owning post's `commentCounter` via the
    /// adapter; replies increment their parent's `reply_count` directly
    /// (reply counts are local to this service's own comment table, never
    /// cross-service).
    pub async fn create(
        &self,
        post_id: Uuid,
        text: &str,
        parent_comment_id: Option<Uuid>,
        user: &UserContext,
    ) -> Result<Comment> {
        if text.trim().is_empty() {
            return Err(AppError::ValidationError("text must not be empty".to_string()));
        }

        if let Some(parent_id) = parent_comment_id {
            let parent = comment_repo::find_by_id(&self.pool, parent_id).await?;
            if parent.post_id != post_id {
                return Err(AppError::ValidationError(
                    "parent comment does not belong to this post".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            owner_user_id: user.user_id,
            owner_display_name: user.display_name.clone(),
            owner_avatar: user.avatar.clone(),
            text: text.to_string(),
            parent_comment_id,
            score: 0,
            reply_count: 0,
            deleted: false,
            deleted_date: None,
            created_date: now,
            last_updated: now,
        };

        let mut tx = self.pool.begin().await?;
        comment_repo::create(&mut tx, &comment).await?;
        if let Some(parent_id) = parent_comment_id {
            comment_repo::increment_reply_count(&mut tx, parent_id, 1).await?;
        }
        tx.commit().await?;

        if comment.is_root() {
            if let Err(e) = self.post_stats.increment_comment_count_for_service(post_id, 1).await {
                tracing::warn!(post_id = %post_id, error = %e, "failed to increment post commentCounter after comment create");
            }
        }

        Ok(comment)
    }

    /// Single comment getter, mirroring `PostService::get_post`'s
    /// deleted-visibility rule: a soft-deleted comment reads as not found.
    pub async fn get(&self, comment_id: Uuid) -> Result<Comment> {
        let comment = comment_repo::find_by_id(&self.pool, comment_id).await?;
        if comment.deleted {
            return Err(AppError::NotFound(format!("comment {comment_id} not found")));
        }
        Ok(comment)
    }

    /// Toggles the caller's like on `comment_id` and adjusts its score by
    /// ±1 in one transaction. Returns the score as stored after the update.
    pub async fn like(&self, comment_id: Uuid, user_id: Uuid) -> Result<(i64, bool)> {
        let mut tx = self.pool.begin().await?;

        comment_repo::find_by_id(&self.pool, comment_id).await?;
        let already_liked = comment_like_repo::exists(&mut tx, user_id, comment_id).await?;

        let (score, now_liked) = if already_liked {
            comment_like_repo::delete(&mut tx, user_id, comment_id).await?;
            let score = comment_repo::increment_score(&mut tx, comment_id, -1).await?;
            (score, false)
        } else {
            comment_like_repo::insert(&mut tx, user_id, comment_id).await?;
            let score = comment_repo::increment_score(&mut tx, comment_id, 1).await?;
            (score, true)
        };

        tx.commit().await?;
        Ok((score, now_liked))
    }

    /// Ownership-checked text edit. Returns the comment as stored after the
    /// update.
    pub async fn update(&self, comment_id: Uuid, text: &str, user: &UserContext) -> Result<Comment> {
        if text.trim().is_empty() {
            return Err(AppError::ValidationError("text must not be empty".to_string()));
        }

        let mut comment = comment_repo::find_by_id(&self.pool, comment_id).await?;
        if comment.deleted || comment.owner_user_id != user.user_id {
            return Err(AppError::NotFound(format!("comment {comment_id} not found")));
        }

        let mut tx = self.pool.begin().await?;
        comment_repo::update_text(&mut tx, comment_id, text).await?;
        tx.commit().await?;

        comment.text = text.to_string();
        comment.last_updated = Utc::now();
        Ok(comment)
    }

    /// Ownership-checked, idempotent soft-delete. `post_id` must match the
    /// comment's own post (a mismatch is treated the same as "not found,"
    /// matching the idempotent-delete convention elsewhere in this module).
    /// A root comment's removal decrements the owning post's
    /// `commentCounter` via the adapter; a reply's removal decrements its
    /// parent's local `reply_count` instead.
    pub async fn delete(&self, comment_id: Uuid, post_id: Uuid, user: &UserContext) -> Result<()> {
        let comment = match comment_repo::find_by_id(&self.pool, comment_id).await {
            Ok(comment) => comment,
            Err(AppError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };
        if comment.post_id != post_id || comment.owner_user_id != user.user_id || comment.deleted {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        comment_repo::soft_delete(&mut tx, comment_id).await?;
        if let Some(parent_id) = comment.parent_comment_id {
            comment_repo::increment_reply_count(&mut tx, parent_id, -1).await?;
        }
        tx.commit().await?;

        if comment.is_root() {
            if let Err(e) = self
                .post_stats
                .increment_comment_count_for_service(comment.post_id, -1)
                .await
            {
                tracing::warn!(post_id = %comment.post_id, error = %e, "failed to decrement post commentCounter after comment delete");
            }
        }

        Ok(())
    }

    /// All non-deleted comments under a post (root and replies alike),
    /// cursor-paginated, with a bulk `isLiked` lookup against the viewer
    /// (when authenticated).
    pub async fn list_by_post(
        &self,
        post_id: Uuid,
        cursor_token: Option<&str>,
        limit: i64,
        viewer: Option<Uuid>,
    ) -> Result<CommentPage> {
        let cursor = cursor_token.map(Cursor::decode).transpose()?;
        let (comments, has_next) =
            comment_repo::list_by_post(&self.pool, post_id, cursor.as_ref(), limit).await?;

        let liked: HashMap<Uuid, bool> = match viewer {
            Some(viewer_id) => {
                let ids: Vec<Uuid> = comments.iter().map(|c| c.id).collect();
                comment_like_repo::get_map_by_user_and_comments(&self.pool, viewer_id, &ids)
                    .await
                    .unwrap_or_default()
            }
            None => HashMap::new(),
        };

        let next_cursor = if has_next {
            comments
                .last()
                .map(|c| Cursor { id: c.id, created_date: c.created_date }.encode())
        } else {
            None
        };

        let comments = comments
            .into_iter()
            .map(|comment| {
                let is_liked = liked.get(&comment.id).copied().unwrap_or(false);
                CommentWithLiked { comment, is_liked }
            })
            .collect();

        Ok(CommentPage { comments, next_cursor, has_next })
    }
}

/// `GetRootCommentCount`: the `CommentCounter` contract, called by the
/// Posts core (over HMAC-signed HTTP in this deployment mode) for lazy
/// `commentCounter` correction.
#[async_trait]
impl CommentCounter for CommentService {
    async fn get_root_comment_count(&self, post_id: Uuid) -> std::result::Result<i64, AdapterError> {
        comment_repo::count_root_by_post(&self.pool, post_id)
            .await
            .map_err(|e| AdapterError::Network(e.to_string()))
    }
}
