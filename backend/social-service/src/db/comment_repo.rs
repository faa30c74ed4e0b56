//! Comment storage: CRUD, reply threading, and the cursor list used by
//! `GET /comments`. Schema-compatible with `content-service`'s `comments`
//! table shape so the two can be pointed at the same `comments` table when
//! co-deployed in `serverless` mode behind only `content-service`, and at
//! an independent store when split out — this repository makes no
//! assumption either way beyond the table name.

use crate::cursor::Cursor;
use crate::error::{AppError, Result};
use crate::models::Comment;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub async fn create(tx: &mut Transaction<'_, Postgres>, comment: &Comment) -> Result<()> {
    sqlx::query(
        "INSERT INTO comments (
            id, post_id, owner_user_id, owner_display_name, owner_avatar, text,
            parent_comment_id, score, reply_count, deleted, deleted_date,
            created_date, last_updated
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)",
    )
    .bind(comment.id)
    .bind(comment.post_id)
    .bind(comment.owner_user_id)
    .bind(&comment.owner_display_name)
    .bind(&comment.owner_avatar)
    .bind(&comment.text)
    .bind(comment.parent_comment_id)
    .bind(comment.score)
    .bind(comment.reply_count)
    .bind(comment.deleted)
    .bind(comment.deleted_date)
    .bind(comment.created_date)
    .bind(comment.last_updated)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Comment> {
    sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("comment {id} not found")))
}

pub async fn list_by_post(
    pool: &PgPool,
    post_id: Uuid,
    cursor: Option<&Cursor>,
    limit: i64,
) -> Result<(Vec<Comment>, bool)> {
    let mut query = String::from(
        "SELECT * FROM comments WHERE post_id = $1 AND deleted = false",
    );
    if cursor.is_some() {
        query.push_str(" AND (created_date < $2 OR (created_date = $2 AND id < $3))");
    }
    query.push_str(" ORDER BY created_date DESC, id DESC LIMIT ");
    query.push_str(&(limit + 1).to_string());

    let mut comments = if let Some(cursor) = cursor {
        sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .bind(cursor.created_date)
            .bind(cursor.id)
            .fetch_all(pool)
            .await?
    } else {
        sqlx::query_as::<_, Comment>(&query)
            .bind(post_id)
            .fetch_all(pool)
            .await?
    };

    let has_more = comments.len() as i64 > limit;
    if has_more {
        comments.truncate(limit as usize);
    }
    Ok((comments, has_more))
}

pub async fn update_text(tx: &mut Transaction<'_, Postgres>, id: Uuid, text: &str) -> Result<()> {
    sqlx::query("UPDATE comments SET text = $1, last_updated = NOW() WHERE id = $2")
        .bind(text)
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn soft_delete(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE comments SET deleted = true, deleted_date = NOW(), last_updated = NOW()
         WHERE id = $1 AND deleted = false",
    )
    .bind(id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Cascade soft-delete of every comment under a post. Mirrors the
/// `CommentRepository.DeleteByPostID` contract `content-service`'s own copy
/// of this repository already calls when a post is soft-deleted — the two
/// services point at the same physical `comments` table, so that single
/// call covers both, and this copy is never invoked from within
/// `social-service` itself. Kept for parity with the repository contract.
pub async fn delete_by_post_id(tx: &mut Transaction<'_, Postgres>, post_id: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE comments SET deleted = true, deleted_date = NOW(), last_updated = NOW()
         WHERE post_id = $1 AND deleted = false",
    )
    .bind(post_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn count_root_by_post(pool: &PgPool, post_id: Uuid) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM comments
         WHERE post_id = $1 AND parent_comment_id IS NULL AND deleted = false",
    )
    .bind(post_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

pub async fn increment_reply_count(
    tx: &mut Transaction<'_, Postgres>,
    parent_id: Uuid,
    delta: i64,
) -> Result<()> {
    sqlx::query(
        "UPDATE comments SET reply_count = GREATEST(0, reply_count + $1), last_updated = NOW()
         WHERE id = $2",
    )
    .bind(delta)
    .bind(parent_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Returns the score as stored after the update, so callers that need to
/// report it back (e.g. the like toggle) don't need a second round trip.
pub async fn increment_score(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    delta: i64,
) -> Result<i64> {
    let score: i64 = sqlx::query_scalar(
        "UPDATE comments SET score = GREATEST(0, score + $1), last_updated = NOW()
         WHERE id = $2 RETURNING score",
    )
    .bind(delta)
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(score)
}
