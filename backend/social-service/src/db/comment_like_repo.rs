//! Storage for the per-(user, comment) like toggle.

use crate::error::Result;
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

pub async fn exists(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    comment_id: Uuid,
) -> Result<bool> {
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT 1 FROM comment_likes WHERE user_id = $1 AND comment_id = $2",
    )
    .bind(user_id)
    .bind(comment_id)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(row.is_some())
}

pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    comment_id: Uuid,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO comment_likes (user_id, comment_id, created_date)
         VALUES ($1, $2, NOW())
         ON CONFLICT (user_id, comment_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(comment_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn delete(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    comment_id: Uuid,
) -> Result<()> {
    sqlx::query("DELETE FROM comment_likes WHERE user_id = $1 AND comment_id = $2")
        .bind(user_id)
        .bind(comment_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Bulk `isLiked` lookup for a list of comments, used by `ListByPost` enrichment.
pub async fn get_map_by_user_and_comments(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    comment_ids: &[Uuid],
) -> Result<HashMap<Uuid, bool>> {
    if comment_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT comment_id FROM comment_likes WHERE user_id = $1 AND comment_id = ANY($2)",
    )
    .bind(user_id)
    .bind(comment_ids)
    .fetch_all(pool)
    .await?;

    let liked: std::collections::HashSet<Uuid> = rows.into_iter().map(|(id,)| id).collect();
    Ok(comment_ids
        .iter()
        .map(|id| (*id, liked.contains(id)))
        .collect())
}
