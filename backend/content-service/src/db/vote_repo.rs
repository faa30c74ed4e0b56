//! Storage for per-(user, post) votes.
//!
//! The state machine itself lives in `services::votes`; this repository
//! only exposes the primitives the single enclosing transaction needs:
//! read the current vote, upsert-or-delete it, and the bulk lookup used
//! for list enrichment.

use crate::error::Result;
use crate::models::VoteType;
use sqlx::{Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

pub async fn get_vote(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    post_id: Uuid,
) -> Result<VoteType> {
    let row: Option<(i32,)> = sqlx::query_as(
        "SELECT vote_type FROM votes WHERE user_id = $1 AND post_id = $2",
    )
    .bind(user_id)
    .bind(post_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(row.map(|(v,)| VoteType::from_i32(v)).unwrap_or(VoteType::None))
}

/// Applies the new vote state inside the caller's transaction.
/// `VoteType::None` deletes the row; any other value upserts it.
pub async fn upsert_or_delete(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    post_id: Uuid,
    new_state: VoteType,
) -> Result<()> {
    if new_state == VoteType::None {
        sqlx::query("DELETE FROM votes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut **tx)
            .await?;
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO votes (user_id, post_id, vote_type, created_date, last_updated)
         VALUES ($1, $2, $3, NOW(), NOW())
         ON CONFLICT (user_id, post_id)
         DO UPDATE SET vote_type = EXCLUDED.vote_type, last_updated = NOW()",
    )
    .bind(user_id)
    .bind(post_id)
    .bind(new_state.as_i32())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Bulk vote lookup for list enrichment: one query, `post_id = ANY($ids)`.
pub async fn get_votes_for_posts(
    pool: &sqlx::PgPool,
    post_ids: &[Uuid],
    user_id: Uuid,
) -> Result<HashMap<Uuid, VoteType>> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(Uuid, i32)> = sqlx::query_as(
        "SELECT post_id, vote_type FROM votes WHERE user_id = $1 AND post_id = ANY($2)",
    )
    .bind(user_id)
    .bind(post_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(post_id, v)| (post_id, VoteType::from_i32(v)))
        .collect())
}
