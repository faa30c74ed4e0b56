//! `VoteService`: the state machine over `(userId, postId)` votes.
//!
//! The transition table (current, requested) → (new, δ) is the one piece
//! of business logic that must never be computed outside a single
//! transaction — see [`VoteService::cast`].

use crate::cache::ContentCache;
use crate::db::{post_repo, vote_repo};
use crate::error::{AppError, Result};
use crate::models::VoteType;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct VoteService {
    pool: PgPool,
    cache: Arc<ContentCache>,
}

impl VoteService {
    pub fn new(pool: PgPool, cache: Arc<ContentCache>) -> Self {
        Self { pool, cache }
    }

    /// Computes (new_state, δ) for a requested vote against the current
    /// state, per the table in the vote service's operation spec.
    fn transition(current: VoteType, requested: VoteType) -> (VoteType, i64) {
        use VoteType::*;
        match (current, requested) {
            (None, Up) => (Up, 1),
            (None, Down) => (Down, -1),
            (Up, Up) => (None, -1),
            (Down, Down) => (None, 1),
            (Up, Down) => (Down, -2),
            (Down, Up) => (Up, 2),
            // A caller requesting `None` directly (explicit un-vote) just
            // removes whatever is there; not reachable via the public
            // `POST /votes` contract (which only accepts Up/Down) but kept
            // total so the match covers every pair.
            (Up, None) => (None, -1),
            (Down, None) => (None, 1),
            (None, None) => (None, 0),
        }
    }

    /// Casts `requested` (Up or Down) for `user_id` on `post_id`. Voting on
    /// one's own post is permitted; there is no ownership check. Runs the
    /// read-current/write-new/adjust-score sequence inside one transaction
    /// so a double-click can't interleave two writers on the same row —
    /// the `(user_id, post_id)` unique constraint does the rest.
    pub async fn cast(&self, post_id: Uuid, user_id: Uuid, requested: VoteType) -> Result<VoteType> {
        let mut tx = self.pool.begin().await?;

        let current = vote_repo::get_vote(&mut tx, user_id, post_id).await?;
        let (new_state, delta) = Self::transition(current, requested);

        vote_repo::upsert_or_delete(&mut tx, user_id, post_id, new_state).await?;
        if delta != 0 {
            sqlx::query("UPDATE posts SET score = score + $1, last_updated = NOW() WHERE id = $2")
                .bind(delta)
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.cache.invalidate_for_counter_write().await;
        Ok(new_state)
    }

    pub async fn get_vote(&self, post_id: Uuid, user_id: Uuid) -> Result<VoteType> {
        // Outside the mutation path a bare read doesn't need a transaction.
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT vote_type FROM votes WHERE user_id = $1 AND post_id = $2")
                .bind(user_id)
                .bind(post_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(v,)| VoteType::from_i32(v)).unwrap_or(VoteType::None))
    }

    pub async fn ensure_post_exists(&self, post_id: Uuid) -> Result<()> {
        post_repo::find_by_id(&self.pool, post_id).await.map(|_| ())
            .map_err(|_| AppError::NotFound(format!("post {post_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use VoteType::*;

    #[test]
    fn toggle_off_reverses_the_original_delta() {
        assert_eq!(VoteService::transition(None, Up), (Up, 1));
        assert_eq!(VoteService::transition(Up, Up), (None, -1));
        assert_eq!(VoteService::transition(None, Down), (Down, -1));
        assert_eq!(VoteService::transition(Down, Down), (None, 1));
    }

    #[test]
    fn switching_applies_the_double_delta() {
        assert_eq!(VoteService::transition(Up, Down), (Down, -2));
        assert_eq!(VoteService::transition(Down, Up), (Up, 2));
    }

    #[test]
    fn state_machine_is_total() {
        let states = [None, Up, Down];
        for &current in &states {
            for &requested in &states {
                // Must not panic for any pair.
                let _ = VoteService::transition(current, requested);
            }
        }
    }
}
