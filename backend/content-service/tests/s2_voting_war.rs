//! Concurrent up/down/toggle voting converges to the same score for every
//! reader, including the post's own owner self-voting.

mod common;

use content_service::models::VoteType;
use content_service::services::votes::VoteService;
use std::sync::Arc;
use uuid::Uuid;

async fn score(pool: &sqlx::PgPool, post_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT score FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore]
async fn voting_war_converges_to_one_final_score() {
    let pool = common::setup_test_db().await;

    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();
    let user_c = Uuid::new_v4();
    let post_id = Uuid::new_v4();
    let now = chrono::Utc::now();

    sqlx::query(
        "INSERT INTO posts (id, owner_user_id, owner_display_name, owner_avatar, post_type_id,
            body, permission, created_date, last_updated)
         VALUES ($1,$2,'alice','',1,'p2','Public',$3,$3)",
    )
    .bind(post_id)
    .bind(user_a)
    .bind(now)
    .execute(&pool)
    .await
    .unwrap();

    let cache = Arc::new(content_service::cache::ContentCache::disabled());
    let votes = VoteService::new(pool.clone(), cache);

    votes.cast(post_id, user_b, VoteType::Up).await.unwrap();
    votes.cast(post_id, user_c, VoteType::Up).await.unwrap();
    assert_eq!(score(&pool, post_id).await, 2);

    votes.cast(post_id, user_b, VoteType::Down).await.unwrap();
    assert_eq!(score(&pool, post_id).await, 0);

    votes.cast(post_id, user_c, VoteType::Up).await.unwrap();
    assert_eq!(score(&pool, post_id).await, -1);

    votes.cast(post_id, user_a, VoteType::Up).await.unwrap();
    assert_eq!(score(&pool, post_id).await, 0);

    for reader in [user_a, user_b, user_c] {
        let seen = score(&pool, post_id).await;
        assert_eq!(seen, 0, "reader {reader} sees a stale score");
    }
}
