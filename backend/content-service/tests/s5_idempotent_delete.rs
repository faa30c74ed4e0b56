//! Deleting a nonexistent post always succeeds; deleting the same post
//! twice succeeds both times and `deleted_date` is set exactly once.

mod common;

use content_service::services::posts::{CreatePostRequest, PostService};
use std::sync::Arc;
use uuid::Uuid;

struct NullCounter;

#[async_trait::async_trait]
impl social_core::adapters::CommentCounter for NullCounter {
    async fn get_root_comment_count(
        &self,
        _post_id: Uuid,
    ) -> Result<i64, social_core::adapters::AdapterError> {
        Ok(0)
    }
}

#[tokio::test]
#[ignore]
async fn delete_is_idempotent_and_deleted_date_is_set_once() {
    let pool = common::setup_test_db().await;
    let cache = Arc::new(content_service::cache::ContentCache::disabled());
    let posts = PostService::new(pool.clone(), cache, Arc::new(NullCounter));

    let user_a = common::user(Uuid::new_v4(), "alice");

    posts.soft_delete_post(Uuid::new_v4(), &user_a).await.expect("delete of a missing post succeeds");

    let post = posts
        .create_post(
            CreatePostRequest { post_type_id: 1, body: "will be deleted".to_string(), ..Default::default() },
            &user_a,
        )
        .await
        .unwrap();

    posts.soft_delete_post(post.id, &user_a).await.expect("first delete succeeds");
    let deleted_date_1: chrono::DateTime<chrono::Utc> =
        sqlx::query_scalar("SELECT deleted_date FROM posts WHERE id = $1")
            .bind(post.id)
            .fetch_one(&pool)
            .await
            .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    posts.soft_delete_post(post.id, &user_a).await.expect("second delete also succeeds");
    let deleted_date_2: chrono::DateTime<chrono::Utc> =
        sqlx::query_scalar("SELECT deleted_date FROM posts WHERE id = $1")
            .bind(post.id)
            .fetch_one(&pool)
            .await
            .unwrap();

    assert_eq!(deleted_date_1, deleted_date_2, "second delete must not overwrite deleted_date");

    let still_soft_deleted: bool = sqlx::query_scalar("SELECT deleted FROM posts WHERE id = $1")
        .bind(post.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(still_soft_deleted, "post row remains, only flagged");
}
