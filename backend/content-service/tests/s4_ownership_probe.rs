//! A non-owner's update attempt against another user's post must fail and
//! must not mutate the stored row.

mod common;

use content_service::error::AppError;
use content_service::services::posts::{CreatePostRequest, PostService, UpdatePostRequest};
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
async fn non_owner_update_is_rejected_and_body_is_unchanged() {
    let pool = common::setup_test_db().await;
    let cache = Arc::new(content_service::cache::ContentCache::disabled());
    let posts = PostService::new(pool.clone(), cache, Arc::new(NullCounter));

    let user_a = common::user(Uuid::new_v4(), "alice");
    let user_b = common::user(Uuid::new_v4(), "bob");

    let post = posts
        .create_post(
            CreatePostRequest {
                post_type_id: 1,
                body: "original body".to_string(),
                ..Default::default()
            },
            &user_a,
        )
        .await
        .unwrap();

    let attempt = posts
        .update_post(
            post.id,
            UpdatePostRequest { body: Some("hacked".to_string()), ..Default::default() },
            &user_b,
        )
        .await;

    assert!(matches!(attempt, Err(AppError::NotFound(_)) | Err(AppError::Forbidden(_))));

    let reread = posts.get_post(post.id).await.unwrap();
    assert_eq!(reread.body, "original body");
}
