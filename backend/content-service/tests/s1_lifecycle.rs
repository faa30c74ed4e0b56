//! Full post/comment/reply/like/delete lifecycle against a real database.

mod common;

use content_service::cache::ContentCache;
use content_service::error::AppError;
use content_service::services::comments::CommentService;
use content_service::services::posts::{CreatePostRequest, PostService};
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
#[ignore]
async fn lifecycle_post_comment_reply_like_then_delete() {
    let pool = common::setup_test_db().await;
    let cache = Arc::new(ContentCache::disabled());

    let user_a = common::user(Uuid::new_v4(), "alice");
    let user_b = common::user(Uuid::new_v4(), "bob");

    let posts = Arc::new(PostService::new(pool.clone(), cache.clone(), Arc::new(NullCounter)));
    let comments = Arc::new(CommentService::new(pool.clone(), posts.clone()));

    let p1 = posts
        .create_post(
            CreatePostRequest {
                post_type_id: 1,
                body: "Lifecycle Test Post".to_string(),
                permission: Some("Public".to_string()),
                ..Default::default()
            },
            &user_a,
        )
        .await
        .expect("post creates");

    let c1 = comments
        .create(p1.id, "C from B", None, &user_b)
        .await
        .expect("root comment creates");

    let r1 = comments
        .create(p1.id, "reply from A", Some(c1.id), &user_a)
        .await
        .expect("reply creates");

    let (score_after_like, liked) = comments.like(r1.id, user_b.user_id).await.expect("like toggles");
    assert!(liked);
    assert_eq!(score_after_like, 1);

    let p1_after = posts.get_post(p1.id).await.unwrap();
    assert_eq!(p1_after.comment_counter, 1);

    let c1_after = common::find_comment(&pool, c1.id).await;
    assert_eq!(c1_after.reply_count, 1);

    let r1_after = common::find_comment(&pool, r1.id).await;
    assert_eq!(r1_after.score, 1);

    comments.delete(c1.id, p1.id, &user_b).await.expect("comment deletes");

    let p1_after_delete = posts.get_post(p1.id).await.unwrap();
    assert_eq!(p1_after_delete.comment_counter, 0);

    let c1_deleted = common::find_comment(&pool, c1.id).await;
    assert!(c1_deleted.deleted);

    let r1_still_present = common::find_comment(&pool, r1.id).await;
    assert!(!r1_still_present.deleted);

    posts.soft_delete_post(p1.id, &user_a).await.expect("post deletes");

    let post_gone = posts.get_post(p1.id).await;
    assert!(matches!(post_gone, Err(AppError::NotFound(_))));

    let c1_gone = common::find_comment(&pool, c1.id).await;
    assert!(c1_gone.deleted, "cascade leaves the row soft-deleted");

    let r1_gone = common::find_comment(&pool, r1.id).await;
    assert!(r1_gone.deleted, "replies cascade with their post too");

    assert!(matches!(comments.get(c1.id).await, Err(AppError::NotFound(_))));
    assert!(matches!(comments.get(r1.id).await, Err(AppError::NotFound(_))));
}

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
