//! Cursor pagination over a post's root comments, including the
//! Limit+1 `hasNext` signal and the per-viewer `isLiked` enrichment.

mod common;

use social_core::adapters::{AdapterError, PostStatsUpdater};
use social_service::services::comments::CommentService;
use std::sync::Arc;
use uuid::Uuid;

struct NullPostStats;

#[async_trait::async_trait]
impl PostStatsUpdater for NullPostStats {
    async fn increment_comment_count_for_service(
        &self,
        _post_id: Uuid,
        _delta: i64,
    ) -> Result<(), AdapterError> {
        Ok(())
    }
}

#[tokio::test]
#[ignore]
async fn cursor_pages_through_newest_first_with_viewer_likes() {
    let pool = common::setup_test_db().await;
    let alice = common::user(Uuid::new_v4(), "alice");
    let bob = common::user(Uuid::new_v4(), "bob");
    let post_id = common::insert_post(&pool, alice.user_id).await;

    let comments = CommentService::new(pool.clone(), Arc::new(NullPostStats));

    let mut created = Vec::new();
    for i in 0..5 {
        let c = comments.create(post_id, &format!("comment {i}"), None, &alice).await.unwrap();
        created.push(c);
    }
    comments.like(created[4].id, bob.user_id).await.unwrap();

    let page1 = comments.list_by_post(post_id, None, 2, Some(bob.user_id)).await.unwrap();
    assert_eq!(page1.comments.len(), 2);
    assert!(page1.has_next);
    assert_eq!(page1.comments[0].comment.id, created[4].id, "newest first");
    assert!(page1.comments[0].is_liked);

    let page2 = comments
        .list_by_post(post_id, page1.next_cursor.as_deref(), 2, Some(bob.user_id))
        .await
        .unwrap();
    assert_eq!(page2.comments.len(), 2);
    assert!(page2.has_next);

    let page3 = comments
        .list_by_post(post_id, page2.next_cursor.as_deref(), 2, Some(bob.user_id))
        .await
        .unwrap();
    assert_eq!(page3.comments.len(), 1);
    assert!(!page3.has_next);
    assert!(page3.next_cursor.is_none());
}

#[tokio::test]
#[ignore]
async fn anonymous_viewer_sees_no_liked_comments() {
    let pool = common::setup_test_db().await;
    let alice = common::user(Uuid::new_v4(), "alice");
    let post_id = common::insert_post(&pool, alice.user_id).await;
    let comments = CommentService::new(pool.clone(), Arc::new(NullPostStats));

    let c = comments.create(post_id, "hi", None, &alice).await.unwrap();
    comments.like(c.id, Uuid::new_v4()).await.unwrap();

    let page = comments.list_by_post(post_id, None, 10, None).await.unwrap();
    assert!(page.comments.iter().all(|c| !c.is_liked));
}
