//! Cursor pagination over comments: limit+1 paging to exhaustion.

mod common;

use content_service::services::comments::CommentService;
use std::sync::Arc;
use uuid::Uuid;

struct NullCounter;

#[async_trait::async_trait]
impl social_core::adapters::PostStatsUpdater for NullCounter {
    async fn increment_comment_count_for_service(
        &self,
        _post_id: Uuid,
        _delta: i64,
    ) -> Result<(), social_core::adapters::AdapterError> {
        Ok(())
    }
}

#[tokio::test]
#[ignore]
async fn twenty_six_comments_page_in_tens_then_a_final_six() {
    let pool = common::setup_test_db().await;

    let post_id = Uuid::new_v4();
    let now = chrono::Utc::now();
    sqlx::query(
        "INSERT INTO posts (id, owner_user_id, owner_display_name, owner_avatar, post_type_id,
            body, permission, created_date, last_updated)
         VALUES ($1,$2,'alice','',1,'P','Public',$3,$3)",
    )
    .bind(post_id)
    .bind(Uuid::new_v4())
    .bind(now)
    .execute(&pool)
    .await
    .unwrap();

    let comments = CommentService::new(pool.clone(), Arc::new(NullCounter));
    let author = common::user(Uuid::new_v4(), "poster");
    for i in 0..26 {
        comments
            .create(post_id, &format!("comment {i}"), None, &author)
            .await
            .unwrap();
        // Guarantee strictly increasing created_date for a stable cursor
        // ordering — comments created in the same transaction can share a
        // timestamp at microsecond clock resolution.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let page1 = comments.list_by_post(post_id, None, 10, None).await.unwrap();
    assert_eq!(page1.comments.len(), 10);
    assert!(page1.has_next);
    let cursor1 = page1.next_cursor.clone().expect("non-empty cursor");
    assert!(!cursor1.is_empty());

    let page2 = comments
        .list_by_post(post_id, Some(&cursor1), 10, None)
        .await
        .unwrap();
    assert_eq!(page2.comments.len(), 10);
    assert!(page2.has_next);
    let cursor2 = page2.next_cursor.clone().expect("non-empty cursor");

    let page3 = comments
        .list_by_post(post_id, Some(&cursor2), 10, None)
        .await
        .unwrap();
    assert_eq!(page3.comments.len(), 6);
    assert!(!page3.has_next);
    assert!(page3.next_cursor.is_none());

    let mut seen: std::collections::HashSet<Uuid> = std::collections::HashSet::new();
    for page in [&page1, &page2, &page3] {
        for c in &page.comments {
            assert!(seen.insert(c.comment.id), "comment paged twice");
        }
    }
    assert_eq!(seen.len(), 26);
}
