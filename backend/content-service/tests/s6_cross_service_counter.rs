//! Three root comments yield exactly three `PostStatsUpdater` calls,
//! whether the adapter is the direct in-process form (serverless) or a
//! stand-in for the RPC transport (microservices) — the call pattern is
//! identical either way, which is the contract the adapter pair exists to
//! guarantee.

mod common;

use content_service::services::comments::CommentService;
use content_service::services::posts::{CreatePostRequest, PostService};
use social_core::adapters::{AdapterError, PostStatsUpdater};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct RecordingPostStats {
    calls: Mutex<Vec<(Uuid, i64)>>,
}

#[async_trait::async_trait]
impl PostStatsUpdater for RecordingPostStats {
    async fn increment_comment_count_for_service(
        &self,
        post_id: Uuid,
        delta: i64,
    ) -> Result<(), AdapterError> {
        self.calls.lock().unwrap().push((post_id, delta));
        Ok(())
    }
}

#[tokio::test]
#[ignore]
async fn serverless_mode_records_one_call_per_root_comment() {
    let pool = common::setup_test_db().await;
    let author = common::user(Uuid::new_v4(), "poster");

    let post_id = Uuid::new_v4();
    let now = chrono::Utc::now();
    sqlx::query(
        "INSERT INTO posts (id, owner_user_id, owner_display_name, owner_avatar, post_type_id,
            body, permission, created_date, last_updated)
         VALUES ($1,$2,'alice','',1,'P','Public',$3,$3)",
    )
    .bind(post_id)
    .bind(author.user_id)
    .bind(now)
    .execute(&pool)
    .await
    .unwrap();

    // In serverless mode `PostService` itself implements `PostStatsUpdater`
    // and is handed to `CommentService` directly, in-process.
    let cache = Arc::new(content_service::cache::ContentCache::disabled());
    let posts = Arc::new(PostService::new(
        pool.clone(),
        cache,
        Arc::new(content_service::services::comments::CommentService::new(
            pool.clone(),
            Arc::new(RecordingPostStats::default()),
        )),
    ));
    let comments = CommentService::new(pool.clone(), posts.clone());

    for i in 0..3 {
        comments.create(post_id, &format!("root {i}"), None, &author).await.unwrap();
    }

    let counted: i64 = sqlx::query_scalar("SELECT comment_counter FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(counted, 3, "direct adapter increments the real post row three times");
}

#[tokio::test]
#[ignore]
async fn microservices_mode_recording_stub_sees_three_calls() {
    let pool = common::setup_test_db().await;
    let author = common::user(Uuid::new_v4(), "poster");

    let post_id = Uuid::new_v4();
    let now = chrono::Utc::now();
    sqlx::query(
        "INSERT INTO posts (id, owner_user_id, owner_display_name, owner_avatar, post_type_id,
            body, permission, created_date, last_updated)
         VALUES ($1,$2,'alice','',1,'P','Public',$3,$3)",
    )
    .bind(post_id)
    .bind(author.user_id)
    .bind(now)
    .execute(&pool)
    .await
    .unwrap();

    // In microservices mode comments live in a separate process and reach
    // the post-stats contract only through the HMAC RPC adapter; a
    // recording stub standing in for that transport observes the same
    // call pattern without needing a live HTTP round trip.
    let stats = Arc::new(RecordingPostStats::default());
    let comments = CommentService::new(pool.clone(), stats.clone());

    for i in 0..3 {
        comments.create(post_id, &format!("root {i}"), None, &author).await.unwrap();
    }

    let calls = stats.calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|&(id, delta)| id == post_id && delta == 1));
}
