//! Root comment create, reply, like, and delete against a real database,
//! with a recording `PostStatsUpdater` standing in for the HMAC RPC call
//! to `content-service` this service would make in a live deployment.

mod common;

use social_core::adapters::{AdapterError, PostStatsUpdater};
use social_service::services::comments::CommentService;
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
async fn lifecycle_root_reply_like_then_delete() {
    let pool = common::setup_test_db().await;
    let alice = common::user(Uuid::new_v4(), "alice");
    let bob = common::user(Uuid::new_v4(), "bob");

    let post_id = common::insert_post(&pool, alice.user_id).await;
    let stats = Arc::new(RecordingPostStats::default());
    let comments = CommentService::new(pool.clone(), stats.clone());

    let root = comments.create(post_id, "hello", None, &bob).await.expect("root creates");
    let reply = comments
        .create(post_id, "reply", Some(root.id), &alice)
        .await
        .expect("reply creates");

    assert_eq!(stats.calls.lock().unwrap().as_slice(), &[(post_id, 1)]);

    let (score, liked) = comments.like(reply.id, bob.user_id).await.expect("like toggles");
    assert!(liked);
    assert_eq!(score, 1);
    let (score, unliked) = comments.like(reply.id, bob.user_id).await.expect("like toggles back");
    assert!(!unliked);
    assert_eq!(score, 0);

    comments.delete(root.id, post_id, &bob).await.expect("root deletes");
    assert_eq!(
        stats.calls.lock().unwrap().as_slice(),
        &[(post_id, 1), (post_id, -1)],
        "delete decrements through the same adapter the create incremented through"
    );

    // Idempotent: deleting again is a no-op, not an error.
    comments.delete(root.id, post_id, &bob).await.expect("second delete is a no-op");
}

#[tokio::test]
#[ignore]
async fn reply_to_nonexistent_parent_is_rejected() {
    let pool = common::setup_test_db().await;
    let alice = common::user(Uuid::new_v4(), "alice");
    let post_id = common::insert_post(&pool, alice.user_id).await;
    let stats = Arc::new(RecordingPostStats::default());
    let comments = CommentService::new(pool.clone(), stats);

    let result = comments.create(post_id, "orphan reply", Some(Uuid::new_v4()), &alice).await;
    assert!(result.is_err());
}

#[tokio::test]
#[ignore]
async fn only_owner_can_edit_or_delete() {
    let pool = common::setup_test_db().await;
    let alice = common::user(Uuid::new_v4(), "alice");
    let bob = common::user(Uuid::new_v4(), "bob");
    let post_id = common::insert_post(&pool, alice.user_id).await;
    let stats = Arc::new(RecordingPostStats::default());
    let comments = CommentService::new(pool.clone(), stats);

    let c = comments.create(post_id, "mine", None, &alice).await.unwrap();

    let edit_attempt = comments.update(c.id, "hijacked", &bob).await;
    assert!(edit_attempt.is_err());

    // A non-owner's delete is a silent no-op, never an error — it must not
    // reveal whether the comment exists.
    comments.delete(c.id, post_id, &bob).await.expect("non-owner delete is a no-op");
    let still_there = social_service::db::comment_repo::find_by_id(&pool, c.id).await.unwrap();
    assert!(!still_there.deleted);
}
