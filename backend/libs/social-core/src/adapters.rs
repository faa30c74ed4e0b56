//! `PostStatsUpdater` / `CommentCounter`: the cross-service adapter pair.
//!
//! Each trait has two implementations reachable from the composition root:
//! a Direct one (each service implements the trait for its own concrete
//! service type, delegating in-process — see `content-service::services::posts`
//! and `social-service::services::comments`) and the RPC one defined here,
//! which signs an HMAC request per `crypto_core::hmac` and calls the peer
//! service's HMAC-authenticated HTTP surface. Callers only ever hold
//! `Arc<dyn PostStatsUpdater>` / `Arc<dyn CommentCounter>` and never know
//! which implementation backs it.

use async_trait::async_trait;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("network error calling peer service: {0}")]
    Network(String),
    #[error("peer service returned an error status: {0}")]
    Status(u16),
    #[error("signing error: {0}")]
    Signing(String),
}

#[async_trait]
pub trait PostStatsUpdater: Send + Sync {
    /// Called by the Comments core when a root comment is created or
    /// soft-deleted. Failures are logged but must not roll back the
    /// comment mutation that triggered them (§4.4 / §7).
    async fn increment_comment_count_for_service(
        &self,
        post_id: Uuid,
        delta: i64,
    ) -> Result<(), AdapterError>;
}

#[async_trait]
pub trait CommentCounter: Send + Sync {
    /// Called by the Posts core for lazy `commentCounter` correction.
    async fn get_root_comment_count(&self, post_id: Uuid) -> Result<i64, AdapterError>;
}

const RPC_TIMEOUT: Duration = Duration::from_secs(5);

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}

fn sign_request(
    secret: &[u8],
    method: &str,
    path: &str,
    query: &str,
    body: &[u8],
    uid: &str,
) -> Result<(String, String), AdapterError> {
    let body_hash = hex::encode(crypto_core::hash::sha256(body));
    let timestamp = now_unix().to_string();
    let canonical = crypto_core::hmac::canonical_string(method, path, query, &body_hash, uid, &timestamp);
    let signature = crypto_core::hmac::sign(secret, &canonical)
        .map_err(|e| AdapterError::Signing(e.to_string()))?;
    Ok((signature, timestamp))
}

/// RPC implementation of `PostStatsUpdater`, calling
/// `PUT {posts_base_url}/posts/actions/comment/count` on the Posts service.
pub struct RpcPostStatsUpdater {
    client: reqwest::Client,
    base_url: String,
    hmac_secret: Vec<u8>,
    uid: String,
}

impl RpcPostStatsUpdater {
    pub fn new(base_url: String, hmac_secret: Vec<u8>, uid: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(RPC_TIMEOUT)
                .build()
                .expect("reqwest client builds"),
            base_url,
            hmac_secret,
            uid,
        }
    }
}

#[async_trait]
impl PostStatsUpdater for RpcPostStatsUpdater {
    async fn increment_comment_count_for_service(
        &self,
        post_id: Uuid,
        delta: i64,
    ) -> Result<(), AdapterError> {
        let path = "/posts/actions/comment/count";
        let body = serde_json::json!({ "postId": post_id, "delta": delta });
        let body_bytes = serde_json::to_vec(&body).map_err(|e| AdapterError::Signing(e.to_string()))?;
        let (signature, timestamp) =
            sign_request(&self.hmac_secret, "PUT", path, "", &body_bytes, &self.uid)?;

        let response = self
            .client
            .put(format!("{}{}", self.base_url, path))
            .header("X-Telar-Signature", format!("sha256={}", signature))
            .header("uid", &self.uid)
            .header("X-Timestamp", timestamp)
            .json(&body)
            .send()
            .await
            .map_err(|e| AdapterError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AdapterError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// RPC implementation of `CommentCounter`, calling
/// `GET {comments_base_url}/comments/actions/root-count/:postId` on the
/// Comments service.
pub struct RpcCommentCounter {
    client: reqwest::Client,
    base_url: String,
    hmac_secret: Vec<u8>,
    uid: String,
}

impl RpcCommentCounter {
    pub fn new(base_url: String, hmac_secret: Vec<u8>, uid: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(RPC_TIMEOUT)
                .build()
                .expect("reqwest client builds"),
            base_url,
            hmac_secret,
            uid,
        }
    }
}

#[async_trait]
impl CommentCounter for RpcCommentCounter {
    async fn get_root_comment_count(&self, post_id: Uuid) -> Result<i64, AdapterError> {
        let path = format!("/comments/actions/root-count/{}", post_id);
        let (signature, timestamp) =
            sign_request(&self.hmac_secret, "GET", &path, "", b"", &self.uid)?;

        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .header("X-Telar-Signature", format!("sha256={}", signature))
            .header("uid", &self.uid)
            .header("X-Timestamp", timestamp)
            .send()
            .await
            .map_err(|e| AdapterError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AdapterError::Status(response.status().as_u16()));
        }

        #[derive(serde::Deserialize)]
        struct CountResponse {
            count: i64,
        }
        let parsed: CountResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::Network(e.to_string()))?;
        Ok(parsed.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_is_deterministic_for_fixed_timestamp() {
        let secret = b"s".to_vec();
        let body = br#"{"postId":"x"}"#;
        let canonical = crypto_core::hmac::canonical_string(
            "PUT",
            "/posts/actions/comment/count",
            "",
            &hex::encode(crypto_core::hash::sha256(body)),
            "system",
            "1000",
        );
        let sig1 = crypto_core::hmac::sign(&secret, &canonical).unwrap();
        let sig2 = crypto_core::hmac::sign(&secret, &canonical).unwrap();
        assert_eq!(sig1, sig2);
    }
}
