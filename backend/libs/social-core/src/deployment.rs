//! Deployment-mode and cross-service-call configuration, read once at
//! process start and used to pick the Direct or RPC adapter at the
//! composition root.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    /// Both services co-hosted in one process; adapters delegate in-process.
    Serverless,
    /// Services deployed independently; adapters call over HMAC-signed HTTP.
    Microservices,
}

impl DeploymentMode {
    pub fn from_env() -> Self {
        match std::env::var("DEPLOYMENT_MODE").as_deref() {
            Ok("microservices") => DeploymentMode::Microservices,
            _ => DeploymentMode::Serverless,
        }
    }
}

/// HMAC signing secret and the replay window accepted around `now`.
#[derive(Debug, Clone)]
pub struct HmacConfig {
    pub secret: Vec<u8>,
    pub clock_skew_seconds: i64,
}

impl HmacConfig {
    pub fn from_env() -> Self {
        let secret = std::env::var("HMAC_SECRET").unwrap_or_else(|_| "dev-hmac-secret".to_string());
        let clock_skew_seconds = std::env::var("HMAC_CLOCK_SKEW_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(300);
        Self {
            secret: secret.into_bytes(),
            clock_skew_seconds,
        }
    }
}

/// Base URLs the RPC adapters dial in `microservices` mode.
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub posts_base_url: String,
    pub comments_base_url: String,
}

impl ServiceEndpoints {
    pub fn from_env() -> Self {
        Self {
            posts_base_url: std::env::var("POSTS_SERVICE_ADDR")
                .unwrap_or_else(|_| "http://content-service:8081".to_string()),
            comments_base_url: std::env::var("COMMENTS_SERVICE_ADDR")
                .unwrap_or_else(|_| "http://social-service:8082".to_string()),
        }
    }
}
