//! Auth gates: JWT bearer extraction into [`UserContext`] for user-facing
//! routes, and HMAC-signed request verification for service-to-service
//! routes. Identical in shape to `content-service::middleware` — both
//! services verify against the same auth service's public key and the
//! same HMAC secret, they just each parse into their own local
//! `UserContext` copy.

use crate::error::AppError;
use crate::models::UserContext;
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use uuid::Uuid;

fn extract_bearer(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn claims_to_user_context(claims: &crypto_core::jwt::Claims) -> Result<UserContext, AppError> {
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("invalid subject in token".to_string()))?;
    Ok(UserContext {
        user_id,
        display_name: claims.display_name.clone(),
        avatar: claims.avatar.clone(),
        social_name: claims.social_name.clone(),
        system_role: claims.system_role.clone(),
    })
}

/// Required authentication: rejects the request with 401 when no valid
/// bearer token is present.
impl FromRequest for UserContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = (|| {
            let token = extract_bearer(req)
                .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
            let token_data = crypto_core::jwt::validate_token(&token)
                .map_err(|e| AppError::Unauthorized(e.to_string()))?;
            claims_to_user_context(&token_data.claims)
        })();
        ready(result)
    }
}

/// Optional authentication: used by `GET /comments` so an anonymous caller
/// still gets a comment list, just without per-viewer `isLiked` enrichment.
pub struct OptionalUserContext(pub Option<UserContext>);

impl FromRequest for OptionalUserContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = extract_bearer(req).and_then(|token| {
            crypto_core::jwt::validate_token(&token)
                .ok()
                .and_then(|data| claims_to_user_context(&data.claims).ok())
        });
        ready(Ok(OptionalUserContext(user)))
    }
}

/// Verifies an inbound HMAC-signed service-to-service request against the
/// `X-Telar-Signature` / `uid` / `X-Timestamp` headers and the raw request
/// body. Called at the top of this service's `/comments/actions/*`
/// handlers — the one `content-service` calls through `RpcCommentCounter`.
pub fn verify_hmac_request(
    req: &HttpRequest,
    body: &web::Bytes,
    hmac_config: &social_core::deployment::HmacConfig,
) -> Result<(), AppError> {
    let signature = req
        .headers()
        .get("X-Telar-Signature")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("sha256="))
        .ok_or_else(|| AppError::Unauthorized("missing X-Telar-Signature".to_string()))?;
    let uid = req
        .headers()
        .get("uid")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing uid header".to_string()))?;
    let timestamp: i64 = req
        .headers()
        .get("X-Timestamp")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| AppError::Unauthorized("missing or invalid X-Timestamp".to_string()))?;

    let body_hash = hex::encode(crypto_core::hash::sha256(body));
    let query = req.query_string();
    let canonical = crypto_core::hmac::canonical_string(
        req.method().as_str(),
        req.path(),
        query,
        &body_hash,
        uid,
        &timestamp.to_string(),
    );

    let now = chrono::Utc::now().timestamp();
    crypto_core::hmac::verify(
        &hmac_config.secret,
        &canonical,
        signature,
        timestamp,
        now,
        hmac_config.clock_skew_seconds,
    )
    .map_err(|e| AppError::Unauthorized(e.to_string()))
}
