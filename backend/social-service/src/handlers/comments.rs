//! HTTP handlers for `/comments`, identical surface to
//! `content-service`'s comments routes — a caller switching deployment
//! modes should not observe any difference besides which host answers.

use crate::error::{AppError, Result};
use crate::middleware::{verify_hmac_request, OptionalUserContext};
use crate::models::UserContext;
use crate::services::comments::{CommentService, CommentWithLiked};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use social_core::adapters::CommentCounter;
use social_core::deployment::HmacConfig;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[serde(rename = "postId")]
    pub post_id: Uuid,
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    #[serde(rename = "parentCommentId")]
    pub parent_comment_id: Option<Uuid>,
}

pub async fn create_comment(
    service: web::Data<Arc<CommentService>>,
    user: UserContext,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let comment = service
        .create(req.post_id, &req.text, req.parent_comment_id, &user)
        .await?;
    Ok(HttpResponse::Created().json(comment))
}

#[derive(Debug, Deserialize)]
pub struct ListCommentsParams {
    #[serde(rename = "postId")]
    pub post_id: Uuid,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

pub async fn list_comments(
    service: web::Data<Arc<CommentService>>,
    viewer: OptionalUserContext,
    query: web::Query<ListCommentsParams>,
) -> Result<HttpResponse> {
    let viewer_id = viewer.0.map(|u| u.user_id);
    let page = service
        .list_by_post(query.post_id, query.cursor.as_deref(), query.limit.unwrap_or(0), viewer_id)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "comments": page.comments.into_iter().map(to_liked_json).collect::<Vec<_>>(),
        "nextCursor": page.next_cursor.unwrap_or_default(),
        "hasNext": page.has_next,
    })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[serde(rename = "commentId")]
    pub comment_id: Uuid,
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
}

pub async fn update_comment(
    service: web::Data<Arc<CommentService>>,
    user: UserContext,
    req: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let comment = service.update(req.comment_id, &req.text, &user).await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn get_comment(
    service: web::Data<Arc<CommentService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let comment = service.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(comment))
}

pub async fn like_comment(
    service: web::Data<Arc<CommentService>>,
    user: UserContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let (score, is_liked) = service.like(path.into_inner(), user.user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "score": score, "isLiked": is_liked })))
}

pub async fn delete_comment(
    service: web::Data<Arc<CommentService>>,
    user: UserContext,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (comment_id, post_id) = path.into_inner();
    service.delete(comment_id, post_id, &user).await?;
    Ok(HttpResponse::Ok().finish())
}

/// `GET /comments/actions/root-count/{postId}` — the HMAC-authenticated
/// service-to-service surface `content-service`'s `RpcCommentCounter`
/// calls for lazy `commentCounter` correction.
pub async fn service_get_root_comment_count(
    service: web::Data<Arc<CommentService>>,
    hmac_config: web::Data<HmacConfig>,
    http_req: HttpRequest,
    body: web::Bytes,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    verify_hmac_request(&http_req, &body, &hmac_config)?;
    let count = service
        .get_root_comment_count(path.into_inner())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "count": count })))
}

fn to_liked_json(c: CommentWithLiked) -> serde_json::Value {
    serde_json::json!({
        "comment": c.comment,
        "isLiked": c.is_liked,
    })
}
