//! HTTP handlers for `/votes`.

use crate::error::Result;
use crate::models::{UserContext, VoteType};
use crate::services::votes::VoteService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    #[serde(rename = "postId")]
    pub post_id: Uuid,
    #[serde(rename = "voteType")]
    pub vote_type: VoteType,
}

pub async fn cast_vote(
    service: web::Data<Arc<VoteService>>,
    user: UserContext,
    req: web::Json<CastVoteRequest>,
) -> Result<HttpResponse> {
    let new_state = service.cast(req.post_id, user.user_id, req.vote_type).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "voteType": new_state })))
}

pub async fn get_vote(
    service: web::Data<Arc<VoteService>>,
    user: UserContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let vote_type = service.get_vote(path.into_inner(), user.user_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "voteType": vote_type })))
}
