//! HTTP handlers for `/posts`.

use crate::error::{AppError, Result};
use crate::middleware::{verify_hmac_request, OptionalUserContext};
use crate::models::{PostFilter, SortDirection, SortField, UserContext};
use crate::services::posts::{CreatePostRequest, PageRequest, PostService, UpdatePostRequest};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use social_core::adapters::PostStatsUpdater;
use social_core::deployment::HmacConfig;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub async fn create_post(
    service: web::Data<Arc<PostService>>,
    user: UserContext,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let post = service.create_post(req.into_inner(), &user).await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn get_post(
    service: web::Data<Arc<PostService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = service.get_post(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn get_post_by_url_key(
    service: web::Data<Arc<PostService>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let post = service.get_post_by_url_key(&path).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[derive(Debug, Deserialize)]
pub struct QueryPostsParams {
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub owner: Option<Uuid>,
    pub tags: Option<String>,
    #[serde(rename = "postTypeId")]
    pub post_type_id: Option<i32>,
    pub deleted: Option<bool>,
    pub search: Option<String>,
}

impl QueryPostsParams {
    fn filter(&self) -> PostFilter {
        PostFilter {
            owner_user_id: self.owner,
            post_type_id: self.post_type_id,
            tags: self
                .tags
                .as_ref()
                .map(|t| t.split(',').map(str::to_string).collect()),
            deleted: self.deleted,
            created_after: None,
            search_text: None,
        }
    }
}

pub async fn query_posts(
    service: web::Data<Arc<PostService>>,
    viewer: OptionalUserContext,
    query: web::Query<QueryPostsParams>,
) -> Result<HttpResponse> {
    let page_req = PageRequest { limit: query.limit.unwrap_or(0), page: query.page.unwrap_or(0) };
    let viewer_id = viewer.0.map(|u| u.user_id);

    let page = if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        service.search_posts(search, &query.filter(), &page_req, viewer_id).await?
    } else {
        service.query_posts(&query.filter(), &page_req, viewer_id).await?
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "posts": page.posts.into_iter().map(to_enriched_json).collect::<Vec<_>>(),
        "totalCount": page.total_count,
        "page": page.page,
        "limit": page.limit,
        "hasNext": page.has_next,
        "nextCursor": page.next_cursor.unwrap_or_default(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct QueryCursorParams {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    pub owner: Option<Uuid>,
    pub tags: Option<String>,
    #[serde(rename = "postTypeId")]
    pub post_type_id: Option<i32>,
    pub deleted: Option<bool>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<SortField>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortDirection>,
}

impl QueryCursorParams {
    fn filter(&self) -> PostFilter {
        PostFilter {
            owner_user_id: self.owner,
            post_type_id: self.post_type_id,
            tags: self
                .tags
                .as_ref()
                .map(|t| t.split(',').map(str::to_string).collect()),
            deleted: self.deleted,
            created_after: None,
            search_text: None,
        }
    }
}

pub async fn query_posts_with_cursor(
    service: web::Data<Arc<PostService>>,
    viewer: OptionalUserContext,
    query: web::Query<QueryCursorParams>,
) -> Result<HttpResponse> {
    let sort_field = query.sort_by.unwrap_or_default();
    let sort_direction = query.sort_order.unwrap_or_default();
    let viewer_id = viewer.0.map(|u| u.user_id);

    let page = service
        .query_posts_with_cursor(
            &query.filter(),
            query.cursor.as_deref(),
            sort_field,
            sort_direction,
            query.limit.unwrap_or(0),
            viewer_id,
        )
        .await?;

    Ok(HttpResponse::Ok().json(cursor_page_json(page)))
}

#[derive(Debug, Deserialize)]
pub struct SearchCursorParams {
    pub q: String,
    pub limit: Option<i64>,
    pub cursor: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<SortField>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortDirection>,
}

pub async fn search_posts_with_cursor(
    service: web::Data<Arc<PostService>>,
    viewer: OptionalUserContext,
    query: web::Query<SearchCursorParams>,
) -> Result<HttpResponse> {
    let sort_field = query.sort_by.unwrap_or_default();
    let sort_direction = query.sort_order.unwrap_or_default();
    let viewer_id = viewer.0.map(|u| u.user_id);
    let filter = PostFilter::default();

    let page = service
        .search_posts_with_cursor(
            &query.q,
            &filter,
            query.cursor.as_deref(),
            sort_field,
            sort_direction,
            query.limit.unwrap_or(0),
            viewer_id,
        )
        .await?;

    Ok(HttpResponse::Ok().json(cursor_page_json(page)))
}

#[derive(Debug, Deserialize)]
pub struct CursorInfoParams {
    #[serde(rename = "sortBy")]
    pub sort_by: Option<SortField>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortDirection>,
}

pub async fn cursor_info(
    service: web::Data<Arc<PostService>>,
    path: web::Path<Uuid>,
    query: web::Query<CursorInfoParams>,
) -> Result<HttpResponse> {
    let post_id = path.into_inner();
    let sort_field = query.sort_by.unwrap_or_default();
    let sort_direction = query.sort_order.unwrap_or_default();

    let (cursor, position) = service.cursor_info(post_id, sort_field, sort_direction).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "postId": post_id,
        "cursor": cursor,
        "position": position,
        "sortBy": sort_field,
        "sortOrder": sort_direction,
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostBody {
    #[serde(rename = "objectId")]
    pub object_id: Uuid,
    #[serde(flatten)]
    pub patch: UpdatePostRequestBody,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequestBody {
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
    pub video: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(rename = "albumTitle")]
    pub album_title: Option<String>,
    #[serde(rename = "albumCover")]
    pub album_cover: Option<String>,
    #[serde(rename = "albumPhotos")]
    pub album_photos: Option<serde_json::Value>,
    pub permission: Option<String>,
    #[serde(rename = "disableComments")]
    pub disable_comments: Option<bool>,
    #[serde(rename = "disableSharing")]
    pub disable_sharing: Option<bool>,
}

pub async fn update_post(
    service: web::Data<Arc<PostService>>,
    user: UserContext,
    req: web::Json<UpdatePostBody>,
) -> Result<HttpResponse> {
    let body = req.into_inner();
    let update = UpdatePostRequest {
        body: body.patch.body,
        tags: body.patch.tags,
        image: body.patch.image,
        video: body.patch.video,
        thumbnail: body.patch.thumbnail,
        album_title: body.patch.album_title,
        album_cover: body.patch.album_cover,
        album_photos: body.patch.album_photos,
        permission: body.patch.permission,
        disable_comments: body.patch.disable_comments,
        disable_sharing: body.patch.disable_sharing,
    };
    let post = service.update_post(body.object_id, update, &user).await?;
    Ok(HttpResponse::Ok().json(post))
}

#[derive(Debug, Deserialize)]
pub struct ToggleDisableBody {
    #[serde(rename = "objectId")]
    pub object_id: Uuid,
    pub disable: bool,
}

pub async fn disable_comments(
    service: web::Data<Arc<PostService>>,
    user: UserContext,
    req: web::Json<ToggleDisableBody>,
) -> Result<HttpResponse> {
    service.set_comment_disabled(req.object_id, req.disable, &user).await?;
    Ok(HttpResponse::Ok().finish())
}

pub async fn disable_sharing(
    service: web::Data<Arc<PostService>>,
    user: UserContext,
    req: web::Json<ToggleDisableBody>,
) -> Result<HttpResponse> {
    service.set_sharing_disabled(req.object_id, req.disable, &user).await?;
    Ok(HttpResponse::Ok().finish())
}

pub async fn generate_url_key(
    service: web::Data<Arc<PostService>>,
    user: UserContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let url_key = service.generate_url_key(path.into_inner(), &user).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "urlKey": url_key })))
}

pub async fn delete_post(
    service: web::Data<Arc<PostService>>,
    user: UserContext,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    service.soft_delete_post(path.into_inner(), &user).await?;
    Ok(HttpResponse::Ok().finish())
}

/// `PUT /posts/actions/comment/count` — the HMAC-authenticated
/// service-to-service surface `RpcPostStatsUpdater` calls.
#[derive(Debug, Deserialize)]
pub struct ServiceCommentCountBody {
    #[serde(rename = "postId")]
    pub post_id: Uuid,
    pub delta: i64,
}

pub async fn service_increment_comment_count(
    service: web::Data<Arc<PostService>>,
    hmac_config: web::Data<HmacConfig>,
    http_req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    verify_hmac_request(&http_req, &body, &hmac_config)?;
    let payload: ServiceCommentCountBody =
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;

    service
        .increment_comment_count_for_service(payload.post_id, payload.delta)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(HttpResponse::Ok().finish())
}

fn to_enriched_json(p: crate::services::posts::PostWithEnrichment) -> serde_json::Value {
    serde_json::json!({
        "post": p.post,
        "voteType": p.enrichment.vote_type,
        "isBookmarked": p.enrichment.is_bookmarked,
    })
}

fn cursor_page_json(page: crate::services::posts::CursorPage) -> serde_json::Value {
    serde_json::json!({
        "posts": page.posts.into_iter().map(to_enriched_json).collect::<Vec<_>>(),
        "nextCursor": page.next_cursor.unwrap_or_default(),
        "hasNext": page.has_next,
    })
}
