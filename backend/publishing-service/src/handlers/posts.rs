/// Scheduled post handlers - HTTP endpoints for the artist portal backend
use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;

use super::{require_internal_token, AppState};
use crate::error::Result;
use crate::services::publishing::models::{CreatePostRequest, ListPostsQuery};

pub async fn create_post(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    require_internal_token(&req, &state)?;
    let post = state.posts.create_post(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn get_post(
    state: web::Data<AppState>,
    req: HttpRequest,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_internal_token(&req, &state)?;
    let post = state.posts.get_post(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Only `scheduled` posts can be cancelled; anything later is a 409
pub async fn cancel_post(
    state: web::Data<AppState>,
    req: HttpRequest,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_internal_token(&req, &state)?;
    state.posts.cancel_post(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Latest `scheduled_at` first, `limit` defaults to 20 and is capped at 100
pub async fn list_artist_posts(
    state: web::Data<AppState>,
    req: HttpRequest,
    artist_id: web::Path<Uuid>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse> {
    require_internal_token(&req, &state)?;
    let posts = state
        .posts
        .list_artist_posts(artist_id.into_inner(), query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(posts))
}
