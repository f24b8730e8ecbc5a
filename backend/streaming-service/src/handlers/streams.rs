/// Stream handlers - HTTP endpoints for the artist portal backend
use actix_web::{web, HttpRequest, HttpResponse};
use uuid::Uuid;

use super::{require_internal_token, AppState};
use crate::error::Result;
use crate::services::streaming::models::{CreateStreamRequest, ListStreamsQuery};

/// Create a stream; the response is the only place the stream key appears
pub async fn create_stream(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateStreamRequest>,
) -> Result<HttpResponse> {
    require_internal_token(&req, &state)?;
    let created = state.streams.create_stream(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_stream(
    state: web::Data<AppState>,
    req: HttpRequest,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_internal_token(&req, &state)?;
    let stream = state.streams.get_stream(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(stream))
}

/// Newest first, `limit` defaults to 20 and is capped at 100
pub async fn list_artist_streams(
    state: web::Data<AppState>,
    req: HttpRequest,
    artist_id: web::Path<Uuid>,
    query: web::Query<ListStreamsQuery>,
) -> Result<HttpResponse> {
    require_internal_token(&req, &state)?;
    let streams = state
        .streams
        .list_artist_streams(artist_id.into_inner(), query.limit)
        .await?;
    Ok(HttpResponse::Ok().json(streams))
}
