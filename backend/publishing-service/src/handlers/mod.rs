//! HTTP handlers for publishing-service
//!
//! - Scheduled post CRUD for the artist portal
//! - Internal publishing trigger

pub mod jobs;
pub mod posts;

use actix_middleware::has_internal_token;
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::metrics;
use crate::services::{PostService, PublishingPipeline};

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<PostService>,
    pub pipeline: Arc<PublishingPipeline>,
    /// Token for `/api/*` and `/internal/*`; those routes are closed when `None`
    pub internal_api_token: Option<String>,
}

pub use actix_middleware::INTERNAL_TOKEN_HEADER;

/// Reject the request unless it carries the configured internal token
pub fn require_internal_token(req: &HttpRequest, state: &AppState) -> Result<()> {
    if has_internal_token(req, state.internal_api_token.as_deref()) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("internal token required".to_string()))
    }
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

/// Route table shared by the server and handler tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics::serve_metrics))
        .service(
            web::scope("/api/v1")
                .route("/scheduled-posts", web::post().to(posts::create_post))
                .route("/scheduled-posts/{id}", web::get().to(posts::get_post))
                .route("/scheduled-posts/{id}", web::delete().to(posts::cancel_post))
                .route(
                    "/artists/{artist_id}/scheduled-posts",
                    web::get().to(posts::list_artist_posts),
                ),
        )
        .service(web::scope("/internal/jobs").route(
            "/process-scheduled-posts",
            web::post().to(jobs::process_scheduled_posts),
        ));
}
