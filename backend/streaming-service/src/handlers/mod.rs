//! HTTP handlers for streaming-service
//!
//! - Stream CRUD for the artist portal
//! - Provider webhook intake
//! - Internal job triggers

pub mod jobs;
pub mod streams;
pub mod webhooks;

use actix_middleware::has_internal_token;
use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::metrics;
use crate::services::{StreamService, StreamStatusPoller, StreamWebhookHandler};

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub streams: Arc<StreamService>,
    pub webhooks: Arc<StreamWebhookHandler>,
    pub poller: Arc<StreamStatusPoller>,
    /// Hex HMAC secret for `x-webhook-signature`; unchecked when `None`
    pub webhook_secret: Option<String>,
    /// Token for `/internal/*`; those routes are closed when `None`
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
                .route("/streams", web::post().to(streams::create_stream))
                .route("/streams/{id}", web::get().to(streams::get_stream))
                .route(
                    "/artists/{artist_id}/streams",
                    web::get().to(streams::list_artist_streams),
                )
                .route(
                    "/webhooks/stream-events",
                    web::post().to(webhooks::stream_events),
                ),
        )
        .service(
            web::scope("/internal/jobs")
                .route("/poll-stream-status", web::post().to(jobs::poll_stream_status)),
        );
}
