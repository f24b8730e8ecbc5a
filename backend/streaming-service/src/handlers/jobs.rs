//! Internal job triggers for an external scheduler

use actix_web::{web, HttpRequest, HttpResponse};

use super::{require_internal_token, AppState};
use crate::error::Result;

/// Run one poll cycle now and return its report
pub async fn poll_stream_status(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    require_internal_token(&req, &state)?;
    let report = state.poller.poll_once().await?;
    Ok(HttpResponse::Ok().json(report))
}
