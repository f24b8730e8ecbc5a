//! Internal job triggers for an external scheduler

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;

use super::{require_internal_token, AppState};
use crate::error::Result;

/// Run one publishing cycle now and return its report
pub async fn process_scheduled_posts(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    require_internal_token(&req, &state)?;
    let report = state.pipeline.process_due_posts(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(report))
}
