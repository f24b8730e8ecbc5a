//! Provider webhook endpoint

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::warn;

use super::AppState;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::services::streaming::stream_webhook::verify_signature;
use crate::services::streaming::WebhookEnvelope;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Accepts `stream.*` events. Events for unknown streams or with unknown
/// names are acknowledged with 200 so the provider does not redeliver them.
pub async fn stream_events(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    if let Some(secret) = state.webhook_secret.as_deref() {
        let signature = req
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !verify_signature(secret, &body, signature) {
            warn!("Rejected webhook with invalid signature");
            metrics::record_webhook_event("unknown", "rejected");
            return Err(AppError::InvalidSignature);
        }
    }

    let envelope: WebhookEnvelope = serde_json::from_slice(&body)?;
    let outcome = match state.webhooks.handle(&envelope).await {
        Ok(outcome) => outcome,
        Err(e) => {
            metrics::record_webhook_event(&envelope.event, "error");
            return Err(e);
        }
    };

    metrics::record_webhook_event(&envelope.event, outcome.label());
    Ok(HttpResponse::Ok().json(outcome))
}
