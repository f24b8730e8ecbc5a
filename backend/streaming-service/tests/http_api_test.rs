mod common;

use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use common::{stream, Harness};
use streaming_service::handlers::{self, AppState, INTERNAL_TOKEN_HEADER};
use streaming_service::services::streaming::stream_webhook::sign;
use streaming_service::services::streaming::{
    ProviderState, StreamProvider, StreamService, StreamStatus, StreamStatusPoller,
    StreamWebhookHandler,
};

const SECRET: &str = "whsec_test";
const TOKEN: &str = "internal-token";

fn state(h: &Harness) -> AppState {
    AppState {
        streams: Arc::new(StreamService::new(h.store.clone(), h.provider.clone())),
        webhooks: Arc::new(StreamWebhookHandler::new(h.store.clone(), h.sync(), None)),
        poller: Arc::new(StreamStatusPoller::new(
            h.store.clone(),
            h.provider.clone(),
            h.sync(),
        )),
        webhook_secret: Some(SECRET.to_string()),
        internal_api_token: Some(TOKEN.to_string()),
    }
}

macro_rules! app {
    ($h:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(state(&$h)))
                .configure(handlers::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn create_mux_stream_returns_key_once() {
    let h = Harness::new();
    let app = app!(h);
    let artist_id = Uuid::new_v4();

    let req = test::TestRequest::post()
        .uri("/api/v1/streams")
        .insert_header((INTERNAL_TOKEN_HEADER, TOKEN))
        .set_json(json!({
            "artist_id": artist_id,
            "title": "Listening party",
            "provider": "mux",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "waiting");
    assert_eq!(body["provider_stream_id"], "mux-created-1");
    assert_eq!(body["stream_key"], "sk-live-123");

    let id = body["id"].as_str().unwrap().to_string();
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/streams/{}", id))
        .insert_header((INTERNAL_TOKEN_HEADER, TOKEN))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["title"], "Listening party");
    assert!(body.get("stream_key").is_none());

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/artists/{}/streams?limit=5", artist_id))
        .insert_header((INTERNAL_TOKEN_HEADER, TOKEN))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[actix_web::test]
async fn create_livepush_stream_requires_provider_id() {
    let h = Harness::new();
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/streams")
        .insert_header((INTERNAL_TOKEN_HEADER, TOKEN))
        .set_json(json!({
            "artist_id": Uuid::new_v4(),
            "title": "Acoustic set",
            "provider": "livepush",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let req = test::TestRequest::post()
        .uri("/api/v1/streams")
        .insert_header((INTERNAL_TOKEN_HEADER, TOKEN))
        .set_json(json!({
            "artist_id": Uuid::new_v4(),
            "title": "",
            "provider": "livepush",
            "provider_stream_id": "lp-9",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn create_mux_stream_rejects_caller_provider_id() {
    let h = Harness::new();
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/api/v1/streams")
        .insert_header((INTERNAL_TOKEN_HEADER, TOKEN))
        .set_json(json!({
            "artist_id": Uuid::new_v4(),
            "title": "Listening party",
            "provider": "mux",
            "provider_stream_id": "mux-existing",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert_eq!(*h.provider.created.lock().unwrap(), 0);
}

#[actix_web::test]
async fn stream_routes_require_internal_token() {
    let h = Harness::new();
    let app = app!(h);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/artists/{}/streams", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn unknown_stream_returns_404() {
    let h = Harness::new();
    let app = app!(h);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/streams/{}", Uuid::new_v4()))
        .insert_header((INTERNAL_TOKEN_HEADER, TOKEN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn webhook_requires_valid_signature() {
    let h = Harness::new();
    let s = stream(StreamProvider::Livepush, "lp-1", StreamStatus::Waiting, None);
    h.store.insert(s.clone());
    let app = app!(h);
    let body = json!({ "event": "stream.started", "stream_id": "lp-1" }).to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/webhooks/stream-events")
        .insert_header(("x-webhook-signature", "deadbeef"))
        .set_payload(body.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    assert_eq!(h.store.snapshot(s.id).status, StreamStatus::Waiting);

    let req = test::TestRequest::post()
        .uri("/api/v1/webhooks/stream-events")
        .insert_header(("x-webhook-signature", sign(SECRET, body.as_bytes())))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(h.store.snapshot(s.id).status, StreamStatus::Live);
}

#[actix_web::test]
async fn webhook_rejects_malformed_bodies() {
    let h = Harness::new();
    let s = stream(StreamProvider::Livepush, "lp-1", StreamStatus::Live, Some(chrono::Utc::now()));
    h.store.insert(s.clone());
    let app = app!(h);

    let truncated = r#"{"event":"stream.ended","stream_id":"lp-"#.to_string();
    let missing_count =
        json!({ "event": "stream.viewer_update", "stream_id": "lp-1", "data": {} }).to_string();

    for body in [truncated, missing_count, "not json".to_string()] {
        let req = test::TestRequest::post()
            .uri("/api/v1/webhooks/stream-events")
            .insert_header(("x-webhook-signature", sign(SECRET, body.as_bytes())))
            .set_payload(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "INVALID_REQUEST");
    }

    let stored = h.store.snapshot(s.id);
    assert_eq!(stored.status, StreamStatus::Live);
    assert_eq!(stored.viewer_count, 0);
}

#[actix_web::test]
async fn webhook_for_unknown_stream_is_acknowledged() {
    let h = Harness::new();
    let app = app!(h);
    let body = json!({ "event": "stream.ended", "stream_id": "missing" }).to_string();

    let req = test::TestRequest::post()
        .uri("/api/v1/webhooks/stream-events")
        .insert_header(("x-webhook-signature", sign(SECRET, body.as_bytes())))
        .set_payload(body)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["outcome"], "ignored");
}

#[actix_web::test]
async fn poll_job_requires_internal_token() {
    let h = Harness::new();
    let s = stream(StreamProvider::Mux, "mux-1", StreamStatus::Waiting, None);
    h.store.insert(s.clone());
    h.provider.set_state("mux-1", ProviderState::Active);
    let app = app!(h);

    let req = test::TestRequest::post()
        .uri("/internal/jobs/poll-stream-status")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/internal/jobs/poll-stream-status")
        .insert_header((INTERNAL_TOKEN_HEADER, TOKEN))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["checked"], 1);
    assert_eq!(body["transitioned"], 1);
    assert_eq!(h.store.snapshot(s.id).status, StreamStatus::Live);
}

#[actix_web::test]
async fn health_and_metrics_respond() {
    let h = Harness::new();
    let app = app!(h);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert!(resp.status().is_success());
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert!(resp.status().is_success());
}
