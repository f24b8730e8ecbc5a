use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, TextEncoder,
};

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "streaming_service_http_requests_total",
            "Total HTTP requests handled by streaming-service",
        ),
        &["method", "path", "status"],
    )
    .expect("failed to create streaming_service_http_requests_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register streaming_service_http_requests_total");
    counter
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "streaming_service_http_request_duration_seconds",
            "HTTP request latency for streaming-service",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
        ]),
        &["method", "path", "status"],
    )
    .expect("failed to create streaming_service_http_request_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register streaming_service_http_request_duration_seconds");
    histogram
});

static STREAM_TRANSITIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "streaming_service_stream_transitions_total",
            "Stream status transitions by source",
        ),
        &["from", "to", "source"],
    )
    .expect("failed to create streaming_service_stream_transitions_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register streaming_service_stream_transitions_total");
    counter
});

static WEBHOOK_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "streaming_service_webhook_events_total",
            "Provider webhook events by event name and outcome",
        ),
        &["event", "outcome"],
    )
    .expect("failed to create streaming_service_webhook_events_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register streaming_service_webhook_events_total");
    counter
});

static POLL_CYCLES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "streaming_service_poll_cycles_total",
        "Completed stream status poll cycles",
    )
    .expect("failed to create streaming_service_poll_cycles_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register streaming_service_poll_cycles_total");
    counter
});

static POLL_STREAM_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "streaming_service_poll_stream_failures_total",
        "Streams whose status could not be polled",
    )
    .expect("failed to create streaming_service_poll_stream_failures_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register streaming_service_poll_stream_failures_total");
    counter
});

static DEDUCTION_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "streaming_service_minutes_deduction_failures_total",
        "Ended managed streams whose minutes could not be deducted",
    )
    .expect("failed to create streaming_service_minutes_deduction_failures_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register streaming_service_minutes_deduction_failures_total");
    counter
});

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
}

pub fn record_transition(from: &str, to: &str, source: &str) {
    STREAM_TRANSITIONS_TOTAL
        .with_label_values(&[from, to, source])
        .inc();
}

pub fn record_webhook_event(event: &str, outcome: &str) {
    WEBHOOK_EVENTS_TOTAL
        .with_label_values(&[event, outcome])
        .inc();
}

pub fn record_poll_cycle(failed_streams: usize) {
    POLL_CYCLES_TOTAL.inc();
    POLL_STREAM_FAILURES_TOTAL.inc_by(failed_streams as u64);
}

pub fn record_deduction_failure() {
    DEDUCTION_FAILURES_TOTAL.inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
