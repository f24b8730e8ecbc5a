use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use actix_middleware::{init_tracing, shutdown_signal, MetricsMiddleware};
use streaming_service::config::Config;
use streaming_service::handlers::{self, AppState};
use streaming_service::jobs::run_poll_loop;
use streaming_service::metrics;
use streaming_service::services::streaming::{
    MuxClient, NoopNotifier, PgStreamStore, RecordingArchive, RedisStatusNotifier,
    S3RecordingArchive, StatusNotifier, StatusSync, StreamService, StreamStatusPoller,
    StreamStore, StreamWebhookHandler,
};

type RedisManager = redis::aio::ConnectionManager;

async fn connect_redis(url: &str) -> Option<RedisManager> {
    let client = match redis::Client::open(url) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Invalid REDIS_URL, status notifications disabled");
            return None;
        }
    };
    match RedisManager::new(client).await {
        Ok(manager) => Some(manager),
        Err(e) => {
            warn!(error = %e, "Failed to connect Redis, status notifications disabled");
            None
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing("streaming_service=info,actix_web=info", config.app.log_format);
    info!(
        env = %config.app.env,
        port = config.app.http_port,
        poll_enabled = config.poller.enabled,
        "Starting streaming-service"
    );

    if config.webhook.secret.is_none() {
        if config.is_production() {
            anyhow::bail!("STREAM_WEBHOOK_SECRET must be set in production");
        }
        warn!("STREAM_WEBHOOK_SECRET not set, webhook signatures are not checked");
    }

    let db_config = db_pool::DbConfig::from_env("streaming-service")
        .map_err(|e| anyhow::anyhow!(e))
        .context("Invalid database configuration")?;
    db_config.log_config();
    let pool = db_pool::create_pool(db_config)
        .await
        .context("Failed to connect to database")?;

    // both services may share a database, each with its own migration set
    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Database migrations applied");

    let store: Arc<dyn StreamStore> = Arc::new(PgStreamStore::new(pool));

    let notifier: Arc<dyn StatusNotifier> = match config.redis_url.as_deref() {
        Some(url) => match connect_redis(url).await {
            Some(redis) => {
                info!("Redis status notifications enabled");
                Arc::new(RedisStatusNotifier::new(redis))
            }
            None => Arc::new(NoopNotifier),
        },
        None => {
            info!("REDIS_URL not set, status notifications disabled");
            Arc::new(NoopNotifier)
        }
    };

    let archive: Option<Arc<dyn RecordingArchive>> = match config.recordings.clone() {
        Some(recordings) => {
            info!(bucket = %recordings.bucket, "Recording archive enabled");
            Some(Arc::new(S3RecordingArchive::new(recordings).await?))
        }
        None => None,
    };

    let provider = Arc::new(MuxClient::new(config.mux.clone())?);
    let sync = StatusSync::new(store.clone(), notifier);
    let poller = Arc::new(StreamStatusPoller::new(
        store.clone(),
        provider.clone(),
        sync.clone(),
    ));

    let state = AppState {
        streams: Arc::new(StreamService::new(store.clone(), provider)),
        webhooks: Arc::new(StreamWebhookHandler::new(store, sync, archive)),
        poller: poller.clone(),
        webhook_secret: config.webhook.secret.clone(),
        internal_api_token: config.app.internal_api_token.clone(),
    };

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let poll_handle = if config.poller.enabled {
        Some(tokio::spawn(run_poll_loop(
            poller,
            config.poller.interval,
            shutdown_tx.subscribe(),
        )))
    } else {
        info!("Stream status poll loop disabled");
        None
    };

    let bind_addr = format!("{}:{}", config.app.host, config.app.http_port);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(Logger::default())
            .wrap(MetricsMiddleware::new(metrics::observe_http_request))
            .configure(handlers::configure)
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind on {bind_addr}"))?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    info!(addr = %bind_addr, "HTTP server listening");

    tokio::select! {
        res = server => res.context("HTTP server error")?,
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    let _ = shutdown_tx.send(());
    if let Some(handle) = poll_handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "Poll loop task ended abnormally");
        }
    }

    info!("streaming-service stopped");
    Ok(())
}
