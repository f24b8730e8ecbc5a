use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use actix_middleware::{init_tracing, shutdown_signal, MetricsMiddleware};
use publishing_service::config::Config;
use publishing_service::handlers::{self, AppState};
use publishing_service::jobs::run_publish_loop;
use publishing_service::metrics;
use publishing_service::services::publishing::{
    InstagramPublisher, PgPostStore, PlatformPublisher, PostService, PostStore,
    PublishingPipeline, TikTokPublisher, YouTubePublisher,
};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing("publishing_service=info,actix_web=info", config.app.log_format);
    info!(
        env = %config.app.env,
        port = config.app.http_port,
        publish_enabled = config.publisher.enabled,
        batch_size = config.publisher.batch_size,
        "Starting publishing-service"
    );

    if config.app.internal_api_token.is_none() {
        if config.is_production() {
            anyhow::bail!("INTERNAL_API_TOKEN must be set in production");
        }
        warn!("INTERNAL_API_TOKEN not set, all /api and /internal routes will reject requests");
    }

    let db_config = db_pool::DbConfig::from_env("publishing-service")
        .map_err(|e| anyhow::anyhow!(e))
        .context("Invalid database configuration")?;
    db_config.log_config();
    let pool = db_pool::create_pool(db_config)
        .await
        .context("Failed to connect to database")?;

    let mut migrator = sqlx::migrate!("./migrations");
    migrator.set_ignore_missing(true);
    migrator
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Database migrations applied");

    let store: Arc<dyn PostStore> = Arc::new(PgPostStore::new(pool));

    let platforms = &config.platforms;
    let publishers: Vec<Arc<dyn PlatformPublisher>> = vec![
        Arc::new(
            TikTokPublisher::new(platforms.tiktok_api_base_url.clone(), platforms.http_timeout)
                .context("Failed to create TikTok client")?,
        ),
        Arc::new(
            YouTubePublisher::new(
                platforms.youtube_upload_base_url.clone(),
                platforms.http_timeout,
            )
            .context("Failed to create YouTube client")?,
        ),
        Arc::new(
            InstagramPublisher::new(platforms.instagram.clone())
                .context("Failed to create Instagram client")?,
        ),
    ];
    let pipeline = Arc::new(PublishingPipeline::new(
        store.clone(),
        publishers,
        config.publisher.batch_size,
    ));

    let state = AppState {
        posts: Arc::new(PostService::new(store)),
        pipeline: pipeline.clone(),
        internal_api_token: config.app.internal_api_token.clone(),
    };

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let publish_handle = if config.publisher.enabled {
        Some(tokio::spawn(run_publish_loop(
            pipeline,
            config.publisher.interval,
            shutdown_tx.subscribe(),
        )))
    } else {
        info!("Scheduled post publish loop disabled");
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

    // a cycle in flight finishes its current post loop before the task exits
    let _ = shutdown_tx.send(());
    if let Some(handle) = publish_handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "Publish loop task ended abnormally");
        }
    }

    info!("publishing-service stopped");
    Ok(())
}
