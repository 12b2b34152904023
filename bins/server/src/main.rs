//! Vitrine API Server
//!
//! Main entry point for the catalog media upload service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vitrine_api::{AppState, create_router};
use vitrine_core::storage::{RetryPolicy, StorageService};
use vitrine_core::upload::{UploadLimits, UploadService};
use vitrine_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitrine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    let limits = UploadLimits::from_settings(&config.upload);
    let retry = RetryPolicy::from_settings(&config.upload);
    info!(
        max_file_size = limits.max_file_size,
        retry_attempts = retry.attempts(),
        retry_delay_ms = config.upload.retry_delay_ms,
        "Upload limits configured"
    );

    // Select the storage backend once; uploads fail until one is configured
    let state = match StorageService::select(&config.storage) {
        Ok(storage) => AppState::new(
            UploadService::new(Arc::new(storage))
                .with_limits(limits)
                .with_retry(retry),
        ),
        Err(e) => {
            error!(error = %e, "No storage backend available, uploads are disabled");
            AppState::without_storage(limits)
        }
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
