use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use fleet_search::api;
use fleet_search::catalog::{CatalogData, CatalogSource, JsonFileSource, StaticSource};
use fleet_search::config::Config;
use fleet_search::engine::refresh::run_catalog_refresher;
use fleet_search::engine::resolver::SearchPolicy;
use fleet_search::error::AppError;
use fleet_search::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let source: Arc<dyn CatalogSource> = match &config.catalog_path {
        Some(path) => Arc::new(JsonFileSource::new(path.clone())),
        None => {
            warn!("CATALOG_PATH not set; starting with an empty catalog");
            Arc::new(StaticSource::new(CatalogData::default()))
        }
    };

    let policy = SearchPolicy {
        substitutes_enabled: config.substitutes_enabled,
    };
    let app_state = AppState::new(
        source,
        policy,
        Duration::from_millis(config.query_timeout_ms),
    )?;
    let shared_state = Arc::new(app_state);

    if config.catalog_refresh_secs > 0 {
        tokio::spawn(run_catalog_refresher(
            shared_state.clone(),
            Duration::from_secs(config.catalog_refresh_secs),
        ));
    }

    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
