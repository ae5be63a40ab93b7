use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::{net::TcpListener, sync::Notify};
use tracing_subscriber::EnvFilter;

use libs::util;

use photostore::{
    CONFIG, api,
    common::{AppState, metrics},
    store::PhotoStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("LOG_LEVEL"))
        .init();

    let store = PhotoStore::open(&CONFIG.photos_dir)?;
    let photos_dir = std::fs::canonicalize(store.root())?;
    let state = AppState::new(store);

    let api_router = api::router(state.clone(), &CONFIG.public_dir, CONFIG.body_limit_bytes);

    let shutdown_notify = Arc::new(Notify::new());
    tokio::spawn(util::listen_for_shutdown(shutdown_notify.clone()));

    let api_listener = TcpListener::bind(format!("0.0.0.0:{}", CONFIG.port)).await?;
    tracing::info!("⇢ API listening on: http://{}", api_listener.local_addr()?);
    tracing::info!("⇢ Photos stored in: {}", photos_dir.display());

    let api_server = axum::serve(api_listener, api_router).with_graceful_shutdown({
        let n = shutdown_notify.clone();
        async move { n.notified().await }
    });

    let Some(metrics_port) = CONFIG.metrics_port else {
        api_server.await?;
        return Ok(());
    };

    let metrics_router = metrics::prometheus_router()?;
    metrics::spawn_system_metrics(
        state.store.clone(),
        Duration::from_secs(CONFIG.metrics_refresh_secs.max(1)),
    );

    let metrics_listener = TcpListener::bind(format!("0.0.0.0:{metrics_port}")).await?;
    tracing::info!(
        "⇢ Metrics listening on: http://{}/metrics",
        metrics_listener.local_addr()?
    );

    let metrics_server = axum::serve(metrics_listener, metrics_router).with_graceful_shutdown({
        let n = shutdown_notify.clone();
        async move { n.notified().await }
    });

    tokio::try_join!(api_server, metrics_server)?;

    Ok(())
}
