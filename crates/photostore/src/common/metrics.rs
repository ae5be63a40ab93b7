use std::{
    future,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::IntoResponse,
    routing,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use sysinfo::System;

use crate::store::PhotoStore;

pub async fn track_http(req: Request, next: Next) -> impl IntoResponse {
    let start = Instant::now();
    let path = if let Some(matched_path) = req.extensions().get::<MatchedPath>() {
        matched_path.as_str().to_owned()
    } else {
        req.uri().path().to_owned()
    };
    let method = req.method().clone();

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status),
    ];

    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_requests_duration_seconds", &labels).record(latency);

    response
}

/// Installs the global Prometheus recorder and returns a router serving `/metrics`.
pub fn prometheus_router() -> Result<Router> {
    let recorder_handle = setup_metrics_recorder()?;
    Ok(Router::new().route(
        "/metrics",
        routing::get(move || future::ready(recorder_handle.render())),
    ))
}

fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    const EXPONENTIAL_SECONDS: &[f64] = &[
        0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_requests_duration_seconds".to_string()),
            EXPONENTIAL_SECONDS,
        )?
        .install_recorder()?;
    Ok(handle)
}

/// Periodically publishes storage and host gauges.
pub fn spawn_system_metrics(store: Arc<PhotoStore>, every: Duration) {
    tokio::spawn(async move {
        let mut sys = System::new();
        let mut ticker = tokio::time::interval(every);

        loop {
            ticker.tick().await;

            match store.stats().await {
                Ok(stats) => {
                    metrics::gauge!("photos_stored").set(stats.photos as f64);
                    metrics::gauge!("photos_stored_bytes").set(stats.bytes as f64);
                }
                Err(e) => tracing::warn!("cannot read storage stats: {e:#}"),
            }

            sys.refresh_memory();
            sys.refresh_cpu_usage();
            metrics::gauge!("system_memory_used_bytes").set(sys.used_memory() as f64);
            metrics::gauge!("system_cpu_usage_percent").set(sys.global_cpu_usage() as f64);
        }
    });
}
