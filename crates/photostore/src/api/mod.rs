mod photo_routes;

use std::path::Path;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    middleware,
};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::{DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::common::{AppState, metrics};

pub use photo_routes::photo_routes;

/// The whole HTTP surface: JSON API, `/fotos/*` from the storage root and
/// everything else from `public_dir`.
pub fn router(state: AppState, public_dir: impl AsRef<Path>, body_limit: usize) -> Router {
    let photos_dir = state.store.root().to_path_buf();

    Router::new()
        .merge(photo_routes())
        .with_state(state)
        .nest_service("/fotos", ServeDir::new(photos_dir))
        .fallback_service(ServeDir::new(public_dir.as_ref()))
        .route_layer(middleware::from_fn(metrics::track_http))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri(),
                    client_ip = %req.headers().get("x-forwarded-for").and_then(|h| h.to_str().ok())
                    .unwrap_or("unknown"),
                )
            })
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO))
            .on_failure(DefaultOnFailure::new().level(Level::INFO))
        )
}
