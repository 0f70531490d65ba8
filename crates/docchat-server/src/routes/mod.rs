//! HTTP route handlers.

pub mod chat;
pub mod documents;
pub mod stats;
pub mod upload;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Build the main Axum router. Routes are served at the root and,
/// for existing clients, under `/api`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .merge(api_routes())
        .nest("/api", api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(upload::routes())
        .merge(documents::routes())
        .merge(stats::routes())
        .merge(chat::routes())
}
