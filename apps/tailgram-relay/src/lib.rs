//! Relay server library: router assembly lives here so integration
//! tests (and the client crate's end-to-end tests) can serve the exact
//! production router in-process.

pub mod config;
pub mod handlers;
pub mod store;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{get_history, health_check, poll_logs, send_message, SharedStore};
use crate::store::LogStore;

/// Largest accepted request body; a relayed message is one short line.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn app(store: LogStore) -> Router {
    let shared: SharedStore = Arc::new(store);
    Router::new()
        .route("/healthz", get(health_check))
        .route("/send", post(send_message))
        .route("/history", get(get_history))
        .route("/poll", get(poll_logs))
        .with_state(shared)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // Pollers must always see fresh offsets, never a cached body.
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store, must-revalidate"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
