//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use axum::{
  routing::{delete, get, post},
  Router,
};
use tower_http::{
  cors::{Any, CorsLayer},
  services::{ServeDir, ServeFile},
  trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::SharedState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - dashboard WebSocket feed at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - the legacy action endpoint at `/api/v1/legacy`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: SharedState) -> Router {
  // Static files with SPA fallback
  let static_service = ServeDir::new("./static")
    .append_index_html_on_directories(true)
    .not_found_service(ServeFile::new("./static/index.html"));

  Router::new()
    // WebSocket
    .route("/ws", get(ws::ws_upgrade))
    // HTTP API
    .route("/api/v1/health", get(http::http_health))
    .route("/api/v1/assignments/:id", get(http::http_get_assignment))
    .route("/api/v1/answer", post(http::http_post_answer))
    .route("/api/v1/submission/:uid", get(http::http_get_submission))
    .route("/api/v1/presence/:uid", post(http::http_post_presence))
    .route("/api/v1/dashboard", get(http::http_get_dashboard))
    .route("/api/v1/print/:uid/:assignment", get(http::http_get_print))
    .route("/api/v1/register", post(http::http_post_register))
    .route("/api/v1/admin/classes", post(http::http_post_class))
    .route("/api/v1/admin/classes/:id", delete(http::http_delete_class))
    .route("/api/v1/admin/users/:id", delete(http::http_delete_user))
    // Legacy action dispatch (listDrafts / getDraft / submit)
    .route("/api/v1/legacy", post(http::http_post_legacy))
    // State + CORS + HTTP tracing
    .with_state(state)
    .layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any),
    )
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
    // Frontend fallback
    .fallback_service(static_service)
}
