//! Aufgaben · Classroom Assignment Backend
//!
//! - Axum HTTP + WebSocket API over the hosted document store
//! - Debounced answer sync with merge-write semantics
//! - Teacher dashboard aggregation with a live change feed
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT            : u16 (default 3000)
//!   APP_CONFIG_PATH : path to TOML config (debounce, definitions, teacher key)
//!   LOG_LEVEL       : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use aufgaben_backend::routes::build_router;
use aufgaben_backend::state::AppState;
use aufgaben_backend::telemetry;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (document store, writer, definitions).
  let state = Arc::new(AppState::new());

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "aufgaben_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
