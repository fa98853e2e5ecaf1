//! REST API over the analysis engine.
//!
//! Routes:
//! - `POST /analyze` runs the full pipeline on a facility request
//! - `GET /health` reports liveness and the number of configured locations
//! - `GET /rates` lists configured location keys
//! - `GET /rates/{location}` returns one location's rate constants

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::config::RateTable;

pub use types::{ErrorResponse, HealthResponse};

/// Immutable application state shared across all request handlers.
///
/// Loaded once at startup and wrapped in `Arc`; handlers only read it.
pub struct AppState {
    /// Rate constants resolved per request from the facility location.
    pub rates: RateTable,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/health", get(handlers::health))
        .route("/rates", get(handlers::list_rates))
        .route("/rates/{location}", get(handlers::get_rates))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns the I/O error if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
