//! REST API for a completed run.
//!
//! Provides four GET endpoints:
//! - `/state`: run configuration, capability, KPI report and latest step
//! - `/telemetry`: step records with optional range filtering
//! - `/profiles`: summary of every forward profile
//! - `/profiles/{id}`: one tariff's prices and profile

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::runner::RunOutput;

/// Immutable application state shared across all request handlers.
///
/// Built once from a finished run and wrapped in `Arc`; all data is
/// read-only so no locks are needed.
pub struct AppState {
    pub run: RunOutput,
}

impl From<RunOutput> for AppState {
    fn from(run: RunOutput) -> Self {
        Self { run }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/profiles", get(handlers::list_profiles))
        .route("/profiles/{id}", get(handlers::get_profile))
        .with_state(state)
}

/// Binds to `addr` and serves the API until the server stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
