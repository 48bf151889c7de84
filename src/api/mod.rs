//! HTTP adapter: REST endpoints, the tool dispatcher, a landing page and a
//! health check, all delegating to [`LedgerService`].

pub mod dto;
pub mod error;
pub mod rest;
pub mod tools;

use anyhow::{Context, Result};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::LedgerService;
use crate::config::ServerConfig;

pub use error::ApiError;

/// Shared handler state. Cloning shares the same store.
#[derive(Clone)]
pub struct AppState {
    pub service: LedgerService,
}

/// Build the application router.
pub fn router(service: LedgerService) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/", get(landing_page))
        .route("/health", get(health))
        .route("/accounts", post(rest::create_account).get(rest::list_accounts))
        .route("/accounts/:id", get(rest::get_balance))
        .route("/accounts/:id/deposit", post(rest::deposit))
        .route("/accounts/:id/withdraw", post(rest::withdraw))
        .route("/accounts/:id/transactions", get(rest::get_transactions))
        .route("/accounts/:id/deactivate", post(rest::deactivate_account))
        .route("/integrity", get(rest::check_integrity))
        .route("/tools", get(tools::list_tools))
        .route("/tools/:name", post(tools::call_tool))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until Ctrl-C, then close the store.
pub async fn serve(service: LedgerService, config: &ServerConfig) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, router(service.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    service.close().await;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// GET /
async fn landing_page() -> Html<&'static str> {
    Html(include_str!("landing.html"))
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": "Tally Ledger" }))
}
