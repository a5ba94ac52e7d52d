//! HTTP routes: scan API, results table fragment, browser page.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{self, ScanError};
use crate::mail::GmailClient;
use crate::scan::{Package, Scanner};
use crate::ui;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<Scanner>,
    /// OAuth client id embedded in the browser page.
    pub google_client_id: String,
}

/// Build the Axum router with the scan API and page routes.
pub fn app_routes(scanner: Arc<Scanner>, google_client_id: impl Into<String>) -> Router {
    let state = AppState {
        scanner,
        google_client_id: google_client_id.into(),
    };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/scan", post(scan_json))
        .route("/api/scan/table", post(scan_table))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Build the Gmail-backed app for `config`, bind it, and serve until shutdown.
pub async fn serve(config: &ServerConfig) -> error::Result<()> {
    let gmail = GmailClient::new(config.gmail_api_base.clone(), config.http_timeout)?;
    let scanner = Arc::new(Scanner::new(Arc::new(gmail), config.scan.clone()));
    let app = app_routes(scanner, config.google_client_id.clone());

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Dispatch listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Deserialize)]
struct ScanRequest {
    token: Option<String>,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "dispatch",
    }))
}

async fn index(State(state): State<AppState>) -> impl IntoResponse {
    Html(ui::index_page(&state.google_client_id))
}

async fn scan_json(
    State(state): State<AppState>,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> Response {
    match run_scan(&state, body).await {
        Ok(packages) => (StatusCode::OK, Json(packages)).into_response(),
        Err(response) => response,
    }
}

async fn scan_table(
    State(state): State<AppState>,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> Response {
    match run_scan(&state, body).await {
        Ok(packages) => Html(ui::render_package_table(&packages)).into_response(),
        Err(response) => response,
    }
}

async fn run_scan(
    state: &AppState,
    body: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Vec<Package>, Response> {
    let token = body
        .ok()
        .and_then(|Json(req)| req.token)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| scan_error_response(&ScanError::MissingToken))?;

    let token = SecretString::from(token);
    state
        .scanner
        .scan(&token)
        .await
        .map_err(|e| scan_error_response(&e))
}

fn scan_error_response(err: &ScanError) -> Response {
    match err {
        ScanError::MissingToken => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Missing token"})),
        )
            .into_response(),
        other => {
            error!(error = %other, "Scan failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to scan Gmail."})),
            )
                .into_response()
        }
    }
}
