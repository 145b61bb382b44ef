//! # REST API for the Dashboard and Estado Metadata

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::{error, info};

use crate::backend::domain::housing_unit_service::estado_catalog;
use crate::backend::io::rest::error::domain_error_response;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/estados", get(list_estados))
}

/// Counts per estado, chart data and the ten latest changes
pub async fn get_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/dashboard");

    match state.dashboard_service.summary().await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to build dashboard: {}", e);
            domain_error_response(e)
        }
    }
}

pub async fn list_estados() -> impl IntoResponse {
    info!("GET /api/estados");
    (StatusCode::OK, Json(estado_catalog()))
}
