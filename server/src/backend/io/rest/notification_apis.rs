//! # REST API for Notification Failures
//!
//! Exposes the side channel where failed best-effort notifications end up.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::info;
use shared::NotificationFailureDto;

use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/failures", get(list_failures))
}

pub async fn list_failures(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/notifications/failures");

    let failures: Vec<NotificationFailureDto> = state
        .notification_log
        .failures()
        .iter()
        .map(|f| f.to_dto())
        .collect();
    (StatusCode::OK, Json(failures))
}
