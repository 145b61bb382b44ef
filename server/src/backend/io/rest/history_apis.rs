//! # REST API for the Change History

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::{error, info};

use crate::backend::io::rest::error::domain_error_response;
use crate::backend::io::rest::export_apis::export_history;
use crate::backend::io::rest::mappers::{FilterMapper, HistoryQuery};
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_history))
        .route("/export", get(export_history))
}

/// List history entries matching the query filters, newest first
pub async fn list_history(State(state): State<AppState>, Query(query): Query<HistoryQuery>) -> impl IntoResponse {
    info!("GET /api/history - query: {:?}", query);

    let filter = match FilterMapper::to_history_filter(query) {
        Ok(filter) => filter,
        Err(e) => return domain_error_response(e.into()),
    };

    match state.history_service.list(&filter).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to list history: {}", e);
            domain_error_response(e)
        }
    }
}
