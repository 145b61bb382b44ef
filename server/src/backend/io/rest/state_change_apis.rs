//! # REST API for Estado Changes
//!
//! The unit is loaded first so the change is checked against its current
//! estado before anything is written.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::post,
    Router,
};
use log::{error, info};
use shared::{ChangeEstadoRequest, ChangeEstadoResponse};
use uuid::Uuid;

use crate::backend::domain::models::Session;
use crate::backend::io::rest::error::domain_error_response;
use crate::backend::AppState;

/// Routes nested under `/housing-units`
pub fn router() -> Router<AppState> {
    Router::new().route("/:id/estado", post(change_estado))
}

pub async fn change_estado(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeEstadoRequest>,
) -> impl IntoResponse {
    info!("POST /api/housing-units/{}/estado - request: {:?}", id, request);

    let unit = match state.housing_unit_service.get(id).await {
        Ok(unit) => unit,
        Err(e) => {
            error!("Failed to load housing unit {}: {}", id, e);
            return domain_error_response(e);
        }
    };

    match state.state_change_service.change_estado(&session, &unit, request).await {
        Ok(outcome) => {
            let response = ChangeEstadoResponse {
                change: outcome.change,
                success_message: outcome.success_message,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to change estado of {}: {}", unit.code, e);
            domain_error_response(e)
        }
    }
}
