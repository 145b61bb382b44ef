//! # REST API for Housing Units
//!
//! Read endpoints of the inventory: the filtered list, the values offered by
//! the list filters, and the detail of one unit.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::{error, info};
use uuid::Uuid;

use crate::backend::io::rest::error::domain_error_response;
use crate::backend::io::rest::export_apis::export_units;
use crate::backend::io::rest::mappers::{FilterMapper, UnitQuery};
use crate::backend::AppState;

/// Create a router for housing unit related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_units))
        .route("/options", get(get_filter_options))
        .route("/export", get(export_units))
        .route("/:id", get(get_unit_detail))
}

/// List units matching the query filters
pub async fn list_units(State(state): State<AppState>, Query(query): Query<UnitQuery>) -> impl IntoResponse {
    info!("GET /api/housing-units - query: {:?}", query);

    let filter = match FilterMapper::to_unit_filter(query) {
        Ok(filter) => filter,
        Err(e) => return domain_error_response(e.into()),
    };

    match state.housing_unit_service.list(&filter).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to list housing units: {}", e);
            domain_error_response(e)
        }
    }
}

pub async fn get_filter_options(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/housing-units/options");

    match state.housing_unit_service.filter_options().await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to load filter options: {}", e);
            domain_error_response(e)
        }
    }
}

pub async fn get_unit_detail(State(state): State<AppState>, Path(id): Path<Uuid>) -> impl IntoResponse {
    info!("GET /api/housing-units/{}", id);

    match state.housing_unit_service.detail(id).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to load housing unit {}: {}", id, e);
            domain_error_response(e)
        }
    }
}
