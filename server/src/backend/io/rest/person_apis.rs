//! # REST API for Managers and Promoters

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use log::{error, info};
use serde::Deserialize;
use shared::{CreatePersonRequest, PersonKind};

use crate::backend::domain::models::{Session, ValidationError};
use crate::backend::io::rest::error::domain_error_response;
use crate::backend::AppState;

#[derive(Debug, Deserialize)]
pub struct PersonQuery {
    pub kind: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_persons).post(create_person))
}

/// Active persons, optionally of one kind
pub async fn list_persons(State(state): State<AppState>, Query(query): Query<PersonQuery>) -> impl IntoResponse {
    info!("GET /api/persons - kind: {:?}", query.kind);

    let kind = match query.kind.filter(|k| !k.trim().is_empty()) {
        Some(raw) => match raw.parse::<PersonKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                return domain_error_response(ValidationError::InvalidFilter(format!("kind = {}", raw)).into())
            }
        },
        None => None,
    };

    match state.person_service.list(kind).await {
        Ok(persons) => (StatusCode::OK, Json(persons)).into_response(),
        Err(e) => {
            error!("Failed to list persons: {}", e);
            domain_error_response(e)
        }
    }
}

pub async fn create_person(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreatePersonRequest>,
) -> impl IntoResponse {
    info!("POST /api/persons - request: {:?}", request);

    match state.person_service.create(&session, request).await {
        Ok(person) => (StatusCode::CREATED, Json(person)).into_response(),
        Err(e) => {
            error!("Failed to create person: {}", e);
            domain_error_response(e)
        }
    }
}
