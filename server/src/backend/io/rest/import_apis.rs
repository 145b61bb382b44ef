//! # REST API for Spreadsheet Import
//!
//! Files are sent as the raw request body with their name in the
//! `filename` query parameter; the extension selects the reader.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use log::{error, info};
use serde::Deserialize;

use crate::backend::domain::export_service::template;
use crate::backend::domain::models::Session;
use crate::backend::io::rest::error::domain_error_response;
use crate::backend::io::rest::export_apis::file_response;
use crate::backend::AppState;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct JobsQuery {
    pub limit: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/template", get(download_template))
        .route("/preview", post(preview_import))
        .route("/", post(import_units))
        .route("/jobs", get(list_import_jobs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

pub async fn download_template() -> impl IntoResponse {
    info!("GET /api/import/template");

    match template() {
        Ok(file) => file_response(file),
        Err(e) => {
            error!("Failed to build import template: {}", e);
            domain_error_response(e)
        }
    }
}

/// Headers and first rows of the uploaded file
pub async fn preview_import(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> impl IntoResponse {
    info!("POST /api/import/preview - {} ({} bytes)", query.filename, body.len());

    match state.import_service.preview(&query.filename, &body) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!("Failed to preview {}: {}", query.filename, e);
            domain_error_response(e)
        }
    }
}

pub async fn import_units(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> impl IntoResponse {
    info!("POST /api/import - {} ({} bytes)", query.filename, body.len());

    match state.import_service.import(&session, &query.filename, &body).await {
        Ok(summary) => (StatusCode::OK, Json(summary.to_response())).into_response(),
        Err(e) => {
            error!("Failed to import {}: {}", query.filename, e);
            domain_error_response(e)
        }
    }
}

pub async fn list_import_jobs(State(state): State<AppState>, Query(query): Query<JobsQuery>) -> impl IntoResponse {
    info!("GET /api/import/jobs - limit: {:?}", query.limit);

    match state.import_service.list_jobs(query.limit).await {
        Ok(jobs) => (StatusCode::OK, Json(jobs)).into_response(),
        Err(e) => {
            error!("Failed to list import jobs: {}", e);
            domain_error_response(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::InventoryRepository;
    use crate::backend::test_support::test_state;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use shared::{ImportJob, ImportResponse};
    use tower::util::ServiceExt;
    use uuid::Uuid;

    const CSV: &str = "Portal,Planta,Letra,Tipología,Orientación,Dormitorios,Superficie Útil + Terraza,Superficie Útil Vivienda,Superficie Útil Terrazas,PVP Final,Observaciones,Estado,Gestor,Último Responsable\n\
1,0,A,Piso,S,2,85.5,70,15.5,225000,,LIBRE,,\n\
1,0,,Piso,S,2,,,,,,LIBRE,,\n";

    fn upload(uri: &str, role: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("x-user-id", Uuid::new_v4().to_string())
            .header("x-user-role", role)
            .body(Body::from(CSV))
            .unwrap()
    }

    #[tokio::test]
    async fn test_import_reports_rows_and_records_job() {
        let (state, repository) = test_state();
        let app = router().with_state(state);

        let response = app
            .clone()
            .oneshot(upload("/?filename=viviendas.csv", "gestor"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let summary: ImportResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(summary.total_rows, 2);
        assert_eq!(summary.ok_rows, 1);
        assert_eq!(summary.error_rows, 1);
        assert_eq!(summary.details[0].row, 3);
        assert_eq!(summary.details[0].error, "Letra es obligatoria");
        assert_eq!(repository.list_units().await.unwrap().len(), 1);

        let request = Request::builder().uri("/jobs").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let jobs: Vec<ImportJob> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, summary.job_id);
    }

    #[tokio::test]
    async fn test_viewer_cannot_import() {
        let (state, repository) = test_state();
        let app = router().with_state(state);

        let response = app.oneshot(upload("/?filename=viviendas.csv", "viewer")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(repository.upsert_calls(), 0);
    }

    #[tokio::test]
    async fn test_preview_rejects_unsupported_extension() {
        let (state, _) = test_state();
        let app = router().with_state(state);

        let response = app.oneshot(upload("/preview?filename=viviendas.pdf", "gestor")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_template_is_served_as_attachment() {
        let (state, _) = test_state();
        let app = router().with_state(state);

        let request = Request::builder().uri("/template").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"plantilla_viviendas.xlsx\""
        );
    }
}
