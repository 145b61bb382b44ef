//! # REST API for Excel Export
//!
//! Exports take the same query filters as the lists they mirror and are
//! routed next to them (`/housing-units/export`, `/history/export`).

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use log::{error, info};

use crate::backend::domain::export_service::ExportFile;
use crate::backend::io::rest::error::domain_error_response;
use crate::backend::io::rest::mappers::{FilterMapper, HistoryQuery, UnitQuery};
use crate::backend::AppState;

/// Serve a generated file as a download
pub fn file_response(file: ExportFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}

pub async fn export_units(State(state): State<AppState>, Query(query): Query<UnitQuery>) -> impl IntoResponse {
    info!("GET /api/housing-units/export - query: {:?}", query);

    let filter = match FilterMapper::to_unit_filter(query) {
        Ok(filter) => filter,
        Err(e) => return domain_error_response(e.into()),
    };

    match state.export_service.export_units(&filter).await {
        Ok(file) => file_response(file),
        Err(e) => {
            error!("Failed to export housing units: {}", e);
            domain_error_response(e)
        }
    }
}

pub async fn export_history(State(state): State<AppState>, Query(query): Query<HistoryQuery>) -> impl IntoResponse {
    info!("GET /api/history/export - query: {:?}", query);

    let filter = match FilterMapper::to_history_filter(query) {
        Ok(filter) => filter,
        Err(e) => return domain_error_response(e.into()),
    };

    match state.export_service.export_history(&filter).await {
        Ok(file) => file_response(file),
        Err(e) => {
            error!("Failed to export history: {}", e);
            domain_error_response(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::export_service::XLSX_CONTENT_TYPE;
    use crate::backend::domain::spreadsheet::read_sheet;
    use crate::backend::test_support::{sample_unit, test_state};
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use shared::Estado;
    use tower::util::ServiceExt;

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/housing-units/export", get(export_units))
            .route("/history/export", get(export_history))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_unit_export_is_filtered_workbook_download() {
        let (state, repository) = test_state();
        repository.seed_unit(sample_unit("P1-0-A", Estado::Libre)).unwrap();
        repository.seed_unit(sample_unit("P1-0-B", Estado::Bloqueada)).unwrap();
        let app = app(state);

        let request = Request::builder()
            .uri("/housing-units/export?estados=LIBRE")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.starts_with("attachment; filename=\"viviendas_"));
        assert!(disposition.ends_with(".xlsx\""));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let sheet = read_sheet("viviendas.xlsx", &bytes).unwrap();
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].get("Código"), Some("P1-0-A"));
    }

    #[tokio::test]
    async fn test_history_export_rejects_bad_date() {
        let (state, _) = test_state();
        let app = app(state);

        let request = Request::builder()
            .uri("/history/export?date_from=yesterday")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
