//! Bulk import of housing units from a spreadsheet.
//!
//! Rows are processed one at a time in sheet order. A row that fails
//! validation or is rejected by the repository is recorded and skipped, and
//! processing continues with the next one. Every run ends with one
//! [`ImportJob`] summarizing totals and per-row errors.

use chrono::Utc;
use log::{error, info, warn};
use shared::{
    Estado, HousingUnit, ImportJob, ImportPreviewResponse, ImportResponse, ImportRowError,
    ImportStatus,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::backend::domain::commands::import::UnitUpsert;
use crate::backend::domain::models::{DomainError, Session, ValidationError};
use crate::backend::domain::row_validator::{parse_number, parse_whole_number, validate_row};
use crate::backend::domain::spreadsheet::{columns, read_sheet, SheetRow};
use crate::backend::storage::SharedRepository;

const PREVIEW_ROWS: usize = 5;

/// Outcome of an import run
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub job: ImportJob,
}

impl ImportSummary {
    /// Some rows were imported and some were not
    pub fn is_partial_failure(&self) -> bool {
        self.job.ok_rows > 0 && self.job.error_rows > 0
    }

    pub fn to_response(&self) -> ImportResponse {
        ImportResponse {
            job_id: self.job.id,
            total_rows: self.job.total_rows,
            ok_rows: self.job.ok_rows,
            error_rows: self.job.error_rows,
            details: self.job.log.clone(),
            success_message: format!(
                "{} registros importados correctamente, {} errores",
                self.job.ok_rows, self.job.error_rows
            ),
        }
    }
}

#[derive(Clone)]
pub struct ImportService {
    repository: SharedRepository,
}

impl ImportService {
    pub fn new(repository: SharedRepository) -> Self {
        Self { repository }
    }

    /// Header and first rows of a file, without importing anything
    pub fn preview(&self, filename: &str, bytes: &[u8]) -> Result<ImportPreviewResponse, DomainError> {
        let sheet = read_sheet(filename, bytes)?;
        Ok(ImportPreviewResponse {
            headers: sheet.headers,
            total_rows: sheet.rows.len(),
            rows: sheet.rows.iter().take(PREVIEW_ROWS).map(SheetRow::to_json).collect(),
        })
    }

    pub async fn import(
        &self,
        session: &Session,
        filename: &str,
        bytes: &[u8],
    ) -> Result<ImportSummary, DomainError> {
        if !session.can_import() {
            return Err(ValidationError::PermissionDenied("importar".to_string()).into());
        }

        let sheet = read_sheet(filename, bytes)?;
        info!("Importing {} rows from {}", sheet.rows.len(), filename);

        let persons: HashMap<String, Uuid> = self
            .repository
            .list_persons(true)
            .await
            .map_err(DomainError::operation_failed)?
            .into_iter()
            .map(|p| (p.name, p.id))
            .collect();

        let actor = session.actor();
        let reason = format!("Importación desde {}", filename);
        let mut ok_rows = 0u32;
        let mut details = Vec::new();

        for (index, row) in sheet.rows.iter().enumerate() {
            // Header is row 1 and data starts at row 2
            let row_number = index + 2;

            let errors = validate_row(row);
            if !errors.is_empty() {
                details.push(ImportRowError {
                    row: row_number,
                    error: errors.join(", "),
                    data: row.to_json(),
                });
                continue;
            }

            let upsert = to_upsert(row, &persons);
            match self.repository.upsert_unit(&upsert, &actor, &reason).await {
                Ok(_) => ok_rows += 1,
                Err(e) => {
                    warn!("Row {} ({}) rejected: {}", row_number, upsert.code, e);
                    details.push(ImportRowError {
                        row: row_number,
                        error: e.to_string(),
                        data: row.to_json(),
                    });
                }
            }
        }

        let error_rows = details.len() as u32;
        let job = ImportJob {
            id: Uuid::new_v4(),
            filename: Some(filename.to_string()),
            status: if error_rows > 0 {
                ImportStatus::Error
            } else {
                ImportStatus::Ok
            },
            total_rows: sheet.rows.len() as u32,
            ok_rows,
            error_rows,
            log: details,
            created_at: Utc::now(),
        };

        self.repository.append_import_job(&job).await.map_err(|e| {
            error!("Could not record import job for {}: {}", filename, e);
            DomainError::operation_failed(e)
        })?;

        info!(
            "Import of {} finished: {} ok, {} errors",
            filename, job.ok_rows, job.error_rows
        );
        Ok(ImportSummary { job })
    }

    /// Most recent import jobs first
    pub async fn list_jobs(&self, limit: Option<u32>) -> Result<Vec<ImportJob>, DomainError> {
        self.repository
            .list_import_jobs(limit)
            .await
            .map_err(DomainError::operation_failed)
    }
}

/// Map a validated row to the stored attributes; unknown person names resolve to None
fn to_upsert(row: &SheetRow, persons: &HashMap<String, Uuid>) -> UnitUpsert {
    let text = |column: &str| row.get(column).map(str::to_string);
    let person = |column: &str| row.get(column).and_then(|name| persons.get(name).copied());

    let portal = row.get(columns::PORTAL).unwrap_or_default().to_string();
    let floor = row.get(columns::FLOOR).unwrap_or_default().to_string();
    let letter = row.get(columns::LETTER).unwrap_or_default().to_string();

    UnitUpsert {
        code: HousingUnit::compose_code(&portal, &floor, &letter),
        portal,
        floor,
        letter,
        typology: text(columns::TYPOLOGY),
        orientation: text(columns::ORIENTATION),
        bedrooms: row.get(columns::BEDROOMS).and_then(parse_whole_number),
        surface_with_terrace: row.get(columns::SURFACE_WITH_TERRACE).and_then(parse_number),
        surface_interior: row.get(columns::SURFACE_INTERIOR).and_then(parse_number),
        surface_terraces: row.get(columns::SURFACE_TERRACES).and_then(parse_number),
        final_price: row.get(columns::FINAL_PRICE).and_then(parse_number),
        notes: text(columns::NOTES),
        estado: row
            .get(columns::ESTADO)
            .and_then(|e| e.parse::<Estado>().ok())
            .unwrap_or(Estado::Libre),
        manager_id: person(columns::MANAGER),
        responsible_id: person(columns::RESPONSIBLE),
    }
}
