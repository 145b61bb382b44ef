//! Export of the unit list and the history as Excel workbooks, plus the import template.
//!
//! Exports contain exactly the rows left by the filter the operator is
//! looking at, with Spanish column headers matching the on-screen tables.
//! Each workbook holds a single named sheet. Filenames carry the UTC date
//! of the export.

use anyhow::Result;
use chrono::Utc;
use log::info;
use rust_xlsxwriter::{Format, Workbook};
use shared::{HistoryEntry, HousingUnit, PersonRef};

use crate::backend::domain::filters::{HistoryFilter, UnitFilter};
use crate::backend::domain::formatting::format_date;
use crate::backend::domain::models::DomainError;
use crate::backend::domain::spreadsheet::IMPORT_HEADERS;
use crate::backend::storage::SharedRepository;

pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const UNITS_SHEET: &str = "Viviendas";
pub const HISTORY_SHEET: &str = "Historial";
pub const TEMPLATE_SHEET: &str = "Plantilla";

pub const UNIT_EXPORT_HEADERS: [&str; 15] = [
    "Código",
    "Portal",
    "Planta",
    "Letra",
    "Tipología",
    "Orientación",
    "Dormitorios",
    "Superficie Útil + Terraza",
    "Superficie Útil Vivienda",
    "Superficie Útil Terrazas",
    "PVP Final",
    "Estado",
    "Gestor",
    "Responsable",
    "Observaciones",
];

pub const HISTORY_EXPORT_HEADERS: [&str; 8] = [
    "Fecha",
    "Vivienda",
    "De Estado",
    "A Estado",
    "Gestor",
    "Responsable",
    "Actor",
    "Motivo",
];

const TEMPLATE_EXAMPLE_ROW: [&str; 14] = [
    "1",
    "0",
    "A",
    "Piso",
    "S",
    "2",
    "85.5",
    "70",
    "15.5",
    "225000",
    "",
    "LIBRE",
    "Juan L. Herrero",
    "",
];

/// A generated file ready to be downloaded
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct ExportService {
    repository: SharedRepository,
}

impl ExportService {
    pub fn new(repository: SharedRepository) -> Self {
        Self { repository }
    }

    /// Export the units matching `filter`
    pub async fn export_units(&self, filter: &UnitFilter) -> Result<ExportFile, DomainError> {
        let units = self
            .repository
            .list_units()
            .await
            .map_err(DomainError::operation_failed)?;
        let units = filter.apply(units);
        info!("Exporting {} units", units.len());

        Ok(ExportFile {
            filename: format!("viviendas_{}.xlsx", Utc::now().format("%Y-%m-%d")),
            content_type: XLSX_CONTENT_TYPE,
            bytes: units_workbook(&units).map_err(DomainError::operation_failed)?,
        })
    }

    /// Export the history entries matching `filter`
    pub async fn export_history(&self, filter: &HistoryFilter) -> Result<ExportFile, DomainError> {
        let entries = self
            .repository
            .list_history(None)
            .await
            .map_err(DomainError::operation_failed)?;
        let entries = filter.apply(entries);
        info!("Exporting {} history entries", entries.len());

        Ok(ExportFile {
            filename: format!("historial_cambios_{}.xlsx", Utc::now().format("%Y-%m-%d")),
            content_type: XLSX_CONTENT_TYPE,
            bytes: history_workbook(&entries).map_err(DomainError::operation_failed)?,
        })
    }
}

/// Import template with one example row
pub fn template() -> Result<ExportFile, DomainError> {
    let row = TEMPLATE_EXAMPLE_ROW
        .iter()
        .map(|value| match value.parse::<f64>() {
            Ok(n) => Cell::Number(n),
            Err(_) => text(&Some(value.to_string())),
        })
        .collect();
    let bytes = write_workbook(TEMPLATE_SHEET, &IMPORT_HEADERS, vec![row])
        .map_err(DomainError::operation_failed)?;

    Ok(ExportFile {
        filename: "plantilla_viviendas.xlsx".to_string(),
        content_type: XLSX_CONTENT_TYPE,
        bytes,
    })
}

/// A single worksheet cell; numbers stay numeric so they can be summed in Excel
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

pub fn units_workbook(units: &[HousingUnit]) -> Result<Vec<u8>> {
    let rows = units
        .iter()
        .map(|u| {
            vec![
                Cell::Text(u.code.clone()),
                text(&u.portal),
                text(&u.floor),
                text(&u.letter),
                text(&u.typology),
                text(&u.orientation),
                number(u.bedrooms.map(f64::from)),
                number(u.surface_with_terrace),
                number(u.surface_interior),
                number(u.surface_terraces),
                number(u.final_price),
                Cell::Text(u.estado.to_string()),
                name(&u.manager),
                name(&u.responsible),
                text(&u.notes),
            ]
        })
        .collect();

    write_workbook(UNITS_SHEET, &UNIT_EXPORT_HEADERS, rows)
}

pub fn history_workbook(entries: &[HistoryEntry]) -> Result<Vec<u8>> {
    let rows = entries
        .iter()
        .map(|e| {
            vec![
                Cell::Text(format_date(e.change.created_at)),
                text(&e.unit_code),
                text(&e.change.from_estado.map(|s| s.to_string())),
                Cell::Text(e.change.to_estado.to_string()),
                name(&e.manager),
                name(&e.responsible),
                text(&e.change.actor_name),
                text(&e.change.reason),
            ]
        })
        .collect();

    write_workbook(HISTORY_SHEET, &HISTORY_EXPORT_HEADERS, rows)
}

fn write_workbook(sheet_name: &str, headers: &[&str], rows: Vec<Vec<Cell>>) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (col, header) in (0u16..).zip(headers) {
        worksheet.write_string_with_format(0, col, *header, &header_format)?;
    }

    for (row, cells) in (1u32..).zip(rows) {
        for (col, cell) in (0u16..).zip(cells) {
            match cell {
                Cell::Text(value) => {
                    worksheet.write_string(row, col, value)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(row, col, value)?;
                }
                Cell::Empty => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn text(value: &Option<String>) -> Cell {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Cell::Text(v.to_string()),
        _ => Cell::Empty,
    }
}

fn number(value: Option<f64>) -> Cell {
    value.map(Cell::Number).unwrap_or(Cell::Empty)
}

fn name(person: &Option<PersonRef>) -> Cell {
    text(&person.as_ref().map(|p| p.name.clone()))
}
