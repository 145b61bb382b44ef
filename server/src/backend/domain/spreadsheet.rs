//! Spreadsheet reading for the import pipeline.
//!
//! Accepts Excel workbooks (`.xlsx`, `.xls`) through calamine and CSV through
//! the csv crate. Only the first sheet is read; its first row is the header
//! row and every later row becomes a [`SheetRow`] keyed by header. Rows whose
//! cells are all blank are dropped.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::{Map, Value};
use std::io::Cursor;

use crate::backend::domain::models::ValidationError;

/// Column headers of the import vocabulary
pub mod columns {
    pub const PORTAL: &str = "Portal";
    pub const FLOOR: &str = "Planta";
    pub const LETTER: &str = "Letra";
    pub const TYPOLOGY: &str = "Tipología";
    pub const ORIENTATION: &str = "Orientación";
    pub const BEDROOMS: &str = "Dormitorios";
    pub const SURFACE_WITH_TERRACE: &str = "Superficie Útil + Terraza";
    pub const SURFACE_INTERIOR: &str = "Superficie Útil Vivienda";
    pub const SURFACE_TERRACES: &str = "Superficie Útil Terrazas";
    pub const FINAL_PRICE: &str = "PVP Final";
    pub const NOTES: &str = "Observaciones";
    pub const ESTADO: &str = "Estado";
    pub const MANAGER: &str = "Gestor";
    pub const RESPONSIBLE: &str = "Último Responsable";
}

/// Import headers in template order
pub const IMPORT_HEADERS: [&str; 14] = [
    columns::PORTAL,
    columns::FLOOR,
    columns::LETTER,
    columns::TYPOLOGY,
    columns::ORIENTATION,
    columns::BEDROOMS,
    columns::SURFACE_WITH_TERRACE,
    columns::SURFACE_INTERIOR,
    columns::SURFACE_TERRACES,
    columns::FINAL_PRICE,
    columns::NOTES,
    columns::ESTADO,
    columns::MANAGER,
    columns::RESPONSIBLE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetKind {
    Xlsx,
    Xls,
    Csv,
}

impl SpreadsheetKind {
    /// Detect the format from the file extension, case-insensitively
    pub fn from_filename(filename: &str) -> Result<Self, ValidationError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.trim().to_ascii_lowercase())
            .ok_or(ValidationError::UnsupportedFile)?;

        match extension.as_str() {
            "xlsx" => Ok(SpreadsheetKind::Xlsx),
            "xls" => Ok(SpreadsheetKind::Xls),
            "csv" => Ok(SpreadsheetKind::Csv),
            _ => Err(ValidationError::UnsupportedFile),
        }
    }
}

/// One data row, with cells keyed by the header of their column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    cells: Vec<(String, String)>,
}

impl SheetRow {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        Self { cells }
    }

    /// Build a row from header/value pairs, mainly for tests
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        )
    }

    /// Trimmed value of a column; None when absent or blank
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.trim().is_empty())
    }

    /// Raw cells as a JSON object, used in import logs and previews
    pub fn to_json(&self) -> Map<String, Value> {
        self.cells
            .iter()
            .map(|(h, v)| (h.clone(), Value::String(v.clone())))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

/// Read the first sheet of a spreadsheet file
pub fn read_sheet(filename: &str, bytes: &[u8]) -> Result<Sheet, ValidationError> {
    let table = match SpreadsheetKind::from_filename(filename)? {
        SpreadsheetKind::Xlsx | SpreadsheetKind::Xls => read_workbook(bytes)?,
        SpreadsheetKind::Csv => read_csv(bytes)?,
    };
    Ok(into_sheet(table))
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<Vec<String>>, ValidationError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ValidationError::InvalidSpreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ValidationError::InvalidSpreadsheet("el libro no tiene hojas".to_string()))?
        .map_err(|e| ValidationError::InvalidSpreadsheet(e.to_string()))?;

    Ok(range
        .rows()
        .map(|r| r.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

fn read_csv(bytes: &[u8]) -> Result<Vec<Vec<String>>, ValidationError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    reader
        .records()
        .map(|record| {
            record
                .map(|r| r.iter().map(str::to_string).collect())
                .map_err(|e| ValidationError::InvalidSpreadsheet(e.to_string()))
        })
        .collect()
}

fn into_sheet(table: Vec<Vec<String>>) -> Sheet {
    let mut lines = table.into_iter();
    let headers: Vec<String> = match lines.next() {
        Some(header) => header.into_iter().map(|h| h.trim().to_string()).collect(),
        None => return Sheet::default(),
    };

    let rows = lines
        .map(|values| {
            let cells = headers
                .iter()
                .enumerate()
                .filter(|(_, header)| !header.is_empty())
                .map(|(i, header)| (header.clone(), values.get(i).cloned().unwrap_or_default()))
                .collect();
            SheetRow::new(cells)
        })
        .filter(|row| !row.is_blank())
        .collect();

    Sheet { headers, rows }
}
