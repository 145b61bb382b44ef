//! Validation of one imported spreadsheet row.
//!
//! All checks run on every row and their messages accumulate, so an operator
//! sees every problem of a row at once.

use shared::Estado;

use crate::backend::domain::spreadsheet::{columns, SheetRow};

const NUMERIC_COLUMNS: [&str; 4] = [
    columns::SURFACE_WITH_TERRACE,
    columns::SURFACE_INTERIOR,
    columns::SURFACE_TERRACES,
    columns::FINAL_PRICE,
];

/// Check a row; an empty result means the row can be imported
pub fn validate_row(row: &SheetRow) -> Vec<String> {
    let mut errors = Vec::new();

    if row.get(columns::PORTAL).is_none() {
        errors.push("Portal es obligatorio".to_string());
    }
    if row.get(columns::FLOOR).is_none() {
        errors.push("Planta es obligatoria".to_string());
    }
    if row.get(columns::LETTER).is_none() {
        errors.push("Letra es obligatoria".to_string());
    }

    if let Some(estado) = row.get(columns::ESTADO) {
        if estado.parse::<Estado>().is_err() {
            errors.push(format!("Estado debe ser uno de: {}", Estado::valid_codes()));
        }
    }

    if let Some(bedrooms) = row.get(columns::BEDROOMS) {
        if parse_whole_number(bedrooms).is_none() {
            errors.push(format!("{} debe ser un número", columns::BEDROOMS));
        }
    }

    for column in NUMERIC_COLUMNS {
        if let Some(value) = row.get(column) {
            if parse_number(value).is_none() {
                errors.push(format!("{} debe ser un número", column));
            }
        }
    }

    errors
}

/// Parse a finite decimal number
pub fn parse_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Parse a whole number; spreadsheet cells may carry it as `2` or `2.0`
pub fn parse_whole_number(value: &str) -> Option<i32> {
    let number = parse_number(value)?;
    if number.fract() != 0.0 || number < i32::MIN as f64 || number > i32::MAX as f64 {
        return None;
    }
    Some(number as i32)
}
