use chrono::NaiveDate;
use serde::Deserialize;
use shared::Estado;
use std::str::FromStr;
use uuid::Uuid;

use crate::backend::domain::filters::{HistoryFilter, UnitFilter};
use crate::backend::domain::models::ValidationError;

/// Query string of the unit list and unit export
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitQuery {
    pub search: Option<String>,
    pub portal: Option<String>,
    /// Comma separated estado codes
    pub estados: Option<String>,
    pub typology: Option<String>,
    pub manager_id: Option<String>,
    pub responsible_id: Option<String>,
}

/// Query string of the history list and history export
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub search: Option<String>,
    pub from_estado: Option<String>,
    pub to_estado: Option<String>,
    pub manager_id: Option<String>,
    pub responsible_id: Option<String>,
    pub actor_id: Option<String>,
    /// YYYY-MM-DD
    pub date_from: Option<String>,
    /// YYYY-MM-DD
    pub date_to: Option<String>,
}

pub struct FilterMapper;

impl FilterMapper {
    pub fn to_unit_filter(query: UnitQuery) -> Result<UnitFilter, ValidationError> {
        let estados = match present(query.estados) {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(|code| parse::<Estado>("estados", code))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(UnitFilter {
            search: present(query.search),
            portal: present(query.portal),
            estados,
            typology: present(query.typology),
            manager_id: optional::<Uuid>("manager_id", query.manager_id)?,
            responsible_id: optional::<Uuid>("responsible_id", query.responsible_id)?,
        })
    }

    pub fn to_history_filter(query: HistoryQuery) -> Result<HistoryFilter, ValidationError> {
        Ok(HistoryFilter {
            search: present(query.search),
            from_estado: optional::<Estado>("from_estado", query.from_estado)?,
            to_estado: optional::<Estado>("to_estado", query.to_estado)?,
            manager_id: optional::<Uuid>("manager_id", query.manager_id)?,
            responsible_id: optional::<Uuid>("responsible_id", query.responsible_id)?,
            actor_id: optional::<Uuid>("actor_id", query.actor_id)?,
            date_from: optional_date("date_from", query.date_from)?,
            date_to: optional_date("date_to", query.date_to)?,
        })
    }
}

/// Empty query values are the same as absent ones
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse<T: FromStr>(field: &str, raw: &str) -> Result<T, ValidationError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ValidationError::InvalidFilter(format!("{} = {}", field, raw)))
}

fn optional<T: FromStr>(field: &str, value: Option<String>) -> Result<Option<T>, ValidationError> {
    present(value).map(|raw| parse(field, &raw)).transpose()
}

fn optional_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, ValidationError> {
    present(value)
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| ValidationError::InvalidFilter(format!("{} = {}", field, raw)))
        })
        .transpose()
}
