//! In-memory filtering of loaded units and history entries.
//!
//! Every criterion is optional and all set criteria must hold. Filtering is
//! pure and synchronous: callers load the collection first, then narrow it.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use shared::{Estado, FilterOptionsResponse, HistoryEntry, HousingUnit};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Criteria of the unit list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitFilter {
    /// Case-insensitive substring of code, portal, floor, letter or typology
    pub search: Option<String>,
    pub portal: Option<String>,
    /// Accepted estados; empty means any
    pub estados: Vec<Estado>,
    pub typology: Option<String>,
    pub manager_id: Option<Uuid>,
    pub responsible_id: Option<Uuid>,
}

impl UnitFilter {
    pub fn matches(&self, unit: &HousingUnit) -> bool {
        if let Some(search) = normalized_search(&self.search) {
            let haystack = [
                Some(unit.code.as_str()),
                unit.portal.as_deref(),
                unit.floor.as_deref(),
                unit.letter.as_deref(),
                unit.typology.as_deref(),
            ]
            .map(|part| part.unwrap_or(""))
            .join(" ")
            .to_lowercase();

            if !haystack.contains(&search) {
                return false;
            }
        }

        if let Some(portal) = &self.portal {
            if unit.portal.as_ref() != Some(portal) {
                return false;
            }
        }

        if !self.estados.is_empty() && !self.estados.contains(&unit.estado) {
            return false;
        }

        if let Some(typology) = &self.typology {
            if unit.typology.as_ref() != Some(typology) {
                return false;
            }
        }

        if self.manager_id.is_some() && unit.manager_id != self.manager_id {
            return false;
        }

        if self.responsible_id.is_some() && unit.responsible_id != self.responsible_id {
            return false;
        }

        true
    }

    pub fn apply(&self, units: Vec<HousingUnit>) -> Vec<HousingUnit> {
        units.into_iter().filter(|u| self.matches(u)).collect()
    }
}

/// Criteria of the history list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    /// Case-insensitive substring of unit code or reason
    pub search: Option<String>,
    pub from_estado: Option<Estado>,
    pub to_estado: Option<Estado>,
    pub manager_id: Option<Uuid>,
    pub responsible_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    /// Inclusive, from the start of this UTC day
    pub date_from: Option<NaiveDate>,
    /// Inclusive, up to the end of this UTC day
    pub date_to: Option<NaiveDate>,
}

impl HistoryFilter {
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        let change = &entry.change;

        if let Some(search) = normalized_search(&self.search) {
            let haystack = [entry.unit_code.as_deref(), change.reason.as_deref()]
                .map(|part| part.unwrap_or(""))
                .join(" ")
                .to_lowercase();

            if !haystack.contains(&search) {
                return false;
            }
        }

        if self.from_estado.is_some() && change.from_estado != self.from_estado {
            return false;
        }

        if let Some(to_estado) = self.to_estado {
            if change.to_estado != to_estado {
                return false;
            }
        }

        if self.manager_id.is_some() && change.manager_id != self.manager_id {
            return false;
        }

        if self.responsible_id.is_some() && change.responsible_id != self.responsible_id {
            return false;
        }

        if self.actor_id.is_some() && change.actor_user_id != self.actor_id {
            return false;
        }

        if let Some(from) = self.date_from.map(start_of_day) {
            if change.created_at < from {
                return false;
            }
        }

        if let Some(to) = self.date_to.map(end_of_day) {
            if change.created_at > to {
                return false;
            }
        }

        true
    }

    pub fn apply(&self, entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
        entries.into_iter().filter(|e| self.matches(e)).collect()
    }
}

/// Sorted distinct portals and typologies present in the units
pub fn filter_options(units: &[HousingUnit]) -> FilterOptionsResponse {
    let distinct = |values: Vec<Option<&String>>| -> Vec<String> {
        values
            .into_iter()
            .flatten()
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };

    FilterOptionsResponse {
        portals: distinct(units.iter().map(|u| u.portal.as_ref()).collect()),
        typologies: distinct(units.iter().map(|u| u.typology.as_ref()).collect()),
    }
}

fn normalized_search(search: &Option<String>) -> Option<String> {
    search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let end = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    date.and_time(end).and_utc()
}
