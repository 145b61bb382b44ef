//! Read side of the unit inventory: filtered list, filter options, detail.

use log::info;
use shared::{
    Estado, EstadoInfo, FilterOptionsResponse, HousingUnit, HousingUnitDetailResponse,
    UnitListResponse,
};
use uuid::Uuid;

use crate::backend::domain::filters::{filter_options, UnitFilter};
use crate::backend::domain::formatting::{
    estado_color, estado_hex, estado_icon, format_date, format_optional_currency,
};
use crate::backend::domain::models::{DomainError, ValidationError};
use crate::backend::domain::transitions::allowed_targets;
use crate::backend::storage::SharedRepository;

#[derive(Clone)]
pub struct HousingUnitService {
    repository: SharedRepository,
}

impl HousingUnitService {
    pub fn new(repository: SharedRepository) -> Self {
        Self { repository }
    }

    /// All units ordered by code, narrowed by `filter`
    pub async fn list(&self, filter: &UnitFilter) -> Result<UnitListResponse, DomainError> {
        let units = self.load_all().await?;
        let total = units.len();
        let units = filter.apply(units);
        info!("Listing {} of {} units", units.len(), total);

        Ok(UnitListResponse {
            filtered: units.len(),
            total,
            units,
        })
    }

    pub async fn filter_options(&self) -> Result<FilterOptionsResponse, DomainError> {
        Ok(filter_options(&self.load_all().await?))
    }

    pub async fn get(&self, unit_id: Uuid) -> Result<HousingUnit, DomainError> {
        self.repository
            .get_unit(unit_id)
            .await
            .map_err(DomainError::operation_failed)?
            .ok_or_else(|| ValidationError::UnitNotFound(unit_id).into())
    }

    pub async fn detail(&self, unit_id: Uuid) -> Result<HousingUnitDetailResponse, DomainError> {
        let unit = self.get(unit_id).await?;
        Ok(HousingUnitDetailResponse {
            price_display: format_optional_currency(unit.final_price),
            created_display: format_date(unit.created_at),
            updated_display: format_date(unit.updated_at),
            allowed_transitions: allowed_targets(unit.estado).to_vec(),
            unit,
        })
    }

    async fn load_all(&self) -> Result<Vec<HousingUnit>, DomainError> {
        self.repository
            .list_units()
            .await
            .map_err(DomainError::operation_failed)
    }
}

/// Display metadata and transitions of every estado
pub fn estado_catalog() -> Vec<EstadoInfo> {
    Estado::ALL
        .into_iter()
        .map(|estado| EstadoInfo {
            estado,
            label: estado.as_str().to_string(),
            badge_class: estado_color(estado).to_string(),
            color: estado_hex(estado).to_string(),
            icon: estado_icon(estado).to_string(),
            transitions: allowed_targets(estado).to_vec(),
        })
        .collect()
}
