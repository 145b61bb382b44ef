//! Dashboard aggregates: counts per estado, distribution chart and latest changes.

use log::info;
use shared::{DashboardResponse, Estado, EstadoCounts, EstadoShare, HousingUnit};

use crate::backend::domain::formatting::{estado_hex, estado_plural_label};
use crate::backend::domain::history_service::HistoryService;
use crate::backend::domain::models::DomainError;
use crate::backend::storage::SharedRepository;

const RECENT_CHANGES: u32 = 10;

#[derive(Clone)]
pub struct DashboardService {
    repository: SharedRepository,
    history_service: HistoryService,
}

impl DashboardService {
    pub fn new(repository: SharedRepository, history_service: HistoryService) -> Self {
        Self {
            repository,
            history_service,
        }
    }

    pub async fn summary(&self) -> Result<DashboardResponse, DomainError> {
        let units = self
            .repository
            .list_units()
            .await
            .map_err(DomainError::operation_failed)?;
        let counts = count_by_estado(&units);
        info!("Dashboard over {} units", counts.total);

        Ok(DashboardResponse {
            distribution: distribution(&counts),
            counts,
            recent_changes: self.history_service.recent(Some(RECENT_CHANGES)).await?,
        })
    }
}

pub fn count_by_estado(units: &[HousingUnit]) -> EstadoCounts {
    units.iter().fold(EstadoCounts::default(), |mut counts, unit| {
        counts.total += 1;
        match unit.estado {
            Estado::Libre => counts.libres += 1,
            Estado::Bloqueada => counts.bloqueadas += 1,
            Estado::Reservada => counts.reservadas += 1,
        }
        counts
    })
}

pub fn distribution(counts: &EstadoCounts) -> Vec<EstadoShare> {
    Estado::ALL
        .into_iter()
        .map(|estado| EstadoShare {
            estado,
            label: estado_plural_label(estado).to_string(),
            value: match estado {
                Estado::Libre => counts.libres,
                Estado::Bloqueada => counts.bloqueadas,
                Estado::Reservada => counts.reservadas,
            },
            color: estado_hex(estado).to_string(),
        })
        .collect()
}
