//! Estado change of a housing unit.
//!
//! ## Business Rules
//!
//! - Viewers cannot change estados
//! - The requested estado must differ from the unit's current one
//! - Moving to BLOQUEADA or RESERVADA requires a non-blank reason
//! - These rules are checked before the repository is called, so a rejected
//!   request has no side effect
//! - The repository applies the update and appends the history record in one
//!   transaction
//! - A notification is dispatched after the commit; its outcome never changes
//!   the result

use log::{error, info};
use shared::{ChangeEstadoRequest, Estado, HousingUnit, StateChange};
use tokio::task::JoinHandle;

use crate::backend::domain::commands::state_change::ChangeEstadoCommand;
use crate::backend::domain::models::{DomainError, Session, ValidationError};
use crate::backend::domain::notification_service::{NotificationDispatcher, NotificationRequest};
use crate::backend::domain::transitions::is_allowed;
use crate::backend::storage::SharedRepository;

/// Result of a committed estado change
#[derive(Debug)]
pub struct StateChangeOutcome {
    pub change: StateChange,
    pub success_message: String,
    /// Detached notification task; dropping it does not cancel the task
    pub notification: JoinHandle<()>,
}

#[derive(Clone)]
pub struct StateChangeService {
    repository: SharedRepository,
    dispatcher: NotificationDispatcher,
}

impl StateChangeService {
    pub fn new(repository: SharedRepository, dispatcher: NotificationDispatcher) -> Self {
        Self {
            repository,
            dispatcher,
        }
    }

    /// Change the estado of `unit` as currently known by the caller
    pub async fn change_estado(
        &self,
        session: &Session,
        unit: &HousingUnit,
        request: ChangeEstadoRequest,
    ) -> Result<StateChangeOutcome, DomainError> {
        info!(
            "Changing estado of {} from {} to {}",
            unit.code, unit.estado, request.new_estado
        );

        if !session.can_edit() {
            return Err(ValidationError::PermissionDenied("cambiar el estado".to_string()).into());
        }

        let reason = check_preconditions(unit.estado, &request)?;

        let command = ChangeEstadoCommand {
            unit_id: unit.id,
            new_estado: request.new_estado,
            manager_id: request.manager_id,
            responsible_id: request.responsible_id,
            reason,
            actor: session.actor(),
        };

        let change = self.repository.change_estado(&command).await.map_err(|e| {
            error!("Estado change of {} failed: {}", unit.code, e);
            DomainError::operation_failed(e)
        })?;

        let notification = self.dispatcher.dispatch(NotificationRequest {
            change: change.clone(),
            unit_code: unit.code.clone(),
            actor_email: session.email.clone(),
        });

        Ok(StateChangeOutcome {
            success_message: format!("Vivienda {} cambiada a {}", unit.code, change.to_estado),
            change,
            notification,
        })
    }
}

/// Validate a request against the current estado; returns the trimmed reason
fn check_preconditions(current: Estado, request: &ChangeEstadoRequest) -> Result<Option<String>, ValidationError> {
    // The only move the table forbids is staying put
    if !is_allowed(current, request.new_estado) {
        return Err(ValidationError::NoOpTransition);
    }

    let reason = request
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    if request.new_estado != Estado::Libre && reason.is_none() {
        return Err(ValidationError::MissingReason);
    }

    Ok(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::notification_service::test_support::RecordingNotifier;
    use crate::backend::domain::notification_service::NotificationLog;
    use crate::backend::storage::{InMemoryRepository, InventoryRepository};
    use chrono::Utc;
    use shared::Role;
    use std::sync::Arc;
    use uuid::Uuid;

    struct Fixture {
        repository: Arc<InMemoryRepository>,
        notifier: Arc<RecordingNotifier>,
        log: NotificationLog,
        service: StateChangeService,
    }

    fn fixture_with(notifier: RecordingNotifier) -> Fixture {
        let repository = Arc::new(InMemoryRepository::new());
        let notifier = Arc::new(notifier);
        let log = NotificationLog::new();
        let dispatcher = NotificationDispatcher::new(notifier.clone(), repository.clone(), log.clone());
        let service = StateChangeService::new(repository.clone(), dispatcher);
        Fixture {
            repository,
            notifier,
            log,
            service,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(RecordingNotifier::default())
    }

    fn session() -> Session {
        let mut session = Session::new(Uuid::new_v4(), Role::Gestor);
        session.name = Some("Ana Ruiz".to_string());
        session.email = Some("ana@example.com".to_string());
        session
    }

    fn seeded_unit(repository: &InMemoryRepository, estado: Estado) -> HousingUnit {
        let now = Utc::now();
        let unit = HousingUnit {
            id: Uuid::new_v4(),
            code: "P1-2-B".to_string(),
            portal: Some("1".to_string()),
            floor: Some("2".to_string()),
            letter: Some("B".to_string()),
            typology: Some("Piso".to_string()),
            orientation: None,
            bedrooms: Some(3),
            surface_with_terrace: None,
            surface_interior: None,
            surface_terraces: None,
            final_price: Some(250000.0),
            notes: None,
            estado,
            manager_id: None,
            responsible_id: None,
            manager: None,
            responsible: None,
            created_at: now,
            updated_at: now,
        };
        repository.seed_unit(unit.clone()).unwrap();
        unit
    }

    fn request(new_estado: Estado, reason: Option<&str>) -> ChangeEstadoRequest {
        ChangeEstadoRequest {
            new_estado,
            manager_id: None,
            responsible_id: None,
            reason: reason.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_same_estado_is_rejected_without_repository_call() {
        let fx = fixture();
        for estado in Estado::ALL {
            let unit = seeded_unit(&fx.repository, estado);
            let err = fx
                .service
                .change_estado(&session(), &unit, request(estado, Some("motivo")))
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::Validation(ValidationError::NoOpTransition)));
        }
        assert_eq!(fx.repository.change_estado_calls(), 0);
    }

    #[tokio::test]
    async fn test_viewer_cannot_change_estado() {
        let fx = fixture();
        let unit = seeded_unit(&fx.repository, Estado::Libre);
        let viewer = Session::new(Uuid::new_v4(), Role::Viewer);

        let err = fx
            .service
            .change_estado(&viewer, &unit, request(Estado::Reservada, Some("Señal")))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(ValidationError::PermissionDenied(_))));
        assert_eq!(err.to_string(), "No tienes permisos para cambiar el estado");
        assert_eq!(fx.repository.change_estado_calls(), 0);
        assert!(fx.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_promoter_can_change_estado() {
        let fx = fixture();
        let unit = seeded_unit(&fx.repository, Estado::Libre);
        let promoter = Session::new(Uuid::new_v4(), Role::Promotor);

        let outcome = fx
            .service
            .change_estado(&promoter, &unit, request(Estado::Bloqueada, Some("Visita")))
            .await
            .unwrap();
        assert_eq!(outcome.change.to_estado, Estado::Bloqueada);
    }

    #[tokio::test]
    async fn test_blocking_or_reserving_requires_reason() {
        let fx = fixture();
        let unit = seeded_unit(&fx.repository, Estado::Libre);

        for target in [Estado::Bloqueada, Estado::Reservada] {
            for reason in [None, Some(""), Some("   ")] {
                let err = fx
                    .service
                    .change_estado(&session(), &unit, request(target, reason))
                    .await
                    .unwrap_err();
                assert!(matches!(err, DomainError::Validation(ValidationError::MissingReason)));
            }
        }
        assert_eq!(fx.repository.change_estado_calls(), 0);
    }

    #[tokio::test]
    async fn test_freeing_a_unit_needs_no_reason() {
        let fx = fixture();
        let unit = seeded_unit(&fx.repository, Estado::Reservada);

        let outcome = fx
            .service
            .change_estado(&session(), &unit, request(Estado::Libre, None))
            .await
            .unwrap();

        assert_eq!(outcome.change.from_estado, Some(Estado::Reservada));
        assert_eq!(outcome.change.to_estado, Estado::Libre);
        assert_eq!(outcome.change.reason, None);
        assert_eq!(outcome.success_message, "Vivienda P1-2-B cambiada a LIBRE");
    }

    #[tokio::test]
    async fn test_successful_change_records_actor_and_notifies() {
        let fx = fixture();
        let unit = seeded_unit(&fx.repository, Estado::Libre);
        let session = session();
        let manager = Uuid::new_v4();

        let mut req = request(Estado::Bloqueada, Some("  Cliente interesado  "));
        req.manager_id = Some(manager);
        let outcome = fx.service.change_estado(&session, &unit, req).await.unwrap();
        outcome.notification.await.unwrap();

        assert_eq!(fx.repository.change_estado_calls(), 1);
        assert_eq!(outcome.change.reason.as_deref(), Some("Cliente interesado"));
        assert_eq!(outcome.change.actor_user_id, Some(session.user_id));
        assert_eq!(outcome.change.actor_name.as_deref(), Some("Ana Ruiz"));
        assert_eq!(outcome.change.manager_id, Some(manager));

        let stored = fx.repository.get_unit(unit.id).await.unwrap().unwrap();
        assert_eq!(stored.estado, Estado::Bloqueada);

        let sent = fx.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].actor_email.as_deref(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_change() {
        let fx = fixture_with(RecordingNotifier::failing());
        let unit = seeded_unit(&fx.repository, Estado::Libre);

        let outcome = fx
            .service
            .change_estado(&session(), &unit, request(Estado::Reservada, Some("Señal")))
            .await
            .unwrap();
        outcome.notification.await.unwrap();

        let history = fx.repository.list_history(None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].change.id, outcome.change.id);

        let failures = fx.log.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].state_change_id, outcome.change.id);
    }

    #[tokio::test]
    async fn test_repository_failure_surfaces_backend_message() {
        let fx = fixture();
        let unit = seeded_unit(&fx.repository, Estado::Libre);
        fx.repository
            .fail_change_estado("permission denied for function change_estado")
            .unwrap();

        let err = fx
            .service
            .change_estado(&session(), &unit, request(Estado::Bloqueada, Some("motivo")))
            .await
            .unwrap_err();

        match err {
            DomainError::OperationFailed(message) => {
                assert_eq!(message, "permission denied for function change_estado")
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(fx.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_stale_unit_view_is_refused_by_repository() {
        let fx = fixture();
        let unit = seeded_unit(&fx.repository, Estado::Libre);

        // Someone else already reserved it; our copy still says LIBRE
        fx.service
            .change_estado(&session(), &unit, request(Estado::Reservada, Some("Señal")))
            .await
            .unwrap();

        let err = fx
            .service
            .change_estado(&session(), &unit, request(Estado::Reservada, Some("Señal")))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::OperationFailed(_)));
        assert_eq!(fx.repository.list_history(None).await.unwrap().len(), 1);
    }
}
