//! Best-effort notification of estado changes.
//!
//! A committed state change is announced to an external endpoint from a
//! detached task. The outcome never reaches the caller of the state change:
//! failures are logged and kept in a [`NotificationLog`] that can be inspected
//! through the REST API.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use reqwest::Client;
use serde::Serialize;
use shared::{Estado, NotificationFailureDto, PersonRef, StateChange};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::backend::domain::models::NotificationError;
use crate::backend::storage::SharedRepository;

/// Body sent to the notification endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationPayload {
    pub unit_id: Uuid,
    pub unit_code: String,
    pub from_estado: Option<Estado>,
    pub to_estado: Estado,
    pub manager: Option<PersonRef>,
    pub responsible: Option<PersonRef>,
    pub reason: Option<String>,
    pub actor_email: Option<String>,
    /// RFC 3339 time of the change
    pub timestamp: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, payload: &NotificationPayload) -> Result<(), NotificationError>;
}

/// Posts the payload as JSON to a fixed URL
pub struct HttpNotifier {
    client: Client,
    url: String,
    token: Option<String>,
}

impl HttpNotifier {
    pub fn new(url: String, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url, token })
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, payload: &NotificationPayload) -> Result<(), NotificationError> {
        let mut request = self.client.post(&self.url).json(payload);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotificationError::Rejected {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}

/// Used when no endpoint is configured
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, payload: &NotificationPayload) -> Result<(), NotificationError> {
        info!("Notifications disabled, skipping {}", payload.unit_code);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationFailure {
    pub state_change_id: Uuid,
    pub unit_code: String,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

impl NotificationFailure {
    pub fn to_dto(&self) -> NotificationFailureDto {
        NotificationFailureDto {
            state_change_id: self.state_change_id,
            unit_code: self.unit_code.clone(),
            error: self.error.clone(),
            failed_at: self.failed_at,
        }
    }
}

/// Side channel collecting failed notifications
#[derive(Clone, Default)]
pub struct NotificationLog {
    failures: Arc<Mutex<Vec<NotificationFailure>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<NotificationFailure>> {
        // A panic while holding the lock cannot leave a Vec half-written
        self.failures.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn record(&self, failure: NotificationFailure) {
        self.entries().push(failure);
    }

    /// Recorded failures, oldest first
    pub fn failures(&self) -> Vec<NotificationFailure> {
        self.entries().clone()
    }
}

/// What the dispatcher needs to announce one committed change
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub change: StateChange,
    pub unit_code: String,
    pub actor_email: Option<String>,
}

/// Spawns one detached notification task per committed change
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    repository: SharedRepository,
    log: NotificationLog,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, repository: SharedRepository, log: NotificationLog) -> Self {
        Self {
            notifier,
            repository,
            log,
        }
    }

    pub fn log(&self) -> &NotificationLog {
        &self.log
    }

    /// Announce a change without waiting for the outcome.
    ///
    /// The returned handle is only useful to tests; production callers drop it.
    pub fn dispatch(&self, request: NotificationRequest) -> JoinHandle<()> {
        let notifier = self.notifier.clone();
        let repository = self.repository.clone();
        let log = self.log.clone();

        tokio::spawn(async move {
            let payload = build_payload(&repository, &request).await;
            if let Err(e) = notifier.notify(&payload).await {
                warn!(
                    "Notification for {} (change {}) failed: {}",
                    request.unit_code, request.change.id, e
                );
                log.record(NotificationFailure {
                    state_change_id: request.change.id,
                    unit_code: request.unit_code,
                    error: e.to_string(),
                    failed_at: Utc::now(),
                });
            }
        })
    }
}

async fn build_payload(repository: &SharedRepository, request: &NotificationRequest) -> NotificationPayload {
    let change = &request.change;
    NotificationPayload {
        unit_id: change.unit_id,
        unit_code: request.unit_code.clone(),
        from_estado: change.from_estado,
        to_estado: change.to_estado,
        manager: resolve_person(repository, change.manager_id).await,
        responsible: resolve_person(repository, change.responsible_id).await,
        reason: change.reason.clone(),
        actor_email: request.actor_email.clone(),
        timestamp: change.created_at.to_rfc3339(),
    }
}

/// Display data of a person; lookup failures only drop the name
async fn resolve_person(repository: &SharedRepository, person_id: Option<Uuid>) -> Option<PersonRef> {
    let person_id = person_id?;
    match repository.get_person(person_id).await {
        Ok(person) => person.map(|p| p.to_ref()),
        Err(e) => {
            warn!("Could not resolve person {} for notification: {}", person_id, e);
            None
        }
    }
}
