//! # Storage Traits
//!
//! This module defines the storage abstraction that the domain layer talks to.
//! The production implementation is backed by SQLite; an in-memory
//! implementation is used as a test double.

use anyhow::Result;
use async_trait::async_trait;
use shared::{HistoryEntry, HousingUnit, ImportJob, Person, StateChange};
use std::sync::Arc;
use uuid::Uuid;

use crate::backend::domain::commands::{
    import::{UnitUpsert, UpsertOutcome},
    state_change::{Actor, ChangeEstadoCommand},
};

/// Interface to the four record sets of the inventory
/// (housing units, persons, state changes, import jobs).
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// List all housing units ordered by code, with manager/responsible joined
    async fn list_units(&self) -> Result<Vec<HousingUnit>>;

    /// Retrieve a single housing unit by ID
    async fn get_unit(&self, unit_id: Uuid) -> Result<Option<HousingUnit>>;

    /// Insert or overwrite a unit keyed by its unique code.
    ///
    /// Inserting records the initial state change (no previous state);
    /// overwriting a unit with a different estado records one state change
    /// from the stored estado to the new one. `reason` is used for both.
    async fn upsert_unit(&self, unit: &UnitUpsert, actor: &Actor, reason: &str) -> Result<UpsertOutcome>;

    /// List persons ordered by name
    async fn list_persons(&self, active_only: bool) -> Result<Vec<Person>>;

    /// Retrieve a single person by ID
    async fn get_person(&self, person_id: Uuid) -> Result<Option<Person>>;

    /// Store a new person
    async fn insert_person(&self, person: &Person) -> Result<()>;

    /// Atomically update a unit's estado (and manager/responsible) and append
    /// the matching state change record.
    ///
    /// Fails without side effects if the unit does not exist or its stored
    /// estado already equals the requested one.
    async fn change_estado(&self, command: &ChangeEstadoCommand) -> Result<StateChange>;

    /// List state changes newest first, joined with display data
    async fn list_history(&self, limit: Option<u32>) -> Result<Vec<HistoryEntry>>;

    /// Append the record of an import attempt
    async fn append_import_job(&self, job: &ImportJob) -> Result<()>;

    /// List import jobs newest first
    async fn list_import_jobs(&self, limit: Option<u32>) -> Result<Vec<ImportJob>>;
}

/// Repository handle shared by all domain services
pub type SharedRepository = Arc<dyn InventoryRepository>;
