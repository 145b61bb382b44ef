//! # In-Memory Repository
//!
//! A process-local implementation of [`InventoryRepository`] used as a test
//! double for domain services. It mirrors the SQLite semantics (upsert by
//! code, atomic estado change with history) and additionally counts calls and
//! can be told to fail specific operations.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use shared::{HistoryEntry, HousingUnit, ImportJob, Person, PersonRef, StateChange};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::backend::domain::commands::{
    import::{UnitUpsert, UpsertOutcome},
    state_change::{Actor, ChangeEstadoCommand},
};
use crate::backend::storage::traits::InventoryRepository;

#[derive(Default)]
struct State {
    units: Vec<HousingUnit>,
    persons: Vec<Person>,
    changes: Vec<StateChange>,
    import_jobs: Vec<ImportJob>,
    failing_codes: HashSet<String>,
    fail_change_estado: Option<String>,
}

#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<State>,
    change_estado_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("In-memory repository lock poisoned"))
    }

    /// Number of times `change_estado` was invoked, successful or not
    pub fn change_estado_calls(&self) -> usize {
        self.change_estado_calls.load(Ordering::SeqCst)
    }

    /// Number of times `upsert_unit` was invoked, successful or not
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    /// Make every upsert of the given code fail with a backend error
    pub fn fail_upserts_for(&self, code: &str) -> Result<()> {
        self.state()?.failing_codes.insert(code.to_string());
        Ok(())
    }

    /// Make every `change_estado` call fail with the given backend message
    pub fn fail_change_estado(&self, message: &str) -> Result<()> {
        self.state()?.fail_change_estado = Some(message.to_string());
        Ok(())
    }

    /// Seed a unit directly, bypassing history
    pub fn seed_unit(&self, unit: HousingUnit) -> Result<()> {
        self.state()?.units.push(unit);
        Ok(())
    }

    /// Seed a state change directly
    pub fn seed_change(&self, change: StateChange) -> Result<()> {
        self.state()?.changes.push(change);
        Ok(())
    }
}

fn person_ref(persons: &[Person], id: Option<Uuid>) -> Option<PersonRef> {
    id.and_then(|id| persons.iter().find(|p| p.id == id).map(Person::to_ref))
}

fn joined(unit: &HousingUnit, persons: &[Person]) -> HousingUnit {
    HousingUnit {
        manager: person_ref(persons, unit.manager_id),
        responsible: person_ref(persons, unit.responsible_id),
        ..unit.clone()
    }
}

#[async_trait]
impl InventoryRepository for InMemoryRepository {
    async fn list_units(&self) -> Result<Vec<HousingUnit>> {
        let state = self.state()?;
        let mut units: Vec<HousingUnit> = state
            .units
            .iter()
            .map(|u| joined(u, &state.persons))
            .collect();
        units.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(units)
    }

    async fn get_unit(&self, unit_id: Uuid) -> Result<Option<HousingUnit>> {
        let state = self.state()?;
        Ok(state
            .units
            .iter()
            .find(|u| u.id == unit_id)
            .map(|u| joined(u, &state.persons)))
    }

    async fn upsert_unit(&self, unit: &UnitUpsert, actor: &Actor, reason: &str) -> Result<UpsertOutcome> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state()?;

        if state.failing_codes.contains(&unit.code) {
            bail!("duplicate key value violates unique constraint for {}", unit.code);
        }

        let now = Utc::now();
        let existing = state.units.iter().position(|u| u.code == unit.code);
        let (outcome, from_estado) = match existing {
            Some(index) => {
                let stored = &mut state.units[index];
                let previous = stored.estado;
                stored.portal = Some(unit.portal.clone());
                stored.floor = Some(unit.floor.clone());
                stored.letter = Some(unit.letter.clone());
                stored.typology = unit.typology.clone();
                stored.orientation = unit.orientation.clone();
                stored.bedrooms = unit.bedrooms;
                stored.surface_with_terrace = unit.surface_with_terrace;
                stored.surface_interior = unit.surface_interior;
                stored.surface_terraces = unit.surface_terraces;
                stored.final_price = unit.final_price;
                stored.notes = unit.notes.clone();
                stored.estado = unit.estado;
                stored.manager_id = unit.manager_id;
                stored.responsible_id = unit.responsible_id;
                stored.updated_at = now;

                let estado_changed = previous != unit.estado;
                let outcome = UpsertOutcome::Updated {
                    unit_id: stored.id,
                    estado_changed,
                };
                (outcome, estado_changed.then_some(Some(previous)))
            }
            None => {
                let unit_id = Uuid::new_v4();
                state.units.push(HousingUnit {
                    id: unit_id,
                    code: unit.code.clone(),
                    portal: Some(unit.portal.clone()),
                    floor: Some(unit.floor.clone()),
                    letter: Some(unit.letter.clone()),
                    typology: unit.typology.clone(),
                    orientation: unit.orientation.clone(),
                    bedrooms: unit.bedrooms,
                    surface_with_terrace: unit.surface_with_terrace,
                    surface_interior: unit.surface_interior,
                    surface_terraces: unit.surface_terraces,
                    final_price: unit.final_price,
                    notes: unit.notes.clone(),
                    estado: unit.estado,
                    manager_id: unit.manager_id,
                    responsible_id: unit.responsible_id,
                    manager: None,
                    responsible: None,
                    created_at: now,
                    updated_at: now,
                });
                (UpsertOutcome::Inserted { unit_id }, Some(None))
            }
        };

        if let Some(from_estado) = from_estado {
            state.changes.push(StateChange {
                id: Uuid::new_v4(),
                unit_id: outcome.unit_id(),
                from_estado,
                to_estado: unit.estado,
                manager_id: unit.manager_id,
                responsible_id: unit.responsible_id,
                reason: Some(reason.to_string()),
                actor_user_id: Some(actor.user_id),
                actor_name: actor.name.clone(),
                created_at: now,
            });
        }

        Ok(outcome)
    }

    async fn list_persons(&self, active_only: bool) -> Result<Vec<Person>> {
        let state = self.state()?;
        let mut persons: Vec<Person> = state
            .persons
            .iter()
            .filter(|p| !active_only || p.active)
            .cloned()
            .collect();
        persons.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(persons)
    }

    async fn get_person(&self, person_id: Uuid) -> Result<Option<Person>> {
        let state = self.state()?;
        Ok(state.persons.iter().find(|p| p.id == person_id).cloned())
    }

    async fn insert_person(&self, person: &Person) -> Result<()> {
        self.state()?.persons.push(person.clone());
        Ok(())
    }

    async fn change_estado(&self, command: &ChangeEstadoCommand) -> Result<StateChange> {
        self.change_estado_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state()?;

        if let Some(message) = &state.fail_change_estado {
            bail!("{}", message);
        }

        let now = Utc::now();
        let unit = state
            .units
            .iter_mut()
            .find(|u| u.id == command.unit_id)
            .ok_or_else(|| anyhow!("Vivienda no encontrada: {}", command.unit_id))?;

        let previous = unit.estado;
        if previous == command.new_estado {
            bail!("La vivienda ya está en estado {}", previous);
        }

        unit.estado = command.new_estado;
        unit.manager_id = command.manager_id;
        unit.responsible_id = command.responsible_id;
        unit.updated_at = now;

        let change = StateChange {
            id: Uuid::new_v4(),
            unit_id: command.unit_id,
            from_estado: Some(previous),
            to_estado: command.new_estado,
            manager_id: command.manager_id,
            responsible_id: command.responsible_id,
            reason: command.reason.clone(),
            actor_user_id: Some(command.actor.user_id),
            actor_name: command.actor.name.clone(),
            created_at: now,
        };
        state.changes.push(change.clone());
        Ok(change)
    }

    async fn list_history(&self, limit: Option<u32>) -> Result<Vec<HistoryEntry>> {
        let state = self.state()?;
        let mut entries: Vec<HistoryEntry> = state
            .changes
            .iter()
            .map(|change| HistoryEntry {
                change: change.clone(),
                unit_code: state
                    .units
                    .iter()
                    .find(|u| u.id == change.unit_id)
                    .map(|u| u.code.clone()),
                manager: person_ref(&state.persons, change.manager_id),
                responsible: person_ref(&state.persons, change.responsible_id),
            })
            .collect();

        // Newest first; insertion order breaks ties
        entries.reverse();
        entries.sort_by(|a, b| b.change.created_at.cmp(&a.change.created_at));
        if let Some(limit) = limit {
            entries.truncate(limit as usize);
        }
        Ok(entries)
    }

    async fn append_import_job(&self, job: &ImportJob) -> Result<()> {
        self.state()?.import_jobs.push(job.clone());
        Ok(())
    }

    async fn list_import_jobs(&self, limit: Option<u32>) -> Result<Vec<ImportJob>> {
        let state = self.state()?;
        let mut jobs: Vec<ImportJob> = state.import_jobs.iter().rev().cloned().collect();
        if let Some(limit) = limit {
            jobs.truncate(limit as usize);
        }
        Ok(jobs)
    }
}
