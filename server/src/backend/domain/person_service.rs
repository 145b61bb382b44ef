//! Managers and promoters that can be attached to units.

use chrono::Utc;
use log::info;
use shared::{CreatePersonRequest, Person, PersonKind};
use uuid::Uuid;

use crate::backend::domain::models::{DomainError, Session, ValidationError};
use crate::backend::storage::SharedRepository;

#[derive(Clone)]
pub struct PersonService {
    repository: SharedRepository,
}

impl PersonService {
    pub fn new(repository: SharedRepository) -> Self {
        Self { repository }
    }

    /// Active persons ordered by name, optionally of one kind
    pub async fn list(&self, kind: Option<PersonKind>) -> Result<Vec<Person>, DomainError> {
        let persons = self
            .repository
            .list_persons(true)
            .await
            .map_err(DomainError::operation_failed)?;

        Ok(persons
            .into_iter()
            .filter(|p| kind.map_or(true, |k| p.kind == k))
            .collect())
    }

    /// Register a new person; administrators only
    pub async fn create(&self, session: &Session, request: CreatePersonRequest) -> Result<Person, DomainError> {
        if !session.is_admin() {
            return Err(ValidationError::PermissionDenied("crear personas".to_string()).into());
        }

        let name = request.name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingField("Nombre").into());
        }

        let now = Utc::now();
        let person = Person {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: request
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            kind: request.kind,
            active: true,
            created_at: now,
            updated_at: now,
        };

        self.repository
            .insert_person(&person)
            .await
            .map_err(DomainError::operation_failed)?;
        info!("Created {} {}", person.kind.as_str(), person.name);
        Ok(person)
    }
}
