//! # Domain Module
//!
//! Contains all business logic of the housing unit inventory.
//!
//! The domain operates on the `shared` DTOs and talks to storage only through
//! the [`InventoryRepository`](crate::backend::storage::InventoryRepository)
//! trait, so every service can be exercised against the in-memory repository.
//!
//! ## Module Organization
//!
//! - **transitions**: which estados can follow a given one
//! - **row_validator** / **spreadsheet**: reading and checking import files
//! - **state_change_service**: the guarded, atomic estado change
//! - **notification_service**: best-effort announcement of committed changes
//! - **filters**: in-memory predicates over units and history entries
//! - **import_service** / **export_service**: spreadsheet ingestion and Excel output
//! - **housing_unit_service**, **history_service**, **dashboard_service**,
//!   **person_service**: read models behind the REST endpoints
//! - **formatting**: es-ES display strings and estado colors
//!
//! ## Business Rules
//!
//! - A unit is always LIBRE, BLOQUEADA or RESERVADA
//! - Every change between two different estados leaves exactly one history record
//! - Blocking or reserving a unit needs a reason
//! - Only administrators and managers import; only administrators add persons
//! - A failing notification never undoes or fails an estado change

pub mod commands;
pub mod dashboard_service;
pub mod export_service;
pub mod filters;
pub mod formatting;
pub mod history_service;
pub mod housing_unit_service;
pub mod import_service;
pub mod models;
pub mod notification_service;
pub mod person_service;
pub mod row_validator;
pub mod spreadsheet;
pub mod state_change_service;
pub mod transitions;

pub use dashboard_service::DashboardService;
pub use export_service::ExportService;
pub use history_service::HistoryService;
pub use housing_unit_service::HousingUnitService;
pub use import_service::ImportService;
pub use notification_service::{NotificationDispatcher, NotificationLog};
pub use person_service::PersonService;
pub use state_change_service::StateChangeService;
