//! # REST API Interface Layer
//!
//! HTTP endpoints of the housing unit inventory. This layer handles:
//! - JSON request/response serialization
//! - Query string parsing into domain filters
//! - Session extraction from the identity headers set by the gateway
//! - Translation of domain errors into status codes
//!
//! ## Error Responses
//!
//! Every failure is returned as `{ "error": "<message>" }`. Validation errors
//! are 400 (403 for permissions, 404 for unknown units), a missing session is
//! 401 and a failure of the storage backend is 502 with its message.

pub mod dashboard_apis;
pub mod error;
pub mod export_apis;
pub mod history_apis;
pub mod housing_unit_apis;
pub mod import_apis;
pub mod mappers;
pub mod notification_apis;
pub mod person_apis;
pub mod session;
pub mod state_change_apis;
