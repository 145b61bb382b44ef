//! Housing unit inventory service: REST API over the unit lifecycle,
//! spreadsheet import, exports and change history.

pub mod backend;
pub mod config;
