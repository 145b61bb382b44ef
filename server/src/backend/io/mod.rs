//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain.
//!
//! Handlers translate requests into domain calls and domain results into JSON
//! responses; they hold no business rules of their own. Domain errors are
//! mapped to status codes in one place ([`rest::error`]) and always come back
//! as `{ "error": "<message>" }`.

pub mod rest;

pub use rest::*;
