//! # Storage Module
//!
//! Handles all data persistence for the housing unit inventory.
//!
//! The domain layer only ever talks to [`traits::InventoryRepository`]; the
//! concrete backend can be swapped without touching domain logic.
//!
//! ## Implementations
//!
//! - **sqlite**: production storage with SQLx, one SQL transaction per
//!   atomic operation (estado change, import upsert)
//! - **memory**: in-process test double with call counters and failure
//!   injection, compiled only for tests

#[cfg(test)]
pub mod memory;
pub mod sqlite;
pub mod traits;

// Re-export the main types that other modules need
#[cfg(test)]
pub use memory::InMemoryRepository;
pub use sqlite::{DbConnection, SqliteRepository};
pub use traits::{InventoryRepository, SharedRepository};
