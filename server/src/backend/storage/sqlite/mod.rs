//! SQLite storage backed by SQLx.

pub mod connection;
pub mod repository;

pub use connection::DbConnection;
pub use repository::SqliteRepository;
