//! Conversions between query strings and domain inputs.

pub mod filter_mapper;

pub use filter_mapper::{FilterMapper, HistoryQuery, UnitQuery};
