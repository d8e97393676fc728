//! Persistence layer: sea-orm entities and the [`SafetyStore`] access
//! facade over SQLite.

pub mod entities;
pub mod error;
pub mod store;

pub use error::{Result, StorageError};
pub use store::SafetyStore;

#[cfg(test)]
mod tests;
