//! SQLite backend for the Setpoint settings history.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The most recent snapshot is also held
//! in memory so [`SettingsStore::latest`](setpoint_core::store::SettingsStore::latest)
//! never touches the database.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
