//! The settings manager: the single keeper of the current settings snapshot.
//!
//! Incremental updates arrive from independent sources (dosing-engine
//! preference changes, app activation, device-token delivery, permission
//! query results). Each is marshalled onto one sequential actor task which
//! merges it into a candidate snapshot, drops it if nothing changed, and
//! otherwise advances the in-memory snapshot and, once a device token is
//! known, appends it to the durable store and tells the sync delegate.
//!
//! ```text
//! trigger ─▶ SettingsHandle ─▶ actor ─▶ merge ─▶ gate ─▶ store ─▶ delegate
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod legacy_file;
pub mod merge;
pub mod notify;

mod manager;
mod migrate;

pub use config::{ManagerConfig, SIMULATED_DEVICE_TOKEN};
pub use error::{Error, Result};
pub use manager::{Collaborators, SettingsEvent, SettingsHandle, SettingsManager};
pub use notify::{ChannelDelegate, SettingsDelegate};
