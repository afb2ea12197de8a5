//! Error type for `setpoint-manager`.

use thiserror::Error;

/// A type-erased error from a collaborator (store, permission query).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("legacy settings file error: {0}")]
  Io(#[from] std::io::Error),

  #[error("legacy settings json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The manager task has exited; no further events are accepted.
  #[error("settings manager has stopped")]
  Stopped,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
