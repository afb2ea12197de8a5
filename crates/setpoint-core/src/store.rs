//! The `SettingsStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g.
//! `setpoint-store-sqlite`). The settings manager depends on this
//! abstraction, not on any concrete backend.

use std::{future::Future, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::settings::StoredSettings;

// ─── Expiry ──────────────────────────────────────────────────────────────────

/// How long historical settings records are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
  pub expire_age: Duration,
}

impl ExpiryPolicy {
  pub const DEFAULT_EXPIRE_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

  pub fn new(expire_age: Duration) -> Self { Self { expire_age } }

  /// Records dated strictly before the returned instant are expired.
  pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
    let age = chrono::Duration::from_std(self.expire_age)
      .unwrap_or(chrono::Duration::MAX);
    now.checked_sub_signed(age).unwrap_or(DateTime::<Utc>::MIN_UTC)
  }
}

impl Default for ExpiryPolicy {
  fn default() -> Self { Self::new(Self::DEFAULT_EXPIRE_AGE) }
}

// ─── Records and anchors ─────────────────────────────────────────────────────

/// Acknowledgement of a persisted snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
  /// Monotonically increasing per store; never reused.
  pub modification_counter: i64,
  pub sync_identifier:      Uuid,
}

/// Position in the settings history from which an incremental read resumes.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct QueryAnchor {
  /// The highest modification counter already seen; `0` reads from the
  /// beginning.
  pub modification_counter: i64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Durable, append-only settings history.
///
/// All async methods return `Send` futures so the trait can be used from
/// spawned tasks in a multi-threaded runtime.
pub trait SettingsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The most recently stored snapshot, if any. Served from memory.
  fn latest(&self) -> Option<StoredSettings>;

  /// Append `settings` to the history and expire records older than the
  /// store's expiry window. The most recent record is never expired.
  fn store(
    &self,
    settings: StoredSettings,
  ) -> impl Future<Output = Result<StoredRecord, Self::Error>> + Send + '_;

  /// Delete every record dated before `cutoff` except the most recent one.
  /// Returns the number of records removed.
  fn purge_historical_before(
    &self,
    cutoff: DateTime<Utc>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Records with `start <= date < end`, oldest first.
  fn settings_between(
    &self,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<StoredSettings>, Self::Error>> + Send + '_;

  /// Up to `limit` records stored after `anchor`, in storage order, together
  /// with the anchor to resume from next time.
  fn query(
    &self,
    anchor: QueryAnchor,
    limit: usize,
  ) -> impl Future<Output = Result<(QueryAnchor, Vec<StoredSettings>), Self::Error>>
  + Send
  + '_;
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn cutoff_subtracts_expire_age() {
    let now = Utc.timestamp_opt(1_000_000, 0).unwrap();
    let policy = ExpiryPolicy::new(Duration::from_secs(3_600));
    assert_eq!(policy.cutoff(now), Utc.timestamp_opt(996_400, 0).unwrap());
  }

  #[test]
  fn default_keeps_a_week() {
    assert_eq!(
      ExpiryPolicy::default().expire_age,
      Duration::from_secs(604_800)
    );
  }
}
