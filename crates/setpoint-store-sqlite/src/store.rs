//! [`SqliteStore`]: the SQLite implementation of [`SettingsStore`].

use std::{
  path::Path,
  sync::{Arc, RwLock},
};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use setpoint_core::{
  settings::StoredSettings,
  store::{ExpiryPolicy, QueryAnchor, SettingsStore, StoredRecord},
};

use crate::{
  Result,
  encode::{RawSettings, encode_dt, encode_uuid},
  schema::{LATEST_COUNTER, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A settings history backed by a single SQLite file.
///
/// Cloning is cheap: the connection and the latest-record cache are
/// reference-counted and shared between clones.
#[derive(Clone)]
pub struct SqliteStore {
  conn:   tokio_rusqlite::Connection,
  expiry: ExpiryPolicy,
  latest: Arc<RwLock<Option<StoredSettings>>>,
}

impl SqliteStore {
  /// Open (or create) a store at `path`, initialise the schema, and load the
  /// most recent record into memory.
  pub async fn open(path: impl AsRef<Path>, expiry: ExpiryPolicy) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn, expiry).await
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory(expiry: ExpiryPolicy) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn, expiry).await
  }

  async fn init(conn: tokio_rusqlite::Connection, expiry: ExpiryPolicy) -> Result<Self> {
    let store = Self { conn, expiry, latest: Arc::new(RwLock::new(None)) };
    store.init_schema().await?;
    let latest = store.load_latest().await?;
    store.remember(latest);
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn load_latest(&self) -> Result<Option<StoredSettings>> {
    let raw: Option<RawSettings> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM settings
                 ORDER BY date DESC, modification_counter DESC
                 LIMIT 1",
                RawSettings::COLUMNS
              ),
              [],
              RawSettings::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSettings::into_settings).transpose()
  }

  /// Replace the cached latest record unless it would move backwards in time.
  fn remember(&self, candidate: Option<StoredSettings>) {
    let Some(candidate) = candidate else { return };
    let mut guard = match self.latest.write() {
      Ok(g) => g,
      Err(poisoned) => poisoned.into_inner(),
    };
    let newer = guard.as_ref().is_none_or(|current| candidate.date >= current.date);
    if newer {
      *guard = Some(candidate);
    }
  }

  /// Delete records dated before `cutoff`, sparing the most recent one.
  async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
    let cutoff_str = encode_dt(cutoff);

    let deleted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          &format!(
            "DELETE FROM settings
             WHERE date < ?1
               AND modification_counter != ({LATEST_COUNTER})"
          ),
          rusqlite::params![cutoff_str],
        )?;
        Ok(n)
      })
      .await?;

    Ok(deleted)
  }

  /// Total number of records currently held.
  pub async fn count(&self) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM settings", [], |r| r.get(0))?)
      })
      .await?;
    Ok(usize::try_from(n).unwrap_or(0))
  }
}

// ─── SettingsStore impl ──────────────────────────────────────────────────────

impl SettingsStore for SqliteStore {
  type Error = crate::Error;

  fn latest(&self) -> Option<StoredSettings> {
    match self.latest.read() {
      Ok(g) => g.clone(),
      Err(poisoned) => poisoned.into_inner().clone(),
    }
  }

  async fn store(&self, settings: StoredSettings) -> Result<StoredRecord> {
    let sync_str  = encode_uuid(settings.sync_identifier);
    let date_str  = encode_dt(settings.date);
    let json_str  = serde_json::to_string(&settings)?;

    let modification_counter = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO settings (sync_identifier, date, settings_json)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![sync_str, date_str, json_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    let record = StoredRecord {
      modification_counter,
      sync_identifier: settings.sync_identifier,
    };
    self.remember(Some(settings));

    // The row is committed; expiry failing must not turn it into an error.
    match self.delete_before(self.expiry.cutoff(Utc::now())).await {
      Ok(0) => {}
      Ok(expired) => tracing::debug!(expired, "expired historical settings"),
      Err(e) => tracing::warn!(error = %e, "failed to expire historical settings"),
    }

    Ok(record)
  }

  async fn purge_historical_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
    self.delete_before(cutoff).await
  }

  async fn settings_between(
    &self,
    start: DateTime<Utc>,
    end:   DateTime<Utc>,
  ) -> Result<Vec<StoredSettings>> {
    let start_str = encode_dt(start);
    let end_str   = encode_dt(end);

    let raws: Vec<RawSettings> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM settings
           WHERE date >= ?1 AND date < ?2
           ORDER BY date ASC, modification_counter ASC",
          RawSettings::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![start_str, end_str], RawSettings::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSettings::into_settings).collect()
  }

  async fn query(
    &self,
    anchor: QueryAnchor,
    limit:  usize,
  ) -> Result<(QueryAnchor, Vec<StoredSettings>)> {
    let after     = anchor.modification_counter;
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawSettings> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM settings
           WHERE modification_counter > ?1
           ORDER BY modification_counter ASC
           LIMIT ?2",
          RawSettings::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![after, limit_val], RawSettings::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let next = QueryAnchor {
      modification_counter: raws
        .last()
        .map_or(after, |r| r.modification_counter),
    };
    let settings = raws
      .into_iter()
      .map(RawSettings::into_settings)
      .collect::<Result<Vec<_>>>()?;

    Ok((next, settings))
  }
}
