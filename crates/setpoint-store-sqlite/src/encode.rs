//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width
//! so that lexical order matches chronological order. The snapshot itself is
//! stored as compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use setpoint_core::settings::StoredSettings;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `settings` row.
pub struct RawSettings {
  pub modification_counter: i64,
  pub sync_identifier:      String,
  pub date:                 String,
  pub settings_json:        String,
}

impl RawSettings {
  pub const COLUMNS: &'static str =
    "modification_counter, sync_identifier, date, settings_json";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      modification_counter: row.get(0)?,
      sync_identifier:      row.get(1)?,
      date:                 row.get(2)?,
      settings_json:        row.get(3)?,
    })
  }

  /// Decode the snapshot. The indexed columns are authoritative for the
  /// record's stamps.
  pub fn into_settings(self) -> Result<StoredSettings> {
    let mut settings: StoredSettings = serde_json::from_str(&self.settings_json)?;
    settings.sync_identifier = decode_uuid(&self.sync_identifier)?;
    settings.date = decode_dt(&self.date)?;
    Ok(settings)
  }
}
