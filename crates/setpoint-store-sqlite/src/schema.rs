//! SQL schema for the Setpoint SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Settings snapshots are append-only; rows are only ever removed by expiry
-- or an explicit purge, and the most recent row is never removed.
CREATE TABLE IF NOT EXISTS settings (
    modification_counter INTEGER PRIMARY KEY AUTOINCREMENT,
    sync_identifier      TEXT NOT NULL UNIQUE,
    date                 TEXT NOT NULL,   -- RFC 3339 UTC, fixed microsecond width
    settings_json        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS settings_date_idx ON settings(date);

PRAGMA user_version = 1;
";

/// Selects the row considered most recent: newest `date`, ties broken by
/// insertion order.
pub const LATEST_COUNTER: &str = "
SELECT modification_counter FROM settings
ORDER BY date DESC, modification_counter DESC
LIMIT 1
";
