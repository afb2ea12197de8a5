//! Integration tests for `SqliteStore` against an in-memory database.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use setpoint_core::{
  schedule::{DailySchedule, ScheduleItem},
  settings::StoredSettings,
  store::{ExpiryPolicy, QueryAnchor, SettingsStore},
};

use crate::SqliteStore;

/// Long enough that nothing written by these tests expires on its own.
fn keep_everything() -> ExpiryPolicy {
  ExpiryPolicy::new(Duration::from_secs(100 * 365 * 24 * 3600))
}

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory(keep_everything())
    .await
    .expect("in-memory store")
}

fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

fn snapshot(date: DateTime<Utc>, basal: f64) -> StoredSettings {
  let mut s = StoredSettings::initial(date);
  s.basal_rate_schedule =
    Some(DailySchedule::new(0, vec![ScheduleItem::new(0, basal)]).unwrap());
  s
}

// ─── Latest ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_store_has_no_latest() {
  let s = store().await;
  assert!(s.latest().is_none());
  assert_eq!(s.count().await.unwrap(), 0);
}

#[tokio::test]
async fn store_updates_latest() {
  let s = store().await;
  let first = snapshot(Utc::now(), 1.0);
  let record = s.store(first.clone()).await.unwrap();

  assert_eq!(record.sync_identifier, first.sync_identifier);
  assert!(record.modification_counter > 0);
  let latest = s.latest().expect("latest after store");
  assert_eq!(latest.sync_identifier, first.sync_identifier);
  assert!(latest.has_same_values(&first));
}

#[tokio::test]
async fn late_arriving_older_write_does_not_regress_latest() {
  let s = store().await;
  let newer = snapshot(at(2_000_000_000), 2.0);
  let older = snapshot(at(1_999_999_000), 1.0);

  s.store(newer.clone()).await.unwrap();
  s.store(older).await.unwrap();

  assert_eq!(s.latest().unwrap().sync_identifier, newer.sync_identifier);
  assert_eq!(s.count().await.unwrap(), 2);
}

#[tokio::test]
async fn reopening_file_restores_latest() {
  let path = std::env::temp_dir().join(format!("setpoint-{}.db", uuid::Uuid::new_v4()));
  let written = snapshot(Utc::now(), 0.65);
  {
    let s = SqliteStore::open(&path, keep_everything()).await.unwrap();
    s.store(written.clone()).await.unwrap();
  }

  let reopened = SqliteStore::open(&path, keep_everything()).await.unwrap();
  let latest = reopened.latest().expect("latest restored from disk");
  assert_eq!(latest.sync_identifier, written.sync_identifier);
  assert!(latest.has_same_values(&written));

  drop(reopened);
  let _ = std::fs::remove_file(&path);
}

// ─── Expiry and purge ────────────────────────────────────────────────────────

#[tokio::test]
async fn store_expires_records_outside_window_but_keeps_latest() {
  let s = SqliteStore::open_in_memory(ExpiryPolicy::new(Duration::from_secs(3_600)))
    .await
    .unwrap();
  let now = Utc::now();

  // Both are older than an hour; the second is the newest record when it
  // is written, so it survives its own expiry pass.
  s.store(snapshot(now - chrono::Duration::hours(3), 1.0)).await.unwrap();
  s.store(snapshot(now - chrono::Duration::hours(2), 1.1)).await.unwrap();
  assert_eq!(s.count().await.unwrap(), 1);

  s.store(snapshot(now, 1.2)).await.unwrap();
  assert_eq!(s.count().await.unwrap(), 1);
  assert_eq!(
    s.latest().unwrap().basal_rate_schedule.unwrap().items[0].value,
    1.2
  );
}

#[tokio::test]
async fn failed_expiry_still_reports_the_committed_write() {
  let path = std::env::temp_dir().join(format!("setpoint-{}.db", uuid::Uuid::new_v4()));
  let s = SqliteStore::open(&path, ExpiryPolicy::new(Duration::from_secs(3_600)))
    .await
    .unwrap();
  let now = Utc::now();
  s.store(snapshot(now - chrono::Duration::hours(3), 1.0)).await.unwrap();

  // Block every delete from a second connection.
  rusqlite::Connection::open(&path)
    .unwrap()
    .execute_batch(
      "CREATE TRIGGER block_delete BEFORE DELETE ON settings
       BEGIN SELECT RAISE(ABORT, 'delete blocked'); END;",
    )
    .unwrap();

  let fresh = snapshot(now, 1.2);
  let record = s.store(fresh.clone()).await.expect("insert committed");
  assert_eq!(record.sync_identifier, fresh.sync_identifier);
  assert_eq!(s.count().await.unwrap(), 2);
  assert_eq!(s.latest().unwrap().sync_identifier, fresh.sync_identifier);

  drop(s);
  let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn purge_removes_history_before_cutoff() {
  let s = store().await;
  s.store(snapshot(at(1_000), 1.0)).await.unwrap();
  s.store(snapshot(at(2_000), 1.1)).await.unwrap();
  s.store(snapshot(at(3_000), 1.2)).await.unwrap();

  let purged = s.purge_historical_before(at(2_500)).await.unwrap();
  assert_eq!(purged, 2);
  assert_eq!(s.count().await.unwrap(), 1);
}

#[tokio::test]
async fn purge_never_removes_most_recent_record() {
  let s = store().await;
  s.store(snapshot(at(1_000), 1.0)).await.unwrap();
  let newest = snapshot(at(2_000), 1.1);
  s.store(newest.clone()).await.unwrap();

  let purged = s.purge_historical_before(at(10_000)).await.unwrap();
  assert_eq!(purged, 1);

  let remaining = s.settings_between(at(0), at(10_000)).await.unwrap();
  assert_eq!(remaining.len(), 1);
  assert_eq!(remaining[0].sync_identifier, newest.sync_identifier);
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn settings_between_is_half_open_and_ordered() {
  let s = store().await;
  s.store(snapshot(at(3_000), 3.0)).await.unwrap();
  s.store(snapshot(at(1_000), 1.0)).await.unwrap();
  s.store(snapshot(at(2_000), 2.0)).await.unwrap();

  let found = s.settings_between(at(1_000), at(3_000)).await.unwrap();
  let dates: Vec<_> = found.iter().map(|x| x.date).collect();
  assert_eq!(dates, vec![at(1_000), at(2_000)]);
}

#[tokio::test]
async fn anchored_query_resumes_after_last_seen_record() {
  let s = store().await;
  for i in 0..5 {
    s.store(snapshot(at(1_000 + i), i as f64)).await.unwrap();
  }

  let (anchor, first_page) = s.query(QueryAnchor::default(), 3).await.unwrap();
  assert_eq!(first_page.len(), 3);

  let (anchor, second_page) = s.query(anchor, 3).await.unwrap();
  assert_eq!(second_page.len(), 2);
  assert_eq!(second_page[1].date, at(1_004));

  let (same_anchor, empty) = s.query(anchor, 3).await.unwrap();
  assert!(empty.is_empty());
  assert_eq!(same_anchor, anchor);
}
