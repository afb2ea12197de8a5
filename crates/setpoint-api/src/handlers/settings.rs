//! Handlers for `/settings` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/settings` | Current snapshot |
//! | `GET`  | `/settings/control` | Dosing-engine projection |
//! | `PUT`  | `/settings/control` | Body: control settings; 202 once queued |
//! | `GET`  | `/settings/history` | `?anchor=<counter>&limit=<n>` incremental read |
//! | `POST` | `/settings/purge` | Drops history outside the expiry window |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use setpoint_core::{
  settings::{ControlSettings, StoredSettings},
  store::{QueryAnchor, SettingsStore},
};

use crate::{AppState, error::ApiError};

const DEFAULT_HISTORY_LIMIT: usize = 100;

/// `GET /settings`
pub async fn latest<S>(State(state): State<AppState<S>>) -> Json<StoredSettings>
where
  S: SettingsStore,
{
  Json(state.handle.latest_settings())
}

/// `GET /settings/control`
pub async fn control<S>(State(state): State<AppState<S>>) -> Json<ControlSettings>
where
  S: SettingsStore,
{
  Json(state.handle.current_control_settings())
}

/// `PUT /settings/control`
pub async fn apply_control<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<ControlSettings>,
) -> Result<StatusCode, ApiError>
where
  S: SettingsStore,
{
  validate(&body)?;
  state.handle.apply_control_settings_change(body)?;
  Ok(StatusCode::ACCEPTED)
}

/// Reject schedules that could not have come from a well-formed editor.
fn validate(control: &ControlSettings) -> Result<(), ApiError> {
  if let Some(s) = &control.basal_rate_schedule {
    s.validate()?;
  }
  if let Some(s) = &control.carb_ratio_schedule {
    s.validate()?;
  }
  if let Some(s) = &control.insulin_sensitivity_schedule {
    s.schedule.validate()?;
  }
  if let Some(s) = &control.glucose_target_range_schedule {
    s.schedule.validate()?;
    for item in &s.schedule.items {
      item.value.validate()?;
    }
  }
  for range in [&control.pre_meal_target_range, &control.legacy_workout_target_range]
    .into_iter()
    .flatten()
  {
    range.validate()?;
  }
  Ok(())
}

// ─── History ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  #[serde(default)]
  pub anchor: i64,
  pub limit:  Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryPage {
  pub anchor:   i64,
  pub settings: Vec<StoredSettings>,
}

/// `GET /settings/history[?anchor=<counter>][&limit=<n>]`
pub async fn history<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryPage>, ApiError>
where
  S: SettingsStore,
{
  let anchor = QueryAnchor { modification_counter: params.anchor };
  let (next, settings) = state
    .store
    .query(anchor, params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(HistoryPage { anchor: next.modification_counter, settings }))
}

/// `POST /settings/purge`
pub async fn purge<S>(State(state): State<AppState<S>>) -> Result<Json<Value>, ApiError>
where
  S: SettingsStore,
{
  let purged = state.handle.purge_historical_settings().await?;
  Ok(Json(json!({ "purged": purged })))
}
