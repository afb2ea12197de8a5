//! Handlers for app lifecycle and platform events.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/app/active` | App came to the foreground |
//! | `POST` | `/device-token` | Body: `{"token":"<hex>"}` |
//! | `PUT`  | `/platform/permissions` | Body: notification permission snapshot |

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use setpoint_core::{
  permissions::NotificationPermissionSnapshot, store::SettingsStore,
};

use crate::{AppState, error::ApiError};

/// `POST /app/active`
pub async fn became_active<S>(
  State(state): State<AppState<S>>,
) -> Result<StatusCode, ApiError>
where
  S: SettingsStore,
{
  state.handle.app_became_active()?;
  Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Deserialize)]
pub struct DeviceTokenBody {
  /// Hex-encoded token bytes as delivered by the push service.
  pub token: String,
}

/// `POST /device-token`
pub async fn device_token<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<DeviceTokenBody>,
) -> Result<StatusCode, ApiError>
where
  S: SettingsStore,
{
  let bytes = hex::decode(body.token.trim())
    .map_err(|e| ApiError::BadRequest(format!("invalid device token: {e}")))?;
  if bytes.is_empty() {
    return Err(ApiError::BadRequest("device token is empty".into()));
  }
  state.handle.device_token_received(bytes)?;
  Ok(StatusCode::ACCEPTED)
}

/// `PUT /platform/permissions`
pub async fn report_permissions<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<NotificationPermissionSnapshot>,
) -> StatusCode
where
  S: SettingsStore,
{
  state.permissions.report(body);
  StatusCode::NO_CONTENT
}
