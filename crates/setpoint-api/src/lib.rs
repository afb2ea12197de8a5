//! JSON HTTP surface for the Setpoint settings manager.
//!
//! Exposes an axum [`Router`] over a running
//! [`SettingsHandle`](setpoint_manager::SettingsHandle) and the
//! [`SettingsStore`] behind it. Auth and TLS are the caller's responsibility.

pub mod error;
pub mod handlers;
pub mod platform;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use serde::Deserialize;
use setpoint_core::{
  device::{ControllerDevice, DeviceStatus},
  store::SettingsStore,
  units::GlucoseUnit,
};
use setpoint_manager::SettingsHandle;
use tower_http::trace::TraceLayer;

use handlers::{app, settings};
use platform::ReportedPermissions;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  #[serde(default = "default_legacy_settings_path")]
  pub legacy_settings_path: PathBuf,
  /// Run without push-token gating.
  #[serde(default)]
  pub simulation_mode:      bool,
  #[serde(default = "default_expire_age_days")]
  pub expire_age_days:      u64,
  #[serde(default)]
  pub controller:           Option<ControllerDevice>,
  #[serde(default)]
  pub devices:              DeviceStatus,
  #[serde(default)]
  pub display_unit:         Option<GlucoseUnit>,
}

fn default_legacy_settings_path() -> PathBuf { PathBuf::from("legacy-settings.json") }

fn default_expire_age_days() -> u64 { 7 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub handle:      SettingsHandle,
  pub store:       Arc<S>,
  pub permissions: Arc<ReportedPermissions>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      handle:      self.handle.clone(),
      store:       self.store.clone(),
      permissions: self.permissions.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: SettingsStore + 'static,
{
  Router::new()
    .route("/settings",              get(settings::latest::<S>))
    .route(
      "/settings/control",
      get(settings::control::<S>).put(settings::apply_control::<S>),
    )
    .route("/settings/history",      get(settings::history::<S>))
    .route("/settings/purge",        post(settings::purge::<S>))
    .route("/app/active",            post(app::became_active::<S>))
    .route("/device-token",          post(app::device_token::<S>))
    .route("/platform/permissions",  put(app::report_permissions::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use setpoint_core::{
    permissions::{AuthorizationStatus, NotificationPermissionSnapshot},
    providers::LegacySettingsStorage,
    store::ExpiryPolicy,
  };
  use setpoint_manager::{
    Collaborators, ManagerConfig, SettingsManager, legacy_file::JsonFileLegacyStorage,
  };
  use setpoint_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;
  use crate::platform::{StaticDeviceStatus, StaticDisplayUnit};

  async fn make_state() -> AppState<SqliteStore> {
    let expiry = ExpiryPolicy::new(Duration::from_secs(3_600));
    let store = Arc::new(SqliteStore::open_in_memory(expiry).await.unwrap());
    let permissions = Arc::new(ReportedPermissions::default());
    let legacy = JsonFileLegacyStorage::new(
      std::env::temp_dir().join(format!("setpoint-api-{}.json", uuid::Uuid::new_v4())),
    );
    assert!(!legacy.is_present());

    let handle = SettingsManager::start(
      store.clone(),
      Collaborators {
        permissions:   permissions.clone(),
        device_status: Arc::new(StaticDeviceStatus::default()),
        display_unit:  Arc::new(StaticDisplayUnit(Some(GlucoseUnit::MmolL))),
      },
      &legacy,
      ManagerConfig { expiry, ..ManagerConfig::default() },
      None,
    )
    .await;

    AppState { handle, store, permissions }
  }

  async fn call(
    state:  &AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = router(state.clone())
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
  }

  fn control_body(rate: f64) -> Value {
    json!({
      "dosing_enabled": true,
      "basal_rate_schedule": {
        "time_zone_offset": 0,
        "items": [{ "start_time": 0, "value": rate }]
      }
    })
  }

  #[tokio::test]
  async fn fresh_server_reports_default_control_settings() {
    let state = make_state().await;
    let (status, body) = call(&state, "GET", "/settings/control", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dosing_enabled"], json!(false));
    assert!(body["basal_rate_schedule"].is_null());
  }

  #[tokio::test]
  async fn control_change_is_held_until_device_token() {
    let state = make_state().await;

    let (status, _) = call(&state, "PUT", "/settings/control", Some(control_body(0.9))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    state.handle.settled().await.unwrap();

    let (_, history) = call(&state, "GET", "/settings/history", None).await;
    assert_eq!(history["settings"].as_array().unwrap().len(), 0);

    let (status, _) =
      call(&state, "POST", "/device-token", Some(json!({ "token": "c0ffee" }))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    state.handle.settled().await.unwrap();

    let (_, history) = call(&state, "GET", "/settings/history", None).await;
    let settings = history["settings"].as_array().unwrap();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0]["device_token"], json!("c0ffee"));
    assert_eq!(settings[0]["blood_glucose_unit"], json!("mmol_l"));
    assert_eq!(history["anchor"], json!(1));

    let (_, latest) = call(&state, "GET", "/settings", None).await;
    assert_eq!(latest["basal_rate_schedule"]["items"][0]["value"], json!(0.9));
  }

  #[tokio::test]
  async fn malformed_schedule_is_rejected() {
    let state = make_state().await;
    let body = json!({
      "dosing_enabled": true,
      "basal_rate_schedule": {
        "time_zone_offset": 0,
        "items": [{ "start_time": 1800, "value": 1.0 }]
      }
    });
    let (status, err) = call(&state, "PUT", "/settings/control", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("midnight"));
  }

  #[tokio::test]
  async fn inverted_target_range_is_rejected() {
    let state = make_state().await;
    let body = json!({
      "dosing_enabled": true,
      "pre_meal_target_range": { "min_value": 120.0, "max_value": 80.0 }
    });
    let (status, err) = call(&state, "PUT", "/settings/control", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].as_str().unwrap().contains("invalid glucose range"));
    assert!(state.handle.current_control_settings().pre_meal_target_range.is_none());
  }

  #[tokio::test]
  async fn invalid_device_token_is_rejected() {
    let state = make_state().await;
    let (status, _) =
      call(&state, "POST", "/device-token", Some(json!({ "token": "not-hex" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn reported_permissions_are_picked_up_on_activation() {
    let state = make_state().await;
    call(&state, "POST", "/device-token", Some(json!({ "token": "01" }))).await;

    let authorized = NotificationPermissionSnapshot {
      authorization_status: AuthorizationStatus::Authorized,
      ..NotificationPermissionSnapshot::default()
    };
    let (status, _) = call(
      &state,
      "PUT",
      "/platform/permissions",
      Some(serde_json::to_value(authorized).unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = call(&state, "POST", "/app/active", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    state.handle.settled().await.unwrap();

    let (_, latest) = call(&state, "GET", "/settings", None).await;
    assert_eq!(
      latest["notification_permissions"]["authorization_status"],
      json!("authorized")
    );
  }

  #[tokio::test]
  async fn purge_reports_count() {
    let state = make_state().await;
    let (status, body) = call(&state, "POST", "/settings/purge", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["purged"], json!(0));
  }

  #[tokio::test]
  async fn stopped_manager_returns_503() {
    let state = make_state().await;
    state.handle.shutdown().unwrap();
    let _ = state.handle.settled().await;

    let (status, _) = call(&state, "POST", "/app/active", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  }
}
