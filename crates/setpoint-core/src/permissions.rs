//! Point-in-time notification permission state reported by the platform.

use serde::{Deserialize, Serialize};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
  #[default]
  NotDetermined,
  Denied,
  Authorized,
  Provisional,
  Ephemeral,
}

/// State of a single delivery channel (sound, badge, lock screen, ...).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSetting {
  #[default]
  NotSupported,
  Disabled,
  Enabled,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AlertStyle {
  #[default]
  None,
  Banner,
  Alert,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ShowPreviews {
  #[default]
  Always,
  WhenAuthenticated,
  Never,
}

/// Everything the platform reports about how this app may notify the user.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct NotificationPermissionSnapshot {
  pub authorization_status:               AuthorizationStatus,
  pub sound:                              NotificationSetting,
  pub badge:                              NotificationSetting,
  pub alert:                              NotificationSetting,
  pub notification_center:                NotificationSetting,
  pub lock_screen:                        NotificationSetting,
  pub car_play:                           NotificationSetting,
  pub critical_alert:                     NotificationSetting,
  pub announcement:                       NotificationSetting,
  pub alert_style:                        AlertStyle,
  pub show_previews:                      ShowPreviews,
  /// The app offers its own in-app notification settings screen.
  pub provides_app_notification_settings: bool,
}
