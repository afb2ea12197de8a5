//! Narrow interfaces to the platform services the settings manager samples.

use std::future::Future;

use crate::{
  device::DeviceStatus, legacy::LegacySettings,
  permissions::NotificationPermissionSnapshot, units::GlucoseUnit,
};

/// Synchronous, read-only view of the attached pump and CGM.
pub trait DeviceStatusProvider: Send + Sync {
  fn device_status(&self) -> DeviceStatus;
}

/// The user's preferred glucose display unit, if one has been chosen.
pub trait DisplayUnitProvider: Send + Sync {
  fn display_glucose_unit(&self) -> Option<GlucoseUnit>;
}

/// Asynchronous query of the platform's notification permissions.
///
/// The returned future may complete on any thread. Retry and timeout policy
/// belong to the implementation.
pub trait PermissionQuery: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn current(
    &self,
  ) -> impl Future<Output = Result<NotificationPermissionSnapshot, Self::Error>> + Send + '_;
}

/// The pre-snapshot flat configuration.
pub trait LegacySettingsStorage: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Whether any legacy settings remain.
  fn is_present(&self) -> bool;

  fn read(&self) -> Result<LegacySettings, Self::Error>;

  /// Irreversibly delete the legacy settings.
  fn remove(&self) -> Result<(), Self::Error>;
}
