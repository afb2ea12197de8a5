//! Server-side stand-ins for the platform services.
//!
//! Device facts and the display unit come from configuration. Notification
//! permissions are reported by the client through `PUT /platform/permissions`
//! and returned by the next permission query.

use std::{convert::Infallible, sync::RwLock};

use setpoint_core::{
  device::DeviceStatus,
  permissions::NotificationPermissionSnapshot,
  providers::{DeviceStatusProvider, DisplayUnitProvider, PermissionQuery},
  units::GlucoseUnit,
};

/// Device facts fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticDeviceStatus(pub DeviceStatus);

impl DeviceStatusProvider for StaticDeviceStatus {
  fn device_status(&self) -> DeviceStatus { self.0.clone() }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDisplayUnit(pub Option<GlucoseUnit>);

impl DisplayUnitProvider for StaticDisplayUnit {
  fn display_glucose_unit(&self) -> Option<GlucoseUnit> { self.0 }
}

/// The most recent permission snapshot reported by the client.
#[derive(Debug, Default)]
pub struct ReportedPermissions {
  current: RwLock<NotificationPermissionSnapshot>,
}

impl ReportedPermissions {
  pub fn report(&self, snapshot: NotificationPermissionSnapshot) {
    let mut guard = match self.current.write() {
      Ok(g) => g,
      Err(poisoned) => poisoned.into_inner(),
    };
    *guard = snapshot;
  }
}

impl PermissionQuery for ReportedPermissions {
  type Error = Infallible;

  async fn current(&self) -> Result<NotificationPermissionSnapshot, Infallible> {
    let snapshot = match self.current.read() {
      Ok(g) => *g,
      Err(poisoned) => *poisoned.into_inner(),
    };
    Ok(snapshot)
  }
}
