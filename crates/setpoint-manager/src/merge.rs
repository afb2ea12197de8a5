//! The merge engine: combines a base snapshot with optional partial updates
//! and freshly sampled live facts into a new candidate snapshot.

use chrono::{DateTime, Utc};
use setpoint_core::{
  device::{ControllerDevice, DeviceStatus},
  permissions::NotificationPermissionSnapshot,
  settings::{ControlSettings, StoredSettings},
  units::GlucoseUnit,
};
use uuid::Uuid;

/// Facts sampled fresh for every merge.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveContext {
  /// Hex-encoded device token, or the simulation sentinel.
  pub device_token:  Option<String>,
  pub now:           DateTime<Utc>,
  pub device_status: DeviceStatus,
  pub display_unit:  Option<GlucoseUnit>,
  pub controller:    Option<ControllerDevice>,
}

/// Build a new snapshot from `base`.
///
/// A missing `control` payload is re-derived from `base` and missing
/// `permissions` are carried forward from it. `base` must be the newest
/// adopted snapshot, which may be ahead of the store while a write is in
/// flight or the gate is closed. The result is always stamped with
/// `context.now` and a fresh sync identifier.
pub fn merge(
  base:        &StoredSettings,
  control:     Option<ControlSettings>,
  permissions: Option<NotificationPermissionSnapshot>,
  context:     &LiveContext,
) -> StoredSettings {
  let control = control.unwrap_or_else(|| base.control_settings());
  let status  = context.device_status.clone();

  StoredSettings {
    date:                          context.now,
    dosing_enabled:                control.dosing_enabled,
    glucose_target_range_schedule: control.glucose_target_range_schedule,
    pre_meal_target_range:         control.pre_meal_target_range,
    workout_target_range:          control.legacy_workout_target_range,
    override_presets:              control.override_presets,
    schedule_override:             control.schedule_override,
    pre_meal_override:             control.pre_meal_override,
    maximum_basal_rate_per_hour:   control.maximum_basal_rate_per_hour,
    maximum_bolus:                 control.maximum_bolus,
    suspend_threshold:             control.suspend_threshold,
    device_token:                  context.device_token.clone(),
    insulin_type:                  status.insulin_type,
    default_rapid_acting_model:    control.default_rapid_acting_model,
    basal_rate_schedule:           control.basal_rate_schedule,
    insulin_sensitivity_schedule:  control.insulin_sensitivity_schedule,
    carb_ratio_schedule:           control.carb_ratio_schedule,
    notification_permissions:      permissions.or(base.notification_permissions),
    controller_device:             context.controller.clone(),
    cgm_device:                    status.cgm_device,
    pump_device:                   status.pump_device,
    blood_glucose_unit:            context.display_unit,
    automatic_dosing_strategy:     control.automatic_dosing_strategy,
    sync_identifier:               Uuid::new_v4(),
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};
  use setpoint_core::{
    device::HardwareDevice,
    permissions::{AuthorizationStatus, NotificationSetting},
    schedule::{DailySchedule, ScheduleItem},
    units::InsulinType,
  };

  use super::*;

  fn context(now: DateTime<Utc>) -> LiveContext {
    LiveContext {
      device_token:  Some("00ff".into()),
      now,
      device_status: DeviceStatus {
        cgm_device:   Some(HardwareDevice {
          name: Some("G7".into()),
          ..HardwareDevice::default()
        }),
        pump_device:  None,
        insulin_type: Some(InsulinType::Humalog),
      },
      display_unit:  Some(GlucoseUnit::MmolL),
      controller:    None,
    }
  }

  fn control() -> ControlSettings {
    ControlSettings {
      dosing_enabled: true,
      basal_rate_schedule: Some(
        DailySchedule::new(0, vec![ScheduleItem::new(0, 1.2)]).unwrap(),
      ),
      ..ControlSettings::default()
    }
  }

  #[test]
  fn merge_applies_payload_and_live_facts() {
    let now  = Utc.timestamp_opt(5_000, 0).unwrap();
    let base = StoredSettings::initial(Utc.timestamp_opt(0, 0).unwrap());

    let merged = merge(&base, Some(control()), None, &context(now));
    assert_eq!(merged.date, now);
    assert!(merged.dosing_enabled);
    assert_eq!(merged.basal_rate_schedule, control().basal_rate_schedule);
    assert_eq!(merged.device_token.as_deref(), Some("00ff"));
    assert_eq!(merged.insulin_type, Some(InsulinType::Humalog));
    assert_eq!(merged.blood_glucose_unit, Some(GlucoseUnit::MmolL));
    assert_eq!(merged.cgm_device.unwrap().name.as_deref(), Some("G7"));
    assert_ne!(merged.sync_identifier, base.sync_identifier);
  }

  #[test]
  fn missing_control_is_projected_from_base() {
    let now  = Utc.timestamp_opt(5_000, 0).unwrap();
    let base = merge(
      &StoredSettings::initial(now),
      Some(control()),
      None,
      &context(now),
    );

    let again = merge(&base, None, None, &context(now + Duration::seconds(1)));
    assert_eq!(again.control_settings(), base.control_settings());
  }

  #[test]
  fn merge_is_idempotent_apart_from_stamps() {
    let t0    = Utc.timestamp_opt(5_000, 0).unwrap();
    let base  = StoredSettings::initial(t0);
    let once  = merge(&base, Some(control()), None, &context(t0));
    let twice = merge(&once, Some(control()), None, &context(t0 + Duration::seconds(30)));

    assert_ne!(once.date, twice.date);
    assert_ne!(once.sync_identifier, twice.sync_identifier);
    assert!(once.has_same_values(&twice));
  }

  #[test]
  fn permissions_carry_forward_from_base() {
    let now = Utc.timestamp_opt(5_000, 0).unwrap();
    let adopted = NotificationPermissionSnapshot {
      authorization_status: AuthorizationStatus::Authorized,
      alert: NotificationSetting::Enabled,
      ..NotificationPermissionSnapshot::default()
    };
    let mut base = StoredSettings::initial(now);
    base.notification_permissions = Some(adopted);

    let merged = merge(&base, Some(control()), None, &context(now));
    assert_eq!(merged.notification_permissions, Some(adopted));
  }

  #[test]
  fn explicit_permissions_win() {
    let now = Utc.timestamp_opt(5_000, 0).unwrap();
    let fresh = NotificationPermissionSnapshot {
      authorization_status: AuthorizationStatus::Denied,
      ..NotificationPermissionSnapshot::default()
    };
    let mut base = StoredSettings::initial(now);
    base.notification_permissions = Some(NotificationPermissionSnapshot::default());

    let merged = merge(&base, None, Some(fresh), &context(now));
    assert_eq!(merged.notification_permissions, Some(fresh));
  }
}
