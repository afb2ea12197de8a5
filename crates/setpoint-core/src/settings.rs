//! The settings snapshot and its dosing-engine projection.
//!
//! [`StoredSettings`] is the complete, timestamped, immutable record of every
//! setting in effect at a point in time. [`ControlSettings`] is the subset
//! owned by the dosing engine; the mapping between the two is total and
//! lossless for every field the dosing engine owns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  device::{ControllerDevice, HardwareDevice},
  overrides::{TemporaryScheduleOverride, TemporaryScheduleOverridePreset},
  permissions::NotificationPermissionSnapshot,
  schedule::{
    BasalRateSchedule, CarbRatioSchedule, GlucoseRangeSchedule,
    InsulinSensitivitySchedule,
  },
  units::{
    AutomaticDosingStrategy, DoubleRange, GlucoseThreshold, GlucoseUnit,
    InsulinModelPreset, InsulinType,
  },
};

// ─── Control settings ────────────────────────────────────────────────────────

/// The settings the dosing engine owns and publishes whenever its
/// preferences change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlSettings {
  pub dosing_enabled:               bool,
  pub glucose_target_range_schedule: Option<GlucoseRangeSchedule>,
  pub pre_meal_target_range:        Option<DoubleRange>,
  pub legacy_workout_target_range:  Option<DoubleRange>,
  #[serde(default)]
  pub override_presets:             Vec<TemporaryScheduleOverridePreset>,
  pub schedule_override:            Option<TemporaryScheduleOverride>,
  pub pre_meal_override:            Option<TemporaryScheduleOverride>,
  pub maximum_basal_rate_per_hour:  Option<f64>,
  pub maximum_bolus:                Option<f64>,
  pub suspend_threshold:            Option<GlucoseThreshold>,
  #[serde(default)]
  pub automatic_dosing_strategy:    AutomaticDosingStrategy,
  pub default_rapid_acting_model:   Option<InsulinModelPreset>,
  pub basal_rate_schedule:          Option<BasalRateSchedule>,
  pub insulin_sensitivity_schedule: Option<InsulinSensitivitySchedule>,
  pub carb_ratio_schedule:          Option<CarbRatioSchedule>,
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// A complete point-in-time settings record.
///
/// Derived `PartialEq` is full structural equality. Change detection uses
/// [`StoredSettings::has_same_values`] instead, which ignores the per-record
/// `date` and `sync_identifier` stamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSettings {
  pub date:                         DateTime<Utc>,
  pub dosing_enabled:               bool,
  pub glucose_target_range_schedule: Option<GlucoseRangeSchedule>,
  pub pre_meal_target_range:        Option<DoubleRange>,
  pub workout_target_range:         Option<DoubleRange>,
  #[serde(default)]
  pub override_presets:             Vec<TemporaryScheduleOverridePreset>,
  pub schedule_override:            Option<TemporaryScheduleOverride>,
  pub pre_meal_override:            Option<TemporaryScheduleOverride>,
  pub maximum_basal_rate_per_hour:  Option<f64>,
  pub maximum_bolus:                Option<f64>,
  pub suspend_threshold:            Option<GlucoseThreshold>,
  /// Hex-encoded push token identifying this installation.
  pub device_token:                 Option<String>,
  pub insulin_type:                 Option<InsulinType>,
  pub default_rapid_acting_model:   Option<InsulinModelPreset>,
  pub basal_rate_schedule:          Option<BasalRateSchedule>,
  pub insulin_sensitivity_schedule: Option<InsulinSensitivitySchedule>,
  pub carb_ratio_schedule:          Option<CarbRatioSchedule>,
  pub notification_permissions:     Option<NotificationPermissionSnapshot>,
  pub controller_device:            Option<ControllerDevice>,
  pub cgm_device:                   Option<HardwareDevice>,
  pub pump_device:                  Option<HardwareDevice>,
  pub blood_glucose_unit:           Option<GlucoseUnit>,
  #[serde(default)]
  pub automatic_dosing_strategy:    AutomaticDosingStrategy,
  pub sync_identifier:              Uuid,
}

impl StoredSettings {
  /// The snapshot used on a fresh install: dosing disabled, every schedule
  /// and limit absent.
  pub fn initial(date: DateTime<Utc>) -> Self {
    Self {
      date,
      dosing_enabled: false,
      glucose_target_range_schedule: None,
      pre_meal_target_range: None,
      workout_target_range: None,
      override_presets: Vec::new(),
      schedule_override: None,
      pre_meal_override: None,
      maximum_basal_rate_per_hour: None,
      maximum_bolus: None,
      suspend_threshold: None,
      device_token: None,
      insulin_type: None,
      default_rapid_acting_model: None,
      basal_rate_schedule: None,
      insulin_sensitivity_schedule: None,
      carb_ratio_schedule: None,
      notification_permissions: None,
      controller_device: None,
      cgm_device: None,
      pump_device: None,
      blood_glucose_unit: None,
      automatic_dosing_strategy: AutomaticDosingStrategy::default(),
      sync_identifier: Uuid::new_v4(),
    }
  }

  /// Project the dosing-engine-owned fields.
  pub fn control_settings(&self) -> ControlSettings {
    ControlSettings {
      dosing_enabled:               self.dosing_enabled,
      glucose_target_range_schedule: self.glucose_target_range_schedule.clone(),
      pre_meal_target_range:        self.pre_meal_target_range,
      legacy_workout_target_range:  self.workout_target_range,
      override_presets:             self.override_presets.clone(),
      schedule_override:            self.schedule_override.clone(),
      pre_meal_override:            self.pre_meal_override.clone(),
      maximum_basal_rate_per_hour:  self.maximum_basal_rate_per_hour,
      maximum_bolus:                self.maximum_bolus,
      suspend_threshold:            self.suspend_threshold,
      automatic_dosing_strategy:    self.automatic_dosing_strategy,
      default_rapid_acting_model:   self.default_rapid_acting_model,
      basal_rate_schedule:          self.basal_rate_schedule.clone(),
      insulin_sensitivity_schedule: self.insulin_sensitivity_schedule.clone(),
      carb_ratio_schedule:          self.carb_ratio_schedule.clone(),
    }
  }

  /// Value equality over every field except `date` and `sync_identifier`.
  ///
  /// Every merge stamps a fresh date and identifier, so comparing those would
  /// make every candidate look new.
  pub fn has_same_values(&self, other: &StoredSettings) -> bool {
    let StoredSettings {
      date: _,
      dosing_enabled,
      glucose_target_range_schedule,
      pre_meal_target_range,
      workout_target_range,
      override_presets,
      schedule_override,
      pre_meal_override,
      maximum_basal_rate_per_hour,
      maximum_bolus,
      suspend_threshold,
      device_token,
      insulin_type,
      default_rapid_acting_model,
      basal_rate_schedule,
      insulin_sensitivity_schedule,
      carb_ratio_schedule,
      notification_permissions,
      controller_device,
      cgm_device,
      pump_device,
      blood_glucose_unit,
      automatic_dosing_strategy,
      sync_identifier: _,
    } = self;

    *dosing_enabled == other.dosing_enabled
      && *glucose_target_range_schedule == other.glucose_target_range_schedule
      && *pre_meal_target_range == other.pre_meal_target_range
      && *workout_target_range == other.workout_target_range
      && *override_presets == other.override_presets
      && *schedule_override == other.schedule_override
      && *pre_meal_override == other.pre_meal_override
      && *maximum_basal_rate_per_hour == other.maximum_basal_rate_per_hour
      && *maximum_bolus == other.maximum_bolus
      && *suspend_threshold == other.suspend_threshold
      && *device_token == other.device_token
      && *insulin_type == other.insulin_type
      && *default_rapid_acting_model == other.default_rapid_acting_model
      && *basal_rate_schedule == other.basal_rate_schedule
      && *insulin_sensitivity_schedule == other.insulin_sensitivity_schedule
      && *carb_ratio_schedule == other.carb_ratio_schedule
      && *notification_permissions == other.notification_permissions
      && *controller_device == other.controller_device
      && *cgm_device == other.cgm_device
      && *pump_device == other.pump_device
      && *blood_glucose_unit == other.blood_glucose_unit
      && *automatic_dosing_strategy == other.automatic_dosing_strategy
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::schedule::{DailySchedule, ScheduleItem};

  fn with_basal(date_secs: i64) -> StoredSettings {
    let mut s = StoredSettings::initial(Utc.timestamp_opt(date_secs, 0).unwrap());
    s.basal_rate_schedule =
      Some(DailySchedule::new(0, vec![ScheduleItem::new(0, 1.0)]).unwrap());
    s
  }

  #[test]
  fn initial_snapshot_is_empty_and_disabled() {
    let s = StoredSettings::initial(Utc::now());
    assert!(!s.dosing_enabled);
    assert!(s.basal_rate_schedule.is_none());
    assert!(s.insulin_sensitivity_schedule.is_none());
    assert!(s.carb_ratio_schedule.is_none());
    assert!(s.glucose_target_range_schedule.is_none());
    assert!(s.override_presets.is_empty());
  }

  #[test]
  fn stamps_are_ignored_by_value_comparison() {
    let a = with_basal(100);
    let b = with_basal(200);
    assert_ne!(a, b);
    assert!(a.has_same_values(&b));
  }

  #[test]
  fn nested_schedule_change_is_detected() {
    let a = with_basal(100);
    let mut b = a.clone();
    b.basal_rate_schedule =
      Some(DailySchedule::new(0, vec![ScheduleItem::new(0, 1.05)]).unwrap());
    assert!(!a.has_same_values(&b));
  }

  #[test]
  fn projection_carries_every_control_field() {
    let mut s = with_basal(0);
    s.dosing_enabled = true;
    s.maximum_bolus = Some(10.0);
    s.workout_target_range = Some(DoubleRange::new(140.0, 160.0).unwrap());
    s.default_rapid_acting_model = Some(InsulinModelPreset::Fiasp);

    let control = s.control_settings();
    assert!(control.dosing_enabled);
    assert_eq!(control.maximum_bolus, Some(10.0));
    assert_eq!(control.legacy_workout_target_range, s.workout_target_range);
    assert_eq!(control.basal_rate_schedule, s.basal_rate_schedule);
    assert_eq!(control.default_rapid_acting_model, Some(InsulinModelPreset::Fiasp));
  }

  #[test]
  fn initial_projection_matches_default_control_settings() {
    let s = StoredSettings::initial(Utc::now());
    assert_eq!(s.control_settings(), ControlSettings::default());
  }
}
