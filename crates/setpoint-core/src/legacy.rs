//! The flat, pre-snapshot settings representation.
//!
//! Older installations kept each dosing setting under its own key. The
//! settings manager folds these into the snapshot once and then deletes
//! them.

use serde::{Deserialize, Serialize};

use crate::{
  schedule::{
    BasalRateSchedule, CarbRatioSchedule, GlucoseRangeSchedule,
    InsulinSensitivitySchedule,
  },
  settings::ControlSettings,
  units::{DoubleRange, GlucoseThreshold, InsulinModelPreset},
};

/// Legacy per-key settings. Absent keys leave the current value untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySettings {
  pub dosing_enabled:               Option<bool>,
  pub glucose_target_range_schedule: Option<GlucoseRangeSchedule>,
  pub pre_meal_target_range:        Option<DoubleRange>,
  pub legacy_workout_target_range:  Option<DoubleRange>,
  pub basal_rate_schedule:          Option<BasalRateSchedule>,
  pub insulin_sensitivity_schedule: Option<InsulinSensitivitySchedule>,
  pub carb_ratio_schedule:          Option<CarbRatioSchedule>,
  pub default_rapid_acting_model:   Option<InsulinModelPreset>,
  pub maximum_basal_rate_per_hour:  Option<f64>,
  pub maximum_bolus:                Option<f64>,
  pub suspend_threshold:            Option<GlucoseThreshold>,
}

impl LegacySettings {
  /// Overlay the legacy values onto `base`, producing the control settings
  /// payload to migrate.
  pub fn overlay(&self, base: ControlSettings) -> ControlSettings {
    let legacy = self.clone();
    ControlSettings {
      dosing_enabled: legacy.dosing_enabled.unwrap_or(base.dosing_enabled),
      glucose_target_range_schedule: legacy
        .glucose_target_range_schedule
        .or(base.glucose_target_range_schedule),
      pre_meal_target_range: legacy
        .pre_meal_target_range
        .or(base.pre_meal_target_range),
      legacy_workout_target_range: legacy
        .legacy_workout_target_range
        .or(base.legacy_workout_target_range),
      basal_rate_schedule: legacy.basal_rate_schedule.or(base.basal_rate_schedule),
      insulin_sensitivity_schedule: legacy
        .insulin_sensitivity_schedule
        .or(base.insulin_sensitivity_schedule),
      carb_ratio_schedule: legacy.carb_ratio_schedule.or(base.carb_ratio_schedule),
      default_rapid_acting_model: legacy
        .default_rapid_acting_model
        .or(base.default_rapid_acting_model),
      maximum_basal_rate_per_hour: legacy
        .maximum_basal_rate_per_hour
        .or(base.maximum_basal_rate_per_hour),
      maximum_bolus: legacy.maximum_bolus.or(base.maximum_bolus),
      suspend_threshold: legacy.suspend_threshold.or(base.suspend_threshold),
      ..base
    }
  }
}
