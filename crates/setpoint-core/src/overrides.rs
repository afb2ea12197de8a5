//! Temporary schedule overrides and the presets they may be enacted from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::units::DoubleRange;

/// What an override changes while it is active.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverrideSettings {
  /// Replaces the scheduled correction range.
  pub target_range:               Option<DoubleRange>,
  /// Multiplier applied to basal rates and inverse-applied to sensitivity
  /// and carb ratio.
  pub insulin_needs_scale_factor: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "seconds", rename_all = "snake_case")]
pub enum OverrideDuration {
  Finite(u32),
  Indefinite,
}

/// A named, reusable override configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporaryScheduleOverridePreset {
  pub id:       Uuid,
  pub symbol:   String,
  pub name:     String,
  pub settings: OverrideSettings,
  pub duration: OverrideDuration,
}

/// Why an override is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverrideContext {
  PreMeal,
  LegacyWorkout,
  Preset { preset: TemporaryScheduleOverridePreset },
  Custom,
}

/// Who started an override.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverrideEnactor {
  #[default]
  Local,
  Remote { address: String },
}

/// An override that is (or was) in effect from `start_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporaryScheduleOverride {
  pub context:         OverrideContext,
  pub settings:        OverrideSettings,
  pub start_date:      DateTime<Utc>,
  pub duration:        OverrideDuration,
  pub enacted_by:      OverrideEnactor,
  pub sync_identifier: Uuid,
}
