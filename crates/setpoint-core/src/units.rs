//! Units and small value types shared by schedules, limits, and overrides.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Glucose ─────────────────────────────────────────────────────────────────

/// The unit a glucose quantity is expressed in.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseUnit {
  /// Milligrams per decilitre.
  #[default]
  MgDl,
  /// Millimoles per litre.
  MmolL,
}

/// A closed interval of glucose values, e.g. a correction target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoubleRange {
  pub min_value: f64,
  pub max_value: f64,
}

impl DoubleRange {
  pub fn new(min_value: f64, max_value: f64) -> Result<Self> {
    let range = Self { min_value, max_value };
    range.validate()?;
    Ok(range)
  }

  /// Ranges arriving through serde bypass [`DoubleRange::new`].
  pub fn validate(&self) -> Result<()> {
    if self.min_value > self.max_value {
      return Err(Error::InvalidRange { min: self.min_value, max: self.max_value });
    }
    Ok(())
  }
}

/// A single glucose value with its unit (e.g. the suspend threshold).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucoseThreshold {
  pub unit:  GlucoseUnit,
  pub value: f64,
}

// ─── Insulin ─────────────────────────────────────────────────────────────────

/// The insulin formulation currently loaded in the pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsulinType {
  Novolog,
  Humalog,
  Apidra,
  Fiasp,
  Lyumjev,
  Afrezza,
}

/// Insulin activity curve used for rapid-acting insulin when the pump does
/// not report an insulin type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsulinModelPreset {
  RapidActingAdult,
  RapidActingChild,
  Fiasp,
  Lyumjev,
  Afrezza,
}

/// How the dosing engine delivers automatic corrections.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AutomaticDosingStrategy {
  #[default]
  TempBasalOnly,
  AutomaticBolus,
}
