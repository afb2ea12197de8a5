//! Repeating daily schedules (basal rates, sensitivities, carb ratios,
//! correction ranges).
//!
//! A schedule is a list of items, each taking effect at a number of seconds
//! after local midnight and lasting until the next item starts. The last
//! item wraps around to the following midnight.

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  units::{DoubleRange, GlucoseUnit},
};

/// Seconds in one day; schedule start times must be strictly below this.
pub const SECONDS_PER_DAY: u32 = 86_400;

// ─── Generic schedule ────────────────────────────────────────────────────────

/// One segment of a [`DailySchedule`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem<T> {
  /// Seconds after local midnight at which this value takes effect.
  pub start_time: u32,
  pub value:      T,
}

impl<T> ScheduleItem<T> {
  pub fn new(start_time: u32, value: T) -> Self { Self { start_time, value } }
}

/// A schedule that repeats every day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySchedule<T> {
  /// Offset of the schedule's local time zone, in seconds east of UTC.
  pub time_zone_offset: i32,
  pub items:            Vec<ScheduleItem<T>>,
}

impl<T> DailySchedule<T> {
  /// Build a schedule, checking that items start at midnight, are strictly
  /// ascending, and all fall within one day.
  pub fn new(time_zone_offset: i32, items: Vec<ScheduleItem<T>>) -> Result<Self> {
    let schedule = Self { time_zone_offset, items };
    schedule.validate()?;
    Ok(schedule)
  }

  pub fn validate(&self) -> Result<()> {
    let first = self.items.first().ok_or(Error::EmptySchedule)?;
    if first.start_time != 0 {
      return Err(Error::ScheduleStartNotMidnight(first.start_time));
    }
    for pair in self.items.windows(2) {
      if pair[1].start_time <= pair[0].start_time {
        return Err(Error::ScheduleOutOfOrder(pair[1].start_time));
      }
    }
    if let Some(last) = self.items.last()
      && last.start_time >= SECONDS_PER_DAY
    {
      return Err(Error::ScheduleBeyondDay(last.start_time));
    }
    Ok(())
  }

  /// The value in effect `seconds_since_midnight` into the local day.
  /// Values past the end of a day wrap.
  pub fn value_at(&self, seconds_since_midnight: u32) -> Option<&T> {
    let t = seconds_since_midnight % SECONDS_PER_DAY;
    self
      .items
      .iter()
      .rev()
      .find(|item| item.start_time <= t)
      .map(|item| &item.value)
  }
}

// ─── Concrete schedules ──────────────────────────────────────────────────────

/// Scheduled basal delivery in units per hour.
pub type BasalRateSchedule = DailySchedule<f64>;

/// Grams of carbohydrate covered by one unit of insulin.
pub type CarbRatioSchedule = DailySchedule<f64>;

/// Expected glucose drop per unit of insulin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsulinSensitivitySchedule {
  pub unit:     GlucoseUnit,
  pub schedule: DailySchedule<f64>,
}

/// Correction target ranges over the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseRangeSchedule {
  pub unit:     GlucoseUnit,
  pub schedule: DailySchedule<DoubleRange>,
}
