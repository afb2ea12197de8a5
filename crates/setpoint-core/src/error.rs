//! Error types for `setpoint-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("schedule has no items")]
  EmptySchedule,

  #[error("first schedule item must start at midnight, found {0}s")]
  ScheduleStartNotMidnight(u32),

  #[error("schedule item starting at {0}s is not after its predecessor")]
  ScheduleOutOfOrder(u32),

  #[error("schedule item starting at {0}s is beyond the end of the day")]
  ScheduleBeyondDay(u32),

  #[error("invalid glucose range: min {min} is greater than max {max}")]
  InvalidRange { min: f64, max: f64 },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
