//! Change detection and the persistence gate.

use setpoint_core::settings::StoredSettings;

/// What to do with a candidate snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  /// Same values as the current snapshot and nothing left unpersisted.
  Unchanged,
  /// Adopt in memory, but hold off writing until a device token arrives.
  Defer,
  /// Adopt in memory and append to the store.
  Persist,
}

/// Decide the fate of `candidate` relative to `current`.
///
/// `unpersisted` is set when the current snapshot never reached the store
/// (deferred, or its write failed); an unchanged candidate is then written
/// anyway once the gate is open.
pub fn evaluate(
  current:     &StoredSettings,
  candidate:   &StoredSettings,
  unpersisted: bool,
  gate_open:   bool,
) -> Decision {
  let changed = !candidate.has_same_values(current);
  match (changed || unpersisted, gate_open) {
    (false, _) => Decision::Unchanged,
    (true, false) if changed => Decision::Defer,
    (true, false) => Decision::Unchanged,
    (true, true) => Decision::Persist,
  }
}
