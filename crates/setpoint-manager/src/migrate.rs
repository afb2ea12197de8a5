//! One-shot migration of the flat legacy settings into the snapshot.
//!
//! Runs during [`SettingsManager::start`] before the actor accepts events.
//! The write goes straight to the store (migration is not held back by a
//! missing device token) but still passes the change check, so re-running
//! after a failed deletion writes nothing new.

use setpoint_core::{
  providers::{LegacySettingsStorage, PermissionQuery},
  store::SettingsStore,
};
use tracing::{debug, info, warn};

use crate::{manager::SettingsManager, merge::merge};

impl<S, P> SettingsManager<S, P>
where
  S: SettingsStore + 'static,
  P: PermissionQuery + 'static,
{
  pub(crate) async fn migrate_legacy<L>(&mut self, legacy: &L)
  where
    L: LegacySettingsStorage,
  {
    if !legacy.is_present() {
      return;
    }

    let settings = match legacy.read() {
      Ok(settings) => settings,
      Err(e) => {
        warn!(error = %e, "unable to read legacy settings; leaving them in place");
        return;
      }
    };

    let base      = self.current.borrow().clone();
    let control   = settings.overlay(base.control_settings());
    let candidate = merge(&base, Some(control), None, &self.live_context());

    if candidate.has_same_values(&base) {
      debug!("legacy settings already migrated");
    } else {
      self.current.send_replace(candidate.clone());
      match self.store.store(candidate).await {
        Ok(record) => {
          info!(
            modification_counter = record.modification_counter,
            "migrated legacy settings"
          );
          self.unpersisted = false;
          self.notify(record);
        }
        Err(e) => {
          // Keep the legacy copy so the next launch migrates again.
          warn!(error = %e, "failed to store migrated settings");
          self.unpersisted = true;
          return;
        }
      }
    }

    if let Err(e) = legacy.remove() {
      warn!(error = %e, "failed to remove legacy settings; will re-migrate next launch");
    }
  }
}
