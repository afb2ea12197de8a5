//! Construction-time configuration for the settings manager.

use setpoint_core::{device::ControllerDevice, store::ExpiryPolicy};

/// Token substituted for the device identity when running in simulation.
pub const SIMULATED_DEVICE_TOKEN: &str = "mockIdentifier";

#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
  /// Running without real push-token delivery. Every merge uses
  /// [`SIMULATED_DEVICE_TOKEN`] and persistence is never deferred.
  pub simulation_mode: bool,
  /// Descriptor of the device this process runs on.
  pub controller:      Option<ControllerDevice>,
  /// Window applied by `purge_historical_settings`.
  pub expiry:          ExpiryPolicy,
}
