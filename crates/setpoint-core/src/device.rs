//! Descriptors for the controller (the phone running the app) and the
//! attached CGM and pump hardware.

use serde::{Deserialize, Serialize};

use crate::units::InsulinType;

/// The device running the controller software.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControllerDevice {
  pub name:             String,
  pub system_name:      String,
  pub system_version:   String,
  pub model:            String,
  pub model_identifier: String,
}

/// A CGM or pump as described by its manager.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HardwareDevice {
  pub name:                  Option<String>,
  pub manufacturer:          Option<String>,
  pub model:                 Option<String>,
  pub hardware_version:      Option<String>,
  pub firmware_version:      Option<String>,
  pub software_version:      Option<String>,
  pub local_identifier:      Option<String>,
  pub udi_device_identifier: Option<String>,
}

/// Live hardware facts sampled on every merge.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceStatus {
  pub cgm_device:   Option<HardwareDevice>,
  pub pump_device:  Option<HardwareDevice>,
  pub insulin_type: Option<InsulinType>,
}
