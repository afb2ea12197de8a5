//! Legacy settings kept as a flat JSON object in a single file.

use std::path::{Path, PathBuf};

use setpoint_core::{legacy::LegacySettings, providers::LegacySettingsStorage};

use crate::{Error, Result};

/// Legacy settings stored at `path`; the file's existence is the presence
/// check and deleting it is the removal.
#[derive(Debug, Clone)]
pub struct JsonFileLegacyStorage {
  path: PathBuf,
}

impl JsonFileLegacyStorage {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }

  /// Write `settings` in the legacy layout.
  pub fn write(&self, settings: &LegacySettings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(&self.path, json)?;
    Ok(())
  }
}

impl LegacySettingsStorage for JsonFileLegacyStorage {
  type Error = Error;

  fn is_present(&self) -> bool { self.path.is_file() }

  fn read(&self) -> Result<LegacySettings> {
    let text = std::fs::read_to_string(&self.path)?;
    Ok(serde_json::from_str(&text)?)
  }

  fn remove(&self) -> Result<()> {
    std::fs::remove_file(&self.path)?;
    Ok(())
  }
}
