//! Change notification for the downstream sync component.
//!
//! The manager only signals that history advanced; the delegate reads the new
//! records itself through
//! [`SettingsStore::query`](setpoint_core::store::SettingsStore::query).

use setpoint_core::store::StoredRecord;
use tokio::sync::mpsc;

/// Receives a signal after every successful durable write.
pub trait SettingsDelegate: Send + Sync {
  fn settings_history_advanced(&self, record: StoredRecord);
}

/// Forwards notifications onto an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelDelegate {
  tx: mpsc::UnboundedSender<StoredRecord>,
}

impl ChannelDelegate {
  pub fn new() -> (Self, mpsc::UnboundedReceiver<StoredRecord>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Self { tx }, rx)
  }
}

impl SettingsDelegate for ChannelDelegate {
  fn settings_history_advanced(&self, record: StoredRecord) {
    if self.tx.send(record).is_err() {
      tracing::debug!("settings delegate receiver dropped");
    }
  }
}
