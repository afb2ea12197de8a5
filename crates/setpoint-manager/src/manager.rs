//! [`SettingsManager`], the actor that owns the current snapshot, and the
//! [`SettingsHandle`] the rest of the application talks to.
//!
//! Every state transition (merge → compare → adopt → persist → notify) runs
//! on the actor task, one at a time. Store writes and permission queries run
//! as child tasks; their completions are fed back into the same loop, so
//! nothing outside the actor ever mutates the snapshot or the device token.

use std::sync::Arc;

use chrono::Utc;
use setpoint_core::{
  permissions::NotificationPermissionSnapshot,
  providers::{
    DeviceStatusProvider, DisplayUnitProvider, LegacySettingsStorage, PermissionQuery,
  },
  settings::{ControlSettings, StoredSettings},
  store::{SettingsStore, StoredRecord},
};
use tokio::{
  sync::{mpsc, oneshot, watch},
  task::{JoinError, JoinSet},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  config::{ManagerConfig, SIMULATED_DEVICE_TOKEN},
  error::BoxError,
  gate::{self, Decision},
  merge::{LiveContext, merge},
  notify::SettingsDelegate,
};

// ─── Events ──────────────────────────────────────────────────────────────────

/// A trigger that may change the settings snapshot.
#[derive(Debug, Clone)]
pub enum SettingsEvent {
  /// The dosing engine published new preferences.
  PreferencesChanged(ControlSettings),
  /// The app returned to the foreground; re-query notification permissions.
  AppBecameActive,
  /// The platform delivered the push token identifying this installation.
  DeviceTokenReceived(Vec<u8>),
  /// A notification permission query completed.
  PermissionsQueried(NotificationPermissionSnapshot),
}

enum Command {
  Event(SettingsEvent),
  SetDelegate(Arc<dyn SettingsDelegate>),
  Purge(oneshot::Sender<Result<usize>>),
  Settled(oneshot::Sender<()>),
  Shutdown,
}

/// Outcome of a child task, delivered back onto the actor.
enum Completion {
  Stored {
    sync_identifier: Uuid,
    result:          Result<StoredRecord, BoxError>,
  },
  PermissionsQueried(Result<NotificationPermissionSnapshot, BoxError>),
}

// ─── Collaborators ───────────────────────────────────────────────────────────

/// Platform services sampled by the manager.
pub struct Collaborators<P> {
  pub permissions:   Arc<P>,
  pub device_status: Arc<dyn DeviceStatusProvider>,
  pub display_unit:  Arc<dyn DisplayUnitProvider>,
}

// ─── Handle ──────────────────────────────────────────────────────────────────

/// Cheap, cloneable access to a running [`SettingsManager`].
///
/// Event methods never block and may be called from any thread; events from
/// one caller are processed in the order they were sent.
#[derive(Clone)]
pub struct SettingsHandle {
  commands: mpsc::UnboundedSender<Command>,
  latest:   watch::Receiver<StoredSettings>,
}

impl SettingsHandle {
  /// The current snapshot.
  pub fn latest_settings(&self) -> StoredSettings { self.latest.borrow().clone() }

  /// The dosing-engine projection of the current snapshot.
  pub fn current_control_settings(&self) -> ControlSettings {
    self.latest.borrow().control_settings()
  }

  /// A receiver that observes every snapshot the manager adopts.
  pub fn subscribe(&self) -> watch::Receiver<StoredSettings> { self.latest.clone() }

  pub fn apply_control_settings_change(&self, settings: ControlSettings) -> Result<()> {
    self.send_event(SettingsEvent::PreferencesChanged(settings))
  }

  pub fn app_became_active(&self) -> Result<()> {
    self.send_event(SettingsEvent::AppBecameActive)
  }

  pub fn device_token_received(&self, token: impl Into<Vec<u8>>) -> Result<()> {
    self.send_event(SettingsEvent::DeviceTokenReceived(token.into()))
  }

  pub fn send_event(&self, event: SettingsEvent) -> Result<()> {
    self.send(Command::Event(event))
  }

  /// Replace the delegate notified after each durable write.
  pub fn set_delegate(&self, delegate: Arc<dyn SettingsDelegate>) -> Result<()> {
    self.send(Command::SetDelegate(delegate))
  }

  /// Remove settings history older than the configured expiry window.
  /// Returns the number of records removed; store failures pass through.
  pub async fn purge_historical_settings(&self) -> Result<usize> {
    let (tx, rx) = oneshot::channel();
    self.send(Command::Purge(tx))?;
    rx.await.map_err(|_| Error::Stopped)?
  }

  /// Wait until every event sent before this call has been processed and
  /// every store write and permission query it started has completed.
  pub async fn settled(&self) -> Result<()> {
    let (tx, rx) = oneshot::channel();
    self.send(Command::Settled(tx))?;
    rx.await.map_err(|_| Error::Stopped)
  }

  /// Stop accepting events. In-flight writes still run to completion.
  pub fn shutdown(&self) -> Result<()> { self.send(Command::Shutdown) }

  fn send(&self, command: Command) -> Result<()> {
    self.commands.send(command).map_err(|_| Error::Stopped)
  }
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Owner of the current settings snapshot.
pub struct SettingsManager<S, P> {
  pub(crate) store:         Arc<S>,
  pub(crate) permissions:   Arc<P>,
  pub(crate) device_status: Arc<dyn DeviceStatusProvider>,
  pub(crate) display_unit:  Arc<dyn DisplayUnitProvider>,
  pub(crate) config:        ManagerConfig,
  pub(crate) delegate:      Option<Arc<dyn SettingsDelegate>>,
  /// The current snapshot; published to every handle on replacement.
  pub(crate) current:       watch::Sender<StoredSettings>,
  /// Hex-encoded device token, once delivered.
  pub(crate) device_token:  Option<String>,
  /// The current snapshot has not reached the store yet.
  pub(crate) unpersisted:   bool,
  in_flight:                JoinSet<Completion>,
  waiters:                  Vec<oneshot::Sender<()>>,
}

impl<S, P> SettingsManager<S, P>
where
  S: SettingsStore + 'static,
  P: PermissionQuery + 'static,
{
  /// Load the latest snapshot (or defaults), migrate legacy settings, and
  /// start the actor. Migration finishes before any event is accepted.
  pub async fn start<L>(
    store:         Arc<S>,
    collaborators: Collaborators<P>,
    legacy:        &L,
    config:        ManagerConfig,
    delegate:      Option<Arc<dyn SettingsDelegate>>,
  ) -> SettingsHandle
  where
    L: LegacySettingsStorage,
  {
    let initial = match store.latest() {
      Some(latest) => latest,
      None => {
        info!("no stored settings; starting from defaults");
        StoredSettings::initial(Utc::now())
      }
    };
    let (current, latest) = watch::channel(initial);

    let mut manager = Self {
      store,
      permissions: collaborators.permissions,
      device_status: collaborators.device_status,
      display_unit: collaborators.display_unit,
      config,
      delegate,
      current,
      device_token: None,
      unpersisted: false,
      in_flight: JoinSet::new(),
      waiters: Vec::new(),
    };
    manager.migrate_legacy(legacy).await;

    let (commands, rx) = mpsc::unbounded_channel();
    tokio::spawn(manager.run(rx));

    SettingsHandle { commands, latest }
  }

  async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
    loop {
      tokio::select! {
        command = rx.recv() => match command {
          Some(Command::Shutdown) | None => break,
          Some(command) => self.handle_command(command),
        },
        Some(done) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
          self.handle_completion(done);
        }
      }
      self.release_waiters();
    }

    debug!(pending = self.in_flight.len(), "settings manager draining");
    while let Some(done) = self.in_flight.join_next().await {
      self.handle_completion(done);
    }
    self.release_waiters();
    info!("settings manager stopped");
  }

  fn handle_command(&mut self, command: Command) {
    match command {
      Command::Event(event) => self.handle_event(event),
      Command::SetDelegate(delegate) => self.delegate = Some(delegate),
      Command::Purge(reply) => self.purge(reply),
      Command::Settled(reply) => self.waiters.push(reply),
      Command::Shutdown => {}
    }
  }

  fn handle_event(&mut self, event: SettingsEvent) {
    match event {
      SettingsEvent::PreferencesChanged(control) => {
        debug!("dosing preferences changed");
        self.merge_and_persist(Some(control), None);
      }
      SettingsEvent::AppBecameActive => {
        debug!("app became active; querying notification permissions");
        let permissions = self.permissions.clone();
        self.in_flight.spawn(async move {
          Completion::PermissionsQueried(
            permissions.current().await.map_err(|e| Box::new(e) as BoxError),
          )
        });
      }
      SettingsEvent::DeviceTokenReceived(bytes) => {
        if bytes.is_empty() {
          warn!("ignoring empty device token");
          return;
        }
        debug!(len = bytes.len(), "device token received");
        self.device_token = Some(hex::encode(bytes));
        self.merge_and_persist(None, None);
      }
      SettingsEvent::PermissionsQueried(snapshot) => {
        // Compare with what was last adopted; the store may still lag it.
        let adopted = self.current.borrow().notification_permissions;
        if adopted == Some(snapshot) {
          debug!("notification permissions unchanged");
          return;
        }
        self.merge_and_persist(None, Some(snapshot));
      }
    }
  }

  fn handle_completion(&mut self, done: Result<Completion, JoinError>) {
    match done {
      Ok(Completion::Stored { result: Ok(record), .. }) => {
        info!(
          modification_counter = record.modification_counter,
          sync_identifier = %record.sync_identifier,
          "settings stored"
        );
        self.notify(record);
      }
      Ok(Completion::Stored { sync_identifier, result: Err(e) }) => {
        warn!(error = %e, "failed to store settings");
        if self.current.borrow().sync_identifier == sync_identifier {
          self.unpersisted = true;
        }
      }
      Ok(Completion::PermissionsQueried(Ok(snapshot))) => {
        self.handle_event(SettingsEvent::PermissionsQueried(snapshot));
      }
      Ok(Completion::PermissionsQueried(Err(e))) => {
        warn!(error = %e, "notification permission query failed");
      }
      Err(e) => warn!(error = %e, "settings task did not complete"),
    }
  }

  // ── Pipeline ────────────────────────────────────────────────────────────

  pub(crate) fn live_context(&self) -> LiveContext {
    let device_token = if self.config.simulation_mode {
      Some(SIMULATED_DEVICE_TOKEN.to_owned())
    } else {
      self.device_token.clone()
    };

    LiveContext {
      device_token,
      now: Utc::now(),
      device_status: self.device_status.device_status(),
      display_unit: self.display_unit.display_glucose_unit(),
      controller: self.config.controller.clone(),
    }
  }

  fn merge_and_persist(
    &mut self,
    control:     Option<ControlSettings>,
    permissions: Option<NotificationPermissionSnapshot>,
  ) {
    let context   = self.live_context();
    let candidate = merge(&self.current.borrow(), control, permissions, &context);
    self.try_persist(candidate);
  }

  fn gate_open(&self) -> bool {
    self.config.simulation_mode || self.device_token.is_some()
  }

  fn try_persist(&mut self, candidate: StoredSettings) {
    let decision = gate::evaluate(
      &self.current.borrow(),
      &candidate,
      self.unpersisted,
      self.gate_open(),
    );

    match decision {
      Decision::Unchanged => debug!("settings unchanged; skipping store"),
      Decision::Defer => {
        debug!("no device token yet; holding settings in memory");
        self.current.send_replace(candidate);
        self.unpersisted = true;
      }
      Decision::Persist => {
        if candidate.insulin_sensitivity_schedule.is_none() {
          warn!("storing settings without an insulin sensitivity schedule");
        }
        self.current.send_replace(candidate.clone());
        self.unpersisted = false;

        let store = self.store.clone();
        self.in_flight.spawn(async move {
          let sync_identifier = candidate.sync_identifier;
          let result = store.store(candidate).await.map_err(|e| Box::new(e) as BoxError);
          Completion::Stored { sync_identifier, result }
        });
      }
    }
  }

  pub(crate) fn notify(&self, record: StoredRecord) {
    if let Some(delegate) = &self.delegate {
      delegate.settings_history_advanced(record);
    }
  }

  fn purge(&self, reply: oneshot::Sender<Result<usize>>) {
    let store  = self.store.clone();
    let cutoff = self.config.expiry.cutoff(Utc::now());
    tokio::spawn(async move {
      let result = store
        .purge_historical_before(cutoff)
        .await
        .map_err(|e| Error::Store(Box::new(e)));
      match &result {
        Ok(purged) => info!(purged, %cutoff, "purged historical settings"),
        Err(e) => warn!(error = %e, "failed to purge historical settings"),
      }
      let _ = reply.send(result);
    });
  }

  fn release_waiters(&mut self) {
    if self.in_flight.is_empty() {
      for waiter in self.waiters.drain(..) {
        let _ = waiter.send(());
      }
    }
  }
}
