//! setpoint-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite settings store, migrates any legacy settings file, and serves the
//! settings API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use setpoint_api::{
  AppState, ServerConfig,
  platform::{ReportedPermissions, StaticDeviceStatus, StaticDisplayUnit},
};
use setpoint_core::store::{ExpiryPolicy, StoredRecord};
use setpoint_manager::{
  Collaborators, ManagerConfig, SettingsDelegate, SettingsManager,
  legacy_file::JsonFileLegacyStorage,
};
use setpoint_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Parser)]
#[command(author, version, about = "Setpoint settings server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

/// Logs each history advance; the sync component polls the history endpoint.
struct LogDelegate;

impl SettingsDelegate for LogDelegate {
  fn settings_history_advanced(&self, record: StoredRecord) {
    tracing::info!(
      modification_counter = record.modification_counter,
      "settings history advanced"
    );
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SETPOINT"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let expiry = ExpiryPolicy::new(Duration::from_secs(
    server_cfg.expire_age_days.saturating_mul(SECONDS_PER_DAY),
  ));

  // Open SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path, expiry)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  // Platform stand-ins.
  let permissions = Arc::new(ReportedPermissions::default());
  let collaborators = Collaborators {
    permissions:   permissions.clone(),
    device_status: Arc::new(StaticDeviceStatus(server_cfg.devices.clone())),
    display_unit:  Arc::new(StaticDisplayUnit(server_cfg.display_unit)),
  };

  let legacy = JsonFileLegacyStorage::new(expand_tilde(&server_cfg.legacy_settings_path));
  let manager_cfg = ManagerConfig {
    simulation_mode: server_cfg.simulation_mode,
    controller:      server_cfg.controller.clone(),
    expiry,
  };
  if manager_cfg.simulation_mode {
    tracing::warn!("running in simulation mode; push-token gating is disabled");
  }

  let handle = SettingsManager::start(
    store.clone(),
    collaborators,
    &legacy,
    manager_cfg,
    Some(Arc::new(LogDelegate)),
  )
  .await;

  let state = AppState { handle: handle.clone(), store, permissions };
  let app = setpoint_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  // Let queued events and in-flight writes finish before exiting.
  if let Err(e) = handle.settled().await {
    tracing::warn!(error = %e, "settings manager stopped before settling");
  }
  handle.shutdown().ok();

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
