//! Server configuration, deserialised from a TOML file plus `HOMEROOM_*`
//! environment overrides.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use homeroom_core::{projector::LoadingGate, reminder::ReminderSchedule};
use serde::Deserialize;

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  pub loading_gate: LoadingGate,
  pub reminder:     ReminderSchedule,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:         "127.0.0.1".to_string(),
      port:         8080,
      store_path:   PathBuf::from("homeroom.db"),
      loading_gate: LoadingGate::default(),
      reminder:     ReminderSchedule::default(),
    }
  }
}

impl ServerConfig {
  /// Read `path` (optional) and layer `HOMEROOM_*` variables on top.
  /// Nested keys use a double underscore, e.g. `HOMEROOM_REMINDER__HOUR`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("HOMEROOM").separator("__"))
      .build()
      .context("failed to read config file")?;

    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    anyhow::ensure!(
      cfg.reminder.is_valid(),
      "reminder time {}:{} is out of range",
      cfg.reminder.hour,
      cfg.reminder.minute
    );
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
