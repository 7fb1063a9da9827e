//! Loading server configuration from TOML.
//!
//! APP_CONFIG_PATH points at the file; every key has a default so the server
//! also runs without any config at all.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Quiet window of the debounced writer, in milliseconds.
  pub debounce_ms: u64,
  /// Directory with `{assignmentId}.json` definition files.
  pub definition_dir: Option<String>,
  /// Alternative HTTP definition source; wins over `definition_dir` when set.
  pub definition_base_url: Option<String>,
  /// Shared dashboard key; teacher-only actions also accept a user with the
  /// teacher role. Unset means key-based access is disabled.
  pub teacher_key: Option<String>,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      debounce_ms: 1500,
      definition_dir: Some("./assignments".into()),
      definition_base_url: None,
      teacher_key: None,
    }
  }
}

impl Config {
  pub fn debounce(&self) -> std::time::Duration {
    std::time::Duration::from_millis(self.debounce_ms)
  }
}

/// Attempt to load `Config` from APP_CONFIG_PATH. On any parsing/IO error,
/// returns the defaults.
pub fn load_config_from_env() -> Config {
  let Some(path) = std::env::var("APP_CONFIG_PATH").ok() else {
    return Config::default();
  };
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<Config>(&s) {
      Ok(cfg) => {
        info!(target: "aufgaben_backend", %path, "Loaded config (TOML)");
        cfg
      }
      Err(e) => {
        error!(target: "aufgaben_backend", %path, error = %e, "Failed to parse TOML config; using defaults");
        Config::default()
      }
    },
    Err(e) => {
      error!(target: "aufgaben_backend", %path, error = %e, "Failed to read TOML config file; using defaults");
      Config::default()
    }
  }
}
