//! Application state: the document store, the debounced writer feeding it,
//! the definition source and the loaded configuration.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::config::{load_config_from_env, Config};
use crate::dashboard::{self, DashboardView};
use crate::definitions::DefinitionSource;
use crate::docstore::DocStore;
use crate::writer::DebouncedWriter;

pub struct AppState {
  pub config: Config,
  pub store: DocStore,
  pub writer: DebouncedWriter<DocStore>,
  pub definitions: DefinitionSource,
}

impl AppState {
  /// Build state from env: load config, wire the writer to the store, pick
  /// the definition source.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    let config = load_config_from_env();
    Self::with_config(config)
  }

  pub fn with_config(config: Config) -> Self {
    let store = DocStore::new();
    let writer = DebouncedWriter::new(store.clone(), config.debounce());

    let definitions = match (&config.definition_base_url, &config.definition_dir) {
      (Some(url), _) => {
        info!(target: "aufgaben_backend", base_url = %url, "Definitions served from HTTP source");
        DefinitionSource::http(url)
      }
      (None, Some(dir)) => {
        info!(target: "aufgaben_backend", %dir, "Definitions served from directory");
        DefinitionSource::dir(dir.clone())
      }
      (None, None) => DefinitionSource::dir("./assignments"),
    };

    if config.teacher_key.is_none() {
      info!(target: "aufgaben_backend", "No teacher_key configured; dashboard access requires a teacher user record");
    }

    AppState { config, store, writer, definitions }
  }

  /// Dashboard view over a consistent snapshot of all four collections.
  pub async fn dashboard_view(&self, class_id: Option<&str>, assignment_id: Option<&str>) -> DashboardView {
    let classes = self.store.classes.read().await.clone();
    let users = self.store.users.read().await.clone();
    let presence = self.store.presence.read().await.clone();
    let submissions = self.store.all_submissions().await;
    dashboard::build_view(&classes, &users, &presence, &submissions, assignment_id, class_id, Utc::now())
  }
}

pub type SharedState = Arc<AppState>;
