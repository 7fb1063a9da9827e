//! Assignment definition source: `assignments/{id}.json` from a local
//! directory or an HTTP base URL.
//!
//! A missing definition (404 / file not found) is a normal outcome and maps
//! to `Ok(None)`; only transport and parse problems are errors. Loaded
//! definitions are validated (unique page/element ids) before use.

use std::path::PathBuf;

use tracing::{error, info};

use crate::domain::AssignmentDefinition;

pub enum DefinitionSource {
  Dir(PathBuf),
  Http { base_url: String, client: reqwest::Client },
}

impl DefinitionSource {
  pub fn dir(path: impl Into<PathBuf>) -> Self {
    DefinitionSource::Dir(path.into())
  }

  pub fn http(base_url: &str) -> Self {
    DefinitionSource::Http {
      base_url: base_url.trim_end_matches('/').to_string(),
      client: reqwest::Client::new(),
    }
  }

  /// Fetch and validate one definition. `Ok(None)` means "no such
  /// assignment", which callers surface as a non-fatal message.
  pub async fn fetch(&self, assignment_id: &str) -> Result<Option<AssignmentDefinition>, String> {
    // Ids become path segments; keep them to a single flat segment.
    if assignment_id.is_empty() || assignment_id.contains(['/', '\\']) || assignment_id.contains("..") {
      return Err(format!("invalid assignment id '{}'", assignment_id));
    }

    let raw = match self {
      DefinitionSource::Dir(dir) => {
        let path = dir.join(format!("{assignment_id}.json"));
        match std::fs::read_to_string(&path) {
          Ok(raw) => raw,
          Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
          Err(e) => return Err(format!("read {}: {}", path.display(), e)),
        }
      }
      DefinitionSource::Http { base_url, client } => {
        let url = format!("{base_url}/{assignment_id}.json");
        let resp = client.get(&url).send().await.map_err(|e| e.to_string())?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
          return Ok(None);
        }
        if !resp.status().is_success() {
          return Err(format!("GET {}: {}", url, resp.status()));
        }
        resp.text().await.map_err(|e| e.to_string())?
      }
    };

    let def: AssignmentDefinition = serde_json::from_str(&raw).map_err(|e| {
      error!(target: "aufgaben_backend", %assignment_id, error = %e, "Definition parse failed");
      format!("parse '{}': {}", assignment_id, e)
    })?;
    def.validate()?;
    info!(target: "aufgaben_backend", %assignment_id, pages = def.pages.len(), "Definition loaded");
    Ok(Some(def))
  }
}
