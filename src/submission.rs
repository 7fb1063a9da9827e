//! Final submission: gathers the local draft tree and posts it to the legacy
//! submit endpoint, exactly once.
//!
//! The submit trigger is guarded synchronously before the network call
//! starts, which closes the one race the flow has: a double-click during the
//! round trip must not produce a second outbound request. A successful
//! submission is terminal; a failed one re-enables the trigger so the
//! student may retry manually (no automatic retry).

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tracing::{error, info};

use crate::cache::LocalCache;
use crate::domain::SubmissionPayload;
use crate::gather::{gather, DefinitionLookup};
use crate::protocol::{LegacyRequest, StatusOut};

/// Posts one legacy request. Implemented by the HTTP client below and by
/// test doubles.
pub trait SubmitTransport: Send + Sync + 'static {
  fn post(&self, req: LegacyRequest) -> impl Future<Output = Result<StatusOut, String>> + Send;
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
  /// Accepted by the server; the flow is terminal.
  Accepted,
  /// A submission is already in flight; no request was issued.
  AlreadyInFlight,
  /// Server or transport failure; the trigger is re-enabled.
  Failed(String),
}

pub struct FinalSubmitter<T> {
  transport: T,
  in_flight: AtomicBool,
}

impl<T: SubmitTransport> FinalSubmitter<T> {
  pub fn new(transport: T) -> Self {
    FinalSubmitter { transport, in_flight: AtomicBool::new(false) }
  }

  /// Gather everything from the local cache and submit it under the legacy
  /// identifier (`{class}_{name}`).
  pub async fn submit_all(
    &self,
    cache: &LocalCache,
    definitions: &impl DefinitionLookup,
    identifier: &str,
  ) -> SubmitOutcome {
    // Taken before the first await; a concurrent trigger sees it set.
    if self
      .in_flight
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .is_err()
    {
      return SubmitOutcome::AlreadyInFlight;
    }

    let payload = gather(cache, definitions, Utc::now());
    let req = LegacyRequest::submit(identifier, payload.clone());
    match self.transport.post(req).await {
      Ok(out) if out.is_success() => {
        info!(target: "sync", %identifier, "Final submission accepted");
        SubmitOutcome::Accepted
      }
      Ok(out) => {
        let message = out.message.unwrap_or_else(|| "Unbekannter Server-Fehler".into());
        error!(target: "sync", %identifier, %message, "Final submission rejected");
        self.in_flight.store(false, Ordering::SeqCst);
        SubmitOutcome::Failed(message)
      }
      Err(e) => {
        error!(target: "sync", %identifier, error = %e, "Final submission transport failure");
        self.in_flight.store(false, Ordering::SeqCst);
        SubmitOutcome::Failed(e)
      }
    }
  }
}

/// Legacy endpoint client over HTTP.
pub struct HttpSubmitClient {
  client: reqwest::Client,
  url: String,
}

impl HttpSubmitClient {
  pub fn new(url: &str) -> Self {
    HttpSubmitClient { client: reqwest::Client::new(), url: url.to_string() }
  }

  async fn post_json(&self, req: &LegacyRequest) -> Result<serde_json::Value, String> {
    let resp = self
      .client
      .post(&self.url)
      .json(req)
      .send()
      .await
      .map_err(|e| e.to_string())?;
    let value: serde_json::Value = resp.json().await.map_err(|e| e.to_string())?;
    if value.get("status").and_then(|s| s.as_str()) == Some("error") {
      let message = value
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Unbekannter Server-Fehler");
      return Err(message.to_string());
    }
    Ok(value)
  }

  /// Draft index grouped by class and student.
  pub async fn list_drafts(&self, teacher_key: &str) -> Result<serde_json::Value, String> {
    self.post_json(&LegacyRequest::list_drafts(teacher_key)).await
  }

  /// One draft payload by its path.
  pub async fn get_draft(&self, teacher_key: &str, path: &str) -> Result<SubmissionPayload, String> {
    let value = self.post_json(&LegacyRequest::get_draft(teacher_key, path)).await?;
    serde_json::from_value(value).map_err(|e| e.to_string())
  }
}

impl SubmitTransport for HttpSubmitClient {
  async fn post(&self, req: LegacyRequest) -> Result<StatusOut, String> {
    let value = self.post_json(&req).await?;
    serde_json::from_value(value).map_err(|e| e.to_string())
  }
}
