//! The hosted document store: collections, merge-write semantics, and a
//! broadcast change feed.
//!
//! This module owns:
//!   - `merge_value`, the one merge rule both the editor and the dashboard
//!     rely on: a write sets only the leaf paths present in its payload and
//!     leaves sibling paths untouched at every nesting level
//!   - the collections (`classes`, `users`, `presence`, `submissions`,
//!     final submissions for the legacy endpoint)
//!   - a `broadcast` channel carrying a collection tag per mutation, which
//!     drives the dashboard's push-based re-render
//!
//! Submission documents are keyed by the student uid and are single-writer /
//! multi-reader: only the owning student's session writes them, so no
//! transactional conflict resolution is needed. Absence of a document or of
//! any nested path means "no answer yet", never an error.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use crate::domain::{ClassRecord, PresenceRecord, SubmissionPayload, UserRecord};

/// Deep merge `patch` into `target`. Objects merge recursively; any other
/// value (including arrays) replaces the target wholesale.
pub fn merge_value(target: &mut Value, patch: &Value) {
  match (target, patch) {
    (Value::Object(t), Value::Object(p)) => {
      for (k, v) in p {
        merge_value(t.entry(k.clone()).or_insert(Value::Null), v);
      }
    }
    (t, p) => *t = p.clone(),
  }
}

/// Collection tags published on the change feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
  Classes,
  Users,
  Submissions,
  Presence,
  FinalSubmissions,
}

/// A draft accepted by the legacy submit action, addressable by path.
#[derive(Clone, Debug)]
pub struct StoredDraft {
  pub name: String,
  pub created_at: DateTime<Utc>,
  pub payload: SubmissionPayload,
}

#[derive(Clone)]
pub struct DocStore {
  pub classes: Arc<RwLock<HashMap<String, ClassRecord>>>,
  pub users: Arc<RwLock<HashMap<String, UserRecord>>>,
  pub presence: Arc<RwLock<HashMap<String, PresenceRecord>>>,
  pub submissions: Arc<RwLock<HashMap<String, Value>>>,
  pub finals: Arc<RwLock<HashMap<String, Vec<StoredDraft>>>>,
  changes: broadcast::Sender<Collection>,
}

impl DocStore {
  pub fn new() -> Self {
    let (changes, _) = broadcast::channel(64);
    DocStore {
      classes: Arc::new(RwLock::new(HashMap::new())),
      users: Arc::new(RwLock::new(HashMap::new())),
      presence: Arc::new(RwLock::new(HashMap::new())),
      submissions: Arc::new(RwLock::new(HashMap::new())),
      finals: Arc::new(RwLock::new(HashMap::new())),
      changes,
    }
  }

  /// Live feed of collection deltas. Receivers that fall behind miss tags,
  /// which is fine: a tag only means "recompute", it carries no data.
  pub fn subscribe(&self) -> broadcast::Receiver<Collection> {
    self.changes.subscribe()
  }

  fn notify(&self, collection: Collection) {
    // No receivers is a normal state (no dashboard connected).
    let _ = self.changes.send(collection);
  }

  /// Merge-write into one student's submission document.
  pub async fn merge_submission(&self, uid: &str, patch: &Value) {
    let mut docs = self.submissions.write().await;
    let doc = docs.entry(uid.to_string()).or_insert_with(|| Value::Object(Default::default()));
    merge_value(doc, patch);
    drop(docs);
    debug!(target: "sync", %uid, "Submission merge-write applied");
    self.notify(Collection::Submissions);
  }

  /// The student's document, or an empty object when none exists yet.
  pub async fn submission(&self, uid: &str) -> Value {
    self
      .submissions
      .read()
      .await
      .get(uid)
      .cloned()
      .unwrap_or_else(|| Value::Object(Default::default()))
  }

  pub async fn all_submissions(&self) -> HashMap<String, Value> {
    self.submissions.read().await.clone()
  }

  pub async fn touch_presence(&self, uid: &str, now: DateTime<Utc>) {
    self
      .presence
      .write()
      .await
      .insert(uid.to_string(), PresenceRecord { last_active: now });
    self.notify(Collection::Presence);
  }

  pub async fn upsert_class(&self, id: String, class: ClassRecord) {
    info!(target: "dashboard", class_id = %id, class_name = %class.class_name, "Class upserted");
    self.classes.write().await.insert(id, class);
    self.notify(Collection::Classes);
  }

  pub async fn delete_class(&self, id: &str) -> bool {
    let removed = self.classes.write().await.remove(id).is_some();
    if removed {
      info!(target: "dashboard", class_id = %id, "Class deleted");
      self.notify(Collection::Classes);
    }
    removed
  }

  pub async fn class_by_code(&self, code: &str) -> Option<(String, ClassRecord)> {
    self
      .classes
      .read()
      .await
      .iter()
      .find(|(_, c)| c.registration_code.eq_ignore_ascii_case(code))
      .map(|(id, c)| (id.clone(), c.clone()))
  }

  pub async fn upsert_user(&self, id: String, user: UserRecord) {
    info!(target: "dashboard", user_id = %id, display_name = %user.display_name, "User upserted");
    self.users.write().await.insert(id, user);
    self.notify(Collection::Users);
  }

  pub async fn delete_user(&self, id: &str) -> bool {
    let removed = self.users.write().await.remove(id).is_some();
    if removed {
      info!(target: "dashboard", user_id = %id, "User record removed");
      self.notify(Collection::Users);
    }
    removed
  }

  /// Accept a final submission for `identifier`. Draft names encode the
  /// creation instant, so a student's drafts sort chronologically by name.
  pub async fn store_final(&self, identifier: &str, payload: SubmissionPayload) -> String {
    let created_at = payload.created_at;
    let name = created_at.format("abgabe_%Y%m%dT%H%M%S").to_string();
    let path = format!("{}/{}", identifier, name);
    self
      .finals
      .write()
      .await
      .entry(identifier.to_string())
      .or_default()
      .push(StoredDraft { name, created_at, payload });
    info!(target: "sync", %identifier, %path, "Final submission stored");
    self.notify(Collection::FinalSubmissions);
    path
  }

  /// Draft index grouped by class, then student. The legacy identifier is
  /// `{class}_{student}`; identifiers without an underscore land under "-".
  pub async fn list_finals(&self) -> BTreeMap<String, BTreeMap<String, Vec<(String, String)>>> {
    let finals = self.finals.read().await;
    let mut out: BTreeMap<String, BTreeMap<String, Vec<(String, String)>>> = BTreeMap::new();
    for (identifier, drafts) in finals.iter() {
      let (class, student) = match identifier.split_once('_') {
        Some((c, s)) => (c.to_uppercase(), s.to_string()),
        None => ("-".to_string(), identifier.clone()),
      };
      let slot = out.entry(class).or_default().entry(student).or_default();
      for d in drafts {
        slot.push((d.name.clone(), format!("{}/{}", identifier, d.name)));
      }
      slot.sort();
    }
    out
  }

  pub async fn get_final(&self, path: &str) -> Option<SubmissionPayload> {
    let (identifier, name) = path.split_once('/')?;
    self
      .finals
      .read()
      .await
      .get(identifier)
      .and_then(|drafts| drafts.iter().find(|d| d.name == name))
      .map(|d| d.payload.clone())
  }
}

/// Where the debounced writer flushes to. The doc store implements this
/// directly; tests substitute recorders.
pub trait SubmissionSink: Send + Sync + 'static {
  fn merge_write(&self, uid: String, patch: Value) -> impl Future<Output = Result<(), String>> + Send;
}

impl SubmissionSink for DocStore {
  async fn merge_write(&self, uid: String, patch: Value) -> Result<(), String> {
    self.merge_submission(&uid, &patch).await;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn merge_preserves_siblings_at_every_level() {
    let mut doc = json!({});
    merge_value(&mut doc, &json!({"a": {"b": {"c": "x"}}}));
    merge_value(&mut doc, &json!({"a": {"b": {"d": "y"}}}));
    assert_eq!(doc, json!({"a": {"b": {"c": "x", "d": "y"}}}));
  }

  #[test]
  fn merge_overwrites_only_named_leaves() {
    let mut doc = json!({"a1": {"p1": {"q1": "old", "q2": "keep"}, "p2": {"q3": "keep"}}});
    merge_value(&mut doc, &json!({"a1": {"p1": {"q1": "new"}}}));
    assert_eq!(doc, json!({"a1": {"p1": {"q1": "new", "q2": "keep"}, "p2": {"q3": "keep"}}}));
  }

  #[test]
  fn merge_replaces_non_object_values() {
    let mut doc = json!({"a": "scalar"});
    merge_value(&mut doc, &json!({"a": {"b": 1}}));
    assert_eq!(doc, json!({"a": {"b": 1}}));
  }

  #[tokio::test]
  async fn absent_document_reads_as_empty_object() {
    let store = DocStore::new();
    assert_eq!(store.submission("nobody").await, json!({}));
  }

  #[tokio::test]
  async fn mutations_publish_collection_tags() {
    let store = DocStore::new();
    let mut rx = store.subscribe();
    store.merge_submission("u1", &json!({"a1": {"p1": {"q1": "x"}}})).await;
    store.touch_presence("u1", Utc::now()).await;
    assert_eq!(rx.recv().await.expect("tag"), Collection::Submissions);
    assert_eq!(rx.recv().await.expect("tag"), Collection::Presence);
  }

  #[tokio::test]
  async fn finals_round_trip_by_path() {
    let store = DocStore::new();
    let payload = SubmissionPayload { assignments: Default::default(), created_at: Utc::now() };
    let path = store.store_final("7A_Muster", payload).await;
    assert!(store.get_final(&path).await.is_some());
    let listing = store.list_finals().await;
    assert!(listing.get("7A").and_then(|c| c.get("Muster")).is_some());
  }
}
