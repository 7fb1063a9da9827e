//! Editing session: local-first capture of a student's answers.
//!
//! Every edit is written through to the local cache immediately and handed to
//! the debounced writer for the remote merge-write. The cache is the source
//! of truth while the student is still working; a failed remote write never
//! rolls it back. On page (re)load, editors repopulate from the remote
//! document first and fall back to the cached copy.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::cache::LocalCache;
use crate::docstore::SubmissionSink;
use crate::domain::{AssignmentDefinition, Page};
use crate::keys::CacheKey;
use crate::writer::DebouncedWriter;

pub struct EditingSession<S: SubmissionSink> {
  uid: String,
  cache: Arc<LocalCache>,
  writer: DebouncedWriter<S>,
}

impl<S: SubmissionSink> EditingSession<S> {
  pub fn new(uid: &str, cache: Arc<LocalCache>, writer: DebouncedWriter<S>) -> Self {
    EditingSession { uid: uid.to_string(), cache, writer }
  }

  /// Snapshot a page's question structure and title into the cache, so the
  /// gatherer can rebuild the tree even when the definition source is down.
  pub fn open_page(&self, assignment_id: &str, definition: &AssignmentDefinition, page: &Page) {
    let questions = definition.questions_of(&page.id);
    match CacheKey::questions(assignment_id, &page.id) {
      Ok(key) => {
        if let Ok(raw) = serde_json::to_string(&questions) {
          self.cache.put(&key.encode(), &raw);
        }
      }
      Err(e) => warn!(target: "sync", error = %e, "Skipping question snapshot"),
    }
    match CacheKey::title(assignment_id, &page.id) {
      Ok(key) => self.cache.put(&key.encode(), &page.title),
      Err(e) => warn!(target: "sync", error = %e, "Skipping title snapshot"),
    }
  }

  /// One edit event: cache write-through plus debounced remote write.
  pub fn on_answer_changed(&self, assignment_id: &str, page_id: &str, element_id: &str, content: &str) {
    match CacheKey::answer(assignment_id, page_id, element_id) {
      Ok(key) => self.cache.put(&key.encode(), content),
      Err(e) => {
        // Bad identifiers cannot be addressed in either store; drop the edit.
        warn!(target: "sync", error = %e, "Edit for unaddressable element dropped");
        return;
      }
    }
    self
      .writer
      .on_answer_changed(&self.uid, assignment_id, page_id, element_id, content);
  }

  /// Answer used to repopulate one editor: remote document wins, cache is the
  /// fallback, absence means empty.
  pub fn answer_for(&self, remote_doc: &Value, assignment_id: &str, page_id: &str, element_id: &str) -> String {
    if let Some(remote) = remote_doc
      .get(assignment_id)
      .and_then(|a| a.get(page_id))
      .and_then(|p| p.get(element_id))
      .and_then(|v| v.as_str())
    {
      return remote.to_string();
    }
    CacheKey::answer(assignment_id, page_id, element_id)
      .ok()
      .and_then(|key| self.cache.get(&key.encode()))
      .unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::docstore::DocStore;
  use crate::domain::Element;
  use crate::writer::DEFAULT_DEBOUNCE;
  use serde_json::json;
  use std::time::Duration;

  fn sample_definition() -> AssignmentDefinition {
    AssignmentDefinition {
      assignment_title: "Modul 1".into(),
      pages: vec![Page {
        id: "p1".into(),
        title: "Einstieg".into(),
        help_text: None,
        elements: vec![Element::Quill { id: "q1".into(), question: "Was denkst du?".into() }],
      }],
    }
  }

  #[tokio::test(start_paused = true)]
  async fn edit_reaches_cache_immediately_and_store_after_quiet_window() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = Arc::new(LocalCache::open(dir.path().join("cache.json")));
    let store = DocStore::new();
    let session = EditingSession::new(
      "u1",
      cache.clone(),
      DebouncedWriter::new(store.clone(), DEFAULT_DEBOUNCE),
    );

    session.on_answer_changed("a1", "p1", "q1", "Hello");
    assert_eq!(cache.get("answer::a1::p1::q1").as_deref(), Some("Hello"));
    assert_eq!(store.submission("u1").await, json!({}));

    tokio::time::sleep(Duration::from_millis(2000)).await;
    assert_eq!(store.submission("u1").await, json!({"a1": {"p1": {"q1": "Hello"}}}));

    // Reload path: the flushed document repopulates the editor.
    let doc = store.submission("u1").await;
    assert_eq!(session.answer_for(&doc, "a1", "p1", "q1"), "Hello");
  }

  #[tokio::test(start_paused = true)]
  async fn cache_backfills_when_remote_is_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = Arc::new(LocalCache::open(dir.path().join("cache.json")));
    let store = DocStore::new();
    let session = EditingSession::new(
      "u1",
      cache.clone(),
      DebouncedWriter::new(store.clone(), DEFAULT_DEBOUNCE),
    );

    cache.put("answer::a1::p1::q1", "local only");
    assert_eq!(session.answer_for(&json!({}), "a1", "p1", "q1"), "local only");
    assert_eq!(session.answer_for(&json!({}), "a1", "p1", "q9"), "");
  }

  #[tokio::test(start_paused = true)]
  async fn open_page_snapshots_questions_and_title() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache = Arc::new(LocalCache::open(dir.path().join("cache.json")));
    let store = DocStore::new();
    let session = EditingSession::new("u1", cache.clone(), DebouncedWriter::new(store, DEFAULT_DEBOUNCE));

    let def = sample_definition();
    session.open_page("a1", &def, &def.pages[0]);
    assert_eq!(cache.get("title::a1::p1").as_deref(), Some("Einstieg"));
    let raw = cache.get("questions::a1::p1").expect("snapshot");
    assert!(raw.contains("Was denkst du?"));
  }
}
