//! Debounced remote writer: coalesces bursts of edit events into one
//! merge-write per quiet period and per editable element.
//!
//! Each (uid, assignment, page, element) key runs its own trailing-edge
//! debounce: every edit stores the newest content and bumps a per-key
//! generation, then arms a timer for the full quiet window. A timer that
//! wakes up and finds its generation stale simply returns; the one armed by
//! the last edit of the burst flushes. Keys never share timers or payloads,
//! so concurrent edits to different elements cannot contaminate each other.
//!
//! Flush failures are logged and swallowed: the local cache is the durable
//! fallback and is never rolled back by a failed remote write. Dropping the
//! writer abandons all pending timers (accepted data-loss window equal to
//! the debounce delay).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};

use crate::docstore::SubmissionSink;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1500);

/// Nested single-leaf patch `{assignment: {page: {element: content}}}`.
pub fn element_patch(assignment: &str, page: &str, element: &str, content: &str) -> serde_json::Value {
  json!({ assignment: { page: { element: content } } })
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct FlushKey {
  uid: String,
  assignment: String,
  page: String,
  element: String,
}

struct Pending {
  content: String,
  generation: u64,
}

struct Inner<S> {
  sink: S,
  delay: Duration,
  pending: Mutex<HashMap<FlushKey, Pending>>,
}

pub struct DebouncedWriter<S> {
  inner: Arc<Inner<S>>,
}

impl<S: SubmissionSink> DebouncedWriter<S> {
  pub fn new(sink: S, delay: Duration) -> Self {
    DebouncedWriter {
      inner: Arc::new(Inner { sink, delay, pending: Mutex::new(HashMap::new()) }),
    }
  }

  /// Record an edit and (re)arm the key's quiet-window timer. Cheap enough to
  /// call on every keystroke.
  pub fn on_answer_changed(&self, uid: &str, assignment: &str, page: &str, element: &str, content: &str) {
    let key = FlushKey {
      uid: uid.to_string(),
      assignment: assignment.to_string(),
      page: page.to_string(),
      element: element.to_string(),
    };

    let generation = {
      let mut pending = self.inner.pending.lock().expect("writer lock");
      let slot = pending.entry(key.clone()).or_insert(Pending { content: String::new(), generation: 0 });
      slot.content = content.to_string();
      slot.generation += 1;
      slot.generation
    };

    let weak: Weak<Inner<S>> = Arc::downgrade(&self.inner);
    let delay = self.inner.delay;
    tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      let Some(inner) = weak.upgrade() else {
        // Writer dropped; timer abandoned.
        return;
      };
      let flush = {
        let mut pending = inner.pending.lock().expect("writer lock");
        match pending.get(&key) {
          Some(p) if p.generation == generation => pending.remove(&key),
          // A newer edit re-armed the window; let its timer do the work.
          _ => None,
        }
      };
      if let Some(p) = flush {
        let patch = element_patch(&key.assignment, &key.page, &key.element, &p.content);
        debug!(target: "sync", uid = %key.uid, assignment = %key.assignment, page = %key.page, element = %key.element, "Debounce window closed; flushing");
        if let Err(e) = inner.sink.merge_write(key.uid.clone(), patch).await {
          // Non-blocking by contract: the local cache keeps the durable copy.
          warn!(target: "sync", uid = %key.uid, element = %key.element, error = %e, "Remote merge-write failed; local cache remains authoritative");
        }
      }
    });
  }

  /// Number of keys with an open quiet window (diagnostics).
  pub fn pending_len(&self) -> usize {
    self.inner.pending.lock().expect("writer lock").len()
  }
}
