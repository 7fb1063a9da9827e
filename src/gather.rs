//! Draft/submission gatherer: rebuilds the assignment → sub-assignment →
//! question → answer tree from the local cache, used for printing drafts and
//! for the final submission payload.
//!
//! Grouping and output use `BTreeMap`s keyed by identifier, and answers
//! follow the canonical question list, so the result is deterministic for a
//! given cache snapshot no matter how the store iterates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::cache::LocalCache;
use crate::domain::{AssignmentDefinition, DraftAnswer, DraftEntry, Question, SubmissionPayload};
use crate::keys::CacheKey;

/// Placeholder entry injected when the cache holds no answers at all, so
/// downstream rendering never sees an empty tree.
pub const EMPTY_PLACEHOLDER_TITLE: &str = "Keine gespeicherten Antworten";

/// Resolves assignment definitions for question-structure enrichment.
/// `None` (source down or assignment unknown) falls back to cached snapshots.
pub trait DefinitionLookup {
  fn definition(&self, assignment_id: &str) -> Option<&AssignmentDefinition>;
}

impl DefinitionLookup for std::collections::HashMap<String, AssignmentDefinition> {
  fn definition(&self, assignment_id: &str) -> Option<&AssignmentDefinition> {
    self.get(assignment_id)
  }
}

/// No remote definitions available at all.
pub struct NoDefinitions;

impl DefinitionLookup for NoDefinitions {
  fn definition(&self, _assignment_id: &str) -> Option<&AssignmentDefinition> {
    None
  }
}

pub fn gather(cache: &LocalCache, definitions: &impl DefinitionLookup, now: DateTime<Utc>) -> SubmissionPayload {
  // Group answer entries by (assignment, sub); keep the rest addressable.
  let mut snapshots: BTreeMap<String, String> = BTreeMap::new();
  let mut answers: BTreeMap<(String, String), BTreeMap<String, String>> = BTreeMap::new();
  for (raw_key, value) in cache.entries() {
    match CacheKey::decode(&raw_key) {
      Ok(CacheKey::Answer { assignment, sub, question }) => {
        answers.entry((assignment, sub)).or_default().insert(question, value);
      }
      Ok(_) => {
        snapshots.insert(raw_key, value);
      }
      Err(_) => {
        // Foreign keys in the store are ignored, not an error.
      }
    }
  }

  let mut assignments: BTreeMap<String, BTreeMap<String, DraftEntry>> = BTreeMap::new();
  for ((assignment, sub), group) in answers {
    let cached_questions: Vec<Question> = CacheKey::questions(&assignment, &sub)
      .ok()
      .and_then(|k| snapshots.get(&k.encode()))
      .and_then(|raw| serde_json::from_str(raw).ok())
      .unwrap_or_default();

    // Merge policy: the remote definition's question list wins only when it
    // is non-empty; otherwise the cached snapshot stands.
    let remote_questions: Vec<Question> = definitions
      .definition(&assignment)
      .map(|d| d.questions_of(&sub))
      .unwrap_or_default();
    let questions = if remote_questions.is_empty() { cached_questions } else { remote_questions };

    let title = CacheKey::title(&assignment, &sub)
      .ok()
      .and_then(|k| snapshots.get(&k.encode()).cloned())
      .or_else(|| {
        definitions
          .definition(&assignment)
          .and_then(|d| d.pages.iter().find(|p| p.id == sub))
          .map(|p| p.title.clone())
      })
      .unwrap_or_else(|| sub.clone());

    // Canonical question order first, leftover answers sorted by id after.
    let mut remaining = group;
    let mut ordered: Vec<DraftAnswer> = Vec::new();
    for q in &questions {
      if let Some(answer) = remaining.remove(&q.id) {
        ordered.push(DraftAnswer { question_id: q.id.clone(), answer });
      }
    }
    for (question_id, answer) in remaining {
      ordered.push(DraftAnswer { question_id, answer });
    }

    assignments
      .entry(assignment)
      .or_default()
      .insert(sub, DraftEntry { title, questions, answers: ordered });
  }

  if assignments.is_empty() {
    debug!(target: "sync", "Gather found no answers; emitting placeholder entry");
    let mut subs = BTreeMap::new();
    subs.insert(
      "-".to_string(),
      DraftEntry { title: EMPTY_PLACEHOLDER_TITLE.to_string(), questions: vec![], answers: vec![] },
    );
    assignments.insert("-".to_string(), subs);
  }

  SubmissionPayload { assignments, created_at: now }
}
