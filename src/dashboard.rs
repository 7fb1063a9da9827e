//! Teacher aggregation view: a navigable matrix of class × assignment ×
//! student × answers, computed from the submission documents plus class,
//! user and presence collections.
//!
//! Assignments have no registry; they are discovered as the distinct
//! top-level keys across all submission documents. Two pseudo-classes let
//! the teacher filter across the class structure: every student with at
//! least one submission, and students with no class assignment.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{ClassRecord, PresenceRecord, PresenceTier, Role, UserRecord};

/// Pseudo-class ids (never valid collection ids).
pub const CLASS_ALL_SUBMITTED: &str = "~submitted";
pub const CLASS_UNASSIGNED: &str = "~unassigned";

#[derive(Clone, Debug, Serialize)]
pub struct StudentRow {
  pub uid: String,
  #[serde(rename = "displayName")]
  pub display_name: String,
  #[serde(rename = "answerCount")]
  pub answer_count: usize,
  pub presence: PresenceTier,
}

#[derive(Clone, Debug, Serialize)]
pub struct ClassPane {
  pub id: String,
  pub name: String,
  pub students: Vec<StudentRow>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DashboardView {
  pub assignments: Vec<String>,
  #[serde(rename = "selectedAssignment")]
  pub selected_assignment: Option<String>,
  pub classes: Vec<ClassPane>,
}

/// Distinct assignment ids appearing as top-level keys, sorted.
pub fn discover_assignments(submissions: &HashMap<String, Value>) -> Vec<String> {
  let mut ids: Vec<String> = submissions
    .values()
    .filter_map(|doc| doc.as_object())
    .flat_map(|obj| obj.keys().cloned())
    .collect();
  ids.sort();
  ids.dedup();
  ids
}

/// Leaf count for one student and assignment: answers summed across pages.
/// Empty strings still count as leaves; only absence means "no answer".
pub fn answer_count(doc: &Value, assignment_id: &str) -> usize {
  doc
    .get(assignment_id)
    .and_then(|a| a.as_object())
    .map(|pages| {
      pages
        .values()
        .filter_map(|p| p.as_object())
        .map(|elements| elements.len())
        .sum()
    })
    .unwrap_or(0)
}

/// Compute the full view over consistent collection snapshots.
/// `selected_class` of `None` keeps every pane; a class id (or pseudo-class
/// id) narrows the result to that pane.
pub fn build_view(
  classes: &HashMap<String, ClassRecord>,
  users: &HashMap<String, UserRecord>,
  presence: &HashMap<String, PresenceRecord>,
  submissions: &HashMap<String, Value>,
  selected_assignment: Option<&str>,
  selected_class: Option<&str>,
  now: DateTime<Utc>,
) -> DashboardView {
  let assignments = discover_assignments(submissions);
  let selected_assignment = selected_assignment
    .map(str::to_string)
    .or_else(|| assignments.first().cloned());

  let row = |uid: &str, user: &UserRecord| StudentRow {
    uid: uid.to_string(),
    display_name: user.display_name.clone(),
    answer_count: selected_assignment
      .as_deref()
      .and_then(|a| submissions.get(uid).map(|doc| answer_count(doc, a)))
      .unwrap_or(0),
    presence: PresenceTier::classify(presence.get(uid).map(|p| p.last_active), now),
  };

  let students: Vec<(&String, &UserRecord)> =
    users.iter().filter(|(_, u)| u.role == Role::Student).collect();

  let mut panes: Vec<ClassPane> = Vec::new();

  let mut class_ids: Vec<(&String, &ClassRecord)> = classes.iter().collect();
  class_ids.sort_by(|(_, a), (_, b)| a.class_name.cmp(&b.class_name));
  for (class_id, class) in &class_ids {
    let mut rows: Vec<StudentRow> = students
      .iter()
      .filter(|(_, u)| u.class_id.as_deref() == Some(class_id.as_str()))
      .map(|(uid, u)| row(uid, u))
      .collect();
    rows.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    panes.push(ClassPane { id: (*class_id).clone(), name: class.class_name.clone(), students: rows });
  }

  // Pseudo-class: everyone with at least one submitted answer document.
  let mut submitted: Vec<StudentRow> = students
    .iter()
    .filter(|(uid, _)| submissions.get(uid.as_str()).map_or(false, |d| d.as_object().map_or(false, |o| !o.is_empty())))
    .map(|(uid, u)| row(uid, u))
    .collect();
  submitted.sort_by(|a, b| a.display_name.cmp(&b.display_name));
  panes.push(ClassPane { id: CLASS_ALL_SUBMITTED.into(), name: "Alle mit Abgabe".into(), students: submitted });

  // Pseudo-class: set difference against the known class-id set.
  let mut unassigned: Vec<StudentRow> = students
    .iter()
    .filter(|(_, u)| match &u.class_id {
      None => true,
      Some(cid) => !classes.contains_key(cid),
    })
    .map(|(uid, u)| row(uid, u))
    .collect();
  unassigned.sort_by(|a, b| a.display_name.cmp(&b.display_name));
  panes.push(ClassPane { id: CLASS_UNASSIGNED.into(), name: "Ohne Klasse".into(), students: unassigned });

  if let Some(filter) = selected_class {
    panes.retain(|p| p.id == filter);
  }

  DashboardView { assignments, selected_assignment, classes: panes }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;
  use serde_json::json;

  fn user(name: &str, class_id: Option<&str>) -> UserRecord {
    UserRecord {
      display_name: name.into(),
      email: format!("{}@example.org", name.to_lowercase()),
      role: Role::Student,
      class_id: class_id.map(str::to_string),
      registered_at: Utc::now(),
    }
  }

  fn class(name: &str) -> ClassRecord {
    ClassRecord { class_name: name.into(), teacher_id: "t1".into(), registration_code: "CODE".into() }
  }

  #[test]
  fn discovery_collects_distinct_sorted_ids() {
    let mut submissions = HashMap::new();
    submissions.insert("u1".to_string(), json!({"b": {}, "a": {}}));
    submissions.insert("u2".to_string(), json!({"a": {}, "c": {}}));
    assert_eq!(discover_assignments(&submissions), vec!["a", "b", "c"]);
  }

  #[test]
  fn answer_count_sums_leaves_across_pages() {
    let doc = json!({"a1": {"p1": {"q1": "x", "q2": ""}, "p2": {"q3": "y"}}, "a2": {"p1": {"q1": "z"}}});
    assert_eq!(answer_count(&doc, "a1"), 3);
    assert_eq!(answer_count(&doc, "a2"), 1);
    assert_eq!(answer_count(&doc, "missing"), 0);
  }

  #[test]
  fn view_sorts_students_and_tiers_presence() {
    let now = Utc::now();
    let mut classes = HashMap::new();
    classes.insert("c1".to_string(), class("7A"));
    let mut users = HashMap::new();
    users.insert("u2".to_string(), user("Zoe", Some("c1")));
    users.insert("u1".to_string(), user("Anna", Some("c1")));
    let mut presence = HashMap::new();
    presence.insert("u1".to_string(), PresenceRecord { last_active: now - Duration::seconds(10) });
    presence.insert("u2".to_string(), PresenceRecord { last_active: now - Duration::seconds(120) });
    let mut submissions = HashMap::new();
    submissions.insert("u1".to_string(), json!({"a1": {"p1": {"q1": "x"}}}));

    let view = build_view(&classes, &users, &presence, &submissions, Some("a1"), Some("c1"), now);
    assert_eq!(view.classes.len(), 1);
    let rows = &view.classes[0].students;
    assert_eq!(rows[0].display_name, "Anna");
    assert_eq!(rows[0].answer_count, 1);
    assert_eq!(rows[0].presence, PresenceTier::Active);
    assert_eq!(rows[1].display_name, "Zoe");
    assert_eq!(rows[1].answer_count, 0);
    assert_eq!(rows[1].presence, PresenceTier::Recent);
  }

  #[test]
  fn pseudo_classes_partition_by_submission_and_class_membership() {
    let now = Utc::now();
    let mut classes = HashMap::new();
    classes.insert("c1".to_string(), class("7A"));
    let mut users = HashMap::new();
    users.insert("u1".to_string(), user("Anna", Some("c1")));
    users.insert("u2".to_string(), user("Ben", None));
    users.insert("u3".to_string(), user("Cora", Some("gone-class")));
    let mut submissions = HashMap::new();
    submissions.insert("u2".to_string(), json!({"a1": {"p1": {"q1": "x"}}}));

    let view = build_view(&classes, &users, &HashMap::new(), &submissions, None, None, now);
    let submitted = view.classes.iter().find(|p| p.id == CLASS_ALL_SUBMITTED).expect("pane");
    let names: Vec<&str> = submitted.students.iter().map(|s| s.display_name.as_str()).collect();
    assert_eq!(names, vec!["Ben"]);

    let unassigned = view.classes.iter().find(|p| p.id == CLASS_UNASSIGNED).expect("pane");
    let names: Vec<&str> = unassigned.students.iter().map(|s| s.display_name.as_str()).collect();
    assert_eq!(names, vec!["Ben", "Cora"]);

    // Offline tier for students with no presence record at all.
    assert_eq!(submitted.students[0].presence, PresenceTier::Offline);
  }
}
