//! Domain models: assignment definitions, collection records, presence tiers,
//! and the gathered draft/submission payload shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Assignment definition as served from `assignments/{id}.json`.
/// Read-only input for the editor, the printer and the dashboard.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssignmentDefinition {
  #[serde(rename = "assignmentTitle")]
  pub assignment_title: String,
  pub pages: Vec<Page>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page {
  pub id: String,
  pub title: String,
  #[serde(rename = "helpText", default, skip_serializing_if = "Option::is_none")]
  pub help_text: Option<String>,
  pub elements: Vec<Element>,
}

/// A page element is either a static text block or an answerable prompt.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
  Text { content: String },
  Quill { id: String, question: String },
}

impl AssignmentDefinition {
  /// Page ids must be unique within the assignment, element ids unique within a page.
  pub fn validate(&self) -> Result<(), String> {
    let mut page_ids = std::collections::HashSet::new();
    for page in &self.pages {
      if !page_ids.insert(page.id.as_str()) {
        return Err(format!("duplicate page id '{}'", page.id));
      }
      let mut element_ids = std::collections::HashSet::new();
      for el in &page.elements {
        if let Element::Quill { id, .. } = el {
          if !element_ids.insert(id.as_str()) {
            return Err(format!("duplicate element id '{}' on page '{}'", id, page.id));
          }
        }
      }
    }
    Ok(())
  }

  /// All answerable prompts of one page, in page order.
  pub fn questions_of(&self, page_id: &str) -> Vec<Question> {
    self
      .pages
      .iter()
      .filter(|p| p.id == page_id)
      .flat_map(|p| p.elements.iter())
      .filter_map(|el| match el {
        Element::Quill { id, question } => Some(Question { id: id.clone(), text: question.clone() }),
        Element::Text { .. } => None,
      })
      .collect()
  }
}

/// Question as carried in cached snapshots and gathered payloads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassRecord {
  #[serde(rename = "className")]
  pub class_name: String,
  #[serde(rename = "teacherId")]
  pub teacher_id: String,
  #[serde(rename = "registrationCode")]
  pub registration_code: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Teacher,
  Student,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
  #[serde(rename = "displayName")]
  pub display_name: String,
  pub email: String,
  pub role: Role,
  #[serde(rename = "classId", default, skip_serializing_if = "Option::is_none")]
  pub class_id: Option<String>,
  #[serde(rename = "registeredAt")]
  pub registered_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresenceRecord {
  #[serde(rename = "lastActive")]
  pub last_active: DateTime<Utc>,
}

/// Coarse recency classification derived from a last-seen timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceTier {
  Active,
  Recent,
  Inactive,
  Offline,
}

impl PresenceTier {
  /// Tier boundaries: active < 30s, recent < 300s, otherwise inactive.
  /// `Offline` is reserved for students with no presence record at all.
  pub fn classify(last_active: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
    match last_active {
      None => PresenceTier::Offline,
      Some(ts) => {
        let age = now.signed_duration_since(ts).num_seconds();
        if age < 30 {
          PresenceTier::Active
        } else if age < 300 {
          PresenceTier::Recent
        } else {
          PresenceTier::Inactive
        }
      }
    }
  }
}

/// One gathered sub-assignment: title, canonical question list, and answers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEntry {
  pub title: String,
  pub questions: Vec<Question>,
  pub answers: Vec<DraftAnswer>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftAnswer {
  #[serde(rename = "questionId")]
  pub question_id: String,
  pub answer: String,
}

/// Payload accepted by the legacy submit endpoint; also what the gatherer emits.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionPayload {
  pub assignments: std::collections::BTreeMap<String, std::collections::BTreeMap<String, DraftEntry>>,
  #[serde(rename = "createdAt")]
  pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  #[test]
  fn presence_tier_boundaries() {
    let now = Utc::now();
    assert_eq!(PresenceTier::classify(Some(now - Duration::seconds(10)), now), PresenceTier::Active);
    assert_eq!(PresenceTier::classify(Some(now - Duration::seconds(120)), now), PresenceTier::Recent);
    assert_eq!(PresenceTier::classify(Some(now - Duration::seconds(600)), now), PresenceTier::Inactive);
    assert_eq!(PresenceTier::classify(None, now), PresenceTier::Offline);
  }

  #[test]
  fn presence_tier_exact_edges() {
    let now = Utc::now();
    assert_eq!(PresenceTier::classify(Some(now - Duration::seconds(30)), now), PresenceTier::Recent);
    assert_eq!(PresenceTier::classify(Some(now - Duration::seconds(300)), now), PresenceTier::Inactive);
  }

  #[test]
  fn definition_validation_rejects_duplicate_ids() {
    let def = AssignmentDefinition {
      assignment_title: "T".into(),
      pages: vec![
        Page {
          id: "p1".into(),
          title: "P1".into(),
          help_text: None,
          elements: vec![
            Element::Quill { id: "q1".into(), question: "A?".into() },
            Element::Quill { id: "q1".into(), question: "B?".into() },
          ],
        },
      ],
    };
    assert!(def.validate().is_err());
  }

  #[test]
  fn definition_json_shape_matches_assignment_files() {
    let raw = r#"{
      "assignmentTitle": "Modul 1",
      "pages": [
        {
          "id": "p1",
          "title": "Einstieg",
          "helpText": "<p>Hilfe</p>",
          "elements": [
            { "type": "text", "content": "<p>Lies den Text.</p>" },
            { "type": "quill", "id": "q1", "question": "Was denkst du?" }
          ]
        }
      ]
    }"#;
    let def: AssignmentDefinition = serde_json::from_str(raw).expect("parse");
    assert_eq!(def.assignment_title, "Modul 1");
    assert_eq!(def.questions_of("p1"), vec![Question { id: "q1".into(), text: "Was denkst du?".into() }]);
    def.validate().expect("valid");
  }
}
