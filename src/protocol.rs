//! Public protocol structs for the HTTP API, the legacy submit endpoint and
//! the dashboard WebSocket feed (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dashboard::DashboardView;
use crate::domain::SubmissionPayload;

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

/// One edit event from a student editor.
#[derive(Debug, Deserialize)]
pub struct AnswerIn {
  pub uid: String,
  #[serde(rename = "assignmentId")]
  pub assignment_id: String,
  #[serde(rename = "pageId")]
  pub page_id: String,
  #[serde(rename = "elementId")]
  pub element_id: String,
  pub content: String,
}

/// Legacy status envelope: `{status:"success"}` or `{status:"error", message}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusOut {
  pub status: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

impl StatusOut {
  pub fn success() -> Self {
    StatusOut { status: "success".into(), message: None }
  }

  pub fn error(message: impl Into<String>) -> Self {
    StatusOut { status: "error".into(), message: Some(message.into()) }
  }

  pub fn is_success(&self) -> bool {
    self.status == "success"
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegacyAction {
  ListDrafts,
  GetDraft,
  Submit,
}

/// Action-dispatch body of the legacy endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LegacyRequest {
  pub action: LegacyAction,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub identifier: Option<String>,
  #[serde(rename = "teacherKey", skip_serializing_if = "Option::is_none")]
  pub teacher_key: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub payload: Option<SubmissionPayload>,
  #[serde(rename = "draftPath", skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
}

impl LegacyRequest {
  pub fn submit(identifier: &str, payload: SubmissionPayload) -> Self {
    LegacyRequest {
      action: LegacyAction::Submit,
      identifier: Some(identifier.to_string()),
      teacher_key: None,
      payload: Some(payload),
      path: None,
    }
  }

  pub fn list_drafts(teacher_key: &str) -> Self {
    LegacyRequest {
      action: LegacyAction::ListDrafts,
      identifier: None,
      teacher_key: Some(teacher_key.to_string()),
      payload: None,
      path: None,
    }
  }

  pub fn get_draft(teacher_key: &str, path: &str) -> Self {
    LegacyRequest {
      action: LegacyAction::GetDraft,
      identifier: None,
      teacher_key: Some(teacher_key.to_string()),
      payload: None,
      path: Some(path.to_string()),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
  #[serde(rename = "teacherKey")]
  pub teacher_key: Option<String>,
  #[serde(rename = "classId")]
  pub class_id: Option<String>,
  #[serde(rename = "assignmentId")]
  pub assignment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateClassIn {
  #[serde(rename = "teacherKey")]
  pub teacher_key: Option<String>,
  #[serde(rename = "className")]
  pub class_name: String,
  #[serde(rename = "teacherId")]
  pub teacher_id: String,
}

#[derive(Serialize)]
pub struct ClassOut {
  pub id: String,
  #[serde(rename = "className")]
  pub class_name: String,
  #[serde(rename = "registrationCode")]
  pub registration_code: String,
}

/// Self-registration with a class code, as on the login surface.
#[derive(Debug, Deserialize)]
pub struct RegisterIn {
  pub code: String,
  #[serde(rename = "displayName")]
  pub display_name: String,
  pub email: String,
}

#[derive(Serialize)]
pub struct RegisterOut {
  pub uid: String,
  #[serde(rename = "classId")]
  pub class_id: String,
  #[serde(rename = "className")]
  pub class_name: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
  #[serde(rename = "teacherKey")]
  pub teacher_key: Option<String>,
}

/// Messages the dashboard client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  /// Select the pane; the server pushes a fresh view now and after every
  /// collection delta.
  Subscribe {
    #[serde(rename = "teacherKey")]
    teacher_key: Option<String>,
    #[serde(rename = "classId")]
    class_id: Option<String>,
    #[serde(rename = "assignmentId")]
    assignment_id: Option<String>,
  },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  Dashboard { view: DashboardView },
  Error { message: String },
}

/// Submission document response; absent documents serialize as `{}`.
#[derive(Serialize)]
pub struct SubmissionOut {
  pub uid: String,
  pub document: Value,
}
