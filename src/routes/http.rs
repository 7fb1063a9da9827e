//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs include parameters and basic result info.

use axum::{
  extract::{Path, Query, State},
  response::{Html, IntoResponse},
  Json,
};
use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::{new_registration_code, register_student, require_teacher};
use crate::domain::ClassRecord;
use crate::error::AppError;
use crate::printer::build_print_html;
use crate::protocol::*;
use crate::state::SharedState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_assignment(
  State(state): State<SharedState>,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
  match state.definitions.fetch(&id).await {
    Ok(Some(def)) => Ok(Json(def)),
    Ok(None) => Err(AppError::NotFound(format!("Aufgabe \"{}\" wurde nicht gefunden", id))),
    Err(e) => Err(AppError::Upstream(e)),
  }
}

/// Edit event. The debounced writer coalesces bursts per element; the
/// response only acknowledges receipt, not the (later) merge-write.
#[instrument(level = "debug", skip(state, body), fields(uid = %body.uid, assignment = %body.assignment_id, element = %body.element_id, content_len = body.content.len()))]
pub async fn http_post_answer(
  State(state): State<SharedState>,
  Json(body): Json<AnswerIn>,
) -> impl IntoResponse {
  state
    .writer
    .on_answer_changed(&body.uid, &body.assignment_id, &body.page_id, &body.element_id, &body.content);
  Json(StatusOut::success())
}

#[instrument(level = "info", skip(state), fields(%uid))]
pub async fn http_get_submission(
  State(state): State<SharedState>,
  Path(uid): Path<String>,
) -> impl IntoResponse {
  let document = state.store.submission(&uid).await;
  Json(SubmissionOut { uid, document })
}

#[instrument(level = "debug", skip(state), fields(%uid))]
pub async fn http_post_presence(
  State(state): State<SharedState>,
  Path(uid): Path<String>,
) -> impl IntoResponse {
  state.store.touch_presence(&uid, Utc::now()).await;
  Json(StatusOut::success())
}

#[instrument(level = "info", skip(state, q), fields(class = q.class_id.as_deref().unwrap_or("-"), assignment = q.assignment_id.as_deref().unwrap_or("-")))]
pub async fn http_get_dashboard(
  State(state): State<SharedState>,
  Query(q): Query<DashboardQuery>,
) -> Result<impl IntoResponse, AppError> {
  require_teacher(&state.config, &state.store, q.teacher_key.as_deref(), None).await?;
  let view = state.dashboard_view(q.class_id.as_deref(), q.assignment_id.as_deref()).await;
  Ok(Json(view))
}

/// Print export: self-contained HTML for one student and assignment.
#[instrument(level = "info", skip(state), fields(%uid, %assignment))]
pub async fn http_get_print(
  State(state): State<SharedState>,
  Path((uid, assignment)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
  let definition = match state.definitions.fetch(&assignment).await {
    Ok(Some(def)) => def,
    Ok(None) => return Err(AppError::NotFound(format!("Aufgabe \"{}\" wurde nicht gefunden", assignment))),
    Err(e) => return Err(AppError::Upstream(e)),
  };
  let doc = state.store.submission(&uid).await;
  let label = {
    let users = state.store.users.read().await;
    match users.get(&uid) {
      Some(u) => {
        let classes = state.store.classes.read().await;
        let class = u
          .class_id
          .as_deref()
          .and_then(|cid| classes.get(cid))
          .map(|c| c.class_name.as_str())
          .unwrap_or("-");
        format!("{} · {}", class, u.display_name)
      }
      None => uid.clone(),
    }
  };
  Ok(Html(build_print_html(&definition, &assignment, &doc, &label)))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_register(
  State(state): State<SharedState>,
  Json(body): Json<RegisterIn>,
) -> Result<impl IntoResponse, AppError> {
  let (uid, class_id, class_name) =
    register_student(&state.store, &body.code, &body.display_name, &body.email).await?;
  Ok(Json(RegisterOut { uid, class_id, class_name }))
}

#[instrument(level = "info", skip(state, body), fields(class_name = %body.class_name))]
pub async fn http_post_class(
  State(state): State<SharedState>,
  Json(body): Json<CreateClassIn>,
) -> Result<impl IntoResponse, AppError> {
  require_teacher(&state.config, &state.store, body.teacher_key.as_deref(), Some(&body.teacher_id)).await?;
  let id = Uuid::new_v4().to_string();
  let registration_code = new_registration_code();
  state
    .store
    .upsert_class(
      id.clone(),
      ClassRecord {
        class_name: body.class_name.clone(),
        teacher_id: body.teacher_id,
        registration_code: registration_code.clone(),
      },
    )
    .await;
  Ok(Json(ClassOut { id, class_name: body.class_name, registration_code }))
}

#[instrument(level = "info", skip(state, q), fields(%id))]
pub async fn http_delete_class(
  State(state): State<SharedState>,
  Path(id): Path<String>,
  Query(q): Query<AuthQuery>,
) -> Result<impl IntoResponse, AppError> {
  require_teacher(&state.config, &state.store, q.teacher_key.as_deref(), None).await?;
  if state.store.delete_class(&id).await {
    Ok(Json(StatusOut::success()))
  } else {
    Err(AppError::NotFound(format!("Klasse \"{}\"", id)))
  }
}

#[instrument(level = "info", skip(state, q), fields(%id))]
pub async fn http_delete_user(
  State(state): State<SharedState>,
  Path(id): Path<String>,
  Query(q): Query<AuthQuery>,
) -> Result<impl IntoResponse, AppError> {
  require_teacher(&state.config, &state.store, q.teacher_key.as_deref(), None).await?;
  if state.store.delete_user(&id).await {
    Ok(Json(StatusOut::success()))
  } else {
    Err(AppError::NotFound(format!("Schüler \"{}\"", id)))
  }
}

/// Legacy action dispatch, kept wire-compatible with the old submit script:
/// `submit` stores a final payload, `listDrafts` / `getDraft` are
/// teacher-gated reads.
#[instrument(level = "info", skip(state, body), fields(action = ?body.action))]
pub async fn http_post_legacy(
  State(state): State<SharedState>,
  Json(body): Json<LegacyRequest>,
) -> Result<impl IntoResponse, AppError> {
  match body.action {
    LegacyAction::Submit => {
      let identifier = body
        .identifier
        .ok_or_else(|| AppError::BadRequest("identifier fehlt".into()))?;
      let payload = body
        .payload
        .ok_or_else(|| AppError::BadRequest("payload fehlt".into()))?;
      let path = state.store.store_final(&identifier, payload).await;
      info!(target: "sync", %identifier, %path, "Legacy submit accepted");
      Ok(Json(StatusOut::success()).into_response())
    }
    LegacyAction::ListDrafts => {
      require_teacher(&state.config, &state.store, body.teacher_key.as_deref(), None).await?;
      let listing = state.store.list_finals().await;
      let mut out = serde_json::Map::new();
      for (class, students) in listing {
        let mut class_obj = serde_json::Map::new();
        for (student, drafts) in students {
          let items: Vec<serde_json::Value> = drafts
            .into_iter()
            .map(|(name, path)| serde_json::json!({ "name": name, "path": path }))
            .collect();
          class_obj.insert(student, serde_json::Value::Array(items));
        }
        out.insert(class, serde_json::Value::Object(class_obj));
      }
      Ok(Json(serde_json::Value::Object(out)).into_response())
    }
    LegacyAction::GetDraft => {
      require_teacher(&state.config, &state.store, body.teacher_key.as_deref(), None).await?;
      let path = body.path.ok_or_else(|| AppError::BadRequest("draftPath fehlt".into()))?;
      let payload = state
        .store
        .get_final(&path)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Entwurf \"{}\"", path)))?;
      Ok(Json(payload).into_response())
    }
  }
}
