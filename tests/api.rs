//! End-to-end tests over the assembled router: edit events flowing into the
//! submission document, the legacy action endpoint, and the teacher gates.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use aufgaben_backend::config::Config;
use aufgaben_backend::routes::build_router;
use aufgaben_backend::state::AppState;

fn test_router() -> (Router, Arc<AppState>) {
  let config = Config { teacher_key: Some("geheim".into()), ..Config::default() };
  let state = Arc::new(AppState::with_config(config));
  (build_router(state.clone()), state)
}

async fn send_json(router: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
  let req = Request::builder()
    .method(method)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .expect("request");
  let resp = router.clone().oneshot(req).await.expect("response");
  let status = resp.status();
  let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
  (status, value)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
  let req = Request::builder().uri(uri).body(Body::empty()).expect("request");
  let resp = router.clone().oneshot(req).await.expect("response");
  let status = resp.status();
  let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
  let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
  (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
  let (router, _state) = test_router();
  let (status, body) = get(&router, "/api/v1/health").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body, json!({"ok": true}));
}

#[tokio::test(start_paused = true)]
async fn answer_event_lands_in_submission_document_after_quiet_window() {
  let (router, _state) = test_router();

  let (status, body) = send_json(
    &router,
    "POST",
    "/api/v1/answer",
    json!({"uid": "u1", "assignmentId": "A1", "pageId": "P1", "elementId": "Q1", "content": "Hello"}),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "success");

  // Before the quiet window closes, nothing has been written.
  let (_, body) = get(&router, "/api/v1/submission/u1").await;
  assert_eq!(body["document"], json!({}));

  tokio::time::sleep(Duration::from_millis(2000)).await;

  let (status, body) = get(&router, "/api/v1/submission/u1").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["document"], json!({"A1": {"P1": {"Q1": "Hello"}}}));
}

#[tokio::test(start_paused = true)]
async fn sibling_answers_merge_without_clobbering() {
  let (router, _state) = test_router();
  for (element, content) in [("Q1", "eins"), ("Q2", "zwei")] {
    send_json(
      &router,
      "POST",
      "/api/v1/answer",
      json!({"uid": "u1", "assignmentId": "A1", "pageId": "P1", "elementId": element, "content": content}),
    )
    .await;
  }
  tokio::time::sleep(Duration::from_millis(2000)).await;

  let (_, body) = get(&router, "/api/v1/submission/u1").await;
  assert_eq!(body["document"], json!({"A1": {"P1": {"Q1": "eins", "Q2": "zwei"}}}));
}

#[tokio::test]
async fn missing_assignment_definition_is_not_found() {
  let (router, _state) = test_router();
  let (status, body) = get(&router, "/api/v1/assignments/does-not-exist").await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn legacy_submit_list_and_get_round_trip() {
  let (router, _state) = test_router();

  let payload = json!({
    "assignments": {"A1": {"P1": {"title": "Seite 1", "questions": [{"id": "Q1", "text": "Frage?"}], "answers": [{"questionId": "Q1", "answer": "<p>Hallo</p>"}]}}},
    "createdAt": "2026-08-26T10:00:00Z"
  });
  let (status, body) = send_json(
    &router,
    "POST",
    "/api/v1/legacy",
    json!({"action": "submit", "identifier": "7A_Muster", "payload": payload}),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "success");

  // Reads are teacher-gated.
  let (status, body) = send_json(
    &router,
    "POST",
    "/api/v1/legacy",
    json!({"action": "listDrafts", "teacherKey": "falsch"}),
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(body["status"], "error");

  let (status, listing) = send_json(
    &router,
    "POST",
    "/api/v1/legacy",
    json!({"action": "listDrafts", "teacherKey": "geheim"}),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let drafts = listing["7A"]["Muster"].as_array().expect("draft list");
  assert_eq!(drafts.len(), 1);
  let path = drafts[0]["path"].as_str().expect("path");

  let (status, draft) = send_json(
    &router,
    "POST",
    "/api/v1/legacy",
    json!({"action": "getDraft", "teacherKey": "geheim", "draftPath": path}),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(draft["assignments"]["A1"]["P1"]["answers"][0]["answer"], "<p>Hallo</p>");
}

#[tokio::test(start_paused = true)]
async fn dashboard_aggregates_registered_students() {
  let (router, _state) = test_router();

  let (status, class) = send_json(
    &router,
    "POST",
    "/api/v1/admin/classes",
    json!({"teacherKey": "geheim", "className": "7A", "teacherId": "t1"}),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let code = class["registrationCode"].as_str().expect("code");
  let class_id = class["id"].as_str().expect("id");

  let (status, student) = send_json(
    &router,
    "POST",
    "/api/v1/register",
    json!({"code": code, "displayName": "Anna Muster", "email": "anna@example.org"}),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let uid = student["uid"].as_str().expect("uid");

  send_json(
    &router,
    "POST",
    "/api/v1/answer",
    json!({"uid": uid, "assignmentId": "A1", "pageId": "P1", "elementId": "Q1", "content": "Hello"}),
  )
  .await;
  send_json(&router, "POST", &format!("/api/v1/presence/{uid}"), json!({})).await;
  tokio::time::sleep(Duration::from_millis(2000)).await;

  let (status, _) = get(&router, "/api/v1/dashboard?teacherKey=falsch").await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, view) = get(
    &router,
    &format!("/api/v1/dashboard?teacherKey=geheim&classId={class_id}&assignmentId=A1"),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(view["assignments"], json!(["A1"]));
  let students = view["classes"][0]["students"].as_array().expect("rows");
  assert_eq!(students.len(), 1);
  assert_eq!(students[0]["displayName"], "Anna Muster");
  assert_eq!(students[0]["answerCount"], 1);
}
