//! Router tests against the in-memory store.

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use homeroom_core::{
  memory::MemoryStore,
  projector::{LoadingGate, Projector},
  tracker::Tracker,
};
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::{ApiState, api_router};

struct Harness {
  router:    Router,
  projector: Projector<MemoryStore>,
}

async fn harness() -> Harness {
  let store = Arc::new(MemoryStore::new());
  let mut projector = Projector::new(store.clone(), LoadingGate::All);
  projector.start().await.unwrap();
  let state = ApiState { tracker: Tracker::new(store), views: projector.watch() };
  Harness { router: api_router(state), projector }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn create_math(router: &Router) -> String {
  let (status, subject) =
    send(router, "POST", "/subjects", Some(json!({"name": "Math", "color": "#ff0000"}))).await;
  assert_eq!(status, StatusCode::CREATED);
  subject["id"].as_str().unwrap().to_owned()
}

async fn create_homework(router: &Router, subject_id: &str, due: &str) -> String {
  let (status, hw) = send(
    router,
    "POST",
    "/homework",
    Some(json!({"subject_id": subject_id, "due_date": due, "description": "p.5"})),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{hw}");
  hw["id"].as_str().unwrap().to_owned()
}

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn subject_create_validates() {
  let h = harness().await;
  let (status, _) = send(&h.router, "POST", "/subjects", Some(json!({"name": "  "}))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, body) = send(&h.router, "POST", "/subjects", Some(json!({"name": "Art"}))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["color"], "#6366f1");
}

#[tokio::test]
async fn subject_delete_conflicts_while_in_use() {
  let h = harness().await;
  let math = create_math(&h.router).await;
  let hw = create_homework(&h.router, &math, "2024-06-11").await;

  let (status, body) = send(&h.router, "DELETE", &format!("/subjects/{math}"), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("still used"));

  let (status, _) = send(&h.router, "DELETE", &format!("/homework/{hw}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&h.router, "DELETE", &format!("/subjects/{math}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&h.router, "DELETE", &format!("/subjects/{math}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Homework ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn homework_with_unknown_subject_is_404() {
  let h = harness().await;
  let (status, _) = send(
    &h.router,
    "POST",
    "/homework",
    Some(json!({"subject_id": Uuid::new_v4(), "due_date": "2024-06-11"})),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn complete_and_restore_move_between_lists() {
  let h = harness().await;
  let math = create_math(&h.router).await;
  let hw = create_homework(&h.router, &math, "2024-06-11").await;

  let (status, body) = send(&h.router, "POST", &format!("/homework/{hw}/complete"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["completed"], true);
  assert!(body["completed_at"].is_string());

  let (_, active) = send(&h.router, "GET", "/homework", None).await;
  assert_eq!(active, json!([]));
  let (_, archived) = send(&h.router, "GET", "/homework?state=archived", None).await;
  assert_eq!(archived.as_array().unwrap().len(), 1);

  let (status, body) = send(&h.router, "POST", &format!("/homework/{hw}/restore"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["completed"], false);
  assert!(body["completed_at"].is_null());
  assert_eq!(body["description"], "p.5");
}

#[tokio::test]
async fn unknown_homework_ids_are_404() {
  let h = harness().await;
  let id = Uuid::new_v4();
  for (method, uri) in [
    ("GET", format!("/homework/{id}")),
    ("POST", format!("/homework/{id}/complete")),
    ("POST", format!("/homework/{id}/restore")),
    ("DELETE", format!("/homework/{id}")),
  ] {
    let (status, body) = send(&h.router, method, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
    assert!(body["error"].is_string());
  }
}

#[tokio::test]
async fn update_replaces_all_fields() {
  let h = harness().await;
  let math = create_math(&h.router).await;
  let hw = create_homework(&h.router, &math, "2024-06-11").await;

  let (status, body) = send(
    &h.router,
    "PUT",
    &format!("/homework/{hw}"),
    Some(json!({"subject_id": math, "due_date": "2024-06-15", "description": "ch. 3"})),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["due_date"], "2024-06-15");
  assert_eq!(body["description"], "ch. 3");
}

#[tokio::test]
async fn malformed_requests_are_json_400s() {
  let h = harness().await;
  let math = create_math(&h.router).await;

  let cases = [
    ("GET", "/homework?state=finished".to_owned(), None),
    ("GET", "/homework/not-a-uuid".to_owned(), None),
    ("DELETE", "/subjects/42".to_owned(), None),
    ("POST", "/homework".to_owned(), Some(json!({"subject_id": math, "due_date": "June 11"}))),
    ("POST", "/subjects".to_owned(), Some(json!({"name": "Art", "color": "green"}))),
    ("GET", "/board?today=tomorrow".to_owned(), None),
  ];
  for (method, uri, body) in cases {
    let (status, body) = send(&h.router, method, &uri, body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{method} {uri}");
    assert!(body["error"].is_string(), "{method} {uri}: {body}");
  }
}

#[tokio::test]
async fn body_without_json_content_type_is_json_400() {
  let h = harness().await;
  let req = Request::builder()
    .method("POST")
    .uri("/subjects")
    .body(Body::from(r#"{"name":"Art"}"#))
    .unwrap();
  let resp = h.router.clone().oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body: Value = serde_json::from_slice(&bytes).unwrap();
  assert!(body["error"].is_string());
}

// ─── Board ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn board_classifies_active_items() {
  let h = harness().await;
  let math = create_math(&h.router).await;
  for due in ["2024-06-20", "2024-06-09", "2024-06-11", "2024-06-10"] {
    create_homework(&h.router, &math, due).await;
  }
  let done = create_homework(&h.router, &math, "2024-06-01").await;
  send(&h.router, "POST", &format!("/homework/{done}/complete"), None).await;

  let mut rx = h.projector.watch();
  tokio::time::timeout(
    Duration::from_secs(2),
    rx.wait_for(|v| !v.loading && v.active.len() == 4 && v.archived.len() == 1),
  )
  .await
  .unwrap()
  .unwrap();

  let (status, board) = send(&h.router, "GET", "/board?today=2024-06-10", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(board["loading"], false);

  let urgencies: Vec<_> = board["active"]
    .as_array()
    .unwrap()
    .iter()
    .map(|item| item["due"]["urgency"].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(urgencies, ["overdue", "today", "soon", "normal"]);
  assert_eq!(board["active"][2]["due"]["label"], "tomorrow");

  let archived = &board["archived"][0];
  assert!(archived["due"]["urgency"].is_null());
  assert_eq!(archived["due"]["label"], "Saturday, 1 June");
}
