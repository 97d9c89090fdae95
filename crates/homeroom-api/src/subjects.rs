//! Handlers for `/subjects` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/subjects` | Ordered by name |
//! | `POST`   | `/subjects` | Body: `{"name":"Math","color":"#ff0000"}`; `color` optional |
//! | `DELETE` | `/subjects/:id` | 409 while homework still refers to it |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use homeroom_core::{
  store::DocumentStore,
  subject::{NewSubject, Subject},
};
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /subjects`
pub async fn list<S>(State(state): State<ApiState<S>>) -> Result<Json<Vec<Subject>>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(state.tracker.list_subjects().await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /subjects` — returns 201 + the stored subject.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  ApiJson(body): ApiJson<NewSubject>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
{
  let subject = state.tracker.create_subject(body).await?;
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /subjects/:id`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DocumentStore,
{
  state.tracker.delete_subject(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
