//! Handlers for `/homework` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/homework` | `?state=active\|archived`, default `active` |
//! | `POST`   | `/homework` | Body: [`HomeworkInput`]; returns 201 |
//! | `GET`    | `/homework/:id` | Single item |
//! | `PUT`    | `/homework/:id` | Body: [`HomeworkInput`]; all three fields required |
//! | `DELETE` | `/homework/:id` | Either state |
//! | `POST`   | `/homework/:id/complete` | Archive; no-op if already archived |
//! | `POST`   | `/homework/:id/restore` | Back to active; no-op if already active |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use homeroom_core::{
  homework::{Homework, HomeworkInput},
  store::{DocumentStore, HomeworkFilter},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default = "default_filter")]
  pub state: HomeworkFilter,
}

fn default_filter() -> HomeworkFilter { HomeworkFilter::Active }

/// `GET /homework[?state=<active|archived>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<Homework>>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(state.tracker.list_homework(params.state).await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /homework/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Homework>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(state.tracker.get_homework(id).await?))
}

// ─── Create / update ──────────────────────────────────────────────────────────

/// `POST /homework` — returns 201 + the stored item.
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  ApiJson(body): ApiJson<HomeworkInput>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DocumentStore,
{
  let hw = state.tracker.create(body).await?;
  Ok((StatusCode::CREATED, Json(hw)))
}

/// `PUT /homework/:id`
pub async fn update_one<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<Uuid>,
  ApiJson(body): ApiJson<HomeworkInput>,
) -> Result<Json<Homework>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(state.tracker.update(id, body).await?))
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

/// `POST /homework/:id/complete`
pub async fn complete_one<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Homework>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(state.tracker.complete(id).await?))
}

/// `POST /homework/:id/restore`
pub async fn restore_one<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Homework>, ApiError>
where
  S: DocumentStore,
{
  Ok(Json(state.tracker.restore(id).await?))
}

/// `DELETE /homework/:id`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: DocumentStore,
{
  state.tracker.delete(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
