//! Handler for `GET /board` — the projector's views, ready to render.
//!
//! Each homework item carries its [`DueInfo`]. `today` defaults to the
//! server's local date and can be pinned with `?today=YYYY-MM-DD`.

use axum::{Json, extract::State};
use chrono::NaiveDate;
use homeroom_core::{
  due::{DueInfo, describe, today_local},
  homework::Homework,
  store::DocumentStore,
  subject::Subject,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError, extract::ApiQuery};

#[derive(Debug, Deserialize, Default)]
pub struct BoardParams {
  pub today: Option<NaiveDate>,
}

/// A homework item plus how to display its due date.
#[derive(Debug, Serialize)]
pub struct BoardItem {
  #[serde(flatten)]
  pub homework: Homework,
  pub due:      DueInfo,
}

#[derive(Debug, Serialize)]
pub struct Board {
  pub loading:  bool,
  pub today:    NaiveDate,
  pub subjects: Vec<Subject>,
  pub active:   Vec<BoardItem>,
  pub archived: Vec<BoardItem>,
}

/// `GET /board[?today=YYYY-MM-DD]`
pub async fn handler<S>(
  State(state): State<ApiState<S>>,
  ApiQuery(params): ApiQuery<BoardParams>,
) -> Result<Json<Board>, ApiError>
where
  S: DocumentStore,
{
  let views = state.views.borrow().clone();
  let today = params.today.unwrap_or_else(today_local);

  let decorate = |items: Vec<Homework>| -> Vec<BoardItem> {
    items
      .into_iter()
      .map(|homework| {
        let due = describe(&homework, today);
        BoardItem { homework, due }
      })
      .collect()
  };

  Ok(Json(Board {
    loading: views.loading,
    today,
    subjects: views.subjects,
    active: decorate(views.active),
    archived: decorate(views.archived),
  }))
}
