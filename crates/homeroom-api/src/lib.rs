//! JSON REST API for Homeroom.
//!
//! Exposes an axum [`Router`] backed by any
//! [`homeroom_core::store::DocumentStore`]. Writes go through a
//! [`Tracker`]; the `/board` endpoint serves the projector's live views.
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", homeroom_api::api_router(state))
//! ```

pub mod board;
pub mod error;
pub mod extract;
pub mod homework;
pub mod subjects;

use axum::{
  Router,
  routing::{get, post},
};
use homeroom_core::{projector::Views, store::DocumentStore, tracker::Tracker};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub tracker: Tracker<S>,
  pub views:   watch::Receiver<Views>,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { tracker: self.tracker.clone(), views: self.views.clone() }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: DocumentStore + 'static,
{
  Router::new()
    // Subjects
    .route("/subjects", get(subjects::list::<S>).post(subjects::create::<S>))
    .route("/subjects/{id}", axum::routing::delete(subjects::delete_one::<S>))
    // Homework
    .route("/homework", get(homework::list::<S>).post(homework::create::<S>))
    .route(
      "/homework/{id}",
      get(homework::get_one::<S>)
        .put(homework::update_one::<S>)
        .delete(homework::delete_one::<S>),
    )
    .route("/homework/{id}/complete", post(homework::complete_one::<S>))
    .route("/homework/{id}/restore", post(homework::restore_one::<S>))
    // Projected views
    .route("/board", get(board::handler::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
