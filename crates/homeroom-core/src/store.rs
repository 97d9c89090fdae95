//! The `DocumentStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `homeroom-store-sqlite`, or [`MemoryStore`](crate::memory::MemoryStore)
//! for tests). The tracker and the projector depend on this abstraction,
//! never on a concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
  homework::{Homework, HomeworkPatch, NewHomework},
  subject::{NewSubject, Subject},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Which slice of the `homework` collection a query covers. Each filter
/// carries its own ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomeworkFilter {
  /// `completed = false`, by `due_date` ascending.
  Active,
  /// `completed = true`, by `completed_at` descending.
  Archived,
}

impl HomeworkFilter {
  pub fn completed(self) -> bool { matches!(self, Self::Archived) }

  pub fn matches(self, hw: &Homework) -> bool { hw.completed == self.completed() }

  /// Keep the matching records and put them in this filter's order.
  pub fn apply(self, mut records: Vec<Homework>) -> Vec<Homework> {
    records.retain(|hw| self.matches(hw));
    match self {
      Self::Active => records.sort_by(|a, b| a.due_date.cmp(&b.due_date)),
      Self::Archived => records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at)),
    }
    records
  }
}

/// Put subjects in display order (by name).
pub fn order_subjects(mut subjects: Vec<Subject>) -> Vec<Subject> {
  subjects.sort_by(|a, b| a.name.cmp(&b.name));
  subjects
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// A live query. Yields a full snapshot first and then again after every
/// change to the underlying collection.
///
/// Dropping the subscription releases it; the producer notices the closed
/// channel and stops.
pub struct Subscription<T> {
  rx: watch::Receiver<Option<Vec<T>>>,
}

impl<T: Clone> Subscription<T> {
  pub(crate) fn new(rx: watch::Receiver<Option<Vec<T>>>) -> Self { Self { rx } }

  /// Wait for the next snapshot. Intermediate snapshots may be skipped; the
  /// newest one always wins. Returns `None` once the producer has stopped.
  pub async fn next(&mut self) -> Option<Vec<T>> {
    loop {
      self.rx.changed().await.ok()?;
      if let Some(snapshot) = self.rx.borrow_and_update().clone() {
        return Some(snapshot);
      }
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the document store backing Homeroom.
///
/// Two collections exist: `subjects` and `homework`. Writes that target a
/// missing id report it in-band (`None` / `false`) so callers can tell a
/// missing record apart from a rejected write.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Live queries ──────────────────────────────────────────────────────

  /// Subscribe to all subjects, ordered by name.
  fn subscribe_subjects(
    &self,
  ) -> impl Future<Output = Result<Subscription<Subject>, Self::Error>> + Send + '_;

  /// Subscribe to one slice of the homework collection.
  fn subscribe_homework(
    &self,
    filter: HomeworkFilter,
  ) -> impl Future<Output = Result<Subscription<Homework>, Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  fn list_subjects(&self) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Retrieve a subject by id. Returns `None` if not found.
  fn get_subject(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Persist a new subject and return it with its assigned id.
  fn insert_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  /// Remove a subject. Returns `false` if it did not exist.
  fn delete_subject(&self, id: Uuid) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Homework ──────────────────────────────────────────────────────────

  fn list_homework(
    &self,
    filter: HomeworkFilter,
  ) -> impl Future<Output = Result<Vec<Homework>, Self::Error>> + Send + '_;

  /// Retrieve a homework item by id. Returns `None` if not found.
  fn get_homework(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Homework>, Self::Error>> + Send + '_;

  /// Persist a new homework item and return it with its assigned id.
  fn insert_homework(
    &self,
    input: NewHomework,
  ) -> impl Future<Output = Result<Homework, Self::Error>> + Send + '_;

  /// Apply `patch` to an existing item. Returns `None` if it did not exist.
  fn update_homework(
    &self,
    id: Uuid,
    patch: HomeworkPatch,
  ) -> impl Future<Output = Result<Option<Homework>, Self::Error>> + Send + '_;

  /// Remove a homework item. Returns `false` if it did not exist.
  fn delete_homework(&self, id: Uuid)
  -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
