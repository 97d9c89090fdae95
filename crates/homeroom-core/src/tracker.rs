//! [`Tracker`] — the lifecycle operations users invoke.
//!
//! Every operation is a round trip to the store. None of them touch the
//! projected views directly; those follow from the store's snapshots.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
  Error, Result,
  homework::{Homework, HomeworkInput, HomeworkPatch, NewHomework},
  lifecycle::{Step, Transition, plan},
  store::{DocumentStore, HomeworkFilter},
  subject::{NewSubject, Subject},
};

/// Lifecycle operations over a [`DocumentStore`].
pub struct Tracker<S> {
  store: Arc<S>,
}

impl<S> Clone for Tracker<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: DocumentStore> Tracker<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  // ── Subjects ──────────────────────────────────────────────────────────────

  pub async fn list_subjects(&self) -> Result<Vec<Subject>> {
    self.store.list_subjects().await.map_err(Error::read)
  }

  pub async fn create_subject(&self, input: NewSubject) -> Result<Subject> {
    let input = input.validated()?;
    let subject = self.store.insert_subject(input).await.map_err(Error::write)?;
    tracing::debug!(id = %subject.id, name = %subject.name, "subject created");
    Ok(subject)
  }

  /// Delete a subject that no homework refers to.
  ///
  /// The reference check and the delete are separate store calls, so a
  /// homework item created in between by another writer is not caught.
  pub async fn delete_subject(&self, id: Uuid) -> Result<()> {
    let mut count = 0;
    for filter in [HomeworkFilter::Active, HomeworkFilter::Archived] {
      let records = self.store.list_homework(filter).await.map_err(Error::read)?;
      count += records.iter().filter(|hw| hw.subject_id == id).count();
    }
    if count > 0 {
      return Err(Error::SubjectInUse { id, count });
    }

    if !self.store.delete_subject(id).await.map_err(Error::write)? {
      return Err(Error::SubjectNotFound(id));
    }
    tracing::debug!(%id, "subject deleted");
    Ok(())
  }

  // ── Homework ──────────────────────────────────────────────────────────────

  pub async fn list_homework(&self, filter: HomeworkFilter) -> Result<Vec<Homework>> {
    self.store.list_homework(filter).await.map_err(Error::read)
  }

  pub async fn get_homework(&self, id: Uuid) -> Result<Homework> {
    self
      .store
      .get_homework(id)
      .await
      .map_err(Error::read)?
      .ok_or(Error::HomeworkNotFound(id))
  }

  /// Record a new, active homework item.
  pub async fn create(&self, input: HomeworkInput) -> Result<Homework> {
    let input = input.normalised();
    self.ensure_subject(input.subject_id).await?;

    let draft = NewHomework { input, created_at: Utc::now() };
    let hw = self.store.insert_homework(draft).await.map_err(Error::write)?;
    tracing::debug!(id = %hw.id, due = %hw.due_date, "homework created");
    Ok(hw)
  }

  /// Replace the editable fields wholesale. Works in either state.
  pub async fn update(&self, id: Uuid, input: HomeworkInput) -> Result<Homework> {
    let input = input.normalised();
    self.ensure_subject(input.subject_id).await?;
    self.patch(id, HomeworkPatch::edit(input)).await
  }

  /// Archive an item. Completing an archived item changes nothing.
  pub async fn complete(&self, id: Uuid) -> Result<Homework> {
    self.transition(id, Transition::Complete).await
  }

  /// Bring an archived item back into the worklist. Restoring an active
  /// item changes nothing.
  pub async fn restore(&self, id: Uuid) -> Result<Homework> {
    self.transition(id, Transition::Restore).await
  }

  pub async fn delete(&self, id: Uuid) -> Result<()> {
    if !self.store.delete_homework(id).await.map_err(Error::write)? {
      return Err(Error::HomeworkNotFound(id));
    }
    tracing::debug!(%id, "homework deleted");
    Ok(())
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  async fn ensure_subject(&self, id: Uuid) -> Result<()> {
    match self.store.get_subject(id).await.map_err(Error::read)? {
      Some(_) => Ok(()),
      None => Err(Error::SubjectNotFound(id)),
    }
  }

  async fn transition(&self, id: Uuid, transition: Transition) -> Result<Homework> {
    let current = self.get_homework(id).await?;
    match plan(&current, transition, Utc::now()) {
      Step::Unchanged => Ok(current),
      Step::Apply(patch) => {
        let hw = self.patch(id, patch).await?;
        tracing::debug!(%id, %transition, state = %hw.state(), "homework transitioned");
        Ok(hw)
      }
    }
  }

  async fn patch(&self, id: Uuid, patch: HomeworkPatch) -> Result<Homework> {
    self
      .store
      .update_homework(id, patch)
      .await
      .map_err(Error::write)?
      .ok_or(Error::HomeworkNotFound(id))
  }
}
