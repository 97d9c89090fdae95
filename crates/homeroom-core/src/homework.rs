//! Homework records and the write shapes used to create and patch them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::HomeworkState;

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted homework item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Homework {
  pub id:           Uuid,
  pub subject_id:   Uuid,
  pub due_date:     NaiveDate,
  pub description:  String,
  pub completed:    bool,
  /// Set once at creation; never patched.
  pub created_at:   DateTime<Utc>,
  /// Present exactly while the item is archived.
  pub completed_at: Option<DateTime<Utc>>,
}

impl Homework {
  pub fn state(&self) -> HomeworkState {
    if self.completed {
      HomeworkState::Archived
    } else {
      HomeworkState::Active
    }
  }

  pub fn is_archived(&self) -> bool { self.completed }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// The user-editable fields. Updates always carry all three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeworkInput {
  pub subject_id:  Uuid,
  pub due_date:    NaiveDate,
  #[serde(default)]
  pub description: String,
}

impl HomeworkInput {
  pub fn new(
    subject_id: Uuid,
    due_date: NaiveDate,
    description: impl Into<String>,
  ) -> Self {
    Self { subject_id, due_date, description: description.into() }
  }

  pub(crate) fn normalised(self) -> Self {
    Self { description: self.description.trim().to_owned(), ..self }
  }
}

/// A homework item ready to be inserted; the store only assigns the id.
#[derive(Debug, Clone)]
pub struct NewHomework {
  pub input:      HomeworkInput,
  pub created_at: DateTime<Utc>,
}

impl NewHomework {
  /// Build the record the store persists for this draft.
  pub fn into_homework(self, id: Uuid) -> Homework {
    Homework {
      id,
      subject_id: self.input.subject_id,
      due_date: self.input.due_date,
      description: self.input.description,
      completed: false,
      created_at: self.created_at,
      completed_at: None,
    }
  }
}

// ─── Patch ───────────────────────────────────────────────────────────────────

/// A partial update. `None` leaves the field untouched.
///
/// `completed_at` is doubly optional: `Some(None)` clears the timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HomeworkPatch {
  pub subject_id:   Option<Uuid>,
  pub due_date:     Option<NaiveDate>,
  pub description:  Option<String>,
  pub completed:    Option<bool>,
  pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl HomeworkPatch {
  /// Replace the three editable fields wholesale.
  pub fn edit(input: HomeworkInput) -> Self {
    Self {
      subject_id: Some(input.subject_id),
      due_date: Some(input.due_date),
      description: Some(input.description),
      ..Self::default()
    }
  }

  pub fn complete(at: DateTime<Utc>) -> Self {
    Self {
      completed: Some(true),
      completed_at: Some(Some(at)),
      ..Self::default()
    }
  }

  pub fn restore() -> Self {
    Self {
      completed: Some(false),
      completed_at: Some(None),
      ..Self::default()
    }
  }

  pub fn apply(self, hw: &mut Homework) {
    if let Some(v) = self.subject_id {
      hw.subject_id = v;
    }
    if let Some(v) = self.due_date {
      hw.due_date = v;
    }
    if let Some(v) = self.description {
      hw.description = v;
    }
    if let Some(v) = self.completed {
      hw.completed = v;
    }
    if let Some(v) = self.completed_at {
      hw.completed_at = v;
    }
  }
}
