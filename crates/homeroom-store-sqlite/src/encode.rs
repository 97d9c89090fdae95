//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed microsecond
//! precision, so lexical order in SQL matches chronological order. Dates are
//! stored as `YYYY-MM-DD`. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use homeroom_core::{
  homework::{Homework, HomeworkPatch},
  subject::Subject,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// Drop precision the column cannot hold, so values read back compare equal.
pub fn truncate_dt(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const SUBJECT_COLUMNS: &str = "id, name, color";

pub const HOMEWORK_COLUMNS: &str =
  "id, subject_id, due_date, description, completed, created_at, completed_at";

/// Raw strings read directly from a `subjects` row.
pub struct RawSubject {
  pub id:    String,
  pub name:  String,
  pub color: String,
}

impl RawSubject {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { id: row.get(0)?, name: row.get(1)?, color: row.get(2)? })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      id:    decode_uuid(&self.id)?,
      name:  self.name,
      color: self.color.parse()?,
    })
  }
}

/// Raw values read directly from a `homework` row.
pub struct RawHomework {
  pub id:           String,
  pub subject_id:   String,
  pub due_date:     String,
  pub description:  String,
  pub completed:    bool,
  pub created_at:   String,
  pub completed_at: Option<String>,
}

impl RawHomework {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      subject_id:   row.get(1)?,
      due_date:     row.get(2)?,
      description:  row.get(3)?,
      completed:    row.get(4)?,
      created_at:   row.get(5)?,
      completed_at: row.get(6)?,
    })
  }

  pub fn into_homework(self) -> Result<Homework> {
    Ok(Homework {
      id:           decode_uuid(&self.id)?,
      subject_id:   decode_uuid(&self.subject_id)?,
      due_date:     decode_date(&self.due_date)?,
      description:  self.description,
      completed:    self.completed,
      created_at:   decode_dt(&self.created_at)?,
      completed_at: self.completed_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Column values for writing a full `homework` row, in
/// [`HOMEWORK_COLUMNS`] order.
pub struct HomeworkRow {
  pub id:           String,
  pub subject_id:   String,
  pub due_date:     String,
  pub description:  String,
  pub completed:    bool,
  pub created_at:   String,
  pub completed_at: Option<String>,
}

impl HomeworkRow {
  pub fn encode(hw: &Homework) -> Self {
    Self {
      id:           encode_uuid(hw.id),
      subject_id:   encode_uuid(hw.subject_id),
      due_date:     encode_date(hw.due_date),
      description:  hw.description.clone(),
      completed:    hw.completed,
      created_at:   encode_dt(hw.created_at),
      completed_at: hw.completed_at.map(encode_dt),
    }
  }
}

/// Column values for a partial `homework` update. `None` keeps the stored
/// value.
pub struct HomeworkPatchRow {
  pub subject_id:       Option<String>,
  pub due_date:         Option<String>,
  pub description:      Option<String>,
  pub completed:        Option<bool>,
  /// Whether `completed_at` is written at all; it may be written as NULL.
  pub set_completed_at: bool,
  pub completed_at:     Option<String>,
}

impl HomeworkPatchRow {
  pub fn encode(patch: HomeworkPatch) -> Self {
    let completed_at = patch.completed_at.map(|at| at.map(|dt| encode_dt(truncate_dt(dt))));
    Self {
      subject_id:       patch.subject_id.map(encode_uuid),
      due_date:         patch.due_date.map(encode_date),
      description:      patch.description,
      completed:        patch.completed,
      set_completed_at: completed_at.is_some(),
      completed_at:     completed_at.flatten(),
    }
  }
}
