//! Due-date classification.
//!
//! Maps a due date to an urgency bucket and a display label relative to a
//! caller-supplied "today". Nothing here reads the clock except
//! [`today_local`].

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::homework::Homework;

/// How pressing a pending item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
  Overdue,
  Today,
  Soon,
  Normal,
}

/// A classified due date, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueInfo {
  pub label:   String,
  /// `None` for archived items.
  pub urgency: Option<Urgency>,
}

/// Long-form date, e.g. `Thursday, 20 June`.
pub fn format_due_date(date: NaiveDate) -> String {
  date.format("%A, %-d %B").to_string()
}

/// The current calendar date in the local time zone.
pub fn today_local() -> NaiveDate { Local::now().date_naive() }

/// Classify a pending item's due date against `today`.
pub fn classify(due: NaiveDate, today: NaiveDate) -> DueInfo {
  let tomorrow = today.checked_add_days(Days::new(1));

  let (label, urgency) = if due < today {
    (format!("overdue, {}", format_due_date(due)), Urgency::Overdue)
  } else if due == today {
    ("today".to_owned(), Urgency::Today)
  } else if Some(due) == tomorrow {
    ("tomorrow".to_owned(), Urgency::Soon)
  } else {
    (format_due_date(due), Urgency::Normal)
  };

  DueInfo { label, urgency: Some(urgency) }
}

/// Describe an item for display. Archived items skip classification and
/// always show the plain formatted date.
pub fn describe(hw: &Homework, today: NaiveDate) -> DueInfo {
  if hw.is_archived() {
    return DueInfo { label: format_due_date(hw.due_date), urgency: None };
  }
  classify(hw.due_date, today)
}
