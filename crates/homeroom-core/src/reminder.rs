//! Once-a-day reminder about pending homework.
//!
//! Best effort: the caller polls with the local wall clock (the server does
//! so once a minute) and a reminder comes out at most once per calendar day,
//! the first time a poll lands inside the configured window.

use std::fmt;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::projector::Views;

/// Items listed before the rest are summarised.
const MAX_LISTED: usize = 5;

/// When the reminder may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSchedule {
  pub hour:           u32,
  pub minute:         u32,
  pub window_minutes: u32,
}

impl Default for ReminderSchedule {
  fn default() -> Self { Self { hour: 15, minute: 0, window_minutes: 5 } }
}

impl ReminderSchedule {
  /// Whether `hour:minute` is a real wall-clock time.
  pub fn is_valid(&self) -> bool { self.hour < 24 && self.minute < 60 }

  /// An invalid schedule never fires.
  fn contains(&self, time: NaiveTime) -> bool {
    if !self.is_valid() {
      return false;
    }
    let start = self.hour * 60 + self.minute;
    let now = time.hour() * 60 + time.minute();
    now >= start && now < start.saturating_add(self.window_minutes)
  }
}

/// A reminder ready to be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
  pub title:     String,
  /// One line per listed item.
  pub lines:     Vec<String>,
  /// Pending items not listed.
  pub remaining: usize,
}

impl fmt::Display for Reminder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", self.title)?;
    write!(f, "{}", self.lines.join("\n"))?;
    if self.remaining > 0 {
      write!(f, "\n...and {} more", self.remaining)?;
    }
    Ok(())
  }
}

/// Fires at most once per calendar day.
#[derive(Debug, Clone, Default)]
pub struct DailyReminder {
  schedule: ReminderSchedule,
  fired_on: Option<NaiveDate>,
}

impl DailyReminder {
  pub fn new(schedule: ReminderSchedule) -> Self { Self { schedule, fired_on: None } }

  /// Check the clock. Inside the window the day is marked as handled even
  /// when there is nothing pending, so an item added later that afternoon
  /// does not trigger a second reminder.
  pub fn poll(&mut self, now: NaiveDateTime, views: &Views) -> Option<Reminder> {
    let today = now.date();
    if self.fired_on == Some(today) || !self.schedule.contains(now.time()) {
      return None;
    }
    self.fired_on = Some(today);

    if views.active.is_empty() {
      return None;
    }
    Some(compose(views, today))
  }
}

/// Build the reminder body from the active worklist.
pub fn compose(views: &Views, today: NaiveDate) -> Reminder {
  let tomorrow = today.checked_add_days(Days::new(1));
  let lines = views
    .active
    .iter()
    .take(MAX_LISTED)
    .map(|hw| {
      let subject = views.subject(hw.subject_id).map_or("Subject", |s| s.name.as_str());
      let tag = if hw.due_date <= today {
        " (today!)"
      } else if Some(hw.due_date) == tomorrow {
        " (tomorrow)"
      } else {
        ""
      };
      format!("• {subject}{tag}")
    })
    .collect();

  Reminder {
    title: "Homework pending!".to_owned(),
    lines,
    remaining: views.active.len().saturating_sub(MAX_LISTED),
  }
}
