//! Background loop that polls the daily reminder once a minute.

use std::time::Duration;

use chrono::Local;
use homeroom_core::{
  projector::Views,
  reminder::{DailyReminder, ReminderSchedule},
};
use tokio::{sync::watch, task::JoinHandle};

const POLL_EVERY: Duration = Duration::from_secs(60);

/// Poll against the projected active worklist and log each reminder.
/// The first poll happens immediately.
pub fn spawn(schedule: ReminderSchedule, views: watch::Receiver<Views>) -> JoinHandle<()> {
  tokio::spawn(async move {
    let mut reminder = DailyReminder::new(schedule);
    let mut tick = tokio::time::interval(POLL_EVERY);
    loop {
      tick.tick().await;
      let snapshot = views.borrow().clone();
      if snapshot.loading {
        continue;
      }
      if let Some(r) = reminder.poll(Local::now().naive_local(), &snapshot) {
        tracing::info!(
          target: "homeroom::reminder",
          pending = snapshot.active.len(),
          "{r}"
        );
      }
    }
  })
}
