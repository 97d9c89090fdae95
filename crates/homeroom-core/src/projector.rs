//! The view projector.
//!
//! Keeps three display sequences in step with the store by holding one live
//! subscription per sequence:
//!
//! | Sequence   | Source                      | Order                  |
//! |------------|-----------------------------|------------------------|
//! | `subjects` | all subjects                | `name` ascending       |
//! | `active`   | homework, `completed=false` | `due_date` ascending   |
//! | `archived` | homework, `completed=true`  | `completed_at` desc    |
//!
//! Every snapshot replaces its sequence wholesale. The projector re-applies
//! the filter and the order itself, so the guarantees above hold whatever the
//! backend delivers.
//!
//! A subscription that fails to start, or whose stream ends, is logged; its
//! sequence keeps its last value and `loading` is cleared so consumers never
//! wait forever.

use std::{future, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
  Error, Result,
  homework::Homework,
  store::{DocumentStore, HomeworkFilter, Subscription, order_subjects},
  subject::Subject,
};

// ─── Views ───────────────────────────────────────────────────────────────────

/// The projected, read-only state consumers render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Views {
  pub subjects: Vec<Subject>,
  pub active:   Vec<Homework>,
  pub archived: Vec<Homework>,
  /// True until the gating subscriptions have each delivered a snapshot.
  pub loading:  bool,
}

impl Default for Views {
  fn default() -> Self {
    Self {
      subjects: Vec::new(),
      active:   Vec::new(),
      archived: Vec::new(),
      loading:  true,
    }
  }
}

impl Views {
  pub fn subject(&self, id: uuid::Uuid) -> Option<&Subject> {
    self.subjects.iter().find(|s| s.id == id)
  }
}

/// Which first snapshots clear `loading`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingGate {
  /// Subjects and active homework. The archive loads in the background.
  #[default]
  SubjectsAndActive,
  /// All three sequences.
  All,
}

// ─── Projector ───────────────────────────────────────────────────────────────

/// Owns the live subscriptions and publishes [`Views`].
///
/// The subscriptions live inside one background task. [`Projector::stop`]
/// and dropping the projector both cancel that task, which releases every
/// subscription it holds.
pub struct Projector<S> {
  store:  Arc<S>,
  gate:   LoadingGate,
  views:  watch::Sender<Views>,
  cancel: Option<CancellationToken>,
  handle: Option<JoinHandle<()>>,
}

impl<S> Projector<S>
where
  S: DocumentStore + 'static,
{
  pub fn new(store: Arc<S>, gate: LoadingGate) -> Self {
    let (views, _) = watch::channel(Views::default());
    Self { store, gate, views, cancel: None, handle: None }
  }

  /// The current views.
  pub fn views(&self) -> Views { self.views.borrow().clone() }

  /// A receiver that observes every published [`Views`].
  pub fn watch(&self) -> watch::Receiver<Views> { self.views.subscribe() }

  pub fn is_running(&self) -> bool { self.handle.is_some() }

  /// Open the three subscriptions and start projecting.
  ///
  /// Subscription failures do not fail `start`; they are handled like a
  /// stream that ended (see the module docs).
  pub async fn start(&mut self) -> Result<()> {
    if self.handle.is_some() {
      return Err(Error::AlreadyStarted);
    }
    self.views.send_replace(Views::default());

    let subjects = open("subjects", self.store.subscribe_subjects().await);
    let active = open(
      "active homework",
      self.store.subscribe_homework(HomeworkFilter::Active).await,
    );
    let archived = open(
      "archived homework",
      self.store.subscribe_homework(HomeworkFilter::Archived).await,
    );

    let cancel = CancellationToken::new();
    let streams = Streams { subjects, active, archived };
    let handle = tokio::spawn(project(streams, self.gate, self.views.clone(), cancel.clone()));

    self.cancel = Some(cancel);
    self.handle = Some(handle);
    tracing::debug!(gate = ?self.gate, "projector started");
    Ok(())
  }

  /// Cancel the projection task and wait for it to release its
  /// subscriptions. The last published views stay readable.
  pub async fn stop(&mut self) {
    if let Some(token) = self.cancel.take() {
      token.cancel();
    }
    if let Some(handle) = self.handle.take()
      && let Err(e) = handle.await
    {
      tracing::warn!("projector task ended abnormally: {e}");
    }
  }
}

impl<S> Drop for Projector<S> {
  fn drop(&mut self) {
    if let Some(token) = self.cancel.take() {
      token.cancel();
    }
  }
}

fn open<T, E: std::fmt::Display>(
  name: &'static str,
  result: std::result::Result<Subscription<T>, E>,
) -> Option<Subscription<T>> {
  match result {
    Ok(sub) => Some(sub),
    Err(e) => {
      tracing::error!(sequence = name, "subscription setup failed: {e}");
      None
    }
  }
}

// ─── Projection task ─────────────────────────────────────────────────────────

struct Streams {
  subjects: Option<Subscription<Subject>>,
  active:   Option<Subscription<Homework>>,
  archived: Option<Subscription<Homework>>,
}

/// Tracks which sequences have settled: delivered a snapshot or failed.
#[derive(Debug, Default)]
struct Settled {
  subjects: bool,
  active:   bool,
  archived: bool,
}

impl Settled {
  fn satisfies(&self, gate: LoadingGate) -> bool {
    let base = self.subjects && self.active;
    match gate {
      LoadingGate::SubjectsAndActive => base,
      LoadingGate::All => base && self.archived,
    }
  }
}

async fn next_or_pending<T: Clone>(sub: &mut Option<Subscription<T>>) -> Option<Vec<T>> {
  match sub {
    Some(s) => s.next().await,
    None => future::pending().await,
  }
}

enum Update {
  Subjects(Option<Vec<Subject>>),
  Active(Option<Vec<Homework>>),
  Archived(Option<Vec<Homework>>),
}

async fn project(
  mut streams: Streams,
  gate: LoadingGate,
  views: watch::Sender<Views>,
  cancel: CancellationToken,
) {
  let mut settled = Settled {
    subjects: streams.subjects.is_none(),
    active:   streams.active.is_none(),
    archived: streams.archived.is_none(),
  };
  if settled.satisfies(gate) {
    views.send_modify(|v| v.loading = false);
  }

  loop {
    if streams.subjects.is_none() && streams.active.is_none() && streams.archived.is_none() {
      tracing::warn!("every subscription has ended; projector idle");
      cancel.cancelled().await;
      break;
    }

    let update = tokio::select! {
      _ = cancel.cancelled() => break,
      s = next_or_pending(&mut streams.subjects) => Update::Subjects(s),
      s = next_or_pending(&mut streams.active) => Update::Active(s),
      s = next_or_pending(&mut streams.archived) => Update::Archived(s),
    };

    match update {
      Update::Subjects(Some(snapshot)) => {
        let subjects = order_subjects(snapshot);
        views.send_modify(|v| v.subjects = subjects);
        settled.subjects = true;
      }
      Update::Active(Some(snapshot)) => {
        let active = HomeworkFilter::Active.apply(snapshot);
        views.send_modify(|v| v.active = active);
        settled.active = true;
      }
      Update::Archived(Some(snapshot)) => {
        let archived = HomeworkFilter::Archived.apply(snapshot);
        views.send_modify(|v| v.archived = archived);
        settled.archived = true;
      }
      Update::Subjects(None) => {
        tracing::warn!(sequence = "subjects", "subscription ended; keeping last snapshot");
        streams.subjects = None;
        settled.subjects = true;
      }
      Update::Active(None) => {
        tracing::warn!(sequence = "active homework", "subscription ended; keeping last snapshot");
        streams.active = None;
        settled.active = true;
      }
      Update::Archived(None) => {
        tracing::warn!(sequence = "archived homework", "subscription ended; keeping last snapshot");
        streams.archived = None;
        settled.archived = true;
      }
    }

    let loading = views.borrow().loading;
    if loading && settled.satisfies(gate) {
      views.send_modify(|v| v.loading = false);
    }
  }

  tracing::debug!("projector stopped");
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use chrono::NaiveDate;

  use super::*;
  use crate::{
    homework::HomeworkInput,
    memory::MemoryStore,
    subject::{Color, NewSubject},
    tracker::Tracker,
  };

  const WAIT: Duration = Duration::from_secs(2);

  async fn wait_for(rx: &mut watch::Receiver<Views>, f: impl FnMut(&Views) -> bool) -> Views {
    tokio::time::timeout(WAIT, rx.wait_for(f))
      .await
      .expect("views did not settle in time")
      .expect("projector dropped")
      .clone()
  }

  fn due(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 6, d).unwrap() }

  async fn setup() -> (Tracker<MemoryStore>, Arc<MemoryStore>, Subject) {
    let store = Arc::new(MemoryStore::new());
    let tracker = Tracker::new(store.clone());
    let math = tracker
      .create_subject(NewSubject::new("Math", "#ff0000".parse::<Color>().unwrap()))
      .await
      .unwrap();
    (tracker, store, math)
  }

  #[tokio::test]
  async fn loading_clears_after_first_snapshots() {
    let (_, store, _) = setup().await;
    let mut projector = Projector::new(store, LoadingGate::default());
    assert!(projector.views().loading);

    projector.start().await.unwrap();
    let mut rx = projector.watch();
    let views = wait_for(&mut rx, |v| !v.loading).await;
    assert_eq!(views.subjects.len(), 1);
    projector.stop().await;
  }

  #[tokio::test]
  async fn complete_moves_homework_between_sequences() {
    let (tracker, store, math) = setup().await;
    let mut projector = Projector::new(store, LoadingGate::All);
    projector.start().await.unwrap();
    let mut rx = projector.watch();
    wait_for(&mut rx, |v| !v.loading).await;

    let hw = tracker.create(HomeworkInput::new(math.id, due(11), "p.5")).await.unwrap();
    wait_for(&mut rx, |v| v.active.iter().any(|h| h.id == hw.id)).await;

    tracker.complete(hw.id).await.unwrap();
    let views = wait_for(&mut rx, |v| v.archived.iter().any(|h| h.id == hw.id)).await;
    assert!(views.active.iter().all(|h| h.id != hw.id));
    assert!(views.archived[0].completed_at.is_some());
    projector.stop().await;
  }

  #[tokio::test]
  async fn sequences_are_filtered_and_ordered() {
    let (tracker, store, math) = setup().await;
    tracker
      .create_subject(NewSubject::new("Art", Color::default()))
      .await
      .unwrap();
    for d in [20, 9, 11] {
      tracker.create(HomeworkInput::new(math.id, due(d), "")).await.unwrap();
    }
    let done = tracker.create(HomeworkInput::new(math.id, due(1), "")).await.unwrap();
    tracker.complete(done.id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2)).await;
    let later = tracker.create(HomeworkInput::new(math.id, due(2), "")).await.unwrap();
    tracker.complete(later.id).await.unwrap();

    let mut projector = Projector::new(store, LoadingGate::All);
    projector.start().await.unwrap();
    let mut rx = projector.watch();
    let views = wait_for(&mut rx, |v| !v.loading).await;

    let names: Vec<_> = views.subjects.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Art", "Math"]);
    let days: Vec<_> = views.active.iter().map(|h| h.due_date).collect();
    assert_eq!(days, [due(9), due(11), due(20)]);
    assert!(views.active.iter().all(|h| !h.completed));
    assert_eq!(views.archived.len(), 2);
    assert_eq!(views.archived[0].id, later.id);
    assert!(views.archived.iter().all(|h| h.completed));
    projector.stop().await;
  }

  #[tokio::test]
  async fn failed_subscriptions_still_clear_loading() {
    let (_, store, _) = setup().await;
    store.reject_subscriptions(true);

    let mut projector = Projector::new(store, LoadingGate::All);
    projector.start().await.unwrap();
    let mut rx = projector.watch();
    let views = wait_for(&mut rx, |v| !v.loading).await;
    assert!(views.subjects.is_empty());
    projector.stop().await;
  }

  #[tokio::test]
  async fn default_gate_does_not_wait_for_the_archive() {
    let (tracker, store, math) = setup().await;
    let done = tracker.create(HomeworkInput::new(math.id, due(1), "")).await.unwrap();
    tracker.complete(done.id).await.unwrap();
    store.hold_subscriptions(Some(HomeworkFilter::Archived)).unwrap();

    let mut projector = Projector::new(store.clone(), LoadingGate::default());
    projector.start().await.unwrap();
    let mut rx = projector.watch();
    let views = wait_for(&mut rx, |v| !v.loading).await;
    assert_eq!(views.subjects.len(), 1);
    assert!(views.archived.is_empty());

    store.release_held().unwrap();
    let views = wait_for(&mut rx, |v| !v.archived.is_empty()).await;
    assert_eq!(views.archived[0].id, done.id);
    projector.stop().await;
  }

  #[tokio::test]
  async fn all_gate_waits_for_the_archive() {
    let (tracker, store, math) = setup().await;
    tracker.create(HomeworkInput::new(math.id, due(11), "")).await.unwrap();
    let done = tracker.create(HomeworkInput::new(math.id, due(1), "")).await.unwrap();
    tracker.complete(done.id).await.unwrap();
    store.hold_subscriptions(Some(HomeworkFilter::Archived)).unwrap();

    let mut projector = Projector::new(store.clone(), LoadingGate::All);
    projector.start().await.unwrap();
    let mut rx = projector.watch();
    let views = wait_for(&mut rx, |v| v.subjects.len() == 1 && v.active.len() == 1).await;
    assert!(views.loading);
    assert!(views.archived.is_empty());

    store.release_held().unwrap();
    let views = wait_for(&mut rx, |v| !v.loading).await;
    assert_eq!(views.archived.len(), 1);
    projector.stop().await;
  }

  #[tokio::test]
  async fn failed_refetch_keeps_the_last_snapshot() {
    let (tracker, store, math) = setup().await;
    let first = tracker.create(HomeworkInput::new(math.id, due(11), "")).await.unwrap();

    let mut projector = Projector::new(store.clone(), LoadingGate::default());
    projector.start().await.unwrap();
    let mut rx = projector.watch();
    wait_for(&mut rx, |v| !v.loading && v.active.len() == 1).await;

    store.reject_fetches(true);
    tracker.create(HomeworkInput::new(math.id, due(12), "")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let views = projector.views();
    assert!(!views.loading);
    assert_eq!(views.active.len(), 1);
    assert_eq!(views.active[0].id, first.id);
    assert_eq!(views.subjects.len(), 1);
    projector.stop().await;
  }

  #[tokio::test]
  async fn start_twice_is_rejected_and_restart_after_stop_works() {
    let (_, store, _) = setup().await;
    let mut projector = Projector::new(store, LoadingGate::default());
    projector.start().await.unwrap();
    assert!(matches!(projector.start().await, Err(Error::AlreadyStarted)));

    projector.stop().await;
    assert!(!projector.is_running());
    projector.start().await.unwrap();
    assert!(projector.is_running());
    projector.stop().await;
  }

  #[tokio::test]
  async fn stopped_projector_ignores_later_writes() {
    let (tracker, store, math) = setup().await;
    let mut projector = Projector::new(store, LoadingGate::default());
    projector.start().await.unwrap();
    let mut rx = projector.watch();
    wait_for(&mut rx, |v| !v.loading).await;
    projector.stop().await;

    tracker.create(HomeworkInput::new(math.id, due(11), "")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(projector.views().active.is_empty());
  }
}
