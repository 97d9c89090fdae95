//! [`MemoryStore`] — a process-local [`DocumentStore`].
//!
//! Keeps both collections in a mutex-guarded map and drives live queries
//! through the same [`ChangeFeed`] machinery as the persistent backends.
//! Used by tests throughout the workspace; failure injection lets them
//! exercise rejected writes, failed or stalled subscriptions, and refetches
//! that fail after the first snapshot.

use std::{
  collections::HashMap,
  sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicBool, Ordering},
  },
};

use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::{
  feed::{ChangeFeed, Collection, subscribe_with},
  homework::{Homework, HomeworkPatch, NewHomework},
  store::{DocumentStore, HomeworkFilter, Subscription, order_subjects},
  subject::{NewSubject, Subject},
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("write rejected by backend")]
  WriteRejected,
  #[error("subscription rejected by backend")]
  SubscribeRejected,
  #[error("snapshot fetch rejected by backend")]
  FetchRejected,
  #[error("store lock poisoned")]
  Poisoned,
}

#[derive(Debug, Default)]
struct Collections {
  subjects: HashMap<Uuid, Subject>,
  homework: HashMap<Uuid, Homework>,
}

type HeldSender = (HomeworkFilter, watch::Sender<Option<Vec<Homework>>>);

/// An in-memory store. Cloning is cheap; clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  data:             Arc<Mutex<Collections>>,
  feed:             ChangeFeed,
  reject_writes:    Arc<AtomicBool>,
  reject_subscribe: Arc<AtomicBool>,
  reject_fetches:   Arc<AtomicBool>,
  hold:             Arc<Mutex<Option<HomeworkFilter>>>,
  held:             Arc<Mutex<Vec<HeldSender>>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Make every subsequent write fail with [`MemoryError::WriteRejected`].
  pub fn reject_writes(&self, reject: bool) { self.reject_writes.store(reject, Ordering::SeqCst); }

  /// Make every subsequent subscribe call fail.
  pub fn reject_subscriptions(&self, reject: bool) {
    self.reject_subscribe.store(reject, Ordering::SeqCst);
  }

  /// Make every live-query fetch fail, including the refetches of
  /// subscriptions that are already open. One-shot reads are unaffected.
  pub fn reject_fetches(&self, reject: bool) { self.reject_fetches.store(reject, Ordering::SeqCst); }

  /// Open homework subscriptions for `filter` without a first snapshot.
  /// They stay silent until [`MemoryStore::release_held`].
  pub fn hold_subscriptions(&self, filter: Option<HomeworkFilter>) -> Result<(), MemoryError> {
    *self.hold.lock().map_err(|_| MemoryError::Poisoned)? = filter;
    Ok(())
  }

  /// Deliver one current snapshot to every held subscription.
  pub fn release_held(&self) -> Result<(), MemoryError> {
    let held = self.held.lock().map_err(|_| MemoryError::Poisoned)?;
    for (filter, tx) in held.iter() {
      tx.send_replace(Some(self.snapshot_homework(*filter)?));
    }
    Ok(())
  }

  fn lock(&self) -> Result<MutexGuard<'_, Collections>, MemoryError> {
    self.data.lock().map_err(|_| MemoryError::Poisoned)
  }

  fn check_write(&self) -> Result<(), MemoryError> {
    if self.reject_writes.load(Ordering::SeqCst) {
      return Err(MemoryError::WriteRejected);
    }
    Ok(())
  }

  fn check_subscribe(&self) -> Result<(), MemoryError> {
    if self.reject_subscribe.load(Ordering::SeqCst) {
      return Err(MemoryError::SubscribeRejected);
    }
    Ok(())
  }

  fn check_fetch(&self) -> Result<(), MemoryError> {
    if self.reject_fetches.load(Ordering::SeqCst) {
      return Err(MemoryError::FetchRejected);
    }
    Ok(())
  }

  fn fetch_subjects(&self) -> Result<Vec<Subject>, MemoryError> {
    self.check_fetch()?;
    self.snapshot_subjects()
  }

  fn fetch_homework(&self, filter: HomeworkFilter) -> Result<Vec<Homework>, MemoryError> {
    self.check_fetch()?;
    self.snapshot_homework(filter)
  }

  fn snapshot_subjects(&self) -> Result<Vec<Subject>, MemoryError> {
    let data = self.lock()?;
    Ok(order_subjects(data.subjects.values().cloned().collect()))
  }

  fn snapshot_homework(&self, filter: HomeworkFilter) -> Result<Vec<Homework>, MemoryError> {
    let data = self.lock()?;
    Ok(filter.apply(data.homework.values().cloned().collect()))
  }
}

impl DocumentStore for MemoryStore {
  type Error = MemoryError;

  async fn subscribe_subjects(&self) -> Result<Subscription<Subject>, MemoryError> {
    self.check_subscribe()?;
    let store = self.clone();
    subscribe_with(&self.feed, Collection::Subjects, move || {
      std::future::ready(store.fetch_subjects())
    })
    .await
  }

  async fn subscribe_homework(
    &self,
    filter: HomeworkFilter,
  ) -> Result<Subscription<Homework>, MemoryError> {
    self.check_subscribe()?;
    if *self.hold.lock().map_err(|_| MemoryError::Poisoned)? == Some(filter) {
      let (tx, rx) = watch::channel(None);
      self.held.lock().map_err(|_| MemoryError::Poisoned)?.push((filter, tx));
      return Ok(Subscription::new(rx));
    }

    let store = self.clone();
    subscribe_with(&self.feed, Collection::Homework, move || {
      std::future::ready(store.fetch_homework(filter))
    })
    .await
  }

  async fn list_subjects(&self) -> Result<Vec<Subject>, MemoryError> { self.snapshot_subjects() }

  async fn get_subject(&self, id: Uuid) -> Result<Option<Subject>, MemoryError> {
    Ok(self.lock()?.subjects.get(&id).cloned())
  }

  async fn insert_subject(&self, input: NewSubject) -> Result<Subject, MemoryError> {
    self.check_write()?;
    let subject = Subject { id: Uuid::new_v4(), name: input.name, color: input.color };
    self.lock()?.subjects.insert(subject.id, subject.clone());
    self.feed.notify(Collection::Subjects);
    Ok(subject)
  }

  async fn delete_subject(&self, id: Uuid) -> Result<bool, MemoryError> {
    self.check_write()?;
    let removed = self.lock()?.subjects.remove(&id).is_some();
    if removed {
      self.feed.notify(Collection::Subjects);
    }
    Ok(removed)
  }

  async fn list_homework(&self, filter: HomeworkFilter) -> Result<Vec<Homework>, MemoryError> {
    self.snapshot_homework(filter)
  }

  async fn get_homework(&self, id: Uuid) -> Result<Option<Homework>, MemoryError> {
    Ok(self.lock()?.homework.get(&id).cloned())
  }

  async fn insert_homework(&self, input: NewHomework) -> Result<Homework, MemoryError> {
    self.check_write()?;
    let hw = input.into_homework(Uuid::new_v4());
    self.lock()?.homework.insert(hw.id, hw.clone());
    self.feed.notify(Collection::Homework);
    Ok(hw)
  }

  async fn update_homework(
    &self,
    id: Uuid,
    patch: HomeworkPatch,
  ) -> Result<Option<Homework>, MemoryError> {
    self.check_write()?;
    let updated = {
      let mut data = self.lock()?;
      data.homework.get_mut(&id).map(|hw| {
        patch.apply(hw);
        hw.clone()
      })
    };
    if updated.is_some() {
      self.feed.notify(Collection::Homework);
    }
    Ok(updated)
  }

  async fn delete_homework(&self, id: Uuid) -> Result<bool, MemoryError> {
    self.check_write()?;
    let removed = self.lock()?.homework.remove(&id).is_some();
    if removed {
      self.feed.notify(Collection::Homework);
    }
    Ok(removed)
  }
}
