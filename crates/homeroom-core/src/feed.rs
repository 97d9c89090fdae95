//! Change notifications and the snapshot pump behind every [`Subscription`].
//!
//! A store publishes a [`Collection`] event on its [`ChangeFeed`] after each
//! successful write. Each subscription runs a small task that re-fetches its
//! query whenever its collection changes and publishes the full result.

use std::future::Future;

use tokio::sync::{broadcast, watch};

use crate::store::Subscription;

/// Room for this many unread events before a slow subscriber lags. Lagging
/// only costs a re-fetch.
const FEED_CAPACITY: usize = 64;

/// The two collections a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
  Subjects,
  Homework,
}

/// Broadcasts "this collection changed" to every live subscription.
///
/// Cloning is cheap and every clone feeds the same subscribers.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
  tx: broadcast::Sender<Collection>,
}

impl ChangeFeed {
  pub fn new() -> Self {
    let (tx, _) = broadcast::channel(FEED_CAPACITY);
    Self { tx }
  }

  /// Announce a change. Having no subscribers is fine.
  pub fn notify(&self, collection: Collection) { let _ = self.tx.send(collection); }

  pub fn listen(&self) -> broadcast::Receiver<Collection> { self.tx.subscribe() }
}

impl Default for ChangeFeed {
  fn default() -> Self { Self::new() }
}

/// Start a live query over `collection`.
///
/// The initial fetch happens before this returns, so setup failures surface
/// as an error here. Later fetch failures are logged and end the
/// subscription.
pub async fn subscribe_with<T, E, F, Fut>(
  feed: &ChangeFeed,
  collection: Collection,
  fetch: F,
) -> Result<Subscription<T>, E>
where
  T: Clone + Send + Sync + 'static,
  E: std::fmt::Display + Send + 'static,
  F: Fn() -> Fut + Send + 'static,
  Fut: Future<Output = Result<Vec<T>, E>> + Send + 'static,
{
  // Listen before the first fetch so no write can slip in between.
  let mut changes = feed.listen();
  let initial = fetch().await?;

  let (tx, rx) = watch::channel(None);
  tx.send_replace(Some(initial));

  tokio::spawn(async move {
    while wait_for_change(&tx, &mut changes, collection).await {
      match fetch().await {
        Ok(snapshot) => {
          if tx.send(Some(snapshot)).is_err() {
            break;
          }
        }
        Err(e) => {
          tracing::error!(?collection, "snapshot fetch failed: {e}");
          break;
        }
      }
    }
    tracing::trace!(?collection, "subscription closed");
  });

  Ok(Subscription::new(rx))
}

/// Block until `collection` changes. Returns `false` when the subscriber
/// has gone away or the feed itself is closed.
async fn wait_for_change<T>(
  tx: &watch::Sender<Option<Vec<T>>>,
  changes: &mut broadcast::Receiver<Collection>,
  collection: Collection,
) -> bool {
  loop {
    tokio::select! {
      _ = tx.closed() => return false,
      event = changes.recv() => match event {
        Ok(c) if c == collection => return true,
        Ok(_) => continue,
        Err(broadcast::error::RecvError::Lagged(skipped)) => {
          tracing::debug!(?collection, skipped, "change feed lagged; refetching");
          return true;
        }
        Err(broadcast::error::RecvError::Closed) => return false,
      },
    }
  }
}
