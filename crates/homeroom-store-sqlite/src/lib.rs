//! SQLite backend for the Homeroom document store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Live queries are driven by the
//! [`ChangeFeed`](homeroom_core::feed::ChangeFeed) the store notifies after
//! every write.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
