//! Core types and trait definitions for the Homeroom homework tracker.
//!
//! This crate is free of HTTP and database dependencies. It owns the entity
//! model, the due-date classifier, the homework lifecycle rules, the
//! [`store::DocumentStore`] abstraction and the view projector built on top of
//! it. All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod due;
pub mod error;
pub mod feed;
pub mod homework;
pub mod lifecycle;
pub mod memory;
pub mod projector;
pub mod reminder;
pub mod store;
pub mod subject;
pub mod tracker;

pub use error::{Error, Result};
