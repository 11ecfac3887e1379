//! SQLite backend for the Salus clinic store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. The visit engine itself lives in
//! [`engine`] as synchronous helpers over one open transaction.

mod encode;
mod engine;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
