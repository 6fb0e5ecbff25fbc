//! SQLite backend for the Stackgate access store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Implements the read-side
//! [`stackgate_core::store::AccessStore`] contract consumed by the scan
//! engine, plus the write-time collaborator operations (member inserts,
//! timetable commits with clash detection) the engine itself never calls.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
