//! Core types and trait definitions for the Stackgate access tracker.
//!
//! This crate holds the scan-resolution and skip-detection engine together
//! with the collaborator contracts it consumes (directory, event log,
//! timetable, contact lookup, notifier). It is deliberately free of HTTP and
//! database dependencies; backends and transports live in sibling crates.

pub mod error;
pub mod event;
pub mod member;
pub mod normalize;
pub mod notify;
pub mod scan;
pub mod store;
pub mod timetable;

pub use error::{Error, Result};
