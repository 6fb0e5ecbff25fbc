//! Error type for `stackgate-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] stackgate_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("time parse error: {0}")]
  TimeParse(String),

  #[error("unknown day of week: {0:?}")]
  UnknownDay(String),

  #[error("unknown session type: {0:?}")]
  UnknownSessionType(String),

  #[error("unknown action: {0:?}")]
  UnknownAction(String),

  #[error("unknown scan status: {0:?}")]
  UnknownStatus(String),

  /// An overlapping class already committed for the same cohort scope.
  #[error("timetable clash: overlapping class for this cohort")]
  SlotClash,

  /// The instructor is already committed to an overlapping window.
  #[error("timetable clash: instructor already assigned in this window")]
  InstructorClash,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
