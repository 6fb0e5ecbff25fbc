//! Error types for `stackgate-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A collaborator store could not be reached or failed mid-call. The scan
  /// fails whole; no partial event is written. Retry is the caller's call —
  /// the engine never retries an append, since a blind retry risks
  /// double-toggling the entry/exit state.
  #[error("store unavailable: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("sessions cannot be scheduled on {0}")]
  InvalidDay(String),

  #[error("end time must be after start time")]
  InvalidTimeRange,

  #[error("a lecture covers the whole division; it cannot carry a batch")]
  LectureWithBatch,

  #[error("a practical is batch-scoped; batch is required")]
  PracticalWithoutBatch,
}

impl Error {
  /// Wrap a backend error crossing the engine boundary.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
