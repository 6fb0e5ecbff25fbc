//! Access events — the append-only record of scans.
//!
//! An event is written exactly once per granted scan and never mutated or
//! deleted. The most recent event per user is the sole input to the
//! entry/exit toggle on the next scan.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The two states of the access toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
  Entry,
  Exit,
}

impl Action {
  /// Derive the next action from the most recent recorded one.
  ///
  /// No prior event, or last action EXIT, means ENTRY; last action ENTRY
  /// means EXIT. A strict two-state toggle — there is no "already inside"
  /// rejection, so a second consecutive ENTRY can only occur if the last
  /// record was EXIT, by construction.
  pub fn next(last: Option<Action>) -> Action {
    match last {
      Some(Action::Entry) => Action::Exit,
      Some(Action::Exit) | None => Action::Entry,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Action::Entry => "ENTRY",
      Action::Exit => "EXIT",
    }
  }
}

/// Whether the scan coincided with a scheduled session for the member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanStatus {
  Normal,
  Skip,
}

impl ScanStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      ScanStatus::Normal => "NORMAL",
      ScanStatus::Skip => "SKIP",
    }
  }
}

/// A persisted access event. `event_id` is assigned by the store and is
/// monotonic, which doubles as the tie-break when two events share a
/// timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
  pub event_id:              i64,
  pub user_id:               String,
  pub action:                Action,
  pub status:                ScanStatus,
  pub matched_subject:       Option<String>,
  pub matched_instructor_id: Option<String>,
  /// Local wall-clock time of the scan.
  pub scanned_at:            NaiveDateTime,
}

/// An event about to be appended; the store assigns the `event_id`.
#[derive(Debug, Clone)]
pub struct NewAccessEvent {
  pub user_id:               String,
  pub action:                Action,
  pub status:                ScanStatus,
  pub matched_subject:       Option<String>,
  pub matched_instructor_id: Option<String>,
  pub scanned_at:            NaiveDateTime,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_history_yields_entry() {
    assert_eq!(Action::next(None), Action::Entry);
  }

  #[test]
  fn toggle_alternates() {
    assert_eq!(Action::next(Some(Action::Entry)), Action::Exit);
    assert_eq!(Action::next(Some(Action::Exit)), Action::Entry);
  }
}
