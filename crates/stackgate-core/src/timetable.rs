//! Timetable slots and session matching.
//!
//! A slot is scoped to a cohort: a lecture covers the whole division (no
//! batch), a practical covers exactly one batch. The timetable-management
//! collaborator commits only clash-free slots, so at most one slot should be
//! active for a cohort at any instant; [`first_by_start`] is the policy
//! fallback if that invariant was violated upstream.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, member::Cohort};

/// Lecture or practical — determines batch scoping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionType {
  /// Division-wide; `batch` must be absent.
  Lecture,
  /// Batch-scoped; `batch` must be present.
  Practical,
}

/// How the end of a session window is treated when matching the clock.
///
/// The original comparison was inclusive on both ends; half-open is the
/// default here so back-to-back slots never both match at the shared
/// boundary instant.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
  /// `[start, end)` — the end instant belongs to the next slot.
  #[default]
  HalfOpen,
  /// `[start, end]` — both boundary instants match.
  InclusiveBoth,
}

/// A committed, conflict-free timetable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableSlot {
  pub slot_id:       i64,
  pub department:    String,
  pub year:          String,
  pub division:      String,
  /// `None` for lectures; the covered batch for practicals.
  pub batch:         Option<String>,
  pub subject:       String,
  pub instructor_id: String,
  pub day_of_week:   Weekday,
  pub start_time:    NaiveTime,
  pub end_time:      NaiveTime,
  pub session_type:  SessionType,
}

impl TimetableSlot {
  /// Whether a student of `cohort` is covered by this slot: department,
  /// year, and division must match exactly; a lecture matches any batch,
  /// a practical only its own.
  pub fn applies_to(&self, cohort: &Cohort) -> bool {
    self.department == cohort.department
      && self.year == cohort.year
      && self.division == cohort.division
      && match &self.batch {
        None => true,
        Some(batch) => *batch == cohort.batch,
      }
  }

  /// Whether `at` falls inside the session window under `policy`.
  pub fn contains(&self, at: NaiveTime, policy: BoundaryPolicy) -> bool {
    match policy {
      BoundaryPolicy::HalfOpen => self.start_time <= at && at < self.end_time,
      BoundaryPolicy::InclusiveBoth => self.start_time <= at && at <= self.end_time,
    }
  }
}

/// Pick the active slot among candidates the store already filtered by
/// cohort, day, and time. With clash-free data there is at most one; if the
/// store was violated upstream, the earliest start wins (a policy choice,
/// not a correctness guarantee the engine can enforce).
pub fn first_by_start(mut slots: Vec<TimetableSlot>) -> Option<TimetableSlot> {
  slots.sort_by_key(|slot| slot.start_time);
  slots.into_iter().next()
}

/// A slot as submitted to the timetable-management collaborator, before it
/// is committed.
#[derive(Debug, Clone)]
pub struct NewTimetableSlot {
  pub department:    String,
  pub year:          String,
  pub division:      String,
  pub batch:         Option<String>,
  pub subject:       String,
  pub instructor_id: String,
  pub day_of_week:   Weekday,
  pub start_time:    NaiveTime,
  pub end_time:      NaiveTime,
  pub session_type:  SessionType,
}

impl NewTimetableSlot {
  /// Structural invariants checked at write time. Overlap (clash) detection
  /// needs the committed slots and lives with the store.
  pub fn validate(&self) -> Result<()> {
    if self.day_of_week == Weekday::Sun {
      return Err(Error::InvalidDay("Sunday".to_string()));
    }
    if self.start_time >= self.end_time {
      return Err(Error::InvalidTimeRange);
    }
    match (self.session_type, &self.batch) {
      (SessionType::Lecture, Some(_)) => Err(Error::LectureWithBatch),
      (SessionType::Practical, None) => Err(Error::PracticalWithoutBatch),
      _ => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn slot(batch: Option<&str>, start: &str, end: &str) -> TimetableSlot {
    TimetableSlot {
      slot_id:       1,
      department:    "CS".into(),
      year:          "2".into(),
      division:      "A".into(),
      batch:         batch.map(str::to_string),
      subject:       "DBMS".into(),
      instructor_id: "T100".into(),
      day_of_week:   Weekday::Mon,
      start_time:    start.parse().unwrap(),
      end_time:      end.parse().unwrap(),
      session_type:  if batch.is_some() {
        SessionType::Practical
      } else {
        SessionType::Lecture
      },
    }
  }

  fn cohort(batch: &str) -> Cohort {
    Cohort {
      department: "CS".into(),
      year:       "2".into(),
      division:   "A".into(),
      batch:      batch.into(),
    }
  }

  #[test]
  fn lecture_applies_to_any_batch() {
    let lecture = slot(None, "09:00:00", "10:00:00");
    assert!(lecture.applies_to(&cohort("B1")));
    assert!(lecture.applies_to(&cohort("B2")));
  }

  #[test]
  fn practical_applies_only_to_its_batch() {
    let practical = slot(Some("B2"), "09:00:00", "10:00:00");
    assert!(practical.applies_to(&cohort("B2")));
    assert!(!practical.applies_to(&cohort("B1")));
  }

  #[test]
  fn boundary_instants_per_policy() {
    let s = slot(None, "09:00:00", "10:00:00");
    let start: NaiveTime = "09:00:00".parse().unwrap();
    let end: NaiveTime = "10:00:00".parse().unwrap();

    // Start is inclusive under both policies.
    assert!(s.contains(start, BoundaryPolicy::HalfOpen));
    assert!(s.contains(start, BoundaryPolicy::InclusiveBoth));

    // End differs.
    assert!(!s.contains(end, BoundaryPolicy::HalfOpen));
    assert!(s.contains(end, BoundaryPolicy::InclusiveBoth));

    // Just outside either way.
    let before: NaiveTime = "08:59:59".parse().unwrap();
    let after: NaiveTime = "10:00:01".parse().unwrap();
    assert!(!s.contains(before, BoundaryPolicy::InclusiveBoth));
    assert!(!s.contains(after, BoundaryPolicy::InclusiveBoth));
  }

  #[test]
  fn first_by_start_picks_earliest() {
    let late = slot(None, "10:00:00", "11:00:00");
    let early = slot(None, "09:00:00", "10:30:00");
    let picked = first_by_start(vec![late, early.clone()]).unwrap();
    assert_eq!(picked, early);
  }

  #[test]
  fn validate_rejects_sunday() {
    let mut new = new_slot(None, SessionType::Lecture);
    new.day_of_week = Weekday::Sun;
    assert!(matches!(new.validate(), Err(Error::InvalidDay(_))));
  }

  #[test]
  fn validate_rejects_inverted_window() {
    let mut new = new_slot(None, SessionType::Lecture);
    new.start_time = "11:00:00".parse().unwrap();
    new.end_time = "10:00:00".parse().unwrap();
    assert!(matches!(new.validate(), Err(Error::InvalidTimeRange)));
  }

  #[test]
  fn validate_enforces_batch_scoping() {
    let lecture_with_batch = new_slot(Some("B1"), SessionType::Lecture);
    assert!(matches!(
      lecture_with_batch.validate(),
      Err(Error::LectureWithBatch)
    ));

    let practical_without_batch = new_slot(None, SessionType::Practical);
    assert!(matches!(
      practical_without_batch.validate(),
      Err(Error::PracticalWithoutBatch)
    ));

    assert!(new_slot(None, SessionType::Lecture).validate().is_ok());
    assert!(new_slot(Some("B1"), SessionType::Practical).validate().is_ok());
  }

  fn new_slot(batch: Option<&str>, session_type: SessionType) -> NewTimetableSlot {
    NewTimetableSlot {
      department: "CS".into(),
      year: "2".into(),
      division: "A".into(),
      batch: batch.map(str::to_string),
      subject: "DBMS".into(),
      instructor_id: "T100".into(),
      day_of_week: Weekday::Mon,
      start_time: "09:00:00".parse().unwrap(),
      end_time: "10:00:00".parse().unwrap(),
      session_type,
    }
  }
}
