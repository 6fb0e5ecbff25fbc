//! The `AccessStore` trait — collaborator contract over external storage.
//!
//! The trait is implemented by storage backends (e.g.
//! `stackgate-store-sqlite`). The engine depends on this abstraction only;
//! schema and write-time administration (member CRUD, timetable commits,
//! clash detection) are the backend's concern. Every call is self-contained
//! and independently parameterized — the engine holds no cursor or
//! connection state between calls.
//!
//! All methods return `Send` futures so the trait can be used from
//! multi-threaded async runtimes (tokio with `axum`).

use std::future::Future;

use chrono::{NaiveTime, Weekday};

use crate::{
  event::{AccessEvent, NewAccessEvent},
  member::{Cohort, InstructorContact, Student, Teacher},
  timetable::TimetableSlot,
};

pub trait AccessStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Directory ─────────────────────────────────────────────────────────

  /// Look up a teacher by canonical member ID. `None` if not found.
  fn find_teacher<'a>(
    &'a self,
    member_id: &'a str,
  ) -> impl Future<Output = Result<Option<Teacher>, Self::Error>> + Send + 'a;

  /// Look up a student by canonical member ID. `None` if not found.
  fn find_student<'a>(
    &'a self,
    member_id: &'a str,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + 'a;

  // ── Event log — append-only ───────────────────────────────────────────

  /// Append one event and return it with its store-assigned monotonic
  /// `event_id`. The single durability point of a scan.
  fn append_event(
    &self,
    event: NewAccessEvent,
  ) -> impl Future<Output = Result<AccessEvent, Self::Error>> + Send + '_;

  /// The most recent event for `user_id` (timestamp descending, monotonic
  /// `event_id` as tie-break). `None` for a first-ever scan.
  fn most_recent_event<'a>(
    &'a self,
    user_id: &'a str,
  ) -> impl Future<Output = Result<Option<AccessEvent>, Self::Error>> + Send + 'a;

  // ── Timetable ─────────────────────────────────────────────────────────

  /// Slots covering `cohort` whose window contains `at` on `day`, under the
  /// store's configured boundary policy. With clash-free data at most one
  /// slot is returned; the engine picks the match either way
  /// ([`crate::timetable::first_by_start`]).
  fn active_slots<'a>(
    &'a self,
    cohort: &'a Cohort,
    day: Weekday,
    at: NaiveTime,
  ) -> impl Future<Output = Result<Vec<TimetableSlot>, Self::Error>> + Send + 'a;

  // ── Contacts ──────────────────────────────────────────────────────────

  /// Contact record for an instructor, used only for skip notifications.
  fn find_instructor_contact<'a>(
    &'a self,
    instructor_id: &'a str,
  ) -> impl Future<Output = Result<Option<InstructorContact>, Self::Error>> + Send + 'a;
}
