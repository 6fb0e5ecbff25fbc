//! [`SqliteStore`] — the SQLite implementation of [`AccessStore`].

use std::path::Path;

use chrono::{NaiveTime, Weekday};
use rusqlite::OptionalExtension as _;

use stackgate_core::{
  event::{AccessEvent, NewAccessEvent},
  member::{Cohort, InstructorContact, Student, Teacher},
  normalize::{CaseMode, normalize},
  store::AccessStore,
  timetable::{BoundaryPolicy, NewTimetableSlot, TimetableSlot},
};

use crate::{
  Error, Result,
  encode::{
    RawEvent, RawSlot, encode_day, encode_dt, encode_session_type, encode_time,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Stackgate access store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All writes
/// run on the connection's single worker thread, so for one `user_id` a
/// read-most-recent-event is always causally after any completed append.
#[derive(Clone)]
pub struct SqliteStore {
  conn:     tokio_rusqlite::Connection,
  boundary: BoundaryPolicy,
}

/// Outcome of the check-then-insert performed inside one connection call.
enum SlotCommit {
  Committed(i64),
  ClassClash,
  InstructorClash,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(
    path: impl AsRef<Path>,
    boundary: BoundaryPolicy,
  ) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, boundary };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory(boundary: BoundaryPolicy) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, boundary };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Write-time collaborator operations ────────────────────────────────
  //
  // These belong to the membership- and timetable-management collaborators,
  // not to the scan engine; the engine only ever reads their committed
  // output through `AccessStore`.

  /// Insert a teacher, canonicalising every match key first.
  pub async fn add_teacher(&self, teacher: Teacher) -> Result<Teacher> {
    let teacher = Teacher {
      teacher_id: normalize(&teacher.teacher_id, CaseMode::Upper),
      name:       teacher.name.trim().to_string(),
      department: normalize(&teacher.department, CaseMode::Upper),
      email:      normalize(&teacher.email, CaseMode::Lower),
    };

    let row = teacher.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO teachers (teacher_id, name, department, email)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![row.teacher_id, row.name, row.department, row.email],
        )?;
        Ok(())
      })
      .await?;

    Ok(teacher)
  }

  /// Insert a student, canonicalising every match key first.
  pub async fn add_student(&self, student: Student) -> Result<Student> {
    let student = Student {
      student_id: normalize(&student.student_id, CaseMode::Upper),
      name:       student.name.trim().to_string(),
      department: normalize(&student.department, CaseMode::Upper),
      year:       normalize(&student.year, CaseMode::Upper),
      division:   normalize(&student.division, CaseMode::Upper),
      batch:      normalize(&student.batch, CaseMode::Upper),
      email:      normalize(&student.email, CaseMode::Lower),
    };

    let row = student.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO students
             (student_id, name, department, year, division, batch, email)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            row.student_id,
            row.name,
            row.department,
            row.year,
            row.division,
            row.batch,
            row.email,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(student)
  }

  /// Validate and commit a timetable slot.
  ///
  /// Enforces the structural invariants (day range, window order,
  /// lecture/practical batch scoping) and both overlap invariants: no
  /// overlapping class for the same cohort scope (a lecture's scope covers
  /// every batch), and no overlapping assignment for the instructor. The
  /// check and the insert run in one connection call, so two concurrent
  /// commits cannot both pass the check.
  pub async fn add_slot(&self, slot: NewTimetableSlot) -> Result<TimetableSlot> {
    let slot = NewTimetableSlot {
      department:    normalize(&slot.department, CaseMode::Upper),
      year:          normalize(&slot.year, CaseMode::Upper),
      division:      normalize(&slot.division, CaseMode::Upper),
      batch:         slot
        .batch
        .as_deref()
        .map(|b| normalize(b, CaseMode::Upper))
        .filter(|b| !b.is_empty()),
      subject:       slot.subject.trim().to_string(),
      instructor_id: normalize(&slot.instructor_id, CaseMode::Upper),
      ..slot
    };
    slot.validate().map_err(Error::Core)?;

    let department = slot.department.clone();
    let year = slot.year.clone();
    let division = slot.division.clone();
    let batch = slot.batch.clone();
    let subject = slot.subject.clone();
    let instructor_id = slot.instructor_id.clone();
    let day = encode_day(slot.day_of_week).to_string();
    let start = encode_time(slot.start_time);
    let end = encode_time(slot.end_time);
    let session_type = encode_session_type(slot.session_type).to_string();

    let commit: SlotCommit = self
      .conn
      .call(move |conn| {
        // Class clash: overlapping window, same cohort, overlapping batch
        // scope (either side being a lecture overlaps everything).
        let class_clash: bool = conn
          .query_row(
            "SELECT 1 FROM timetable
             WHERE department = ?1 AND year = ?2 AND division = ?3
               AND day_of_week = ?4
               AND ?5 < end_time AND ?6 > start_time
               AND (batch IS NULL OR ?7 IS NULL OR batch = ?7)",
            rusqlite::params![
              department,
              year,
              division,
              day,
              start,
              end,
              batch
            ],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if class_clash {
          return Ok(SlotCommit::ClassClash);
        }

        let instructor_clash: bool = conn
          .query_row(
            "SELECT 1 FROM timetable
             WHERE instructor_id = ?1 AND day_of_week = ?2
               AND ?3 < end_time AND ?4 > start_time",
            rusqlite::params![instructor_id, day, start, end],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if instructor_clash {
          return Ok(SlotCommit::InstructorClash);
        }

        conn.execute(
          "INSERT INTO timetable
             (department, year, division, batch, subject, instructor_id,
              day_of_week, start_time, end_time, session_type)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            department,
            year,
            division,
            batch,
            subject,
            instructor_id,
            day,
            start,
            end,
            session_type,
          ],
        )?;
        Ok(SlotCommit::Committed(conn.last_insert_rowid()))
      })
      .await?;

    match commit {
      SlotCommit::ClassClash => Err(Error::SlotClash),
      SlotCommit::InstructorClash => Err(Error::InstructorClash),
      SlotCommit::Committed(slot_id) => Ok(TimetableSlot {
        slot_id,
        department:    slot.department,
        year:          slot.year,
        division:      slot.division,
        batch:         slot.batch,
        subject:       slot.subject,
        instructor_id: slot.instructor_id,
        day_of_week:   slot.day_of_week,
        start_time:    slot.start_time,
        end_time:      slot.end_time,
        session_type:  slot.session_type,
      }),
    }
  }
}

// ─── AccessStore impl ────────────────────────────────────────────────────────

impl AccessStore for SqliteStore {
  type Error = Error;

  // ── Directory ─────────────────────────────────────────────────────────

  async fn find_teacher(&self, member_id: &str) -> Result<Option<Teacher>> {
    let id = member_id.to_string();
    let teacher = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT teacher_id, name, department, email
               FROM teachers WHERE teacher_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(Teacher {
                  teacher_id: row.get(0)?,
                  name:       row.get(1)?,
                  department: row.get(2)?,
                  email:      row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(teacher)
  }

  async fn find_student(&self, member_id: &str) -> Result<Option<Student>> {
    let id = member_id.to_string();
    let student = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT student_id, name, department, year, division, batch, email
               FROM students WHERE student_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(Student {
                  student_id: row.get(0)?,
                  name:       row.get(1)?,
                  department: row.get(2)?,
                  year:       row.get(3)?,
                  division:   row.get(4)?,
                  batch:      row.get(5)?,
                  email:      row.get(6)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(student)
  }

  // ── Event log — append-only ───────────────────────────────────────────

  async fn append_event(&self, event: NewAccessEvent) -> Result<AccessEvent> {
    let user_id = event.user_id.clone();
    let action = event.action.as_str();
    let status = event.status.as_str();
    let matched_subject = event.matched_subject.clone();
    let matched_instructor_id = event.matched_instructor_id.clone();
    let scanned_at = encode_dt(event.scanned_at);

    let event_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events
             (user_id, action, status, matched_subject,
              matched_instructor_id, scanned_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            user_id,
            action,
            status,
            matched_subject,
            matched_instructor_id,
            scanned_at,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(AccessEvent {
      event_id,
      user_id: event.user_id,
      action: event.action,
      status: event.status,
      matched_subject: event.matched_subject,
      matched_instructor_id: event.matched_instructor_id,
      scanned_at: event.scanned_at,
    })
  }

  async fn most_recent_event(&self, user_id: &str) -> Result<Option<AccessEvent>> {
    let id = user_id.to_string();
    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT event_id, user_id, action, status, matched_subject,
                      matched_instructor_id, scanned_at
               FROM events
               WHERE user_id = ?1
               ORDER BY scanned_at DESC, event_id DESC
               LIMIT 1",
              rusqlite::params![id],
              |row| {
                Ok(RawEvent {
                  event_id:              row.get(0)?,
                  user_id:               row.get(1)?,
                  action:                row.get(2)?,
                  status:                row.get(3)?,
                  matched_subject:       row.get(4)?,
                  matched_instructor_id: row.get(5)?,
                  scanned_at:            row.get(6)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  // ── Timetable ─────────────────────────────────────────────────────────

  async fn active_slots(
    &self,
    cohort: &Cohort,
    day: Weekday,
    at: NaiveTime,
  ) -> Result<Vec<TimetableSlot>> {
    let department = cohort.department.clone();
    let year = cohort.year.clone();
    let division = cohort.division.clone();
    let batch = cohort.batch.clone();
    let day_str = encode_day(day).to_string();

    let raws: Vec<RawSlot> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT slot_id, department, year, division, batch, subject,
                  instructor_id, day_of_week, start_time, end_time,
                  session_type
           FROM timetable
           WHERE department = ?1 AND year = ?2 AND division = ?3
             AND (batch IS NULL OR batch = ?4)
             AND day_of_week = ?5
           ORDER BY start_time",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![department, year, division, batch, day_str],
            |row| {
              Ok(RawSlot {
                slot_id:       row.get(0)?,
                department:    row.get(1)?,
                year:          row.get(2)?,
                division:      row.get(3)?,
                batch:         row.get(4)?,
                subject:       row.get(5)?,
                instructor_id: row.get(6)?,
                day_of_week:   row.get(7)?,
                start_time:    row.get(8)?,
                end_time:      row.get(9)?,
                session_type:  row.get(10)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let slots: Vec<TimetableSlot> = raws
      .into_iter()
      .map(RawSlot::into_slot)
      .collect::<Result<_>>()?;

    // Window containment is applied here, not in SQL, so the configured
    // boundary policy has exactly one implementation.
    Ok(
      slots
        .into_iter()
        .filter(|slot| slot.contains(at, self.boundary))
        .collect(),
    )
  }

  // ── Contacts ──────────────────────────────────────────────────────────

  async fn find_instructor_contact(
    &self,
    instructor_id: &str,
  ) -> Result<Option<InstructorContact>> {
    let id = instructor_id.to_string();
    let contact = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT name, email FROM teachers WHERE teacher_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(InstructorContact {
                  name:  row.get(0)?,
                  email: row.get(1)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(contact)
  }
}
