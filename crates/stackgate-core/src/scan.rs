//! The scan engine — resolution, entry/exit toggling, skip detection, and
//! the one-shot notification.
//!
//! Each scan is an independent, short-lived unit of work: every piece of
//! state (directory, timetable, event history) is read from the injected
//! store on every call, and exactly one event is appended per granted scan.
//! Two near-simultaneous scans of the *same* badge can both read the same
//! last event and compute the same next action; that race is accepted and
//! documented rather than serialized. Scans of different badges are fully
//! independent.

use std::sync::Arc;

use chrono::{Datelike as _, NaiveDateTime};

use crate::{
  Error, Result,
  event::{AccessEvent, Action, NewAccessEvent, ScanStatus},
  member::{Person, Role, Student},
  normalize::{CaseMode, normalize},
  notify::{Notifier, skip_alert},
  store::AccessStore,
  timetable::{TimetableSlot, first_by_start},
};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Why a scan was denied. Denials are terminal and leave no event behind —
/// a denial row must never be able to re-enter the toggle history as a
/// "last action".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
  /// Empty or whitespace-only input.
  InvalidIdentifier,
  /// Normalized but present in neither directory.
  UnknownMember,
}

impl DenialReason {
  pub fn message(&self) -> &'static str {
    match self {
      DenialReason::InvalidIdentifier => "Invalid ID",
      DenialReason::UnknownMember => "Access Denied: Invalid ID",
    }
  }
}

/// The externally-observable result of one scan.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
  Denied(DenialReason),
  Granted {
    role:    Role,
    action:  Action,
    status:  ScanStatus,
    message: String,
  },
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Composes the identity resolver, the action toggle, the timetable matcher,
/// and the notifier over injected collaborator handles. The handles are
/// owned by the request-scoping layer; the engine itself is stateless
/// between scans.
pub struct ScanEngine<S, N> {
  store:    Arc<S>,
  notifier: Arc<N>,
}

impl<S, N> ScanEngine<S, N>
where
  S: AccessStore,
  N: Notifier,
{
  pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
    Self { store, notifier }
  }

  /// Process one badge scan at wall-clock time `now`.
  ///
  /// Returns `Ok(ScanOutcome)` for every resolvable decision, including
  /// denials; `Err` only when a collaborator store is unreachable, in which
  /// case nothing was written and the whole scan is safely retryable by the
  /// caller.
  pub async fn process_scan(
    &self,
    raw_id: &str,
    now: NaiveDateTime,
  ) -> Result<ScanOutcome> {
    let user_id = normalize(raw_id, CaseMode::Upper);
    if user_id.is_empty() {
      return Ok(ScanOutcome::Denied(DenialReason::InvalidIdentifier));
    }

    let Some(person) = self.resolve(&user_id).await? else {
      tracing::debug!(user_id, "scan denied: unknown member");
      return Ok(ScanOutcome::Denied(DenialReason::UnknownMember));
    };

    let action = self.next_action(&user_id).await?;

    match person {
      Person::Teacher(_) => {
        // Teachers are never skip-checked.
        self
          .append(&user_id, action, ScanStatus::Normal, None, now)
          .await?;
        Ok(ScanOutcome::Granted {
          role:    Role::Teacher,
          action,
          status:  ScanStatus::Normal,
          message: format!("Teacher {} successful", action.as_str()),
        })
      }
      Person::Student(student) => {
        // Skipping is "present in the library while scheduled in class",
        // so only entries are checked.
        let matched = if action == Action::Entry {
          self.find_active_session(&student, now).await?
        } else {
          None
        };

        let status = if matched.is_some() {
          ScanStatus::Skip
        } else {
          ScanStatus::Normal
        };

        let event = self
          .append(&user_id, action, status, matched.as_ref(), now)
          .await?;

        if status == ScanStatus::Skip {
          self.notify_skip(&student.name, &event).await;
        }

        Ok(ScanOutcome::Granted {
          role: Role::Student,
          action,
          status,
          message: format!("Student {} successful", action.as_str()),
        })
      }
    }
  }

  // ── Identity resolver ─────────────────────────────────────────────────

  /// Classify a normalized identifier. Teacher directory first, then
  /// student; first match wins. No side effects.
  async fn resolve(&self, user_id: &str) -> Result<Option<Person>> {
    if let Some(teacher) = self
      .store
      .find_teacher(user_id)
      .await
      .map_err(Error::store)?
    {
      return Ok(Some(Person::Teacher(teacher)));
    }
    if let Some(student) = self
      .store
      .find_student(user_id)
      .await
      .map_err(Error::store)?
    {
      return Ok(Some(Person::Student(student)));
    }
    Ok(None)
  }

  // ── Action state machine ──────────────────────────────────────────────

  /// Pure function of history: toggle off the most recent recorded action.
  async fn next_action(&self, user_id: &str) -> Result<Action> {
    let last = self
      .store
      .most_recent_event(user_id)
      .await
      .map_err(Error::store)?;
    Ok(Action::next(last.map(|event| event.action)))
  }

  // ── Timetable matcher ─────────────────────────────────────────────────

  /// The session in progress for the student's cohort at `now`, if any.
  async fn find_active_session(
    &self,
    student: &Student,
    now: NaiveDateTime,
  ) -> Result<Option<TimetableSlot>> {
    let cohort = student.cohort();
    let slots = self
      .store
      .active_slots(&cohort, now.weekday(), now.time())
      .await
      .map_err(Error::store)?;
    Ok(first_by_start(slots))
  }

  // ── Event append ──────────────────────────────────────────────────────

  /// The single durability point of a scan.
  async fn append(
    &self,
    user_id: &str,
    action: Action,
    status: ScanStatus,
    matched: Option<&TimetableSlot>,
    now: NaiveDateTime,
  ) -> Result<AccessEvent> {
    self
      .store
      .append_event(NewAccessEvent {
        user_id:               user_id.to_string(),
        action,
        status,
        matched_subject:       matched.map(|slot| slot.subject.clone()),
        matched_instructor_id: matched.map(|slot| slot.instructor_id.clone()),
        scanned_at:            now,
      })
      .await
      .map_err(Error::store)
  }

  // ── Skip notifier ─────────────────────────────────────────────────────

  /// Best-effort, at most one outbound message per SKIP event. Every
  /// failure path logs and returns — the event is already durably recorded
  /// and must not be invalidated by delivery problems.
  async fn notify_skip(&self, student_name: &str, event: &AccessEvent) {
    let Some(instructor_id) = event.matched_instructor_id.as_deref() else {
      return;
    };

    let contact = match self.store.find_instructor_contact(instructor_id).await {
      Ok(Some(contact)) => contact,
      Ok(None) => {
        tracing::warn!(instructor_id, "skip alert dropped: no contact record");
        return;
      }
      Err(e) => {
        tracing::warn!(instructor_id, error = %e, "skip alert dropped: contact lookup failed");
        return;
      }
    };

    let subject = event.matched_subject.as_deref().unwrap_or("(unknown)");
    let notification =
      skip_alert(&contact, student_name, subject, event.scanned_at);

    if let Err(e) = self.notifier.send(notification).await {
      tracing::warn!(instructor_id, error = %e, "skip alert delivery failed");
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::{convert::Infallible, sync::Mutex};

  use chrono::{NaiveTime, Weekday};

  use super::*;
  use crate::{
    member::{Cohort, InstructorContact, Student, Teacher},
    notify::Notification,
    timetable::{BoundaryPolicy, SessionType},
  };

  // ── In-memory collaborator doubles ──────────────────────────────────────

  #[derive(Default)]
  struct MemoryStore {
    teachers: Vec<Teacher>,
    students: Vec<Student>,
    contacts: Vec<(String, InstructorContact)>,
    slots:    Vec<TimetableSlot>,
    boundary: BoundaryPolicy,
    events:   Mutex<Vec<AccessEvent>>,
  }

  impl MemoryStore {
    fn event_count(&self) -> usize {
      self.events.lock().unwrap().len()
    }

    fn last_event(&self) -> Option<AccessEvent> {
      self.events.lock().unwrap().last().cloned()
    }
  }

  impl AccessStore for MemoryStore {
    type Error = Infallible;

    async fn find_teacher(&self, member_id: &str) -> Result<Option<Teacher>, Infallible> {
      Ok(self.teachers.iter().find(|t| t.teacher_id == member_id).cloned())
    }

    async fn find_student(&self, member_id: &str) -> Result<Option<Student>, Infallible> {
      Ok(self.students.iter().find(|s| s.student_id == member_id).cloned())
    }

    async fn append_event(&self, event: NewAccessEvent) -> Result<AccessEvent, Infallible> {
      let mut events = self.events.lock().unwrap();
      let persisted = AccessEvent {
        event_id:              events.len() as i64 + 1,
        user_id:               event.user_id,
        action:                event.action,
        status:                event.status,
        matched_subject:       event.matched_subject,
        matched_instructor_id: event.matched_instructor_id,
        scanned_at:            event.scanned_at,
      };
      events.push(persisted.clone());
      Ok(persisted)
    }

    async fn most_recent_event(&self, user_id: &str) -> Result<Option<AccessEvent>, Infallible> {
      Ok(
        self
          .events
          .lock()
          .unwrap()
          .iter()
          .filter(|e| e.user_id == user_id)
          .max_by_key(|e| (e.scanned_at, e.event_id))
          .cloned(),
      )
    }

    async fn active_slots(
      &self,
      cohort: &Cohort,
      day: Weekday,
      at: NaiveTime,
    ) -> Result<Vec<TimetableSlot>, Infallible> {
      Ok(
        self
          .slots
          .iter()
          .filter(|slot| {
            slot.day_of_week == day
              && slot.applies_to(cohort)
              && slot.contains(at, self.boundary)
          })
          .cloned()
          .collect(),
      )
    }

    async fn find_instructor_contact(
      &self,
      instructor_id: &str,
    ) -> Result<Option<InstructorContact>, Infallible> {
      Ok(
        self
          .contacts
          .iter()
          .find(|(id, _)| id == instructor_id)
          .map(|(_, contact)| contact.clone()),
      )
    }
  }

  #[derive(Default)]
  struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
  }

  impl Notifier for RecordingNotifier {
    type Error = Infallible;

    async fn send(&self, notification: Notification) -> Result<(), Infallible> {
      self.sent.lock().unwrap().push(notification);
      Ok(())
    }
  }

  #[derive(Debug, thiserror::Error)]
  #[error("delivery refused")]
  struct DeliveryRefused;

  struct FailingNotifier;

  impl Notifier for FailingNotifier {
    type Error = DeliveryRefused;

    async fn send(&self, _notification: Notification) -> Result<(), DeliveryRefused> {
      Err(DeliveryRefused)
    }
  }

  // ── Fixtures ────────────────────────────────────────────────────────────

  fn teacher(id: &str) -> Teacher {
    Teacher {
      teacher_id: id.to_string(),
      name:       "Prof. Mira Vale".to_string(),
      department: "CS".to_string(),
      email:      "mira.vale@example.edu".to_string(),
    }
  }

  fn student(id: &str, batch: &str) -> Student {
    Student {
      student_id: id.to_string(),
      name:       "Ravi Anand".to_string(),
      department: "CS".to_string(),
      year:       "2".to_string(),
      division:   "A".to_string(),
      batch:      batch.to_string(),
      email:      "ravi.anand@example.edu".to_string(),
    }
  }

  fn lecture(subject: &str, instructor_id: &str) -> TimetableSlot {
    TimetableSlot {
      slot_id:       1,
      department:    "CS".to_string(),
      year:          "2".to_string(),
      division:      "A".to_string(),
      batch:         None,
      subject:       subject.to_string(),
      instructor_id: instructor_id.to_string(),
      day_of_week:   Weekday::Mon,
      start_time:    "09:00:00".parse().unwrap(),
      end_time:      "10:00:00".parse().unwrap(),
      session_type:  SessionType::Lecture,
    }
  }

  fn practical(batch: &str, instructor_id: &str) -> TimetableSlot {
    TimetableSlot {
      batch: Some(batch.to_string()),
      session_type: SessionType::Practical,
      ..lecture("DBMS Lab", instructor_id)
    }
  }

  /// Monday 09:30, inside the fixture lecture window.
  fn monday_0930() -> NaiveDateTime {
    "2026-01-05T09:30:00".parse().unwrap()
  }

  fn engine(
    store: MemoryStore,
  ) -> (ScanEngine<MemoryStore, RecordingNotifier>, Arc<MemoryStore>, Arc<RecordingNotifier>) {
    let store = Arc::new(store);
    let notifier = Arc::new(RecordingNotifier::default());
    (
      ScanEngine::new(store.clone(), notifier.clone()),
      store,
      notifier,
    )
  }

  // ── Denials ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn empty_identifier_denied_without_event() {
    let (engine, store, _) = engine(MemoryStore::default());

    let outcome = engine.process_scan("   ", monday_0930()).await.unwrap();
    assert!(matches!(
      outcome,
      ScanOutcome::Denied(DenialReason::InvalidIdentifier)
    ));
    assert_eq!(store.event_count(), 0);
  }

  #[tokio::test]
  async fn unknown_identifier_denied_without_event() {
    let (engine, store, _) = engine(MemoryStore {
      teachers: vec![teacher("T100")],
      ..Default::default()
    });

    let outcome = engine.process_scan("S999", monday_0930()).await.unwrap();
    assert!(matches!(
      outcome,
      ScanOutcome::Denied(DenialReason::UnknownMember)
    ));
    assert_eq!(store.event_count(), 0);
  }

  // ── Toggle ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn teacher_scans_toggle_entry_exit_and_stay_normal() {
    let (engine, store, notifier) = engine(MemoryStore {
      teachers: vec![teacher("T100")],
      // A committed slot taught by this teacher; irrelevant to their own
      // scans.
      slots: vec![lecture("DBMS", "T100")],
      ..Default::default()
    });

    let first = engine.process_scan("T100", monday_0930()).await.unwrap();
    let ScanOutcome::Granted { role, action, status, .. } = first else {
      panic!("expected grant");
    };
    assert_eq!(role, Role::Teacher);
    assert_eq!(action, Action::Entry);
    assert_eq!(status, ScanStatus::Normal);

    let second = engine.process_scan("T100", monday_0930()).await.unwrap();
    let ScanOutcome::Granted { action, status, .. } = second else {
      panic!("expected grant");
    };
    assert_eq!(action, Action::Exit);
    assert_eq!(status, ScanStatus::Normal);

    assert_eq!(store.event_count(), 2);
    assert!(notifier.sent.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn identifier_is_normalized_before_lookup() {
    let (engine, _, _) = engine(MemoryStore {
      students: vec![student("S101", "B1")],
      ..Default::default()
    });

    let outcome = engine.process_scan("  s101 ", monday_0930()).await.unwrap();
    assert!(matches!(outcome, ScanOutcome::Granted { role: Role::Student, .. }));
  }

  #[tokio::test]
  async fn teacher_directory_is_consulted_first() {
    // A shared ID is not a modeled case; the stated policy is that the
    // teacher record wins.
    let (engine, _, _) = engine(MemoryStore {
      teachers: vec![teacher("X1")],
      students: vec![student("X1", "B1")],
      ..Default::default()
    });

    let outcome = engine.process_scan("X1", monday_0930()).await.unwrap();
    assert!(matches!(outcome, ScanOutcome::Granted { role: Role::Teacher, .. }));
  }

  // ── Skip detection ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn student_entry_during_lecture_is_skip() {
    let (engine, store, notifier) = engine(MemoryStore {
      students: vec![student("S101", "B1")],
      slots:    vec![lecture("DBMS", "T100")],
      contacts: vec![(
        "T100".to_string(),
        InstructorContact {
          name:  "Prof. Mira Vale".to_string(),
          email: "mira.vale@example.edu".to_string(),
        },
      )],
      ..Default::default()
    });

    let outcome = engine.process_scan("S101", monday_0930()).await.unwrap();
    let ScanOutcome::Granted { role, action, status, .. } = outcome else {
      panic!("expected grant");
    };
    assert_eq!(role, Role::Student);
    assert_eq!(action, Action::Entry);
    assert_eq!(status, ScanStatus::Skip);

    let event = store.last_event().unwrap();
    assert_eq!(event.status, ScanStatus::Skip);
    assert_eq!(event.matched_subject.as_deref(), Some("DBMS"));
    assert_eq!(event.matched_instructor_id.as_deref(), Some("T100"));

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_email, "mira.vale@example.edu");
    assert!(sent[0].body.contains("Ravi Anand"));
    assert!(sent[0].body.contains("DBMS"));
  }

  #[tokio::test]
  async fn practical_for_other_batch_does_not_match() {
    let (engine, store, notifier) = engine(MemoryStore {
      students: vec![student("S101", "B1")],
      slots:    vec![practical("B2", "T100")],
      ..Default::default()
    });

    let outcome = engine.process_scan("S101", monday_0930()).await.unwrap();
    let ScanOutcome::Granted { status, .. } = outcome else {
      panic!("expected grant");
    };
    assert_eq!(status, ScanStatus::Normal);
    assert_eq!(store.last_event().unwrap().matched_subject, None);
    assert!(notifier.sent.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn exit_bypasses_skip_detection() {
    let store = MemoryStore {
      students: vec![student("S101", "B1")],
      slots:    vec![lecture("DBMS", "T100")],
      ..Default::default()
    };
    let (engine, store, notifier) = engine(store);

    // First scan enters (and skips); second scan exits during the same
    // still-matching window but is never checked.
    engine.process_scan("S101", monday_0930()).await.unwrap();
    let outcome = engine
      .process_scan("S101", "2026-01-05T09:45:00".parse().unwrap())
      .await
      .unwrap();

    let ScanOutcome::Granted { action, status, .. } = outcome else {
      panic!("expected grant");
    };
    assert_eq!(action, Action::Exit);
    assert_eq!(status, ScanStatus::Normal);

    // Only the entry produced an alert attempt (dropped here: no contact).
    assert!(notifier.sent.lock().unwrap().is_empty());
    assert_eq!(store.event_count(), 2);
  }

  #[tokio::test]
  async fn entry_outside_any_session_is_normal() {
    let (engine, store, _) = engine(MemoryStore {
      students: vec![student("S101", "B1")],
      slots:    vec![lecture("DBMS", "T100")],
      ..Default::default()
    });

    // Monday 11:00, after the 09:00-10:00 lecture.
    let outcome = engine
      .process_scan("S101", "2026-01-05T11:00:00".parse().unwrap())
      .await
      .unwrap();
    let ScanOutcome::Granted { status, .. } = outcome else {
      panic!("expected grant");
    };
    assert_eq!(status, ScanStatus::Normal);
    assert_eq!(store.last_event().unwrap().status, ScanStatus::Normal);
  }

  // ── Notification decoupling ─────────────────────────────────────────────

  #[tokio::test]
  async fn delivery_failure_never_invalidates_the_event() {
    let store = Arc::new(MemoryStore {
      students: vec![student("S101", "B1")],
      slots:    vec![lecture("DBMS", "T100")],
      contacts: vec![(
        "T100".to_string(),
        InstructorContact {
          name:  "Prof. Mira Vale".to_string(),
          email: "mira.vale@example.edu".to_string(),
        },
      )],
      ..Default::default()
    });
    let engine = ScanEngine::new(store.clone(), Arc::new(FailingNotifier));

    let outcome = engine.process_scan("S101", monday_0930()).await.unwrap();
    assert!(matches!(
      outcome,
      ScanOutcome::Granted { status: ScanStatus::Skip, .. }
    ));

    let event = store.last_event().unwrap();
    assert_eq!(event.status, ScanStatus::Skip);
    assert_eq!(event.matched_subject.as_deref(), Some("DBMS"));
  }

  #[tokio::test]
  async fn missing_contact_drops_alert_but_records_skip() {
    let (engine, store, notifier) = engine(MemoryStore {
      students: vec![student("S101", "B1")],
      slots:    vec![lecture("DBMS", "T900")],
      // No contact record for T900.
      ..Default::default()
    });

    let outcome = engine.process_scan("S101", monday_0930()).await.unwrap();
    assert!(matches!(
      outcome,
      ScanOutcome::Granted { status: ScanStatus::Skip, .. }
    ));
    assert_eq!(store.last_event().unwrap().status, ScanStatus::Skip);
    assert!(notifier.sent.lock().unwrap().is_empty());
  }
}
