//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Times are stored as zero-padded `HH:MM:SS` so lexicographic comparison
//! in SQL matches chronological order; scan timestamps as
//! `YYYY-MM-DD HH:MM:SS`; days as full title-case names.

use chrono::{NaiveDateTime, NaiveTime, Weekday};
use stackgate_core::{
  event::{AccessEvent, Action, ScanStatus},
  timetable::{SessionType, TimetableSlot},
};

use crate::{Error, Result};

// ─── Day of week ─────────────────────────────────────────────────────────────

pub fn encode_day(day: Weekday) -> &'static str {
  match day {
    Weekday::Mon => "Monday",
    Weekday::Tue => "Tuesday",
    Weekday::Wed => "Wednesday",
    Weekday::Thu => "Thursday",
    Weekday::Fri => "Friday",
    Weekday::Sat => "Saturday",
    Weekday::Sun => "Sunday",
  }
}

pub fn decode_day(s: &str) -> Result<Weekday> {
  match s {
    "Monday" => Ok(Weekday::Mon),
    "Tuesday" => Ok(Weekday::Tue),
    "Wednesday" => Ok(Weekday::Wed),
    "Thursday" => Ok(Weekday::Thu),
    "Friday" => Ok(Weekday::Fri),
    "Saturday" => Ok(Weekday::Sat),
    "Sunday" => Ok(Weekday::Sun),
    other => Err(Error::UnknownDay(other.to_string())),
  }
}

// ─── Times ───────────────────────────────────────────────────────────────────

pub fn encode_time(t: NaiveTime) -> String {
  t.format("%H:%M:%S").to_string()
}

/// Accepts the stored `HH:MM:SS` form and the minute-granularity `HH:MM`
/// form found in data imported from older deployments.
pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S")
    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
    .map_err(|e| Error::TimeParse(format!("{s:?}: {e}")))
}

pub fn encode_dt(dt: NaiveDateTime) -> String {
  dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn decode_dt(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map_err(|e| Error::TimeParse(format!("{s:?}: {e}")))
}

// ─── Session type ────────────────────────────────────────────────────────────

pub fn encode_session_type(t: SessionType) -> &'static str {
  match t {
    SessionType::Lecture => "lecture",
    SessionType::Practical => "practical",
  }
}

pub fn decode_session_type(s: &str) -> Result<SessionType> {
  match s {
    "lecture" => Ok(SessionType::Lecture),
    "practical" => Ok(SessionType::Practical),
    other => Err(Error::UnknownSessionType(other.to_string())),
  }
}

// ─── Action / status ─────────────────────────────────────────────────────────

pub fn decode_action(s: &str) -> Result<Action> {
  match s {
    "ENTRY" => Ok(Action::Entry),
    "EXIT" => Ok(Action::Exit),
    other => Err(Error::UnknownAction(other.to_string())),
  }
}

pub fn decode_status(s: &str) -> Result<ScanStatus> {
  match s {
    "NORMAL" => Ok(ScanStatus::Normal),
    "SKIP" => Ok(ScanStatus::Skip),
    other => Err(Error::UnknownStatus(other.to_string())),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `timetable` row.
pub struct RawSlot {
  pub slot_id:       i64,
  pub department:    String,
  pub year:          String,
  pub division:      String,
  pub batch:         Option<String>,
  pub subject:       String,
  pub instructor_id: String,
  pub day_of_week:   String,
  pub start_time:    String,
  pub end_time:      String,
  pub session_type:  String,
}

impl RawSlot {
  pub fn into_slot(self) -> Result<TimetableSlot> {
    Ok(TimetableSlot {
      slot_id:       self.slot_id,
      department:    self.department,
      year:          self.year,
      division:      self.division,
      batch:         self.batch,
      subject:       self.subject,
      instructor_id: self.instructor_id,
      day_of_week:   decode_day(&self.day_of_week)?,
      start_time:    decode_time(&self.start_time)?,
      end_time:      decode_time(&self.end_time)?,
      session_type:  decode_session_type(&self.session_type)?,
    })
  }
}

/// Raw strings read directly from an `events` row.
pub struct RawEvent {
  pub event_id:              i64,
  pub user_id:               String,
  pub action:                String,
  pub status:                String,
  pub matched_subject:       Option<String>,
  pub matched_instructor_id: Option<String>,
  pub scanned_at:            String,
}

impl RawEvent {
  pub fn into_event(self) -> Result<AccessEvent> {
    Ok(AccessEvent {
      event_id:              self.event_id,
      user_id:               self.user_id,
      action:                decode_action(&self.action)?,
      status:                decode_status(&self.status)?,
      matched_subject:       self.matched_subject,
      matched_instructor_id: self.matched_instructor_id,
      scanned_at:            decode_dt(&self.scanned_at)?,
    })
  }
}
