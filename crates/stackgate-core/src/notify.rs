//! The outbound notification contract.
//!
//! Notifications are ephemeral: ownership transfers to the delivery
//! mechanism and nothing is persisted. Delivery is best-effort — a failure
//! is logged by the engine and never invalidates the already-recorded
//! access event.

use std::future::Future;

use chrono::NaiveDateTime;

use crate::member::InstructorContact;

/// A message handed to the delivery collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub to_name:      String,
  pub to_email:     String,
  pub subject_line: String,
  pub body:         String,
}

/// Fire-and-forget delivery. Implementations are expected to bound their
/// own latency (a short client timeout); the engine ignores the result
/// beyond logging it.
pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send(
    &self,
    notification: Notification,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Build the lecture-skipping alert sent to the responsible instructor.
pub fn skip_alert(
  instructor:   &InstructorContact,
  student_name: &str,
  subject:      &str,
  scanned_at:   NaiveDateTime,
) -> Notification {
  let body = format!(
    "Dear {},\n\n\
     The following student was detected inside the library during your\n\
     scheduled session.\n\n\
     Student Name : {}\n\
     Subject      : {}\n\
     Scan Time    : {}\n\n\
     This is a system-generated alert.\n\n\
     Regards,\n\
     Stackgate Library Monitoring",
    instructor.name,
    student_name,
    subject,
    scanned_at.format("%Y-%m-%d %H:%M"),
  );

  Notification {
    to_name:      instructor.name.clone(),
    to_email:     instructor.email.clone(),
    subject_line: "Lecture Skipping Alert".to_string(),
    body,
  }
}
