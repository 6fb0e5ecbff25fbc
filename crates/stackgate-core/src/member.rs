//! Membership reference data — teachers, students, and the cohort tuple.
//!
//! Member records are immutable from the engine's point of view: they are
//! created and updated only by the membership-management collaborator. All
//! string keys are stored in canonical form (see [`crate::normalize`]).

use serde::{Deserialize, Serialize};

/// The classification a scanned identifier resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Teacher,
  Student,
}

impl Role {
  pub fn as_str(&self) -> &'static str {
    match self {
      Role::Teacher => "teacher",
      Role::Student => "student",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Teacher {
  /// Badge / member ID, canonical upper-case.
  pub teacher_id: String,
  pub name:       String,
  pub department: String,
  pub email:      String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
  /// Badge / member ID, canonical upper-case.
  pub student_id: String,
  pub name:       String,
  pub department: String,
  pub year:       String,
  pub division:   String,
  pub batch:      String,
  pub email:      String,
}

impl Student {
  /// The (department, year, division, batch) tuple that selects which
  /// timetable slots apply to this student.
  pub fn cohort(&self) -> Cohort {
    Cohort {
      department: self.department.clone(),
      year:       self.year.clone(),
      division:   self.division.clone(),
      batch:      self.batch.clone(),
    }
  }
}

/// Identifies the set of timetable slots a student is enrolled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohort {
  pub department: String,
  pub year:       String,
  pub division:   String,
  pub batch:      String,
}

/// A resolved person — teacher directory is consulted first, then students;
/// first match wins. (ID namespaces are expected to be disjoint by
/// construction; the ordering makes the precedence explicit rather than
/// incidental.)
#[derive(Debug, Clone)]
pub enum Person {
  Teacher(Teacher),
  Student(Student),
}

impl Person {
  pub fn role(&self) -> Role {
    match self {
      Person::Teacher(_) => Role::Teacher,
      Person::Student(_) => Role::Student,
    }
  }
}

/// Contact record for the instructor responsible for a matched session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructorContact {
  pub name:  String,
  pub email: String,
}
