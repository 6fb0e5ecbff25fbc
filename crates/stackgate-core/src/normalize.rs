//! Text normalization for join and match keys.
//!
//! Every field used to resolve or match records (member IDs, department,
//! year, division, batch, day-of-week) passes through [`normalize`] both at
//! data-entry time and at scan time, so case variance never causes a false
//! negative. Components treat normalized input as a precondition, not an
//! optional cleanup step.

use serde::{Deserialize, Serialize};

/// Canonical case for a field class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
  /// Match keys: IDs, department, year, division, batch.
  Upper,
  /// Email addresses and role strings.
  Lower,
  /// Day names and designations ("Monday", "Assistant Professor").
  Title,
  /// Free-text descriptions.
  Sentence,
}

/// Canonicalize `text` under `mode`.
///
/// Total and idempotent: empty or whitespace-only input yields the empty
/// string, and `normalize(normalize(x, m), m) == normalize(x, m)` for every
/// mode.
pub fn normalize(text: &str, mode: CaseMode) -> String {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return String::new();
  }

  match mode {
    CaseMode::Upper => trimmed.to_uppercase(),
    CaseMode::Lower => trimmed.to_lowercase(),
    CaseMode::Title => trimmed
      .split_whitespace()
      .map(capitalize)
      .collect::<Vec<_>>()
      .join(" "),
    CaseMode::Sentence => capitalize(&trimmed.to_lowercase()),
  }
}

/// Upper-case the first character, lower-case the rest.
///
/// Some uppercase mappings expand to several characters ('ß' maps to
/// "SS"); only the first is kept, so applying the fold twice yields the
/// same string.
fn capitalize(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => {
      let mut out = String::new();
      out.push(first.to_uppercase().next().unwrap_or(first));
      out.push_str(&chars.as_str().to_lowercase());
      out
    }
    None => String::new(),
  }
}
