//! Pure calendar rules for exam validity.
//!
//! Kept free of any database access so the end-of-month behaviour is pinned
//! down here, in one place, with tests.

use chrono::{Months, NaiveDate};

use crate::exam::ExamType;

/// How many months an exam result stays valid, given how many times this
/// employee has already taken this exam type at this client.
pub fn validity_months(exam: &ExamType, prior_occurrences: u64) -> u32 {
  if prior_occurrences == 0 {
    exam.initial_validity_months
  } else {
    exam.periodic_validity_months
  }
}

/// Calendar month addition. The day of month is preserved when the target
/// month has it, and clamped to the target month's last day otherwise
/// (Jan 31 + 1 month = Feb 28, or Feb 29 in a leap year).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
  date
    .checked_add_months(Months::new(months))
    .unwrap_or(NaiveDate::MAX)
}

/// The expiry date of an item: visit date plus the applicable validity
/// period.
pub fn expires_on(
  visit_date: NaiveDate,
  exam: &ExamType,
  prior_occurrences: u64,
) -> NaiveDate {
  add_months(visit_date, validity_months(exam, prior_occurrences))
}
