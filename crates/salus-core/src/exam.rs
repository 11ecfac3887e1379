//! Exam catalog types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry of the exam catalog.
///
/// The two validity periods drive expiry computation: `initial` applies to an
/// employee's first occurrence of this exam type at a client, `periodic` to
/// every occurrence after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamType {
  pub exam_type_id:             Uuid,
  pub description:              String,
  /// Default price charged when a visit item does not override it.
  pub list_value:               Decimal,
  pub initial_validity_months:  u32,
  pub periodic_validity_months: u32,
  pub created_at:               DateTime<Utc>,
}

/// Input to `add_exam_type`. The id and timestamp are set by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewExamType {
  pub description:              String,
  pub list_value:               Decimal,
  pub initial_validity_months:  u32,
  pub periodic_validity_months: u32,
}
