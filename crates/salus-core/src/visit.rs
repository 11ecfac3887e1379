//! Visit — the anamnesis master record and its exam line items.
//!
//! A visit is one clinical intake of an employee at a client company. Its
//! line items are owned outright: they are written only through the visit
//! engine, inside the visit's own transaction, and are hard-deleted when the
//! visit is cancelled. An item never outlives or changes parent.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Enums ───────────────────────────────────────────────────────────────────

/// How the visit is paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  Cash,
  Card,
  Invoice,
  Courtesy,
}

/// The occupational-health reason for the visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitKind {
  Admission,
  Periodic,
  ReturnToWork,
  RoleChange,
  Dismissal,
}

/// Lifecycle status of the master record. A cancelled visit keeps its row
/// (for audit) but loses all items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
  Active,
  Cancelled,
}

impl VisitStatus {
  pub fn is_active(&self) -> bool { matches!(self, Self::Active) }
}

// ─── Visit ───────────────────────────────────────────────────────────────────

/// The persisted anamnesis master row. `visit_date` is always resolved —
/// drafts may omit it, the store never does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
  pub visit_id:       Uuid,
  pub tenant_id:      Uuid,
  pub employee_id:    Uuid,
  pub client_id:      Uuid,
  /// The staff member who attended the visit; defaults to the caller.
  pub attendant_id:   Option<Uuid>,
  pub visit_date:     NaiveDate,
  pub payment_method: PaymentMethod,
  pub kind:           VisitKind,
  /// The employee's role/position at the client, as free text.
  pub role:           String,
  pub status:         VisitStatus,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

// ─── VisitItem ───────────────────────────────────────────────────────────────

/// One exam ordered or performed within a visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitItem {
  pub item_id:         Uuid,
  pub visit_id:        Uuid,
  pub exam_type_id:    Uuid,
  pub practitioner_id: Uuid,
  /// Normalised to two decimal places before storage.
  pub charged_value:   Decimal,
  /// Computed from the visit date and the employee's exam history at this
  /// client; never accepted from callers.
  pub expires_on:      NaiveDate,
}

// ─── Drafts ──────────────────────────────────────────────────────────────────

/// Caller input to `upsert_visit`. A present `visit_id` means "edit that
/// row"; absent means "create". Ids, timestamps, item expiry dates, and the
/// status column are all assigned by the store.
#[derive(Debug, Clone)]
pub struct VisitDraft {
  pub visit_id:       Option<Uuid>,
  pub employee_id:    Uuid,
  pub client_id:      Uuid,
  pub attendant_id:   Option<Uuid>,
  /// Defaults to today on insert; an absent date on edit keeps the stored
  /// one.
  pub visit_date:     Option<NaiveDate>,
  pub payment_method: PaymentMethod,
  pub kind:           VisitKind,
  pub role:           String,
  pub items:          Vec<ItemDraft>,
}

/// One submitted line item. Items carrying an id are updated in place; on an
/// edit, stored items whose id is missing from the submitted set are deleted.
#[derive(Debug, Clone)]
pub struct ItemDraft {
  pub item_id:         Option<Uuid>,
  pub exam_type_id:    Uuid,
  pub practitioner_id: Uuid,
  /// Defaults to the exam type's list value when unset.
  pub charged_value:   Option<Decimal>,
}
