//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates ISO 8601 (`YYYY-MM-DD`),
//! UUIDs hyphenated lowercase, and monetary values decimal text normalised to
//! two places at encode time.

use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use salus_core::{
  employment::Employment,
  exam::ExamType,
  party::{Client, Employee},
  visit::{PaymentMethod, Visit, VisitItem, VisitKind, VisitStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::from_str(s).map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

/// The single normalisation point for monetary columns: everything is stored
/// with two decimal places.
pub fn encode_money(v: Decimal) -> String { v.round_dp(2).to_string() }

pub fn decode_money(s: &str) -> Result<Decimal> {
  Decimal::from_str(s).map_err(|e| Error::Decode(format!("decimal {s:?}: {e}")))
}

// ─── PaymentMethod ───────────────────────────────────────────────────────────

pub fn encode_payment_method(m: PaymentMethod) -> &'static str {
  match m {
    PaymentMethod::Cash => "cash",
    PaymentMethod::Card => "card",
    PaymentMethod::Invoice => "invoice",
    PaymentMethod::Courtesy => "courtesy",
  }
}

pub fn decode_payment_method(s: &str) -> Result<PaymentMethod> {
  match s {
    "cash" => Ok(PaymentMethod::Cash),
    "card" => Ok(PaymentMethod::Card),
    "invoice" => Ok(PaymentMethod::Invoice),
    "courtesy" => Ok(PaymentMethod::Courtesy),
    other => Err(Error::Decode(format!("unknown payment method: {other:?}"))),
  }
}

// ─── VisitKind ───────────────────────────────────────────────────────────────

pub fn encode_visit_kind(k: VisitKind) -> &'static str {
  match k {
    VisitKind::Admission => "admission",
    VisitKind::Periodic => "periodic",
    VisitKind::ReturnToWork => "return_to_work",
    VisitKind::RoleChange => "role_change",
    VisitKind::Dismissal => "dismissal",
  }
}

pub fn decode_visit_kind(s: &str) -> Result<VisitKind> {
  match s {
    "admission" => Ok(VisitKind::Admission),
    "periodic" => Ok(VisitKind::Periodic),
    "return_to_work" => Ok(VisitKind::ReturnToWork),
    "role_change" => Ok(VisitKind::RoleChange),
    "dismissal" => Ok(VisitKind::Dismissal),
    other => Err(Error::Decode(format!("unknown visit kind: {other:?}"))),
  }
}

// ─── VisitStatus ─────────────────────────────────────────────────────────────

pub fn encode_visit_status(s: VisitStatus) -> &'static str {
  match s {
    VisitStatus::Active => "active",
    VisitStatus::Cancelled => "cancelled",
  }
}

pub fn decode_visit_status(s: &str) -> Result<VisitStatus> {
  match s {
    "active" => Ok(VisitStatus::Active),
    "cancelled" => Ok(VisitStatus::Cancelled),
    other => Err(Error::Decode(format!("unknown visit status: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `visits` row.
pub struct RawVisit {
  pub visit_id:       String,
  pub tenant_id:      String,
  pub employee_id:    String,
  pub client_id:      String,
  pub attendant_id:   Option<String>,
  pub visit_date:     String,
  pub payment_method: String,
  pub kind:           String,
  pub role:           String,
  pub status:         String,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawVisit {
  pub fn into_visit(self) -> Result<Visit> {
    Ok(Visit {
      visit_id:       decode_uuid(&self.visit_id)?,
      tenant_id:      decode_uuid(&self.tenant_id)?,
      employee_id:    decode_uuid(&self.employee_id)?,
      client_id:      decode_uuid(&self.client_id)?,
      attendant_id:   self.attendant_id.as_deref().map(decode_uuid).transpose()?,
      visit_date:     decode_date(&self.visit_date)?,
      payment_method: decode_payment_method(&self.payment_method)?,
      kind:           decode_visit_kind(&self.kind)?,
      role:           self.role,
      status:         decode_visit_status(&self.status)?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `visit_items` row.
pub struct RawVisitItem {
  pub item_id:         String,
  pub visit_id:        String,
  pub exam_type_id:    String,
  pub practitioner_id: String,
  pub charged_value:   String,
  pub expires_on:      String,
}

impl RawVisitItem {
  pub fn into_item(self) -> Result<VisitItem> {
    Ok(VisitItem {
      item_id:         decode_uuid(&self.item_id)?,
      visit_id:        decode_uuid(&self.visit_id)?,
      exam_type_id:    decode_uuid(&self.exam_type_id)?,
      practitioner_id: decode_uuid(&self.practitioner_id)?,
      charged_value:   decode_money(&self.charged_value)?,
      expires_on:      decode_date(&self.expires_on)?,
    })
  }
}

/// Raw strings read directly from an `employments` row.
pub struct RawEmployment {
  pub employment_id: String,
  pub employee_id:   String,
  pub client_id:     String,
  pub admitted_on:   String,
  pub terminated_on: Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawEmployment {
  pub fn into_employment(self) -> Result<Employment> {
    Ok(Employment {
      employment_id: decode_uuid(&self.employment_id)?,
      employee_id:   decode_uuid(&self.employee_id)?,
      client_id:     decode_uuid(&self.client_id)?,
      admitted_on:   decode_date(&self.admitted_on)?,
      terminated_on: self.terminated_on.as_deref().map(decode_date).transpose()?,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from an `exam_types` row.
pub struct RawExamType {
  pub exam_type_id:             String,
  pub description:              String,
  pub list_value:               String,
  pub initial_validity_months:  u32,
  pub periodic_validity_months: u32,
  pub created_at:               String,
}

impl RawExamType {
  pub fn into_exam_type(self) -> Result<ExamType> {
    Ok(ExamType {
      exam_type_id:             decode_uuid(&self.exam_type_id)?,
      description:              self.description,
      list_value:               decode_money(&self.list_value)?,
      initial_validity_months:  self.initial_validity_months,
      periodic_validity_months: self.periodic_validity_months,
      created_at:               decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `employees` row.
pub struct RawEmployee {
  pub employee_id: String,
  pub full_name:   String,
  pub cpf:         Option<String>,
  pub born_on:     Option<String>,
  pub created_at:  String,
}

impl RawEmployee {
  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      employee_id: decode_uuid(&self.employee_id)?,
      full_name:   self.full_name,
      cpf:         self.cpf,
      born_on:     self.born_on.as_deref().map(decode_date).transpose()?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `clients` row.
pub struct RawClient {
  pub client_id:    String,
  pub company_name: String,
  pub cnpj:         Option<String>,
  pub created_at:   String,
}

impl RawClient {
  pub fn into_client(self) -> Result<Client> {
    Ok(Client {
      client_id:    decode_uuid(&self.client_id)?,
      company_name: self.company_name,
      cnpj:         self.cnpj,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}
