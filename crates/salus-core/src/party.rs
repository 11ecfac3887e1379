//! Referenced identities: employees and client companies.
//!
//! Both are managed by the wider application; the store keeps only the thin
//! rows the visit engine needs real foreign keys for.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Employee ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
  pub employee_id: Uuid,
  pub full_name:   String,
  pub cpf:         Option<String>,
  pub born_on:     Option<NaiveDate>,
  pub created_at:  DateTime<Utc>,
}

/// Input to `add_employee`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
  pub full_name: String,
  pub cpf:       Option<String>,
  pub born_on:   Option<NaiveDate>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
  pub client_id:    Uuid,
  pub company_name: String,
  pub cnpj:         Option<String>,
  pub created_at:   DateTime<Utc>,
}

/// Input to `add_client`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
  pub company_name: String,
  pub cnpj:         Option<String>,
}
