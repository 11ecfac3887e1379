//! Employment — the relationship between an employee and a client company.
//!
//! Rows are keyed by the `(employee, client, admitted_on)` triple; a null
//! termination date means the engagement is active. The visit engine
//! maintains these rows as a side effect of every upsert: it inserts the
//! triple for the visit date if absent and clears termination dates on the
//! pair, because a new visit implies the employee is (again) active there.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employment {
  pub employment_id: Uuid,
  pub employee_id:   Uuid,
  pub client_id:     Uuid,
  pub admitted_on:   NaiveDate,
  pub terminated_on: Option<NaiveDate>,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl Employment {
  pub fn is_active(&self) -> bool { self.terminated_on.is_none() }
}
