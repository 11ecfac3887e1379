//! [`SqliteStore`] — the SQLite implementation of [`ClinicStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use salus_core::{
  auth::AuthContext,
  employment::Employment,
  exam::{ExamType, NewExamType},
  party::{Client, Employee, NewClient, NewEmployee},
  store::{ClinicStore, VisitQuery},
  visit::{Visit, VisitDraft, VisitItem},
};

use crate::{
  Error, Result,
  encode::{
    RawClient, RawEmployee, RawEmployment, RawExamType, RawVisit, RawVisitItem,
    encode_date, encode_dt, encode_money, encode_uuid,
  },
  engine,
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Salus clinic store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All calls
/// are serialised through that one connection's worker thread, which is also
/// what makes the prior-occurrence count inside `upsert_visit` safe: two
/// upserts for the same employee and exam type can never interleave.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ClinicStore impl ────────────────────────────────────────────────────────

impl ClinicStore for SqliteStore {
  type Error = Error;

  // ── Visits ────────────────────────────────────────────────────────────────

  async fn upsert_visit(
    &self,
    ctx: AuthContext,
    draft: VisitDraft,
  ) -> Result<Visit> {
    let tenant_id = ctx.tenant_id.ok_or(Error::MissingTenant)?;
    let attendant_default = ctx.user_id;

    let visit = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let now = Utc::now();
        let editing = draft.visit_id.is_some();

        let visit =
          engine::write_master(&tx, tenant_id, attendant_default, &draft, now)?;
        engine::link_employment(&tx, &visit, now)?;
        engine::reconcile_items(&tx, visit.visit_id, editing, &draft.items)?;
        engine::write_items(&tx, &visit, &draft.items)?;

        tx.commit()?;
        Ok(visit)
      })
      .await
      .map_err(Error::from_call)?;

    tracing::debug!(visit_id = %visit.visit_id, "visit upserted");
    Ok(visit)
  }

  async fn cancel_visit(&self, ctx: AuthContext, visit_id: Uuid) -> Result<()> {
    let tenant_id = ctx.tenant_id.ok_or(Error::MissingTenant)?;
    let visit_id_str = encode_uuid(visit_id);
    let tenant_str = encode_uuid(tenant_id);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let affected = tx.execute(
          "UPDATE visits SET status = 'cancelled', updated_at = ?1
           WHERE visit_id = ?2 AND tenant_id = ?3",
          rusqlite::params![encode_dt(Utc::now()), visit_id_str, tenant_str],
        )?;
        if affected == 0 {
          return Err(Error::VisitNotFound(visit_id).into());
        }

        // Items are meaningless once their visit is cancelled.
        tx.execute(
          "DELETE FROM visit_items WHERE visit_id = ?1",
          rusqlite::params![visit_id_str],
        )?;

        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(Error::from_call)?;

    tracing::debug!(%visit_id, "visit cancelled");
    Ok(())
  }

  async fn get_visit(
    &self,
    ctx: AuthContext,
    visit_id: Uuid,
  ) -> Result<Option<Visit>> {
    let tenant_id = ctx.tenant_id.ok_or(Error::MissingTenant)?;
    let visit_id_str = encode_uuid(visit_id);
    let tenant_str = encode_uuid(tenant_id);

    let raw: Option<RawVisit> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT visit_id, tenant_id, employee_id, client_id, attendant_id,
                      visit_date, payment_method, kind, role, status,
                      created_at, updated_at
               FROM visits WHERE visit_id = ?1 AND tenant_id = ?2",
              rusqlite::params![visit_id_str, tenant_str],
              |row| {
                Ok(RawVisit {
                  visit_id:       row.get(0)?,
                  tenant_id:      row.get(1)?,
                  employee_id:    row.get(2)?,
                  client_id:      row.get(3)?,
                  attendant_id:   row.get(4)?,
                  visit_date:     row.get(5)?,
                  payment_method: row.get(6)?,
                  kind:           row.get(7)?,
                  role:           row.get(8)?,
                  status:         row.get(9)?,
                  created_at:     row.get(10)?,
                  updated_at:     row.get(11)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::from_call)?;

    raw.map(RawVisit::into_visit).transpose()
  }

  async fn visit_items(&self, visit_id: Uuid) -> Result<Vec<VisitItem>> {
    let visit_id_str = encode_uuid(visit_id);

    let raws: Vec<RawVisitItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT item_id, visit_id, exam_type_id, practitioner_id,
                  charged_value, expires_on
           FROM visit_items WHERE visit_id = ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![visit_id_str], |row| {
            Ok(RawVisitItem {
              item_id:         row.get(0)?,
              visit_id:        row.get(1)?,
              exam_type_id:    row.get(2)?,
              practitioner_id: row.get(3)?,
              charged_value:   row.get(4)?,
              expires_on:      row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::from_call)?;

    raws.into_iter().map(RawVisitItem::into_item).collect()
  }

  async fn search_visits(
    &self,
    ctx: AuthContext,
    query: &VisitQuery,
  ) -> Result<Vec<Visit>> {
    let tenant_id = ctx.tenant_id.ok_or(Error::MissingTenant)?;
    let tenant_str = encode_uuid(tenant_id);
    let employee_str = query.employee_id.map(encode_uuid);
    let client_str = query.client_id.map(encode_uuid);
    let include_cancelled = query.include_cancelled;
    let limit_val = query.limit.unwrap_or(100) as i64;
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawVisit> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically; the numbered placeholders keep one
        // parameter list valid for every combination.
        let mut conds: Vec<&'static str> = vec!["tenant_id = ?1"];
        if employee_str.is_some() {
          conds.push("employee_id = ?2");
        }
        if client_str.is_some() {
          conds.push("client_id = ?3");
        }
        if !include_cancelled {
          conds.push("status = 'active'");
        }

        let sql = format!(
          "SELECT visit_id, tenant_id, employee_id, client_id, attendant_id,
                  visit_date, payment_method, kind, role, status,
                  created_at, updated_at
           FROM visits
           WHERE {}
           ORDER BY visit_date DESC, created_at DESC
           LIMIT ?4 OFFSET ?5",
          conds.join(" AND ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              tenant_str,
              employee_str.as_deref(),
              client_str.as_deref(),
              limit_val,
              offset_val,
            ],
            |row| {
              Ok(RawVisit {
                visit_id:       row.get(0)?,
                tenant_id:      row.get(1)?,
                employee_id:    row.get(2)?,
                client_id:      row.get(3)?,
                attendant_id:   row.get(4)?,
                visit_date:     row.get(5)?,
                payment_method: row.get(6)?,
                kind:           row.get(7)?,
                role:           row.get(8)?,
                status:         row.get(9)?,
                created_at:     row.get(10)?,
                updated_at:     row.get(11)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await
      .map_err(Error::from_call)?;

    raws.into_iter().map(RawVisit::into_visit).collect()
  }

  // ── Employment relationships ──────────────────────────────────────────────

  async fn employments(
    &self,
    employee_id: Uuid,
    client_id: Uuid,
  ) -> Result<Vec<Employment>> {
    let employee_str = encode_uuid(employee_id);
    let client_str = encode_uuid(client_id);

    let raws: Vec<RawEmployment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT employment_id, employee_id, client_id, admitted_on,
                  terminated_on, created_at, updated_at
           FROM employments
           WHERE employee_id = ?1 AND client_id = ?2
           ORDER BY admitted_on",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![employee_str, client_str], |row| {
            Ok(RawEmployment {
              employment_id: row.get(0)?,
              employee_id:   row.get(1)?,
              client_id:     row.get(2)?,
              admitted_on:   row.get(3)?,
              terminated_on: row.get(4)?,
              created_at:    row.get(5)?,
              updated_at:    row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::from_call)?;

    raws.into_iter().map(RawEmployment::into_employment).collect()
  }

  async fn terminate_employments(
    &self,
    employee_id: Uuid,
    client_id: Uuid,
    on: NaiveDate,
  ) -> Result<usize> {
    let employee_str = encode_uuid(employee_id);
    let client_str = encode_uuid(client_id);
    let on_str = encode_date(on);

    let terminated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE employments SET terminated_on = ?1, updated_at = ?2
           WHERE employee_id = ?3 AND client_id = ?4
             AND terminated_on IS NULL",
          rusqlite::params![on_str, encode_dt(Utc::now()), employee_str, client_str],
        )?)
      })
      .await
      .map_err(Error::from_call)?;

    Ok(terminated)
  }

  // ── Exam catalog ──────────────────────────────────────────────────────────

  async fn add_exam_type(&self, input: NewExamType) -> Result<ExamType> {
    let exam = ExamType {
      exam_type_id:             Uuid::new_v4(),
      description:              input.description,
      // Normalised here so the returned value matches the stored one.
      list_value:               input.list_value.round_dp(2),
      initial_validity_months:  input.initial_validity_months,
      periodic_validity_months: input.periodic_validity_months,
      created_at:               Utc::now(),
    };

    let id_str = encode_uuid(exam.exam_type_id);
    let description = exam.description.clone();
    let value_str = encode_money(exam.list_value);
    let initial = exam.initial_validity_months;
    let periodic = exam.periodic_validity_months;
    let at_str = encode_dt(exam.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO exam_types (
             exam_type_id, description, list_value,
             initial_validity_months, periodic_validity_months, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, description, value_str, initial, periodic, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from_call)?;

    Ok(exam)
  }

  async fn get_exam_type(&self, id: Uuid) -> Result<Option<ExamType>> {
    self
      .conn
      .call(move |conn| Ok(engine::read_exam_type(conn, id)?))
      .await
      .map_err(Error::from_call)
  }

  async fn list_exam_types(&self) -> Result<Vec<ExamType>> {
    let raws: Vec<RawExamType> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT exam_type_id, description, list_value,
                  initial_validity_months, periodic_validity_months, created_at
           FROM exam_types ORDER BY description",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawExamType {
              exam_type_id:             row.get(0)?,
              description:              row.get(1)?,
              list_value:               row.get(2)?,
              initial_validity_months:  row.get(3)?,
              periodic_validity_months: row.get(4)?,
              created_at:               row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::from_call)?;

    raws.into_iter().map(RawExamType::into_exam_type).collect()
  }

  // ── Referenced identities ─────────────────────────────────────────────────

  async fn add_employee(&self, input: NewEmployee) -> Result<Employee> {
    let employee = Employee {
      employee_id: Uuid::new_v4(),
      full_name:   input.full_name,
      cpf:         input.cpf,
      born_on:     input.born_on,
      created_at:  Utc::now(),
    };

    let id_str = encode_uuid(employee.employee_id);
    let full_name = employee.full_name.clone();
    let cpf = employee.cpf.clone();
    let born_str = employee.born_on.map(encode_date);
    let at_str = encode_dt(employee.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO employees (employee_id, full_name, cpf, born_on, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, full_name, cpf, born_str, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from_call)?;

    Ok(employee)
  }

  async fn get_employee(&self, id: Uuid) -> Result<Option<Employee>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawEmployee> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT employee_id, full_name, cpf, born_on, created_at
               FROM employees WHERE employee_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawEmployee {
                  employee_id: row.get(0)?,
                  full_name:   row.get(1)?,
                  cpf:         row.get(2)?,
                  born_on:     row.get(3)?,
                  created_at:  row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::from_call)?;

    raw.map(RawEmployee::into_employee).transpose()
  }

  async fn add_client(&self, input: NewClient) -> Result<Client> {
    let client = Client {
      client_id:    Uuid::new_v4(),
      company_name: input.company_name,
      cnpj:         input.cnpj,
      created_at:   Utc::now(),
    };

    let id_str = encode_uuid(client.client_id);
    let company_name = client.company_name.clone();
    let cnpj = client.cnpj.clone();
    let at_str = encode_dt(client.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO clients (client_id, company_name, cnpj, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, company_name, cnpj, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from_call)?;

    Ok(client)
  }

  async fn get_client(&self, id: Uuid) -> Result<Option<Client>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawClient> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT client_id, company_name, cnpj, created_at
               FROM clients WHERE client_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawClient {
                  client_id:    row.get(0)?,
                  company_name: row.get(1)?,
                  cnpj:         row.get(2)?,
                  created_at:   row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::from_call)?;

    raw.map(RawClient::into_client).transpose()
  }
}
