//! The transactional visit engine.
//!
//! Every helper takes the open [`rusqlite::Transaction`] for the current call
//! as an explicit unit of work; nothing here commits. The caller in
//! `store.rs` owns the transaction lifetime, so a failure in any step rolls
//! back every step.
//!
//! Step order matters. The master row is written first because later steps
//! need its id and resolved visit date. Removed items are deleted before the
//! submitted ones are written. Submitted items are written strictly in order:
//! an item's prior-occurrence count must see items of the same batch that
//! were written before it.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, Transaction, params};
use rust_decimal::Decimal;
use uuid::Uuid;

use salus_core::{
  exam::ExamType,
  expiry,
  visit::{ItemDraft, Visit, VisitDraft, VisitStatus},
};

use crate::{
  Error, Result,
  encode::{
    RawExamType, RawVisit, encode_date, encode_dt, encode_money,
    encode_payment_method, encode_uuid, encode_visit_kind, encode_visit_status,
  },
};

// ─── Master record ───────────────────────────────────────────────────────────

/// Insert or update the anamnesis master row and return the persisted state.
///
/// An update touching zero rows means the visit is absent or owned by another
/// tenant; that surfaces as [`Error::VisitNotFound`], never as a silent no-op.
pub(crate) fn write_master(
  tx: &Transaction<'_>,
  tenant_id: Uuid,
  attendant_default: Option<Uuid>,
  draft: &VisitDraft,
  now: DateTime<Utc>,
) -> Result<Visit> {
  match draft.visit_id {
    Some(visit_id) => update_master(tx, tenant_id, visit_id, draft, now),
    None => insert_master(tx, tenant_id, attendant_default, draft, now),
  }
}

fn insert_master(
  tx: &Transaction<'_>,
  tenant_id: Uuid,
  attendant_default: Option<Uuid>,
  draft: &VisitDraft,
  now: DateTime<Utc>,
) -> Result<Visit> {
  let visit = Visit {
    visit_id:       Uuid::new_v4(),
    tenant_id,
    employee_id:    draft.employee_id,
    client_id:      draft.client_id,
    attendant_id:   draft.attendant_id.or(attendant_default),
    visit_date:     draft.visit_date.unwrap_or_else(|| now.date_naive()),
    payment_method: draft.payment_method,
    kind:           draft.kind,
    role:           draft.role.clone(),
    status:         VisitStatus::Active,
    created_at:     now,
    updated_at:     now,
  };

  tx.execute(
    "INSERT INTO visits (
       visit_id, tenant_id, employee_id, client_id, attendant_id,
       visit_date, payment_method, kind, role, status,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    params![
      encode_uuid(visit.visit_id),
      encode_uuid(visit.tenant_id),
      encode_uuid(visit.employee_id),
      encode_uuid(visit.client_id),
      visit.attendant_id.map(encode_uuid),
      encode_date(visit.visit_date),
      encode_payment_method(visit.payment_method),
      encode_visit_kind(visit.kind),
      visit.role,
      encode_visit_status(visit.status),
      encode_dt(visit.created_at),
      encode_dt(visit.updated_at),
    ],
  )?;

  Ok(visit)
}

fn update_master(
  tx: &Transaction<'_>,
  tenant_id: Uuid,
  visit_id: Uuid,
  draft: &VisitDraft,
  now: DateTime<Utc>,
) -> Result<Visit> {
  // An absent visit date or attendant keeps the stored value.
  let affected = tx.execute(
    "UPDATE visits SET
       employee_id    = ?1,
       client_id      = ?2,
       attendant_id   = coalesce(?3, attendant_id),
       visit_date     = coalesce(?4, visit_date),
       payment_method = ?5,
       kind           = ?6,
       role           = ?7,
       updated_at     = ?8
     WHERE visit_id = ?9 AND tenant_id = ?10",
    params![
      encode_uuid(draft.employee_id),
      encode_uuid(draft.client_id),
      draft.attendant_id.map(encode_uuid),
      draft.visit_date.map(encode_date),
      encode_payment_method(draft.payment_method),
      encode_visit_kind(draft.kind),
      draft.role,
      encode_dt(now),
      encode_uuid(visit_id),
      encode_uuid(tenant_id),
    ],
  )?;

  if affected == 0 {
    return Err(Error::VisitNotFound(visit_id));
  }

  // Re-read the row so downstream steps see the resolved visit date.
  read_visit(tx, visit_id)?.ok_or(Error::VisitNotFound(visit_id))
}

/// Read one visit row by primary key, without tenant scoping. Tenant-scoped
/// reads live in `store.rs`; this is for re-reading a row the engine just
/// wrote.
pub(crate) fn read_visit(
  conn: &rusqlite::Connection,
  visit_id: Uuid,
) -> Result<Option<Visit>> {
  let raw: Option<RawVisit> = conn
    .query_row(
      "SELECT visit_id, tenant_id, employee_id, client_id, attendant_id,
              visit_date, payment_method, kind, role, status,
              created_at, updated_at
       FROM visits WHERE visit_id = ?1",
      params![encode_uuid(visit_id)],
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
    .optional()?;

  raw.map(RawVisit::into_visit).transpose()
}

// ─── Employment link ─────────────────────────────────────────────────────────

/// Ensure an employment row exists for the visit's `(employee, client)` pair
/// and clear any termination dates on that pair.
///
/// The insert is keyed on `(employee, client, admitted_on)`, so repeating a
/// visit date never duplicates a row. The termination sweep touches every
/// terminated row for the pair, not only the latest: a new visit means the
/// employee is active at this client again, whichever cycle the termination
/// belonged to.
pub(crate) fn link_employment(
  tx: &Transaction<'_>,
  visit: &Visit,
  now: DateTime<Utc>,
) -> Result<()> {
  tx.execute(
    "INSERT INTO employments (
       employment_id, employee_id, client_id, admitted_on,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
     ON CONFLICT (employee_id, client_id, admitted_on) DO NOTHING",
    params![
      encode_uuid(Uuid::new_v4()),
      encode_uuid(visit.employee_id),
      encode_uuid(visit.client_id),
      encode_date(visit.visit_date),
      encode_dt(now),
    ],
  )?;

  let reactivated = tx.execute(
    "UPDATE employments SET terminated_on = NULL, updated_at = ?1
     WHERE employee_id = ?2 AND client_id = ?3 AND terminated_on IS NOT NULL",
    params![
      encode_dt(now),
      encode_uuid(visit.employee_id),
      encode_uuid(visit.client_id),
    ],
  )?;

  if reactivated > 0 {
    tracing::debug!(
      employee_id = %visit.employee_id,
      client_id = %visit.client_id,
      reactivated,
      "cleared termination on employment rows"
    );
  }

  Ok(())
}

// ─── Item reconciliation ─────────────────────────────────────────────────────

/// Delete stored items that the caller dropped from the submitted set.
///
/// Runs only when editing. The keep-set is the set of item ids present in the
/// submitted list; an empty keep-set removes every stored item (the caller
/// replaced them all with new ones). Returns the number of rows removed.
pub(crate) fn reconcile_items(
  tx: &Transaction<'_>,
  visit_id: Uuid,
  editing: bool,
  items: &[ItemDraft],
) -> Result<usize> {
  if !editing {
    return Ok(0);
  }

  let visit_id_str = encode_uuid(visit_id);
  let keep: Vec<String> =
    items.iter().filter_map(|i| i.item_id).map(encode_uuid).collect();

  let removed = if keep.is_empty() {
    tx.execute(
      "DELETE FROM visit_items WHERE visit_id = ?1",
      params![visit_id_str],
    )?
  } else {
    let placeholders = vec!["?"; keep.len()].join(", ");
    let sql = format!(
      "DELETE FROM visit_items
       WHERE visit_id = ? AND item_id NOT IN ({placeholders})"
    );
    tx.execute(
      &sql,
      rusqlite::params_from_iter(std::iter::once(visit_id_str).chain(keep)),
    )?
  };

  if removed > 0 {
    tracing::debug!(%visit_id, removed, "removed dropped visit items");
  }

  Ok(removed)
}

// ─── Expiry inputs ───────────────────────────────────────────────────────────

/// Read one exam catalog row. `None` when absent — the engine turns that into
/// [`Error::ExamTypeNotFound`] before writing the referencing item.
pub(crate) fn read_exam_type(
  conn: &rusqlite::Connection,
  exam_type_id: Uuid,
) -> Result<Option<ExamType>> {
  let raw: Option<RawExamType> = conn
    .query_row(
      "SELECT exam_type_id, description, list_value,
              initial_validity_months, periodic_validity_months, created_at
       FROM exam_types WHERE exam_type_id = ?1",
      params![encode_uuid(exam_type_id)],
      |row| {
        Ok(RawExamType {
          exam_type_id:             row.get(0)?,
          description:              row.get(1)?,
          list_value:               row.get(2)?,
          initial_validity_months:  row.get(3)?,
          periodic_validity_months: row.get(4)?,
          created_at:               row.get(5)?,
        })
      },
    )
    .optional()?;

  raw.map(RawExamType::into_exam_type).transpose()
}

/// Count stored occurrences of an exam type for an `(employee, client)` pair
/// across all visits, excluding the item currently being updated (an item is
/// not prior to itself).
///
/// Runs inside the upsert's own transaction, so items of the current batch
/// that were already written are counted — the second of two identical exams
/// in one submission gets the periodic period.
pub(crate) fn prior_occurrences(
  tx: &Transaction<'_>,
  employee_id: Uuid,
  client_id: Uuid,
  exam_type_id: Uuid,
  exclude_item: Option<Uuid>,
) -> Result<u64> {
  let count: i64 = tx.query_row(
    "SELECT count(*)
     FROM visit_items i
     JOIN visits v ON v.visit_id = i.visit_id
     WHERE v.employee_id = ?1
       AND v.client_id   = ?2
       AND i.exam_type_id = ?3
       AND (?4 IS NULL OR i.item_id <> ?4)",
    params![
      encode_uuid(employee_id),
      encode_uuid(client_id),
      encode_uuid(exam_type_id),
      exclude_item.map(encode_uuid),
    ],
    |row| row.get(0),
  )?;

  Ok(count as u64)
}

// ─── Item writer ─────────────────────────────────────────────────────────────

/// Write every submitted item in order: resolve its exam type, count prior
/// occurrences, compute the expiry date, then insert or update the row.
pub(crate) fn write_items(
  tx: &Transaction<'_>,
  visit: &Visit,
  items: &[ItemDraft],
) -> Result<()> {
  for draft in items {
    let exam = read_exam_type(tx, draft.exam_type_id)?
      .ok_or(Error::ExamTypeNotFound(draft.exam_type_id))?;

    let prior = prior_occurrences(
      tx,
      visit.employee_id,
      visit.client_id,
      draft.exam_type_id,
      draft.item_id,
    )?;

    let due = expiry::expires_on(visit.visit_date, &exam, prior);
    let charged = draft.charged_value.unwrap_or(exam.list_value);

    write_item(tx, visit.visit_id, draft, charged, due)?;
  }

  Ok(())
}

fn write_item(
  tx: &Transaction<'_>,
  visit_id: Uuid,
  draft: &ItemDraft,
  charged: Decimal,
  due: NaiveDate,
) -> Result<Uuid> {
  match draft.item_id {
    Some(item_id) => {
      let affected = tx.execute(
        "UPDATE visit_items SET
           exam_type_id    = ?1,
           practitioner_id = ?2,
           charged_value   = ?3,
           expires_on      = ?4
         WHERE item_id = ?5 AND visit_id = ?6",
        params![
          encode_uuid(draft.exam_type_id),
          encode_uuid(draft.practitioner_id),
          encode_money(charged),
          encode_date(due),
          encode_uuid(item_id),
          encode_uuid(visit_id),
        ],
      )?;
      if affected == 0 {
        return Err(Error::ItemNotFound(item_id));
      }
      Ok(item_id)
    }
    None => {
      let item_id = Uuid::new_v4();
      tx.execute(
        "INSERT INTO visit_items (
           item_id, visit_id, exam_type_id, practitioner_id,
           charged_value, expires_on
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
          encode_uuid(item_id),
          encode_uuid(visit_id),
          encode_uuid(draft.exam_type_id),
          encode_uuid(draft.practitioner_id),
          encode_money(charged),
          encode_date(due),
        ],
      )?;
      Ok(item_id)
    }
  }
}
