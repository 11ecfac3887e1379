//! The `ClinicStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `salus-store-sqlite`).
//! Higher layers (`salus-api`, `salus-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  auth::AuthContext,
  employment::Employment,
  error::StoreError,
  exam::{ExamType, NewExamType},
  party::{Client, Employee, NewClient, NewEmployee},
  visit::{Visit, VisitDraft, VisitItem},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`ClinicStore::search_visits`].
#[derive(Debug, Clone, Default)]
pub struct VisitQuery {
  pub employee_id:       Option<Uuid>,
  pub client_id:         Option<Uuid>,
  /// Cancelled visits are hidden unless explicitly requested.
  pub include_cancelled: bool,
  pub limit:             Option<usize>,
  pub offset:            Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Salus clinic store backend.
///
/// Visit writes are multi-step, business-rule-driven operations; every
/// backend must run the whole of `upsert_visit` and `cancel_visit` atomically
/// — a failure anywhere leaves nothing persisted.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ClinicStore: Send + Sync {
  type Error: StoreError + Send + Sync + 'static;

  // ── Visits ────────────────────────────────────────────────────────────

  /// Create or update a visit together with its items, the employment link,
  /// and each item's computed expiry date — in one transaction.
  ///
  /// Fails before any write when `ctx` carries no tenant. A draft with a
  /// `visit_id` that does not resolve under the caller's tenant fails with
  /// the not-found classification; it is never silently ignored.
  fn upsert_visit(
    &self,
    ctx: AuthContext,
    draft: VisitDraft,
  ) -> impl Future<Output = Result<Visit, Self::Error>> + Send + '_;

  /// Cancel a visit: flip the master row's status and hard-delete its items.
  fn cancel_visit(
    &self,
    ctx: AuthContext,
    visit_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Retrieve a visit, scoped to the caller's tenant. `None` covers both a
  /// missing row and a row owned by another tenant.
  fn get_visit(
    &self,
    ctx: AuthContext,
    visit_id: Uuid,
  ) -> impl Future<Output = Result<Option<Visit>, Self::Error>> + Send + '_;

  /// All items under a visit, in insertion order.
  fn visit_items(
    &self,
    visit_id: Uuid,
  ) -> impl Future<Output = Result<Vec<VisitItem>, Self::Error>> + Send + '_;

  /// Search the caller's visits with optional employee/client filters.
  fn search_visits<'a>(
    &'a self,
    ctx: AuthContext,
    query: &'a VisitQuery,
  ) -> impl Future<Output = Result<Vec<Visit>, Self::Error>> + Send + 'a;

  // ── Employment relationships ──────────────────────────────────────────

  /// All employment rows for an `(employee, client)` pair, oldest first.
  fn employments(
    &self,
    employee_id: Uuid,
    client_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Employment>, Self::Error>> + Send + '_;

  /// Set the termination date on every active employment row for the pair.
  /// The dismissal-side counterpart of the link maintained by
  /// [`ClinicStore::upsert_visit`]. Returns how many rows were terminated.
  fn terminate_employments(
    &self,
    employee_id: Uuid,
    client_id: Uuid,
    on: NaiveDate,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Exam catalog ──────────────────────────────────────────────────────

  fn add_exam_type(
    &self,
    input: NewExamType,
  ) -> impl Future<Output = Result<ExamType, Self::Error>> + Send + '_;

  fn get_exam_type(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ExamType>, Self::Error>> + Send + '_;

  fn list_exam_types(
    &self,
  ) -> impl Future<Output = Result<Vec<ExamType>, Self::Error>> + Send + '_;

  // ── Referenced identities ─────────────────────────────────────────────

  fn add_employee(
    &self,
    input: NewEmployee,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn get_employee(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  fn add_client(
    &self,
    input: NewClient,
  ) -> impl Future<Output = Result<Client, Self::Error>> + Send + '_;

  fn get_client(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Client>, Self::Error>> + Send + '_;
}
