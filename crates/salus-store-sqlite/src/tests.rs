//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use salus_core::{
  auth::AuthContext,
  exam::NewExamType,
  party::{NewClient, NewEmployee},
  store::{ClinicStore, VisitQuery},
  visit::{ItemDraft, PaymentMethod, VisitDraft, VisitKind, VisitStatus},
};

use crate::{Error, SqliteStore};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn money(cents: i64) -> Decimal { Decimal::new(cents, 2) }

// ─── Fixture ─────────────────────────────────────────────────────────────────

/// One tenant, one employee, one client, and an audiometry exam type with
/// 12-month initial / 6-month periodic validity and a list value of 85.00.
struct Fixture {
  store:           SqliteStore,
  tenant_id:       Uuid,
  user_id:         Uuid,
  employee_id:     Uuid,
  client_id:       Uuid,
  exam_id:         Uuid,
  practitioner_id: Uuid,
}

impl Fixture {
  fn ctx(&self) -> AuthContext {
    AuthContext::new(self.tenant_id, self.user_id)
  }

  fn draft(&self, items: Vec<ItemDraft>) -> VisitDraft {
    VisitDraft {
      visit_id: None,
      employee_id: self.employee_id,
      client_id: self.client_id,
      attendant_id: None,
      visit_date: Some(date(2023, 1, 1)),
      payment_method: PaymentMethod::Invoice,
      kind: VisitKind::Admission,
      role: "welder".into(),
      items,
    }
  }

  fn item(&self) -> ItemDraft {
    ItemDraft {
      item_id:         None,
      exam_type_id:    self.exam_id,
      practitioner_id: self.practitioner_id,
      charged_value:   None,
    }
  }
}

async fn fixture() -> Fixture {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");

  let employee = store
    .add_employee(NewEmployee {
      full_name: "Ana Souza".into(),
      cpf:       None,
      born_on:   None,
    })
    .await
    .unwrap();

  let client = store
    .add_client(NewClient {
      company_name: "Forja Industrial Ltda".into(),
      cnpj:         None,
    })
    .await
    .unwrap();

  let exam = store
    .add_exam_type(NewExamType {
      description:              "audiometry".into(),
      list_value:               money(8500),
      initial_validity_months:  12,
      periodic_validity_months: 6,
    })
    .await
    .unwrap();

  Fixture {
    store,
    tenant_id: Uuid::new_v4(),
    user_id: Uuid::new_v4(),
    employee_id: employee.employee_id,
    client_id: client.client_id,
    exam_id: exam.exam_type_id,
    practitioner_id: Uuid::new_v4(),
  }
}

// ─── Tenant guard ────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_without_tenant_is_unauthorized_and_writes_nothing() {
  let fx = fixture().await;
  let no_tenant = AuthContext { tenant_id: None, user_id: Some(fx.user_id) };

  let err = fx
    .store
    .upsert_visit(no_tenant, fx.draft(vec![fx.item()]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MissingTenant));

  let visits = fx
    .store
    .search_visits(fx.ctx(), &VisitQuery::default())
    .await
    .unwrap();
  assert!(visits.is_empty());

  let employments = fx
    .store
    .employments(fx.employee_id, fx.client_id)
    .await
    .unwrap();
  assert!(employments.is_empty());
}

#[tokio::test]
async fn cancel_without_tenant_is_unauthorized() {
  let fx = fixture().await;
  let no_tenant = AuthContext::default();

  let err = fx
    .store
    .cancel_visit(no_tenant, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MissingTenant));
}

// ─── Master record ───────────────────────────────────────────────────────────

#[tokio::test]
async fn create_assigns_defaults() {
  let fx = fixture().await;
  let mut draft = fx.draft(vec![fx.item()]);
  draft.visit_date = None;

  let visit = fx.store.upsert_visit(fx.ctx(), draft).await.unwrap();

  assert_eq!(visit.tenant_id, fx.tenant_id);
  assert_eq!(visit.visit_date, Utc::now().date_naive());
  assert_eq!(visit.attendant_id, Some(fx.user_id));
  assert_eq!(visit.status, VisitStatus::Active);
}

#[tokio::test]
async fn edit_updates_fields_and_keeps_stored_visit_date() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();
  let item_id = fx.store.visit_items(visit.visit_id).await.unwrap()[0].item_id;

  let mut edit = fx.draft(vec![ItemDraft {
    item_id: Some(item_id),
    ..fx.item()
  }]);
  edit.visit_id = Some(visit.visit_id);
  edit.visit_date = None;
  edit.payment_method = PaymentMethod::Cash;
  edit.role = "foreman".into();

  let updated = fx.store.upsert_visit(fx.ctx(), edit).await.unwrap();

  assert_eq!(updated.visit_id, visit.visit_id);
  assert_eq!(updated.visit_date, date(2023, 1, 1));
  assert_eq!(updated.payment_method, PaymentMethod::Cash);
  assert_eq!(updated.role, "foreman");
}

#[tokio::test]
async fn edit_unknown_id_is_not_found() {
  let fx = fixture().await;
  let mut draft = fx.draft(vec![fx.item()]);
  draft.visit_id = Some(Uuid::new_v4());

  let err = fx.store.upsert_visit(fx.ctx(), draft).await.unwrap_err();
  assert!(matches!(err, Error::VisitNotFound(_)));
}

#[tokio::test]
async fn edit_under_wrong_tenant_is_not_found_and_items_untouched() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();

  let other = AuthContext::new(Uuid::new_v4(), fx.user_id);
  let mut edit = fx.draft(vec![]);
  edit.visit_id = Some(visit.visit_id);

  let err = fx.store.upsert_visit(other, edit).await.unwrap_err();
  assert!(matches!(err, Error::VisitNotFound(_)));

  // The whole transaction aborted before reconciliation could delete items.
  let items = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert_eq!(items.len(), 1);
}

// ─── Employment link ─────────────────────────────────────────────────────────

#[tokio::test]
async fn visit_creates_active_employment_for_visit_date() {
  let fx = fixture().await;
  fx.store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();

  let rows = fx
    .store
    .employments(fx.employee_id, fx.client_id)
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].admitted_on, date(2023, 1, 1));
  assert!(rows[0].is_active());
}

#[tokio::test]
async fn repeated_visits_never_duplicate_the_admission_triple() {
  let fx = fixture().await;
  fx.store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();
  fx.store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();

  let rows = fx
    .store
    .employments(fx.employee_id, fx.client_id)
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn visits_on_different_dates_record_separate_cycles() {
  let fx = fixture().await;
  fx.store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();

  let mut later = fx.draft(vec![fx.item()]);
  later.visit_date = Some(date(2024, 3, 1));
  fx.store.upsert_visit(fx.ctx(), later).await.unwrap();

  let rows = fx
    .store
    .employments(fx.employee_id, fx.client_id)
    .await
    .unwrap();
  assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn new_visit_reactivates_every_terminated_row() {
  let fx = fixture().await;
  fx.store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();

  let mut second = fx.draft(vec![fx.item()]);
  second.visit_date = Some(date(2023, 6, 1));
  fx.store.upsert_visit(fx.ctx(), second).await.unwrap();

  let terminated = fx
    .store
    .terminate_employments(fx.employee_id, fx.client_id, date(2023, 12, 31))
    .await
    .unwrap();
  assert_eq!(terminated, 2);

  let mut rehire = fx.draft(vec![fx.item()]);
  rehire.visit_date = Some(date(2024, 2, 1));
  fx.store.upsert_visit(fx.ctx(), rehire).await.unwrap();

  let rows = fx
    .store
    .employments(fx.employee_id, fx.client_id)
    .await
    .unwrap();
  assert_eq!(rows.len(), 3);
  assert!(rows.iter().all(|r| r.is_active()));
}

// ─── Item reconciliation ─────────────────────────────────────────────────────

#[tokio::test]
async fn edit_deletes_items_dropped_from_the_submitted_set() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item(), fx.item(), fx.item()]))
    .await
    .unwrap();

  let stored = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert_eq!(stored.len(), 3);
  let (a, b, c) = (stored[0].item_id, stored[1].item_id, stored[2].item_id);

  let mut edit = fx.draft(vec![
    ItemDraft { item_id: Some(a), ..fx.item() },
    ItemDraft { item_id: Some(c), ..fx.item() },
  ]);
  edit.visit_id = Some(visit.visit_id);
  fx.store.upsert_visit(fx.ctx(), edit).await.unwrap();

  let kept: Vec<Uuid> = fx
    .store
    .visit_items(visit.visit_id)
    .await
    .unwrap()
    .iter()
    .map(|i| i.item_id)
    .collect();
  assert_eq!(kept, vec![a, c]);
  assert!(!kept.contains(&b));
}

#[tokio::test]
async fn edit_with_only_new_items_replaces_the_stored_set() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item(), fx.item()]))
    .await
    .unwrap();
  let old: Vec<Uuid> = fx
    .store
    .visit_items(visit.visit_id)
    .await
    .unwrap()
    .iter()
    .map(|i| i.item_id)
    .collect();

  let mut edit = fx.draft(vec![fx.item()]);
  edit.visit_id = Some(visit.visit_id);
  fx.store.upsert_visit(fx.ctx(), edit).await.unwrap();

  let items = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert_eq!(items.len(), 1);
  assert!(!old.contains(&items[0].item_id));
}

// ─── Expiry computation ──────────────────────────────────────────────────────

#[tokio::test]
async fn first_occurrence_gets_the_initial_validity() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();

  let items = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert_eq!(items[0].expires_on, date(2024, 1, 1));
}

#[tokio::test]
async fn subsequent_occurrence_gets_the_periodic_validity() {
  let fx = fixture().await;
  fx.store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();

  let second = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();

  let items = fx.store.visit_items(second.visit_id).await.unwrap();
  assert_eq!(items[0].expires_on, date(2023, 7, 1));
}

#[tokio::test]
async fn later_items_of_one_batch_see_earlier_ones() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item(), fx.item()]))
    .await
    .unwrap();

  let items = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert_eq!(items[0].expires_on, date(2024, 1, 1));
  assert_eq!(items[1].expires_on, date(2023, 7, 1));
}

#[tokio::test]
async fn re_editing_an_item_does_not_count_itself() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();
  let item_id = fx.store.visit_items(visit.visit_id).await.unwrap()[0].item_id;

  let mut edit = fx.draft(vec![ItemDraft {
    item_id: Some(item_id),
    ..fx.item()
  }]);
  edit.visit_id = Some(visit.visit_id);
  fx.store.upsert_visit(fx.ctx(), edit).await.unwrap();

  let items = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert_eq!(items[0].expires_on, date(2024, 1, 1));
}

#[tokio::test]
async fn expiry_clamps_to_the_end_of_a_shorter_month() {
  let fx = fixture().await;
  let short_exam = fx
    .store
    .add_exam_type(NewExamType {
      description:              "vision screening".into(),
      list_value:               money(4000),
      initial_validity_months:  1,
      periodic_validity_months: 1,
    })
    .await
    .unwrap();

  let mut draft = fx.draft(vec![ItemDraft {
    item_id:         None,
    exam_type_id:    short_exam.exam_type_id,
    practitioner_id: fx.practitioner_id,
    charged_value:   None,
  }]);
  draft.visit_date = Some(date(2023, 1, 31));

  let visit = fx.store.upsert_visit(fx.ctx(), draft).await.unwrap();
  let items = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert_eq!(items[0].expires_on, date(2023, 2, 28));
}

#[tokio::test]
async fn unknown_exam_type_fails_and_rolls_everything_back() {
  let fx = fixture().await;
  let mut dangling = fx.item();
  dangling.exam_type_id = Uuid::new_v4();

  let err = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item(), dangling]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ExamTypeNotFound(_)));

  // Nothing survived: no master row, no employment link.
  let visits = fx
    .store
    .search_visits(fx.ctx(), &VisitQuery::default())
    .await
    .unwrap();
  assert!(visits.is_empty());

  let employments = fx
    .store
    .employments(fx.employee_id, fx.client_id)
    .await
    .unwrap();
  assert!(employments.is_empty());
}

// ─── Item writer ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn charged_value_defaults_to_the_exam_list_value() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();

  let items = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert_eq!(items[0].charged_value, money(8500));
}

#[tokio::test]
async fn explicit_charged_value_is_normalised_to_two_places() {
  let fx = fixture().await;
  let mut item = fx.item();
  item.charged_value = Some(Decimal::new(123_456, 4)); // 12.3456

  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![item]))
    .await
    .unwrap();

  let items = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert_eq!(items[0].charged_value, money(1235)); // 12.35
}

#[tokio::test]
async fn stale_item_id_is_not_found_and_aborts_the_edit() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();
  let original = fx.store.visit_items(visit.visit_id).await.unwrap();

  let mut edit = fx.draft(vec![ItemDraft {
    item_id: Some(Uuid::new_v4()),
    ..fx.item()
  }]);
  edit.visit_id = Some(visit.visit_id);

  let err = fx.store.upsert_visit(fx.ctx(), edit).await.unwrap_err();
  assert!(matches!(err, Error::ItemNotFound(_)));

  // Reconciliation had already removed the stored item inside the
  // transaction; the rollback restored it.
  let items = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].item_id, original[0].item_id);
}

// ─── Soft delete ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn cancel_flips_status_and_hard_deletes_items() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item(), fx.item()]))
    .await
    .unwrap();

  fx.store.cancel_visit(fx.ctx(), visit.visit_id).await.unwrap();

  let stored = fx
    .store
    .get_visit(fx.ctx(), visit.visit_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.status, VisitStatus::Cancelled);

  let items = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert!(items.is_empty());
}

#[tokio::test]
async fn cancel_unknown_visit_is_not_found() {
  let fx = fixture().await;
  let err = fx
    .store
    .cancel_visit(fx.ctx(), Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::VisitNotFound(_)));
}

#[tokio::test]
async fn cancel_under_wrong_tenant_is_not_found_and_keeps_items() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();

  let other = AuthContext::new(Uuid::new_v4(), fx.user_id);
  let err = fx
    .store
    .cancel_visit(other, visit.visit_id)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::VisitNotFound(_)));

  let items = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert_eq!(items.len(), 1);
}

// ─── Round-trip and reads ────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_read_back_matches_the_submission() {
  let fx = fixture().await;
  let mut item = fx.item();
  item.charged_value = Some(money(9900));

  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![item]))
    .await
    .unwrap();

  let stored = fx
    .store
    .get_visit(fx.ctx(), visit.visit_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.visit_id, visit.visit_id);
  assert_eq!(stored.employee_id, fx.employee_id);
  assert_eq!(stored.client_id, fx.client_id);
  assert_eq!(stored.visit_date, date(2023, 1, 1));
  assert_eq!(stored.payment_method, PaymentMethod::Invoice);
  assert_eq!(stored.kind, VisitKind::Admission);
  assert_eq!(stored.role, "welder");

  let items = fx.store.visit_items(visit.visit_id).await.unwrap();
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].visit_id, visit.visit_id);
  assert_eq!(items[0].exam_type_id, fx.exam_id);
  assert_eq!(items[0].practitioner_id, fx.practitioner_id);
  assert_eq!(items[0].charged_value, money(9900));
}

#[tokio::test]
async fn get_visit_under_wrong_tenant_returns_none() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();

  let other = AuthContext::new(Uuid::new_v4(), fx.user_id);
  let fetched = fx.store.get_visit(other, visit.visit_id).await.unwrap();
  assert!(fetched.is_none());
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_excludes_cancelled_unless_requested() {
  let fx = fixture().await;
  let visit = fx
    .store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();
  fx.store.cancel_visit(fx.ctx(), visit.visit_id).await.unwrap();

  let active = fx
    .store
    .search_visits(fx.ctx(), &VisitQuery::default())
    .await
    .unwrap();
  assert!(active.is_empty());

  let all = fx
    .store
    .search_visits(
      fx.ctx(),
      &VisitQuery { include_cancelled: true, ..Default::default() },
    )
    .await
    .unwrap();
  assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn search_filters_by_employee() {
  let fx = fixture().await;
  fx.store
    .upsert_visit(fx.ctx(), fx.draft(vec![fx.item()]))
    .await
    .unwrap();

  let other_employee = fx
    .store
    .add_employee(NewEmployee {
      full_name: "Bruno Lima".into(),
      cpf:       None,
      born_on:   None,
    })
    .await
    .unwrap();
  let mut draft = fx.draft(vec![fx.item()]);
  draft.employee_id = other_employee.employee_id;
  fx.store.upsert_visit(fx.ctx(), draft).await.unwrap();

  let results = fx
    .store
    .search_visits(
      fx.ctx(),
      &VisitQuery {
        employee_id: Some(fx.employee_id),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(results.len(), 1);
  assert_eq!(results[0].employee_id, fx.employee_id);
}
