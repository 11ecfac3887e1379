//! Handlers for `/visits` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/visits` | Body: [`UpsertVisitBody`]; upsert — 201 on create, 200 on edit |
//! | `GET`    | `/visits` | `?employee_id`, `?client_id`, `?include_cancelled`, `?limit`, `?offset` |
//! | `GET`    | `/visits/:id` | Tenant-scoped; 404 otherwise |
//! | `GET`    | `/visits/:id/items` | Items in insertion order |
//! | `DELETE` | `/visits/:id` | Cancel (soft-delete); items are removed |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use salus_core::{
  store::{ClinicStore, VisitQuery},
  visit::{
    ItemDraft, PaymentMethod, Visit, VisitDraft, VisitItem, VisitKind,
  },
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{context::auth_context, error::ApiError};

// ─── Upsert ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /visits`. A present `visit_id` edits that
/// visit; an absent one creates a new visit.
#[derive(Debug, Deserialize)]
pub struct UpsertVisitBody {
  pub visit_id:       Option<Uuid>,
  pub employee_id:    Uuid,
  pub client_id:      Uuid,
  pub attendant_id:   Option<Uuid>,
  pub visit_date:     Option<NaiveDate>,
  pub payment_method: PaymentMethod,
  pub kind:           VisitKind,
  pub role:           String,
  pub items:          Vec<ItemBody>,
}

#[derive(Debug, Deserialize)]
pub struct ItemBody {
  pub item_id:         Option<Uuid>,
  pub exam_type_id:    Uuid,
  pub practitioner_id: Uuid,
  pub charged_value:   Option<Decimal>,
}

impl From<ItemBody> for ItemDraft {
  fn from(b: ItemBody) -> Self {
    ItemDraft {
      item_id:         b.item_id,
      exam_type_id:    b.exam_type_id,
      practitioner_id: b.practitioner_id,
      charged_value:   b.charged_value,
    }
  }
}

impl From<UpsertVisitBody> for VisitDraft {
  fn from(b: UpsertVisitBody) -> Self {
    VisitDraft {
      visit_id:       b.visit_id,
      employee_id:    b.employee_id,
      client_id:      b.client_id,
      attendant_id:   b.attendant_id,
      visit_date:     b.visit_date,
      payment_method: b.payment_method,
      kind:           b.kind,
      role:           b.role,
      items:          b.items.into_iter().map(ItemDraft::from).collect(),
    }
  }
}

/// `POST /visits`
pub async fn upsert<S>(
  State(store): State<Arc<S>>,
  headers: HeaderMap,
  Json(body): Json<UpsertVisitBody>,
) -> Result<impl IntoResponse, ApiError>
where S: ClinicStore {
  // Field-level validation happens upstream; the one structural rule the
  // engine relies on is a non-empty item list.
  if body.items.is_empty() {
    return Err(ApiError::BadRequest("a visit needs at least one item".into()));
  }

  let ctx = auth_context(&headers);
  let created = body.visit_id.is_none();

  let visit = store
    .upsert_visit(ctx, VisitDraft::from(body))
    .await
    .map_err(ApiError::from_store)?;

  let status = if created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(visit)))
}

// ─── List / search ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub employee_id:       Option<Uuid>,
  pub client_id:         Option<Uuid>,
  #[serde(default)]
  pub include_cancelled: bool,
  pub limit:             Option<usize>,
  pub offset:            Option<usize>,
}

/// `GET /visits[?employee_id=...][&client_id=...][&include_cancelled=true]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  headers: HeaderMap,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Visit>>, ApiError>
where S: ClinicStore {
  let ctx = auth_context(&headers);
  let query = VisitQuery {
    employee_id:       params.employee_id,
    client_id:         params.client_id,
    include_cancelled: params.include_cancelled,
    limit:             params.limit,
    offset:            params.offset,
  };

  let visits = store
    .search_visits(ctx, &query)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(visits))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /visits/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
) -> Result<Json<Visit>, ApiError>
where S: ClinicStore {
  let ctx = auth_context(&headers);
  let visit = store
    .get_visit(ctx, id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("visit {id} not found")))?;
  Ok(Json(visit))
}

// ─── Items ───────────────────────────────────────────────────────────────────

/// `GET /visits/:id/items`
pub async fn items<S>(
  State(store): State<Arc<S>>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<VisitItem>>, ApiError>
where S: ClinicStore {
  let ctx = auth_context(&headers);

  // Scope through the master row first so one tenant cannot enumerate
  // another's items by id.
  store
    .get_visit(ctx, id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("visit {id} not found")))?;

  let items = store.visit_items(id).await.map_err(ApiError::from_store)?;
  Ok(Json(items))
}

// ─── Cancel ──────────────────────────────────────────────────────────────────

/// `DELETE /visits/:id` — flips the status to cancelled and removes items.
pub async fn cancel<S>(
  State(store): State<Arc<S>>,
  headers: HeaderMap,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where S: ClinicStore {
  let ctx = auth_context(&headers);
  store
    .cancel_visit(ctx, id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
