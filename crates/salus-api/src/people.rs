//! Handlers for `/employees` and `/clients` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/employees` | Body: [`NewEmployee`]; returns 201 + stored row |
//! | `GET`  | `/employees/:id` | 404 if not found |
//! | `GET`  | `/employees/:id/employments` | `?client_id` required |
//! | `POST` | `/clients` | Body: [`NewClient`]; returns 201 + stored row |
//! | `GET`  | `/clients/:id` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use salus_core::{
  employment::Employment,
  party::{Client, Employee, NewClient, NewEmployee},
  store::ClinicStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Employees ───────────────────────────────────────────────────────────────

/// `POST /employees`
pub async fn create_employee<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewEmployee>,
) -> Result<impl IntoResponse, ApiError>
where S: ClinicStore {
  let employee = store
    .add_employee(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(employee)))
}

/// `GET /employees/:id`
pub async fn get_employee<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Employee>, ApiError>
where S: ClinicStore {
  let employee = store
    .get_employee(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("employee {id} not found")))?;
  Ok(Json(employee))
}

// ─── Employments ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EmploymentParams {
  pub client_id: Uuid,
}

/// `GET /employees/:id/employments?client_id=<id>`
pub async fn employments<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<EmploymentParams>,
) -> Result<Json<Vec<Employment>>, ApiError>
where S: ClinicStore {
  let rows = store
    .employments(id, params.client_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(rows))
}

// ─── Clients ─────────────────────────────────────────────────────────────────

/// `POST /clients`
pub async fn create_client<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewClient>,
) -> Result<impl IntoResponse, ApiError>
where S: ClinicStore {
  let client = store.add_client(body).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(client)))
}

/// `GET /clients/:id`
pub async fn get_client<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Client>, ApiError>
where S: ClinicStore {
  let client = store
    .get_client(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("client {id} not found")))?;
  Ok(Json(client))
}
