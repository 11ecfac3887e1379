//! Handlers for `/exam-types` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/exam-types` | Full catalog, ordered by description |
//! | `POST` | `/exam-types` | Body: [`NewExamType`]; returns 201 + stored row |
//! | `GET`  | `/exam-types/:id` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use salus_core::{
  exam::{ExamType, NewExamType},
  store::ClinicStore,
};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /exam-types`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<ExamType>>, ApiError>
where S: ClinicStore {
  let exams = store.list_exam_types().await.map_err(ApiError::from_store)?;
  Ok(Json(exams))
}

/// `POST /exam-types`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewExamType>,
) -> Result<impl IntoResponse, ApiError>
where S: ClinicStore {
  let exam = store
    .add_exam_type(body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(exam)))
}

/// `GET /exam-types/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ExamType>, ApiError>
where S: ClinicStore {
  let exam = store
    .get_exam_type(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("exam type {id} not found")))?;
  Ok(Json(exam))
}
