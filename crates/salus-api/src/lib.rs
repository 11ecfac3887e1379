//! JSON REST API for Salus.
//!
//! Exposes an axum [`Router`] backed by any [`salus_core::store::ClinicStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility; tenant
//! and caller identity arrive as `x-tenant-id` / `x-user-id` headers resolved
//! upstream.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", salus_api::api_router(store.clone()))
//! ```

pub mod catalog;
pub mod context;
pub mod error;
pub mod people;
pub mod visits;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use salus_core::store::ClinicStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where S: ClinicStore + Send + Sync + 'static {
  Router::new()
    // Visits
    .route("/visits", post(visits::upsert::<S>).get(visits::list::<S>))
    .route(
      "/visits/{id}",
      get(visits::get_one::<S>).delete(visits::cancel::<S>),
    )
    .route("/visits/{id}/items", get(visits::items::<S>))
    // Exam catalog
    .route("/exam-types", get(catalog::list::<S>).post(catalog::create::<S>))
    .route("/exam-types/{id}", get(catalog::get_one::<S>))
    // Referenced identities
    .route("/employees", post(people::create_employee::<S>))
    .route("/employees/{id}", get(people::get_employee::<S>))
    .route("/employees/{id}/employments", get(people::employments::<S>))
    .route("/clients", post(people::create_client::<S>))
    .route("/clients/{id}", get(people::get_client::<S>))
    .with_state(store)
}
