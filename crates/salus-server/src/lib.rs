//! Server assembly for Salus: configuration and router construction.
//!
//! The binary in `main.rs` wires this to a real listener; the integration
//! tests below drive the same router in-process.

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use salus_core::store::ClinicStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and the
/// `SALUS_*` environment.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8700 }

fn default_store_path() -> PathBuf { PathBuf::from("salus.db") }

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router: the JSON API under `/api` plus a
/// liveness probe, with request tracing.
pub fn router<S>(store: Arc<S>) -> Router
where S: ClinicStore + Send + Sync + 'static {
  Router::new()
    .route("/health", get(health))
    .nest("/api", salus_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }

// ─── Integration tests ───────────────────────────────────────────────────────
