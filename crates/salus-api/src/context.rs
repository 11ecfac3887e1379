//! Caller context extraction.
//!
//! Tenant and caller identity are resolved by upstream middleware and arrive
//! as plain headers. A missing or malformed header yields no tenant; the
//! store rejects that as unauthorized before any write, so handlers never
//! need to special-case it.

use axum::http::HeaderMap;
use salus_core::auth::AuthContext;
use uuid::Uuid;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";

/// Build the [`AuthContext`] for a request from its headers.
pub fn auth_context(headers: &HeaderMap) -> AuthContext {
  AuthContext {
    tenant_id: header_uuid(headers, TENANT_HEADER),
    user_id:   header_uuid(headers, USER_HEADER),
  }
}

fn header_uuid(headers: &HeaderMap, name: &str) -> Option<Uuid> {
  headers.get(name)?.to_str().ok()?.parse().ok()
}
