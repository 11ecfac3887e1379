//! Resolved caller identity.
//!
//! Authentication and authorization happen upstream; by the time a request
//! reaches the store it carries, at most, a tenant id and a user id. The
//! store trusts both for scoping and makes no access decision of its own.

use uuid::Uuid;

/// The ambient identity attached to a request.
///
/// A missing tenant id is not an error at construction time — write
/// operations reject it as unauthorized before touching the database.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthContext {
  pub tenant_id: Option<Uuid>,
  pub user_id:   Option<Uuid>,
}

impl AuthContext {
  /// Context for a fully-resolved caller.
  pub fn new(tenant_id: Uuid, user_id: Uuid) -> Self {
    Self {
      tenant_id: Some(tenant_id),
      user_id:   Some(user_id),
    }
  }
}
