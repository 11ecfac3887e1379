//! The stable error classification shared by all Salus backends.
//!
//! Backends keep their own error enums; callers that are generic over the
//! store (the HTTP layer, mainly) never match on backend variants. They map
//! through [`StoreError::kind`] instead, so the four outcomes a caller can
//! distinguish stay the same no matter which backend is plugged in.

/// Coarse classification of a store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// The caller's context carried no tenant id. Raised before any write.
  Unauthorized,
  /// The target row is absent, or exists under a different tenant.
  NotFound,
  /// A submitted item referenced an exam type that does not exist.
  UnknownExamType,
  /// Anything else that failed inside the transaction. Callers get one
  /// opaque failure; the detail is logged server-side only.
  Persistence,
}

/// Implemented by every backend error type.
pub trait StoreError: std::error::Error {
  fn kind(&self) -> ErrorKind;
}
