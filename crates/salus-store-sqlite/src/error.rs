//! Error type for `salus-store-sqlite`.

use salus_core::{ErrorKind, StoreError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// The caller's context carried no tenant id.
  #[error("missing tenant context")]
  MissingTenant,

  /// The visit is absent, or belongs to another tenant.
  #[error("visit not found: {0}")]
  VisitNotFound(Uuid),

  /// A submitted item id resolved to no stored row under its visit.
  #[error("visit item not found: {0}")]
  ItemNotFound(Uuid),

  /// A submitted item referenced a nonexistent exam type.
  #[error("exam type not found: {0}")]
  ExamTypeNotFound(Uuid),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("database error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column failed to decode (date, decimal, or enum discriminant).
  #[error("column decode error: {0}")]
  Decode(String),
}

impl Error {
  /// Map a `tokio_rusqlite` call failure back to a store error. Domain
  /// errors raised inside the connection closure travel through
  /// [`tokio_rusqlite::Error::Other`] and come back out intact here.
  pub(crate) fn from_call(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::Other(inner) => match inner.downcast::<Error>() {
        Ok(ours) => *ours,
        Err(other) => Error::Database(tokio_rusqlite::Error::Other(other)),
      },
      other => Error::Database(other),
    }
  }
}

impl From<Error> for tokio_rusqlite::Error {
  fn from(e: Error) -> Self { tokio_rusqlite::Error::Other(Box::new(e)) }
}

impl StoreError for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Error::MissingTenant => ErrorKind::Unauthorized,
      Error::VisitNotFound(_) | Error::ItemNotFound(_) => ErrorKind::NotFound,
      Error::ExamTypeNotFound(_) => ErrorKind::UnknownExamType,
      Error::Database(_) | Error::Sqlite(_) | Error::Uuid(_) | Error::Decode(_) => {
        ErrorKind::Persistence
      }
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
