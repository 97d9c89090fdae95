//! Error types for `homeroom-core`.

use thiserror::Error;
use uuid::Uuid;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("subject not found: {0}")]
  SubjectNotFound(Uuid),

  #[error("homework not found: {0}")]
  HomeworkNotFound(Uuid),

  #[error("subject {id} is still used by {count} homework item(s)")]
  SubjectInUse { id: Uuid, count: usize },

  #[error("subject name must not be empty")]
  EmptySubjectName,

  #[error("invalid color {0:?}: expected #rgb or #rrggbb")]
  InvalidColor(String),

  /// The backend rejected a write. Never retried.
  #[error("write rejected: {0}")]
  Write(#[source] BoxError),

  /// A one-shot read against the backend failed.
  #[error("read failed: {0}")]
  Read(#[source] BoxError),

  #[error("projector is already running")]
  AlreadyStarted,
}

impl Error {
  pub fn write(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Write(Box::new(e))
  }

  pub fn read(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Read(Box::new(e))
  }

  /// Whether the operation targeted an id the backend does not know.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::SubjectNotFound(_) | Self::HomeworkNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
