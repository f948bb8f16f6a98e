//! Operation-level error type.

use practicum_core::DomainError;
use practicum_db::StoreError;

/// Wraps domain rejections and store failures. Business-rule violations
/// stay typed (capacity vs. window vs. duplicate priority) so callers can
/// present an actionable message; store conflicts are surfaced except
/// where an idempotent operation retries them.
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for operation return values.
pub type OpResult<T> = Result<T, OpError>;

impl OpError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        OpError::Domain(DomainError::RecordNotFound {
            entity,
            id: id.to_string(),
        })
    }
}
