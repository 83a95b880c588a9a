//! Service error types.

use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors returned by the order service and the bootstrap.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A domain rule rejected the operation.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// The store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
