//! Service layer: domain operations composed from store calls.

pub mod resource_service;

use reshub_core::error::CoreError;

/// Failure of a service operation.
///
/// `Core` carries a domain decision (validation, authorization, not found).
/// `Store` is an unexpected failure of the underlying executor; it aborts the
/// enclosing transaction and is surfaced unchanged.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
