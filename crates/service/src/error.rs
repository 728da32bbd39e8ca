use thiserror::Error;

use scoopstock_core::DomainError;
use scoopstock_ledger::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Application-level error, one variant per caller-visible failure class.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Stable machine-readable code for wire payloads and log fields.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Invariant(_) => "invariant_violation",
            ServiceError::NotFound => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Unavailable(_) => "store_error",
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::Invariant(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::NotFound => ServiceError::NotFound,
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ItemNotFound | StoreError::ProductionNotFound => ServiceError::NotFound,
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::Domain(domain) => domain.into(),
            StoreError::Unavailable(msg) => ServiceError::Unavailable(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_and_domain_errors_map_to_stable_codes() {
        let missing: ServiceError = StoreError::ItemNotFound.into();
        assert_eq!(missing.code(), "not_found");

        let nested: ServiceError = StoreError::Domain(DomainError::conflict("dup")).into();
        assert_eq!(nested.code(), "conflict");

        let invalid: ServiceError = DomainError::invalid_id("not a uuid").into();
        assert_eq!(invalid.code(), "validation_error");
    }
}
