//! # Service Error Type
//!
//! Unified error for every use case.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CoreError (rules, lookups) ──┐                                         │
//! │                               ├──► ServiceError ──► kind() / status     │
//! │  DbError (storage) ───────────┘                                         │
//! │                                                                         │
//! │  NotFound 404 · InvalidState 409 · BusinessRule 400 · Validation 400    │
//! │  Persistence 500                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A returned error means the use case's database transaction was dropped
//! without commit: nothing it wrote is visible.

use serde::Serialize;
use thiserror::Error;

use tavern_core::{CoreError, ErrorKind, ValidationError};
use tavern_db::DbError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Core(err) => err.kind(),
            ServiceError::Db(_) => ErrorKind::Persistence,
        }
    }

    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// The domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            ServiceError::Core(err) => Some(err),
            ServiceError::Db(_) => None,
        }
    }

    /// Serializable form for an API boundary.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.kind(),
            message: self.to_string(),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Db(DbError::from(err))
    }
}

/// What a caller receives when a use case fails.
///
/// ```json
/// { "code": "INVALID_STATE", "message": "Shift 6f1c... has already ended" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorKind,
    pub message: String,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tavern_core::Money;

    #[test]
    fn test_kinds_map_to_status_codes() {
        let not_found: ServiceError = CoreError::OrderNotFound("o-1".to_string()).into();
        assert_eq!(not_found.status_code(), 404);

        let invalid: ServiceError = CoreError::ShiftAlreadyEnded("s-1".to_string()).into();
        assert_eq!(invalid.kind(), ErrorKind::InvalidState);

        let rule: ServiceError = CoreError::InsufficientBalance {
            account_id: "a".to_string(),
            available: Money::from_cents(100),
            requested: Money::from_cents(200),
        }
        .into();
        assert_eq!(rule.status_code(), 400);

        let storage: ServiceError = DbError::PoolExhausted.into();
        assert_eq!(storage.kind(), ErrorKind::Persistence);
        assert!(storage.as_core().is_none());
    }

    #[test]
    fn test_body_serializes_code_and_message() {
        let err: ServiceError = CoreError::OrderAlreadyFinalized {
            order_id: "o-1".to_string(),
            status: "paid".to_string(),
        }
        .into();

        let json = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(json["code"], "INVALID_STATE");
        assert_eq!(json["message"], "Order o-1 is already paid");
    }
}
