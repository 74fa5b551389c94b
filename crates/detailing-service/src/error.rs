//! # Service Errors
//!
//! The one error type the routing layer sees: a taxonomy kind plus a
//! readable message.
//!
//! ```text
//! CoreError ──► kind() ──────────────────────┐
//! DbError ───► NotFound        → NotFound    │
//!              UniqueViolation → Conflict    │
//!              ForeignKey      → InvalidInput├──► ServiceError { kind, message }
//!              Busy / Pool     → Unavailable │
//!              other           → Internal    │
//! transaction timeout          → Unavailable ┘
//! ```

use serde::Serialize;
use std::fmt;

use detailing_core::{CoreError, ErrorKind, ValidationError};
use detailing_db::DbError;

/// Error returned by every service operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ServiceError {
            kind,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorKind::Internal, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorKind::Unavailable, message)
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ServiceError {}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        ServiceError::new(err.kind(), err.to_string())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        let kind = match &err {
            DbError::NotFound { .. } => ErrorKind::NotFound,
            DbError::UniqueViolation { .. } => ErrorKind::Conflict,
            DbError::ForeignKeyViolation { .. } => ErrorKind::InvalidInput,
            DbError::Busy(_) | DbError::PoolExhausted => ErrorKind::Unavailable,
            _ => ErrorKind::Internal,
        };
        ServiceError::new(kind, err.to_string())
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_keep_their_kind() {
        let err: ServiceError = CoreError::not_found("Client", 7).into();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Client not found: 7");

        let err: ServiceError = CoreError::VehicleNotOwned {
            vehicle_id: 3,
            client_id: 1,
        }
        .into();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn test_db_errors_are_classified() {
        let busy: ServiceError = DbError::Busy("database is locked".to_string()).into();
        assert_eq!(busy.kind, ErrorKind::Unavailable);
        assert!(busy.is_retryable());

        let dup: ServiceError = DbError::UniqueViolation {
            field: "vehicles.plate".to_string(),
        }
        .into();
        assert_eq!(dup.kind, ErrorKind::Conflict);

        let other: ServiceError = DbError::QueryFailed("no such column".to_string()).into();
        assert_eq!(other.kind, ErrorKind::Internal);
        assert!(!other.is_retryable());
    }

    #[test]
    fn test_serializes_kind_in_screaming_case() {
        let err = ServiceError::new(ErrorKind::InvalidState, "Sale 4 is already in requested status: Confirmed");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "INVALID_STATE");
    }
}
