//! # Error Types
//!
//! Domain-specific error types for detailing-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  detailing-core (this file)                                             │
//! │  ├── CoreError        - Business rule failures                          │
//! │  ├── ValidationError  - Request shape failures                          │
//! │  └── ErrorKind        - Taxonomy shared by every layer                  │
//! │                                                                         │
//! │  detailing-db                                                           │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  detailing-service                                                      │
//! │  └── ServiceError     - { kind, message } handed to the routing layer   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                   │
//! │                          DbError ───┴─► ServiceError → transport status │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Messages name the offending entity and id
//! 3. Every variant maps to exactly one `ErrorKind`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Error Kind
// =============================================================================

/// Error taxonomy exposed to callers.
///
/// The routing layer maps these onto transport status codes; the core only
/// guarantees the right kind and a readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorKind {
    /// Client, product, service, sale or vehicle absent or soft-deleted.
    NotFound,
    /// Malformed or logically inconsistent request.
    InvalidInput,
    /// Uniqueness clash.
    Conflict,
    /// Insufficient stock or an illegal/no-op status transition.
    InvalidState,
    /// Unexpected data-access failure.
    Internal,
    /// Transient failure (timeout, locked database); safe to retry.
    Unavailable,
}

impl ErrorKind {
    /// Whether the caller may retry the same request unchanged.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Unavailable)
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the pure domain logic.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced row does not exist or is soft-deleted.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Insufficient stock to complete a product sale.
    ///
    /// `requested` is the combined demand of every line for the product.
    #[error(
        "Insufficient stock for product {product_id} ({name}): available {available}, requested {requested}"
    )]
    InsufficientStock {
        product_id: i64,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Vehicle missing, soft-deleted, or owned by another client.
    #[error("Vehicle {vehicle_id} is not valid for client {client_id}")]
    VehicleNotOwned { vehicle_id: i64, client_id: i64 },

    /// No-op status transition.
    #[error("Sale {sale_id} is already in requested status: {status}")]
    AlreadyInStatus { sale_id: i64, status: String },

    /// Transition not permitted by the state machine.
    #[error("Sale {sale_id} cannot move {field} from {from} to {to}")]
    IllegalTransition {
        sale_id: i64,
        field: &'static str,
        from: String,
        to: String,
    },

    /// Report range whose start falls after its end.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    /// Logically inconsistent input not covered by a dedicated variant.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for `CoreError::NotFound`.
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CoreError::NotFound { entity, id }
    }

    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::InsufficientStock { .. }
            | CoreError::AlreadyInStatus { .. }
            | CoreError::IllegalTransition { .. } => ErrorKind::InvalidState,
            CoreError::VehicleNotOwned { .. }
            | CoreError::InvertedRange { .. }
            | CoreError::InvalidInput(_)
            | CoreError::Validation(_) => ErrorKind::InvalidInput,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Request validation errors, raised before any I/O happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field or collection is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a malformed amount or date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: 7,
            name: "Ceramic Coating".to_string(),
            available: 1,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product 7 (Ceramic Coating): available 1, requested 3"
        );

        let err = CoreError::VehicleNotOwned {
            vehicle_id: 99,
            client_id: 1,
        };
        assert_eq!(err.to_string(), "Vehicle 99 is not valid for client 1");
        assert_eq!(CoreError::not_found("Product", 4).to_string(), "Product not found: 4");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::not_found("Sale", 1).kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::AlreadyInStatus {
                sale_id: 1,
                status: "Pending".to_string()
            }
            .kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(
            CoreError::VehicleNotOwned {
                vehicle_id: 1,
                client_id: 2
            }
            .kind(),
            ErrorKind::InvalidInput
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::Required {
            field: "products".to_string(),
        }
        .into();

        assert_eq!(core_err.kind(), ErrorKind::InvalidInput);
        assert_eq!(core_err.to_string(), "Validation error: products is required");
    }

    #[test]
    fn test_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorKind::InvalidState).unwrap();
        assert_eq!(json, "\"INVALID_STATE\"");
        assert!(ErrorKind::Unavailable.is_retryable());
        assert!(!ErrorKind::Internal.is_retryable());
    }
}
