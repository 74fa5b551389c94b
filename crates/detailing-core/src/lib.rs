//! # detailing-core
//!
//! Pure domain logic for the detailing shop backend: product and service
//! sales, the sale status state machine, and dashboard report shaping.
//!
//! ## Module Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        detailing-core                                   │
//! │                                                                         │
//! │  money ─────► types ─────► dto                                          │
//! │                 │           │                                           │
//! │                 ▼           ▼                                           │
//! │             pricing     validation      (sale builder rules)            │
//! │                 │                                                       │
//! │             status                      (state machine rules)           │
//! │             report                      (ranges, buckets, metrics DTOs) │
//! │             audit                       (audit entry model)             │
//! │                                                                         │
//! │  Everything here is synchronous and deterministic: the database layer   │
//! │  loads rows, this crate decides, the service layer persists.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod dto;
pub mod error;
pub mod money;
pub mod pricing;
pub mod report;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use audit::{AuditAction, AuditChanges, AuditEntry, AuditStatus};
pub use dto::*;
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines accepted on a single sale request.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single product line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum length of the free-text observations field.
pub const MAX_OBSERVATIONS_LEN: usize = 500;

/// Number of entries in each dashboard top-N ranking.
pub const TOP_N: i64 = 5;

/// Explicit ranges up to this many days (inclusive) get a daily breakdown.
pub const DAILY_BREAKDOWN_MAX_DAYS: i64 = 32;

/// Number of recent sales shown on the home summary.
pub const RECENT_SALES_LIMIT: i64 = 5;
