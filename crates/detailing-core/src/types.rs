//! # Domain Types
//!
//! Entities and fixed enumerations of the detailing shop.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Client ──< Vehicle                                                     │
//! │    │                                                                    │
//! │    └──< Sale (header) ──┬──< SaleProductLine >── Product (stock)        │
//! │         sale_type       └──< SaleServiceLine >── Service                │
//! │         payment_status                                                  │
//! │         service_status  (SERVICE sales only)                            │
//! │                                                                         │
//! │  Enumerations are stored as small integer ids in lookup tables:         │
//! │    SaleType       1 SERVICE  2 PRODUCT                                  │
//! │    PaymentStatus  1 Pending  2 Confirmed  3 Canceled                    │
//! │    ServiceStatus  1 Pending  2 InProgress 3 Completed 4 Canceled        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Sale lines copy the catalog price at creation time. Later catalog price
//! changes never touch existing sales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Sale Type
// =============================================================================

/// Whether a sale sells products (stock) or services (labour on a vehicle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i64)]
pub enum SaleType {
    Service = 1,
    Product = 2,
}

impl SaleType {
    /// Lookup-table id.
    pub const fn id(self) -> i64 {
        self as i64
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment state of a sale.
///
/// ```text
///   Pending ──► Confirmed ──► Canceled
///      │                         ▲
///      └─────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i64)]
pub enum PaymentStatus {
    Pending = 1,
    Confirmed = 2,
    Canceled = 3,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Pending,
        PaymentStatus::Confirmed,
        PaymentStatus::Canceled,
    ];

    /// Lookup-table id.
    pub const fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Canceled)
    }

    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Confirmed => "Confirmed",
            PaymentStatus::Canceled => "Canceled",
        }
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<i64> for PaymentStatus {
    type Error = ValidationError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or_else(|| ValidationError::NotAllowed {
            field: "payment_status_id".to_string(),
            allowed: Self::ALL.iter().map(|s| s.id().to_string()).collect(),
        })
    }
}

// =============================================================================
// Service Status
// =============================================================================

/// Work state of a service sale.
///
/// ```text
///   Pending ──► InProgress ──► Completed
///      │            │
///      └────────────┴──────► Canceled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i64)]
pub enum ServiceStatus {
    Pending = 1,
    InProgress = 2,
    Completed = 3,
    Canceled = 4,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 4] = [
        ServiceStatus::Pending,
        ServiceStatus::InProgress,
        ServiceStatus::Completed,
        ServiceStatus::Canceled,
    ];

    /// Lookup-table id.
    pub const fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ServiceStatus::Completed | ServiceStatus::Canceled)
    }

    pub const fn label(self) -> &'static str {
        match self {
            ServiceStatus::Pending => "Pending",
            ServiceStatus::InProgress => "In-Progress",
            ServiceStatus::Completed => "Completed",
            ServiceStatus::Canceled => "Canceled",
        }
    }
}

impl Default for ServiceStatus {
    fn default() -> Self {
        ServiceStatus::Pending
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<i64> for ServiceStatus {
    type Error = ValidationError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Self::from_id(id).ok_or_else(|| ValidationError::NotAllowed {
            field: "service_status_id".to_string(),
            allowed: Self::ALL.iter().map(|s| s.id().to_string()).collect(),
        })
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// A stocked product, as loaded for pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,

    /// Unique among active (non-deleted) products.
    pub name: String,

    /// Catalog price, authoritative for new sale lines.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "price_cents"))]
    pub price: Money,

    /// Units on hand, never negative.
    pub stock: i64,

    /// Low-stock threshold.
    pub min_stock: i64,

    pub category_id: Option<i64>,
}

impl Product {
    /// `stock <= min_stock`. Derived at read time, never stored.
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Whether `quantity` more units would leave the product at or below
    /// its threshold.
    pub fn is_low_stock_after(&self, quantity: i64) -> bool {
        self.stock - quantity <= self.min_stock
    }
}

/// A bookable service (wash, polish, coating...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Service {
    pub id: i64,
    pub name: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "price_cents"))]
    pub price: Money,
    pub category_id: Option<i64>,
}

// =============================================================================
// Sale
// =============================================================================

/// Sale header. Immutable after creation except for status fields and
/// the soft-delete marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    pub client_id: i64,

    /// Present for service sales, always `None` for product sales.
    pub vehicle_id: Option<i64>,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "sale_type_id"))]
    pub sale_type: SaleType,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "payment_status_id"))]
    pub payment_status: PaymentStatus,

    /// Present for service sales only.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "service_status_id"))]
    pub service_status: Option<ServiceStatus>,

    pub payment_method_id: i64,

    /// Computed from catalog prices at creation, never client-supplied.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,

    pub observations: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Product line with its price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleProductLine {
    pub sale_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "price_cents"))]
    pub unit_price: Money,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "subtotal_cents"))]
    pub subtotal: Money,
}

/// Service line with its price snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleServiceLine {
    pub sale_id: i64,
    pub service_id: i64,
    pub service_name: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "price_cents"))]
    pub price: Money,
}

/// The status-relevant slice of a sale, read inside a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleStatusSnapshot {
    pub id: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "sale_type_id"))]
    pub sale_type: SaleType,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "payment_status_id"))]
    pub payment_status: PaymentStatus,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "service_status_id"))]
    pub service_status: Option<ServiceStatus>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn wax(stock: i64, min_stock: i64) -> Product {
        Product {
            id: 1,
            name: "Carnauba Wax".to_string(),
            price: Money::from_cents(1899),
            stock,
            min_stock,
            category_id: None,
        }
    }

    #[test]
    fn test_low_stock_boundary() {
        assert!(wax(5, 5).is_low_stock());
        assert!(!wax(6, 5).is_low_stock());
        assert!(wax(8, 5).is_low_stock_after(3));
        assert!(!wax(9, 5).is_low_stock_after(3));
    }

    #[test]
    fn test_status_ids_round_trip() {
        for status in PaymentStatus::ALL {
            assert_eq!(PaymentStatus::from_id(status.id()), Some(status));
        }
        for status in ServiceStatus::ALL {
            assert_eq!(ServiceStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(SaleType::Product.id(), 2);
        assert_eq!(PaymentStatus::Canceled.id(), 3);
        assert_eq!(ServiceStatus::Canceled.id(), 4);
    }

    #[test]
    fn test_unknown_status_id_is_rejected() {
        assert!(PaymentStatus::try_from(0).is_err());
        assert!(PaymentStatus::try_from(4).is_err());
        assert!(ServiceStatus::try_from(5).is_err());
        assert_eq!(ServiceStatus::try_from(2).unwrap(), ServiceStatus::InProgress);
    }

    #[test]
    fn test_terminal_states() {
        assert!(PaymentStatus::Canceled.is_terminal());
        assert!(!PaymentStatus::Confirmed.is_terminal());
        assert!(ServiceStatus::Completed.is_terminal());
        assert!(ServiceStatus::Canceled.is_terminal());
        assert!(!ServiceStatus::InProgress.is_terminal());
    }
}
