//! # Data Transfer Objects
//!
//! Plain request/response shapes exchanged with the routing layer.
//!
//! ## Wire Conventions
//! - Sale mutations (requests, receipts, status changes) use snake_case
//!   keys: `sale_id`, `payment_status_id`, ...
//! - Read-side views (listings, home summary) use camelCase keys.
//! - Money is always integer cents.
//!
//! Receipts enumerate exactly the fields they return. Nothing from the
//! request is echoed back unless the server resolved or re-derived it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Product, Sale, SaleProductLine, SaleServiceLine};

// =============================================================================
// Acting Identity
// =============================================================================

/// Who is performing a mutation. Supplied by the (external) auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub username: Option<String>,
    pub ip_address: Option<String>,
}

impl Actor {
    pub fn new(user_id: i64) -> Self {
        Actor {
            user_id,
            username: None,
            ip_address: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }
}

// =============================================================================
// Sale Requests
// =============================================================================

/// One requested product line. Prices are never accepted from callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLineRequest {
    pub product_id: i64,
    pub quantity: i64,
}

/// Input of `create_product_sale`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSaleRequest {
    pub client_id: i64,
    pub payment_method_id: i64,
    /// Defaults to Pending.
    #[serde(default)]
    pub payment_status_id: Option<i64>,
    #[serde(default)]
    pub observations: Option<String>,
    pub products: Vec<ProductLineRequest>,
}

/// One requested service line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLineRequest {
    pub service_id: i64,
}

/// Input of `create_service_sale`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSaleRequest {
    pub client_id: i64,
    pub vehicle_id: i64,
    pub payment_method_id: i64,
    #[serde(default)]
    pub payment_status_id: Option<i64>,
    #[serde(default)]
    pub observations: Option<String>,
    pub services: Vec<ServiceLineRequest>,
}

/// Body of the payment status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusUpdate {
    pub payment_status_id: i64,
}

/// Body of the service status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatusUpdate {
    pub service_status_id: i64,
}

// =============================================================================
// Sale Responses
// =============================================================================

/// A persisted product line as priced by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductReceiptLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Result of `create_product_sale`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSaleReceipt {
    pub sale_id: i64,
    pub total: Money,
    pub client_id: i64,
    pub payment_method_id: i64,
    pub payment_status_id: i64,
    pub observations: Option<String>,
    pub products: Vec<ProductReceiptLine>,
}

/// A persisted service line as priced by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceReceiptLine {
    pub service_id: i64,
    pub price: Money,
}

/// Result of `create_service_sale`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceSaleReceipt {
    pub sale_id: i64,
    pub total: Money,
    pub client_id: i64,
    pub vehicle_id: i64,
    pub payment_method_id: i64,
    pub payment_status_id: i64,
    pub service_status_id: i64,
    pub observations: Option<String>,
    pub services: Vec<ServiceReceiptLine>,
}

/// Result of `update_payment_status`.
///
/// `service_status_id` is present when the update touched it (cancel cascade).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentStatusChanged {
    pub sale_id: i64,
    pub payment_status_id: i64,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub service_status_id: Option<i64>,
}

/// Result of `update_service_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceStatusChanged {
    pub sale_id: i64,
    pub service_status_id: i64,
}

// =============================================================================
// Read-Side Views
// =============================================================================

/// Row of the product sales listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSaleListing {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub payment_method: String,
    pub payment_status: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,
    pub observations: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Header plus lines of one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    pub sale: Sale,
    pub product_lines: Vec<SaleProductLine>,
    pub service_lines: Vec<SaleServiceLine>,
}

/// Product stock view with the derived low-stock flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductStock {
    pub id: i64,
    pub name: String,
    pub price: Money,
    pub stock: i64,
    pub min_stock: i64,
    pub low_stock: bool,
}

impl From<Product> for ProductStock {
    fn from(product: Product) -> Self {
        let low_stock = product.is_low_stock();
        ProductStock {
            id: product.id,
            name: product.name,
            price: product.price,
            stock: product.stock,
            min_stock: product.min_stock,
            low_stock,
        }
    }
}

/// Recent service sale card on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RecentServiceSale {
    pub id: i64,
    pub client_name: String,
    pub vehicle_plate: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,
    pub payment_status: String,
    pub service_status: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// One product line inside a recent product sale card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RecentProductLine {
    #[serde(skip)]
    #[ts(skip)]
    pub sale_id: i64,
    pub product_name: String,
    pub quantity: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "price_cents"))]
    pub unit_price: Money,
}

/// Recent product sale card on the home screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RecentProductSale {
    pub id: i64,
    pub client_name: String,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,
    pub payment_status: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub products: Vec<RecentProductLine>,
}

/// Home screen summary.
///
/// `total_sales = confirmed_payments + pending_payments`; canceled sales
/// count toward neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HomeSummary {
    pub confirmed_payments: Money,
    pub pending_payments: Money,
    pub total_sales: Money,
    pub recent_service_sales: Vec<RecentServiceSale>,
    pub recent_product_sales: Vec<RecentProductSale>,
    pub low_stock_products: Vec<ProductStock>,
}

// =============================================================================
// Unit Tests
// =============================================================================
