//! # Sale Pricing
//!
//! Turns a validated sale request plus the catalog rows loaded inside the
//! sale transaction into a priced plan the database layer can persist.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request lines ──► distinct ids ──► [db] batch fetch active rows        │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                           price_product_sale / price_service_sale       │
//! │                           ├── every id present?    else NotFound(id)    │
//! │                           ├── demand <= stock?     else InsufficientStock│
//! │                           └── catalog price × qty  → lines + total      │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                           [db] insert header, lines, decrement stock    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices come from the catalog rows only; request DTOs carry no price field.

use std::collections::HashMap;

use crate::dto::{ProductLineRequest, ServiceLineRequest};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, Service};

// =============================================================================
// Plans
// =============================================================================

/// A product line priced from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedProductLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
    /// Stock on hand when the plan was made.
    pub available: i64,
}

/// Priced product sale, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSalePlan {
    pub lines: Vec<PricedProductLine>,
    pub total: Money,
    /// Products this sale leaves at or below their minimum stock.
    pub low_stock_product_ids: Vec<i64>,
}

/// A service line priced from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedServiceLine {
    pub service_id: i64,
    pub service_name: String,
    pub price: Money,
}

/// Priced service sale, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSalePlan {
    pub lines: Vec<PricedServiceLine>,
    pub total: Money,
}

// =============================================================================
// Helpers
// =============================================================================

/// Distinct ids in order of first appearance.
pub fn distinct_ids(ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut seen = Vec::new();
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

fn overflow() -> CoreError {
    CoreError::InvalidInput("sale total exceeds the supported amount".to_string())
}

// =============================================================================
// Product Sales
// =============================================================================

/// Prices a product sale against the active catalog rows.
///
/// Demand for a product listed on several lines is summed before the stock
/// check. Lines keep the request order.
pub fn price_product_sale(
    lines: &[ProductLineRequest],
    catalog: &[Product],
) -> CoreResult<ProductSalePlan> {
    let by_id: HashMap<i64, &Product> = catalog.iter().map(|p| (p.id, p)).collect();

    let mut demand: Vec<(i64, i64)> = Vec::new();
    for line in lines {
        if !by_id.contains_key(&line.product_id) {
            return Err(CoreError::not_found("Product", line.product_id));
        }
        match demand.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, qty)) => *qty += line.quantity,
            None => demand.push((line.product_id, line.quantity)),
        }
    }

    let mut low_stock_product_ids = Vec::new();
    for (product_id, requested) in &demand {
        let product = by_id[product_id];
        if product.stock < *requested {
            return Err(CoreError::InsufficientStock {
                product_id: *product_id,
                name: product.name.clone(),
                available: product.stock,
                requested: *requested,
            });
        }
        if product.is_low_stock_after(*requested) {
            low_stock_product_ids.push(*product_id);
        }
    }

    let mut total = Money::zero();
    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let product = by_id[&line.product_id];
        let subtotal = product
            .price
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(overflow)?;
        total = total.checked_add(subtotal).ok_or_else(overflow)?;

        priced.push(PricedProductLine {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: line.quantity,
            unit_price: product.price,
            subtotal,
            available: product.stock,
        });
    }

    Ok(ProductSalePlan {
        lines: priced,
        total,
        low_stock_product_ids,
    })
}

// =============================================================================
// Service Sales
// =============================================================================

/// Prices a service sale against the active catalog rows.
///
/// The same service may appear more than once (e.g. two washes); each line
/// is charged. A missing service is reported by id.
pub fn price_service_sale(
    lines: &[ServiceLineRequest],
    catalog: &[Service],
) -> CoreResult<ServiceSalePlan> {
    let by_id: HashMap<i64, &Service> = catalog.iter().map(|s| (s.id, s)).collect();

    let mut total = Money::zero();
    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let service = by_id
            .get(&line.service_id)
            .ok_or_else(|| CoreError::not_found("Service", line.service_id))?;
        total = total.checked_add(service.price).ok_or_else(overflow)?;

        priced.push(PricedServiceLine {
            service_id: service.id,
            service_name: service.name.clone(),
            price: service.price,
        });
    }

    Ok(ServiceSalePlan {
        lines: priced,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
