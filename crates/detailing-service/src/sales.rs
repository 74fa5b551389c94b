//! # Sale Builder
//!
//! Creates product and service sales as single atomic transactions.
//!
//! ## Product Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate request (no I/O)                                              │
//! │       │                                                                 │
//! │  BEGIN ─► client active? ─► load products by id ─► price + stock check  │
//! │       │                                                                 │
//! │       ├─► INSERT sale header (total from catalog prices)                │
//! │       ├─► INSERT one line per request line (price snapshot)             │
//! │       ├─► UPDATE stock  WHERE stock >= demand   (0 rows → abort)        │
//! │       ▼                                                                 │
//! │  COMMIT ──► audit SUCCESS          any error ──► ROLLBACK, audit FAILURE│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded stock update makes the decrement conditional on the stock
//! the sale was priced against, so two sales racing for the last units can
//! never both commit.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument, warn};

use detailing_core::pricing::{distinct_ids, price_product_sale, price_service_sale};
use detailing_core::validation::{validate_product_sale, validate_service_sale};
use detailing_core::{
    Actor, AuditAction, AuditEntry, CoreError, ProductReceiptLine,
    ProductSaleReceipt, ProductSaleRequest, SaleType, ServiceReceiptLine, ServiceSaleReceipt,
    ServiceSaleRequest, ServiceStatus,
};
use detailing_db::{CatalogRepository, Database, NewSale, SaleRepository};

use crate::audit::{emit, AuditSink};
use crate::error::ServiceResult;
use crate::tx::with_deadline;

/// Audit entity name for sale headers.
pub(crate) const SALES_ENTITY: &str = "sales";

/// Builds and persists sales.
#[derive(Clone)]
pub struct SaleBuilder {
    db: Database,
    audit: Arc<dyn AuditSink>,
    tx_timeout: Duration,
}

impl SaleBuilder {
    pub fn new(db: Database, audit: Arc<dyn AuditSink>, tx_timeout: Duration) -> Self {
        SaleBuilder {
            db,
            audit,
            tx_timeout,
        }
    }

    // =========================================================================
    // Product Sales
    // =========================================================================

    /// Creates a PRODUCT sale, decrementing stock for every line.
    #[instrument(skip(self, request), fields(user_id = actor.user_id, client_id = request.client_id))]
    pub async fn create_product_sale(
        &self,
        actor: &Actor,
        request: ProductSaleRequest,
    ) -> ServiceResult<ProductSaleReceipt> {
        let result = with_deadline(
            "create_product_sale",
            self.tx_timeout,
            self.product_sale_tx(actor, &request),
        )
        .await;

        let entry = AuditEntry::new(actor, AuditAction::Create, SALES_ENTITY);
        match &result {
            Ok(receipt) => {
                info!(
                    sale_id = receipt.sale_id,
                    total = %receipt.total,
                    lines = receipt.products.len(),
                    "Product sale created"
                );
                emit(
                    self.audit.as_ref(),
                    entry
                        .entity_id(receipt.sale_id)
                        .changes(None, serde_json::to_value(receipt).ok()),
                );
            }
            Err(e) => {
                warn!(kind = ?e.kind, error = %e.message, "Product sale rejected");
                emit(
                    self.audit.as_ref(),
                    entry
                        .changes(None, serde_json::to_value(&request).ok())
                        .failed(e.message.clone()),
                );
            }
        }

        result
    }

    async fn product_sale_tx(
        &self,
        actor: &Actor,
        request: &ProductSaleRequest,
    ) -> ServiceResult<ProductSaleReceipt> {
        let payment_status = validate_product_sale(request)?;

        let mut tx = self.db.begin_write().await?;

        if !CatalogRepository::client_exists(&mut tx, request.client_id).await? {
            return Err(CoreError::not_found("Client", request.client_id).into());
        }

        let ids = distinct_ids(request.products.iter().map(|line| line.product_id));
        let catalog = CatalogRepository::active_products(&mut tx, &ids).await?;
        let plan = price_product_sale(&request.products, &catalog)?;

        let now = Utc::now();
        let sale_id = SaleRepository::insert_sale(
            &mut tx,
            &NewSale {
                client_id: request.client_id,
                vehicle_id: None,
                sale_type: SaleType::Product,
                payment_status,
                service_status: None,
                payment_method_id: request.payment_method_id,
                total: plan.total,
                observations: request.observations.clone(),
                created_by: actor.user_id,
                created_at: now,
            },
        )
        .await?;

        for line in &plan.lines {
            SaleRepository::insert_product_line(&mut tx, sale_id, line, actor.user_id, now).await?;
        }

        for product_id in &ids {
            let demand: i64 = plan
                .lines
                .iter()
                .filter(|line| line.product_id == *product_id)
                .map(|line| line.quantity)
                .sum();

            if !CatalogRepository::decrement_stock(&mut tx, *product_id, demand, actor.user_id)
                .await?
            {
                let (name, available) = plan
                    .lines
                    .iter()
                    .find(|line| line.product_id == *product_id)
                    .map(|line| (line.product_name.clone(), line.available))
                    .unwrap_or_default();
                return Err(CoreError::InsufficientStock {
                    product_id: *product_id,
                    name,
                    available,
                    requested: demand,
                }
                .into());
            }
        }

        tx.commit().await?;

        for product_id in &plan.low_stock_product_ids {
            warn!(product_id, sale_id, "Product at or below minimum stock");
        }

        Ok(ProductSaleReceipt {
            sale_id,
            total: plan.total,
            client_id: request.client_id,
            payment_method_id: request.payment_method_id,
            payment_status_id: payment_status.id(),
            observations: request.observations.clone(),
            products: plan
                .lines
                .iter()
                .map(|line| ProductReceiptLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                    subtotal: line.subtotal,
                })
                .collect(),
        })
    }

    // =========================================================================
    // Service Sales
    // =========================================================================

    /// Creates a SERVICE sale for a client's vehicle. Service status starts
    /// at Pending.
    #[instrument(skip(self, request), fields(user_id = actor.user_id, client_id = request.client_id))]
    pub async fn create_service_sale(
        &self,
        actor: &Actor,
        request: ServiceSaleRequest,
    ) -> ServiceResult<ServiceSaleReceipt> {
        let result = with_deadline(
            "create_service_sale",
            self.tx_timeout,
            self.service_sale_tx(actor, &request),
        )
        .await;

        let entry = AuditEntry::new(actor, AuditAction::Create, SALES_ENTITY);
        match &result {
            Ok(receipt) => {
                info!(
                    sale_id = receipt.sale_id,
                    total = %receipt.total,
                    vehicle_id = receipt.vehicle_id,
                    "Service sale created"
                );
                emit(
                    self.audit.as_ref(),
                    entry
                        .entity_id(receipt.sale_id)
                        .changes(None, serde_json::to_value(receipt).ok()),
                );
            }
            Err(e) => {
                warn!(kind = ?e.kind, error = %e.message, "Service sale rejected");
                emit(
                    self.audit.as_ref(),
                    entry
                        .changes(None, serde_json::to_value(&request).ok())
                        .failed(e.message.clone()),
                );
            }
        }

        result
    }

    async fn service_sale_tx(
        &self,
        actor: &Actor,
        request: &ServiceSaleRequest,
    ) -> ServiceResult<ServiceSaleReceipt> {
        let payment_status = validate_service_sale(request)?;

        let mut tx = self.db.begin_write().await?;

        if !CatalogRepository::client_exists(&mut tx, request.client_id).await? {
            return Err(CoreError::not_found("Client", request.client_id).into());
        }

        let owner = CatalogRepository::vehicle_owner(&mut tx, request.vehicle_id).await?;
        if owner != Some(request.client_id) {
            return Err(CoreError::VehicleNotOwned {
                vehicle_id: request.vehicle_id,
                client_id: request.client_id,
            }
            .into());
        }

        let ids = distinct_ids(request.services.iter().map(|line| line.service_id));
        let catalog = CatalogRepository::active_services(&mut tx, &ids).await?;
        let plan = price_service_sale(&request.services, &catalog)?;

        let now = Utc::now();
        let sale_id = SaleRepository::insert_sale(
            &mut tx,
            &NewSale {
                client_id: request.client_id,
                vehicle_id: Some(request.vehicle_id),
                sale_type: SaleType::Service,
                payment_status,
                service_status: Some(ServiceStatus::Pending),
                payment_method_id: request.payment_method_id,
                total: plan.total,
                observations: request.observations.clone(),
                created_by: actor.user_id,
                created_at: now,
            },
        )
        .await?;

        for line in &plan.lines {
            SaleRepository::insert_service_line(&mut tx, sale_id, line, actor.user_id, now).await?;
        }

        tx.commit().await?;

        Ok(ServiceSaleReceipt {
            sale_id,
            total: plan.total,
            client_id: request.client_id,
            vehicle_id: request.vehicle_id,
            payment_method_id: request.payment_method_id,
            payment_status_id: payment_status.id(),
            service_status_id: ServiceStatus::Pending.id(),
            observations: request.observations.clone(),
            services: plan
                .lines
                .iter()
                .map(|line| ServiceReceiptLine {
                    service_id: line.service_id,
                    price: line.price,
                })
                .collect(),
        })
    }
}

impl std::fmt::Debug for SaleBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaleBuilder")
            .field("tx_timeout", &self.tx_timeout)
            .finish_non_exhaustive()
    }
}
