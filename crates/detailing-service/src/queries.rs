//! Read-side sale queries: listings, sale detail and the home summary.

use tracing::debug;

use detailing_core::{
    HomeSummary, PaymentStatus, ProductSaleListing, ProductStock, SaleDetail, SaleType,
    RECENT_SALES_LIMIT,
};
use detailing_db::Database;

use crate::error::ServiceResult;

/// Read-only sale views.
#[derive(Debug, Clone)]
pub struct SaleQueries {
    db: Database,
}

impl SaleQueries {
    pub fn new(db: Database) -> Self {
        SaleQueries { db }
    }

    /// Every active product sale, newest first.
    pub async fn list_product_sales(&self) -> ServiceResult<Vec<ProductSaleListing>> {
        Ok(self.db.sales().list_product_sales().await?)
    }

    /// A sale header with the lines matching its type.
    pub async fn get_sale(&self, sale_id: i64) -> ServiceResult<SaleDetail> {
        let sales = self.db.sales();
        let sale = sales.get_by_id(sale_id).await?;

        let (product_lines, service_lines) = match sale.sale_type {
            SaleType::Product => (sales.product_lines(sale_id).await?, Vec::new()),
            SaleType::Service => (Vec::new(), sales.service_lines(sale_id).await?),
        };

        Ok(SaleDetail {
            sale,
            product_lines,
            service_lines,
        })
    }

    /// Revenue by payment state, recent sales and low-stock products.
    pub async fn home_summary(&self) -> ServiceResult<HomeSummary> {
        let sales = self.db.sales();
        let catalog = self.db.catalog();

        let (confirmed, pending, recent_service, recent_product, low_stock) = tokio::try_join!(
            sales.total_by_payment_status(PaymentStatus::Confirmed),
            sales.total_by_payment_status(PaymentStatus::Pending),
            sales.recent_service_sales(RECENT_SALES_LIMIT),
            sales.recent_product_sales(RECENT_SALES_LIMIT),
            catalog.low_stock_products(),
        )?;
        debug!(low_stock = low_stock.len(), "Built home summary");

        Ok(HomeSummary {
            confirmed_payments: confirmed,
            pending_payments: pending,
            total_sales: confirmed + pending,
            recent_service_sales: recent_service,
            recent_product_sales: recent_product,
            low_stock_products: low_stock.into_iter().map(ProductStock::from).collect(),
        })
    }
}
