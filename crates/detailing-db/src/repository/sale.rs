//! # Sale Repository
//!
//! Sale headers, their lines, status updates and the read-side listings.
//!
//! ## Write Path (inside one transaction)
//! ```text
//! insert_sale ──► insert_product_line × N   (price snapshot)
//!             └─► insert_service_line × N
//!
//! update_payment_status / update_service_status
//!     WHERE id = ? AND deleted_at IS NULL AND <status> IS <expected>
//! ```
//! Status updates only apply when the row still holds the status the caller
//! read; a concurrent change turns the update into a no-op (`false`).

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use detailing_core::pricing::{PricedProductLine, PricedServiceLine};
use detailing_core::{
    Money, PaymentStatus, ProductSaleListing, RecentProductLine, RecentProductSale,
    RecentServiceSale, Sale, SaleProductLine, SaleServiceLine, SaleStatusSnapshot, SaleType,
    ServiceStatus,
};

/// A sale header ready to insert.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub client_id: i64,
    pub vehicle_id: Option<i64>,
    pub sale_type: SaleType,
    pub payment_status: PaymentStatus,
    pub service_status: Option<ServiceStatus>,
    pub payment_method_id: i64,
    pub total: Money,
    pub observations: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

const SALE_COLUMNS: &str = "id, client_id, vehicle_id, sale_type_id, payment_status_id, \
     service_status_id, payment_method_id, total_cents, observations, \
     created_by, created_at, updated_by, updated_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Transaction-scoped writes
    // =========================================================================

    /// Inserts a sale header and returns its id.
    pub async fn insert_sale(conn: &mut SqliteConnection, sale: &NewSale) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                client_id, vehicle_id, sale_type_id, payment_status_id, service_status_id,
                payment_method_id, total_cents, observations, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(sale.client_id)
        .bind(sale.vehicle_id)
        .bind(sale.sale_type)
        .bind(sale.payment_status)
        .bind(sale.service_status)
        .bind(sale.payment_method_id)
        .bind(sale.total)
        .bind(&sale.observations)
        .bind(sale.created_by)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        let sale_id = result.last_insert_rowid();
        debug!(sale_id, sale_type = ?sale.sale_type, "Inserted sale header");
        Ok(sale_id)
    }

    /// Inserts one product line with its price snapshot.
    pub async fn insert_product_line(
        conn: &mut SqliteConnection,
        sale_id: i64,
        line: &PricedProductLine,
        created_by: i64,
        created_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_products (
                sale_id, product_id, quantity, price_cents, subtotal_cents, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(sale_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.subtotal)
        .bind(created_by)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one service line with its price snapshot.
    pub async fn insert_service_line(
        conn: &mut SqliteConnection,
        sale_id: i64,
        line: &PricedServiceLine,
        created_by: i64,
        created_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sale_services (sale_id, service_id, price_cents, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(sale_id)
        .bind(line.service_id)
        .bind(line.price)
        .bind(created_by)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Reads the status fields of an active sale.
    pub async fn status_snapshot(
        conn: &mut SqliteConnection,
        sale_id: i64,
    ) -> DbResult<Option<SaleStatusSnapshot>> {
        let snapshot = sqlx::query_as::<_, SaleStatusSnapshot>(
            r#"
            SELECT id, sale_type_id, payment_status_id, service_status_id
            FROM sales
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(sale_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(snapshot)
    }

    /// Sets the payment status, and the service status when `service_status`
    /// is `Some`, if the sale still holds `expected`.
    pub async fn update_payment_status(
        conn: &mut SqliteConnection,
        sale_id: i64,
        expected: PaymentStatus,
        payment_status: PaymentStatus,
        service_status: Option<ServiceStatus>,
        updated_by: i64,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET payment_status_id = ?3,
                service_status_id = COALESCE(?4, service_status_id),
                updated_by = ?5,
                updated_at = ?6
            WHERE id = ?1
              AND deleted_at IS NULL
              AND payment_status_id = ?2
            "#,
        )
        .bind(sale_id)
        .bind(expected)
        .bind(payment_status)
        .bind(service_status)
        .bind(updated_by)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Sets the service status of a SERVICE sale if it still holds `expected`.
    pub async fn update_service_status(
        conn: &mut SqliteConnection,
        sale_id: i64,
        expected: Option<ServiceStatus>,
        service_status: ServiceStatus,
        updated_by: i64,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sales
            SET service_status_id = ?3,
                updated_by = ?4,
                updated_at = ?5
            WHERE id = ?1
              AND deleted_at IS NULL
              AND sale_type_id = ?6
              AND service_status_id IS ?2
            "#,
        )
        .bind(sale_id)
        .bind(expected)
        .bind(service_status)
        .bind(updated_by)
        .bind(Utc::now())
        .bind(SaleType::Service)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Pool reads
    // =========================================================================

    /// Gets an active sale header.
    pub async fn get_by_id(&self, sale_id: i64) -> DbResult<Sale> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))
    }

    /// Product lines of a sale, in insertion order.
    pub async fn product_lines(&self, sale_id: i64) -> DbResult<Vec<SaleProductLine>> {
        let lines = sqlx::query_as::<_, SaleProductLine>(
            r#"
            SELECT sp.sale_id, sp.product_id, p.name AS product_name, sp.quantity,
                   sp.price_cents, sp.subtotal_cents
            FROM sale_products sp
            JOIN products p ON p.id = sp.product_id
            WHERE sp.sale_id = ?1
            ORDER BY sp.id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Service lines of a sale, in insertion order.
    pub async fn service_lines(&self, sale_id: i64) -> DbResult<Vec<SaleServiceLine>> {
        let lines = sqlx::query_as::<_, SaleServiceLine>(
            r#"
            SELECT ss.sale_id, ss.service_id, s.name AS service_name, ss.price_cents
            FROM sale_services ss
            JOIN services s ON s.id = ss.service_id
            WHERE ss.sale_id = ?1
            ORDER BY ss.id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Every active product sale, newest first.
    pub async fn list_product_sales(&self) -> DbResult<Vec<ProductSaleListing>> {
        let rows = sqlx::query_as::<_, ProductSaleListing>(
            r#"
            SELECT s.id, s.client_id, c.name AS client_name,
                   pm.name AS payment_method, ps.name AS payment_status,
                   s.total_cents, s.observations, s.created_at
            FROM sales s
            JOIN clients c ON c.id = s.client_id
            JOIN payment_methods pm ON pm.id = s.payment_method_id
            JOIN payment_status ps ON ps.id = s.payment_status_id
            WHERE s.deleted_at IS NULL AND s.sale_type_id = ?1
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .bind(SaleType::Product)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Sum of active sale totals with the given payment status.
    pub async fn total_by_payment_status(&self, status: PaymentStatus) -> DbResult<Money> {
        let total = sqlx::query_scalar::<_, Money>(
            r#"
            SELECT COALESCE(SUM(total_cents), 0)
            FROM sales
            WHERE deleted_at IS NULL AND payment_status_id = ?1
            "#,
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    /// Most recent active service sales.
    pub async fn recent_service_sales(&self, limit: i64) -> DbResult<Vec<RecentServiceSale>> {
        let rows = sqlx::query_as::<_, RecentServiceSale>(
            r#"
            SELECT s.id, c.name AS client_name, v.plate AS vehicle_plate, s.total_cents,
                   ps.name AS payment_status, ss.name AS service_status, s.created_at
            FROM sales s
            JOIN clients c ON c.id = s.client_id
            LEFT JOIN vehicles v ON v.id = s.vehicle_id
            JOIN payment_status ps ON ps.id = s.payment_status_id
            LEFT JOIN service_status ss ON ss.id = s.service_status_id
            WHERE s.deleted_at IS NULL AND s.sale_type_id = ?1
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT ?2
            "#,
        )
        .bind(SaleType::Service)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Most recent active product sales with their lines.
    pub async fn recent_product_sales(&self, limit: i64) -> DbResult<Vec<RecentProductSale>> {
        let mut sales = sqlx::query_as::<_, RecentProductSale>(
            r#"
            SELECT s.id, c.name AS client_name, s.total_cents,
                   ps.name AS payment_status, s.created_at
            FROM sales s
            JOIN clients c ON c.id = s.client_id
            JOIN payment_status ps ON ps.id = s.payment_status_id
            WHERE s.deleted_at IS NULL AND s.sale_type_id = ?1
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT ?2
            "#,
        )
        .bind(SaleType::Product)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        if sales.is_empty() {
            return Ok(sales);
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT sp.sale_id, p.name AS product_name, sp.quantity, sp.price_cents \
             FROM sale_products sp JOIN products p ON p.id = sp.product_id \
             WHERE sp.sale_id IN (",
        );
        let mut separated = query.separated(", ");
        for sale in &sales {
            separated.push_bind(sale.id);
        }
        separated.push_unseparated(") ORDER BY sp.id");

        let lines = query
            .build_query_as::<RecentProductLine>()
            .fetch_all(&self.pool)
            .await?;

        for line in lines {
            if let Some(sale) = sales.iter_mut().find(|s| s.id == line.sale_id) {
                sale.products.push(line);
            }
        }

        Ok(sales)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
