//! # Metrics Repository
//!
//! Read-only aggregates behind the dashboard.
//!
//! Every query here counts only active sales whose payment is Confirmed and
//! whose UTC creation day falls inside the inclusive report window.
//! Sums come back as integer cents; `COALESCE` keeps empty windows at zero.

use sqlx::SqlitePool;

use crate::error::DbResult;
use detailing_core::report::{
    BreakdownRow, GeneralMetrics, Granularity, PaymentMethodRevenue, ReportRange, TopClient,
    TopProduct, TopService,
};
use detailing_core::{PaymentStatus, SaleType};

/// Shared filter. `?1` confirmed status id, `?2`/`?3` window bounds.
const CONFIRMED_IN_RANGE: &str = "s.deleted_at IS NULL \
     AND s.payment_status_id = ?1 \
     AND date(s.created_at) BETWEEN ?2 AND ?3";

fn bucket_format(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Daily => "%Y-%m-%d",
        Granularity::Monthly => "%Y-%m",
    }
}

/// Repository for dashboard aggregates.
#[derive(Debug, Clone)]
pub struct MetricsRepository {
    pool: SqlitePool,
}

impl MetricsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MetricsRepository { pool }
    }

    /// Revenue totals and distinct clients served.
    pub async fn general(&self, range: &ReportRange) -> DbResult<GeneralMetrics> {
        let sql = format!(
            r#"
            SELECT COALESCE(SUM(s.total_cents), 0) AS total_revenue,
                   COALESCE(SUM(CASE WHEN s.sale_type_id = ?4 THEN s.total_cents END), 0)
                       AS total_product_revenue,
                   COALESCE(SUM(CASE WHEN s.sale_type_id = ?5 THEN s.total_cents END), 0)
                       AS total_service_revenue,
                   COUNT(DISTINCT s.client_id) AS total_clients_attended
            FROM sales s
            WHERE {CONFIRMED_IN_RANGE}
            "#
        );

        let metrics = sqlx::query_as::<_, GeneralMetrics>(&sql)
            .bind(PaymentStatus::Confirmed)
            .bind(range.start)
            .bind(range.end)
            .bind(SaleType::Product)
            .bind(SaleType::Service)
            .fetch_one(&self.pool)
            .await?;

        Ok(metrics)
    }

    /// Per-bucket counts and revenue split by sale type.
    ///
    /// Sparse: buckets without confirmed sales are absent.
    pub async fn breakdown(&self, range: &ReportRange) -> DbResult<Vec<BreakdownRow>> {
        let sql = format!(
            r#"
            SELECT strftime(?6, s.created_at) AS bucket,
                   SUM(CASE WHEN s.sale_type_id = ?4 THEN 1 ELSE 0 END) AS product_count,
                   SUM(CASE WHEN s.sale_type_id = ?5 THEN 1 ELSE 0 END) AS service_count,
                   COALESCE(SUM(CASE WHEN s.sale_type_id = ?4 THEN s.total_cents END), 0)
                       AS product_revenue,
                   COALESCE(SUM(CASE WHEN s.sale_type_id = ?5 THEN s.total_cents END), 0)
                       AS service_revenue
            FROM sales s
            WHERE {CONFIRMED_IN_RANGE}
            GROUP BY bucket
            ORDER BY bucket
            "#
        );

        let rows = sqlx::query_as::<_, BreakdownRow>(&sql)
            .bind(PaymentStatus::Confirmed)
            .bind(range.start)
            .bind(range.end)
            .bind(SaleType::Product)
            .bind(SaleType::Service)
            .bind(bucket_format(range.granularity))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Products ranked by units sold, then product id.
    pub async fn top_products(&self, range: &ReportRange, limit: i64) -> DbResult<Vec<TopProduct>> {
        let sql = format!(
            r#"
            SELECT p.id AS product_id, p.name,
                   SUM(sp.quantity) AS quantity_sold,
                   SUM(sp.subtotal_cents) AS revenue
            FROM sale_products sp
            JOIN sales s ON s.id = sp.sale_id
            JOIN products p ON p.id = sp.product_id
            WHERE {CONFIRMED_IN_RANGE}
            GROUP BY p.id, p.name
            ORDER BY quantity_sold DESC, p.id ASC
            LIMIT ?4
            "#
        );

        let rows = sqlx::query_as::<_, TopProduct>(&sql)
            .bind(PaymentStatus::Confirmed)
            .bind(range.start)
            .bind(range.end)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Services ranked by times sold, then service id.
    pub async fn top_services(&self, range: &ReportRange, limit: i64) -> DbResult<Vec<TopService>> {
        let sql = format!(
            r#"
            SELECT sv.id AS service_id, sv.name,
                   COUNT(*) AS times_sold,
                   SUM(ss.price_cents) AS revenue
            FROM sale_services ss
            JOIN sales s ON s.id = ss.sale_id
            JOIN services sv ON sv.id = ss.service_id
            WHERE {CONFIRMED_IN_RANGE}
            GROUP BY sv.id, sv.name
            ORDER BY times_sold DESC, sv.id ASC
            LIMIT ?4
            "#
        );

        let rows = sqlx::query_as::<_, TopService>(&sql)
            .bind(PaymentStatus::Confirmed)
            .bind(range.start)
            .bind(range.end)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Clients ranked by revenue, then client id.
    pub async fn top_clients(&self, range: &ReportRange, limit: i64) -> DbResult<Vec<TopClient>> {
        let sql = format!(
            r#"
            SELECT c.id AS client_id, c.name,
                   COUNT(*) AS sales_count,
                   SUM(s.total_cents) AS revenue
            FROM sales s
            JOIN clients c ON c.id = s.client_id
            WHERE {CONFIRMED_IN_RANGE}
            GROUP BY c.id, c.name
            ORDER BY revenue DESC, c.id ASC
            LIMIT ?4
            "#
        );

        let rows = sqlx::query_as::<_, TopClient>(&sql)
            .bind(PaymentStatus::Confirmed)
            .bind(range.start)
            .bind(range.end)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Revenue per payment method with at least one confirmed sale.
    pub async fn revenue_by_payment_method(
        &self,
        range: &ReportRange,
    ) -> DbResult<Vec<PaymentMethodRevenue>> {
        let sql = format!(
            r#"
            SELECT pm.id AS payment_method_id, pm.name,
                   COUNT(*) AS sales_count,
                   SUM(s.total_cents) AS revenue
            FROM sales s
            JOIN payment_methods pm ON pm.id = s.payment_method_id
            WHERE {CONFIRMED_IN_RANGE}
            GROUP BY pm.id, pm.name
            ORDER BY revenue DESC, pm.id ASC
            "#
        );

        let rows = sqlx::query_as::<_, PaymentMethodRevenue>(&sql)
            .bind(PaymentStatus::Confirmed)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::catalog::NewClient;
    use crate::repository::sale::{NewSale, SaleRepository};
    use crate::{Database, DbConfig};
    use chrono::{NaiveDate, TimeZone, Utc};
    use detailing_core::Money;

    fn range(start: NaiveDate, end: NaiveDate, granularity: Granularity) -> ReportRange {
        ReportRange {
            start,
            end,
            granularity,
        }
    }

    async fn insert_product_sale(
        db: &Database,
        client_id: i64,
        status: PaymentStatus,
        cents: i64,
        day: NaiveDate,
    ) {
        let created_at = Utc.from_utc_datetime(&day.and_hms_opt(15, 30, 0).unwrap());
        let mut tx = db.begin().await.unwrap();
        SaleRepository::insert_sale(
            &mut tx,
            &NewSale {
                client_id,
                vehicle_id: None,
                sale_type: SaleType::Product,
                payment_status: status,
                service_status: None,
                payment_method_id: 2,
                total: Money::from_cents(cents),
                observations: None,
                created_by: 1,
                created_at,
            },
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_only_confirmed_sales_count() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = db
            .catalog()
            .insert_client(
                &NewClient {
                    name: "Dana".to_string(),
                    phone: None,
                    email: None,
                },
                1,
            )
            .await
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

        insert_product_sale(&db, client, PaymentStatus::Confirmed, 1200, day).await;
        insert_product_sale(&db, client, PaymentStatus::Pending, 9900, day).await;
        insert_product_sale(&db, client, PaymentStatus::Canceled, 5000, day).await;

        let window = range(day, day, Granularity::Daily);
        let general = db.metrics().general(&window).await.unwrap();
        assert_eq!(general.total_revenue, Money::from_cents(1200));
        assert_eq!(general.total_product_revenue, Money::from_cents(1200));
        assert_eq!(general.total_service_revenue, Money::zero());
        assert_eq!(general.total_clients_attended, 1);

        let rows = db.metrics().breakdown(&window).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bucket, "2026-03-14");
        assert_eq!(rows[0].product_count, 1);

        let methods = db.metrics().revenue_by_payment_method(&window).await.unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name, "Card");
    }

    #[tokio::test]
    async fn test_window_bounds_are_inclusive_days() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = db
            .catalog()
            .insert_client(
                &NewClient {
                    name: "Eli".to_string(),
                    phone: None,
                    email: None,
                },
                1,
            )
            .await
            .unwrap();
        let jan = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let feb = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let mar = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        insert_product_sale(&db, client, PaymentStatus::Confirmed, 100, jan).await;
        insert_product_sale(&db, client, PaymentStatus::Confirmed, 200, feb).await;
        insert_product_sale(&db, client, PaymentStatus::Confirmed, 400, mar).await;

        let window = range(jan, feb, Granularity::Monthly);
        let rows = db.metrics().breakdown(&window).await.unwrap();
        let keys: Vec<&str> = rows.iter().map(|r| r.bucket.as_str()).collect();
        assert_eq!(keys, vec!["2026-01", "2026-02"]);

        let general = db.metrics().general(&window).await.unwrap();
        assert_eq!(general.total_revenue, Money::from_cents(300));
    }

    #[tokio::test]
    async fn test_empty_window_is_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let window = range(day, day, Granularity::Daily);

        assert_eq!(
            db.metrics().general(&window).await.unwrap(),
            GeneralMetrics::default()
        );
        assert!(db.metrics().top_clients(&window, 5).await.unwrap().is_empty());
    }
}
