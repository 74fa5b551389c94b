//! # Metrics Engine
//!
//! Resolves the reporting window, runs the aggregate queries concurrently
//! and pads the time series so every bucket of the window is present.

use chrono::{NaiveDate, Utc};
use tracing::{debug, instrument};

use detailing_core::report::{pad_breakdown, resolve_range, DashboardMetrics, MetricsQuery};
use detailing_core::TOP_N;
use detailing_db::Database;

use crate::error::ServiceResult;

/// Read-only dashboard aggregation.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    db: Database,
}

impl MetricsEngine {
    pub fn new(db: Database) -> Self {
        MetricsEngine { db }
    }

    /// Dashboard metrics relative to the current UTC date.
    pub async fn dashboard(&self, query: MetricsQuery) -> ServiceResult<DashboardMetrics> {
        self.dashboard_on(query, Utc::now().date_naive()).await
    }

    /// Dashboard metrics with `today` fixed by the caller.
    #[instrument(skip(self))]
    pub async fn dashboard_on(
        &self,
        query: MetricsQuery,
        today: NaiveDate,
    ) -> ServiceResult<DashboardMetrics> {
        let range = resolve_range(&query, today)?;
        debug!(
            start = %range.start,
            end = %range.end,
            breakdown = %range.granularity,
            "Resolved report range"
        );

        let repo = self.db.metrics();
        let (general, rows, top_products, top_services, top_clients, by_method) = tokio::try_join!(
            repo.general(&range),
            repo.breakdown(&range),
            repo.top_products(&range, TOP_N),
            repo.top_services(&range, TOP_N),
            repo.top_clients(&range, TOP_N),
            repo.revenue_by_payment_method(&range),
        )?;

        let (sales_breakdown, revenue_breakdown) = pad_breakdown(&range, rows);

        Ok(DashboardMetrics {
            range,
            general_metrics: general,
            sales_breakdown,
            revenue_breakdown,
            top_products,
            top_services,
            top_clients,
            revenue_by_payment_method: by_method,
        })
    }
}
