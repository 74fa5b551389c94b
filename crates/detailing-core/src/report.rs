//! # Dashboard Report Shaping
//!
//! Pure half of the metrics engine: resolving the reporting window,
//! choosing the breakdown granularity, generating bucket keys and padding
//! sparse query results so every bucket is present.
//!
//! ## Range Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. filter          this_week   Monday .. today                         │
//! │                     this_month  1st .. last day of month                │
//! │                     this_year   Jan 1 .. Dec 31                         │
//! │  2. explicit dates  startDate / endDate replace either side             │
//! │  3. defaults        start = Jan 1 of current year, end = today          │
//! │  4. check           start > end  →  InvalidInput                        │
//! │                                                                         │
//! │  Granularity: daily for an untouched week/month filter or a span of     │
//! │  at most 32 days (inclusive), monthly otherwise.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All dates are UTC calendar days. The window is inclusive on both ends:
//! `start` means 00:00:00.000 and `end` means 23:59:59.999.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::DAILY_BREAKDOWN_MAX_DAYS;

// =============================================================================
// Query
// =============================================================================

/// Named reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodFilter {
    #[serde(alias = "weekly")]
    ThisWeek,
    #[serde(alias = "monthly")]
    ThisMonth,
    #[serde(alias = "yearly")]
    ThisYear,
}

impl FromStr for PeriodFilter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "this_week" | "weekly" => Ok(PeriodFilter::ThisWeek),
            "this_month" | "monthly" => Ok(PeriodFilter::ThisMonth),
            "this_year" | "yearly" => Ok(PeriodFilter::ThisYear),
            _ => Err(ValidationError::NotAllowed {
                field: "filter".to_string(),
                allowed: vec![
                    "this_week".to_string(),
                    "this_month".to_string(),
                    "this_year".to_string(),
                ],
            }),
        }
    }
}

/// Input of `get_dashboard_metrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    #[serde(default)]
    pub filter: Option<PeriodFilter>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl MetricsQuery {
    pub fn filter(filter: PeriodFilter) -> Self {
        MetricsQuery {
            filter: Some(filter),
            ..Default::default()
        }
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        MetricsQuery {
            filter: None,
            start_date: Some(start),
            end_date: Some(end),
        }
    }
}

// =============================================================================
// Range
// =============================================================================

/// Time-series bucket size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Granularity {
    Daily,
    Monthly,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Daily => f.write_str("daily"),
            Granularity::Monthly => f.write_str("monthly"),
        }
    }
}

/// Resolved, inclusive reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportRange {
    #[ts(type = "string")]
    pub start: NaiveDate,
    #[ts(type = "string")]
    pub end: NaiveDate,
    #[serde(rename = "breakdown")]
    pub granularity: Granularity,
}

impl ReportRange {
    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Bucket keys covering the whole window, oldest first.
    ///
    /// Daily keys are `YYYY-MM-DD`, monthly keys are `YYYY-MM`.
    pub fn bucket_keys(&self) -> Vec<String> {
        match self.granularity {
            Granularity::Daily => self
                .start
                .iter_days()
                .take_while(|day| *day <= self.end)
                .map(|day| day.format("%Y-%m-%d").to_string())
                .collect(),
            Granularity::Monthly => {
                let mut keys = Vec::new();
                let (mut year, mut month) = (self.start.year(), self.start.month());
                while (year, month) <= (self.end.year(), self.end.month()) {
                    keys.push(format!("{year:04}-{month:02}"));
                    if month == 12 {
                        year += 1;
                        month = 1;
                    } else {
                        month += 1;
                    }
                }
                keys
            }
        }
    }
}

fn monday_of(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn last_of_month(day: NaiveDate) -> NaiveDate {
    let (year, month) = if day.month() == 12 {
        (day.year() + 1, 1)
    } else {
        (day.year(), day.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .unwrap_or(day)
}

fn first_of_year(day: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(day.year(), 1, 1).unwrap_or(day)
}

fn last_of_year(day: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(day.year(), 12, 31).unwrap_or(day)
}

/// Resolves `query` against the calendar day `today`.
pub fn resolve_range(query: &MetricsQuery, today: NaiveDate) -> CoreResult<ReportRange> {
    let base = query.filter.map(|filter| match filter {
        PeriodFilter::ThisWeek => (monday_of(today), today),
        PeriodFilter::ThisMonth => (first_of_month(today), last_of_month(today)),
        PeriodFilter::ThisYear => (first_of_year(today), last_of_year(today)),
    });

    let start = query
        .start_date
        .or(base.map(|(start, _)| start))
        .unwrap_or_else(|| first_of_year(today));
    let end = query
        .end_date
        .or(base.map(|(_, end)| end))
        .unwrap_or(today);

    if start > end {
        return Err(CoreError::InvertedRange { start, end });
    }

    let untouched_short_filter = matches!(
        query.filter,
        Some(PeriodFilter::ThisWeek) | Some(PeriodFilter::ThisMonth)
    ) && query.start_date.is_none()
        && query.end_date.is_none();
    let span = (end - start).num_days() + 1;

    let granularity = if untouched_short_filter || span <= DAILY_BREAKDOWN_MAX_DAYS {
        Granularity::Daily
    } else {
        Granularity::Monthly
    };

    Ok(ReportRange {
        start,
        end,
        granularity,
    })
}

// =============================================================================
// Aggregate Shapes
// =============================================================================

/// Headline totals for the window (confirmed, non-deleted sales).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GeneralMetrics {
    pub total_revenue: Money,
    pub total_product_revenue: Money,
    pub total_service_revenue: Money,
    pub total_clients_attended: i64,
}

/// One raw row of the time-series query. Buckets with no sales are absent.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BreakdownRow {
    pub bucket: String,
    pub product_count: i64,
    pub service_count: i64,
    pub product_revenue: Money,
    pub service_revenue: Money,
}

/// Sale counts for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesBucket {
    pub key: String,
    pub product_count: i64,
    pub service_count: i64,
}

/// Revenue for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RevenueBucket {
    pub key: String,
    pub product_revenue: Money,
    pub service_revenue: Money,
    pub total_revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub product_id: i64,
    pub name: String,
    pub quantity_sold: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopService {
    pub service_id: i64,
    pub name: String,
    pub times_sold: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopClient {
    pub client_id: i64,
    pub name: String,
    pub sales_count: i64,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentMethodRevenue {
    pub payment_method_id: i64,
    pub name: String,
    pub sales_count: i64,
    pub revenue: Money,
}

/// Full dashboard payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardMetrics {
    pub range: ReportRange,
    pub general_metrics: GeneralMetrics,
    pub sales_breakdown: Vec<SalesBucket>,
    pub revenue_breakdown: Vec<RevenueBucket>,
    pub top_products: Vec<TopProduct>,
    pub top_services: Vec<TopService>,
    pub top_clients: Vec<TopClient>,
    pub revenue_by_payment_method: Vec<PaymentMethodRevenue>,
}

// =============================================================================
// Padding
// =============================================================================

/// Expands sparse breakdown rows into one bucket per key of `range`.
///
/// Rows whose key falls outside the window are ignored.
pub fn pad_breakdown(
    range: &ReportRange,
    rows: Vec<BreakdownRow>,
) -> (Vec<SalesBucket>, Vec<RevenueBucket>) {
    let mut by_key: HashMap<String, BreakdownRow> =
        rows.into_iter().map(|row| (row.bucket.clone(), row)).collect();

    range
        .bucket_keys()
        .into_iter()
        .map(|key| {
            let row = by_key.remove(&key);
            let (product_count, service_count, product_revenue, service_revenue) = match row {
                Some(row) => (
                    row.product_count,
                    row.service_count,
                    row.product_revenue,
                    row.service_revenue,
                ),
                None => (0, 0, Money::zero(), Money::zero()),
            };

            (
                SalesBucket {
                    key: key.clone(),
                    product_count,
                    service_count,
                },
                RevenueBucket {
                    key,
                    product_revenue,
                    service_revenue,
                    total_revenue: product_revenue + service_revenue,
                },
            )
        })
        .unzip()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_this_week_starts_on_monday() {
        // 2026-10-21 is a Wednesday
        let range = resolve_range(&MetricsQuery::filter(PeriodFilter::ThisWeek), date(2026, 10, 21))
            .unwrap();
        assert_eq!(range.start, date(2026, 10, 19));
        assert_eq!(range.end, date(2026, 10, 21));
        assert_eq!(range.granularity, Granularity::Daily);

        // On a Sunday the week started six days earlier
        let range = resolve_range(&MetricsQuery::filter(PeriodFilter::ThisWeek), date(2026, 10, 25))
            .unwrap();
        assert_eq!(range.start, date(2026, 10, 19));
    }

    #[test]
    fn test_this_month_is_daily_and_whole_month() {
        let range = resolve_range(&MetricsQuery::filter(PeriodFilter::ThisMonth), date(2024, 2, 10))
            .unwrap();
        assert_eq!(range.start, date(2024, 2, 1));
        assert_eq!(range.end, date(2024, 2, 29));
        assert_eq!(range.granularity, Granularity::Daily);
        assert_eq!(range.bucket_keys().len(), 29);
    }

    #[test]
    fn test_this_year_on_leap_year_is_twelve_months() {
        let range = resolve_range(&MetricsQuery::filter(PeriodFilter::ThisYear), date(2024, 6, 15))
            .unwrap();
        assert_eq!(range.days(), 366);
        assert_eq!(range.granularity, Granularity::Monthly);

        let keys = range.bucket_keys();
        assert_eq!(keys.len(), 12);
        assert_eq!(keys.first().map(String::as_str), Some("2024-01"));
        assert_eq!(keys.last().map(String::as_str), Some("2024-12"));
    }

    #[test]
    fn test_explicit_range_granularity_threshold() {
        let today = date(2026, 10, 19);

        let range = resolve_range(&MetricsQuery::between(date(2026, 1, 1), date(2026, 2, 1)), today)
            .unwrap();
        assert_eq!(range.days(), 32);
        assert_eq!(range.granularity, Granularity::Daily);

        let range = resolve_range(&MetricsQuery::between(date(2026, 1, 1), date(2026, 2, 2)), today)
            .unwrap();
        assert_eq!(range.granularity, Granularity::Monthly);
        assert_eq!(range.bucket_keys(), vec!["2026-01", "2026-02"]);
    }

    #[test]
    fn test_explicit_date_overrides_one_side_of_filter() {
        let query = MetricsQuery {
            filter: Some(PeriodFilter::ThisYear),
            start_date: Some(date(2026, 10, 1)),
            end_date: None,
        };
        let range = resolve_range(&query, date(2026, 10, 19)).unwrap();
        assert_eq!(range.start, date(2026, 10, 1));
        assert_eq!(range.end, date(2026, 12, 31));
        assert_eq!(range.granularity, Granularity::Monthly);
    }

    #[test]
    fn test_defaults_without_filter() {
        let range = resolve_range(&MetricsQuery::default(), date(2026, 1, 20)).unwrap();
        assert_eq!(range.start, date(2026, 1, 1));
        assert_eq!(range.end, date(2026, 1, 20));
        assert_eq!(range.granularity, Granularity::Daily);
    }

    #[test]
    fn test_defaults_later_in_year_are_monthly() {
        let range = resolve_range(&MetricsQuery::default(), date(2026, 10, 19)).unwrap();
        assert_eq!(range.start, date(2026, 1, 1));
        assert_eq!(range.end, date(2026, 10, 19));
        assert_eq!(range.granularity, Granularity::Monthly);
    }

    #[test]
    fn test_inverted_range_is_invalid_input() {
        let err = resolve_range(
            &MetricsQuery::between(date(2026, 3, 2), date(2026, 3, 1)),
            date(2026, 10, 19),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_single_day_range_is_valid() {
        let day = date(2026, 3, 2);
        let range = resolve_range(&MetricsQuery::between(day, day), day).unwrap();
        assert_eq!(range.bucket_keys(), vec!["2026-03-02"]);
    }

    #[test]
    fn test_padding_fills_every_day() {
        let range = resolve_range(
            &MetricsQuery::between(date(2026, 3, 1), date(2026, 3, 10)),
            date(2026, 10, 19),
        )
        .unwrap();

        let (sales, revenue) = pad_breakdown(&range, Vec::new());
        assert_eq!(sales.len(), 10);
        assert_eq!(revenue.len(), 10);
        assert!(sales.iter().all(|b| b.product_count == 0 && b.service_count == 0));
        assert!(revenue.iter().all(|b| b.total_revenue.is_zero()));
        assert_eq!(sales[0].key, "2026-03-01");
        assert_eq!(sales[9].key, "2026-03-10");
    }

    #[test]
    fn test_padding_keeps_query_rows_in_place() {
        let range = resolve_range(
            &MetricsQuery::between(date(2026, 3, 1), date(2026, 3, 3)),
            date(2026, 10, 19),
        )
        .unwrap();
        let rows = vec![
            BreakdownRow {
                bucket: "2026-03-02".to_string(),
                product_count: 2,
                service_count: 1,
                product_revenue: Money::from_cents(1500),
                service_revenue: Money::from_cents(3550),
            },
            BreakdownRow {
                bucket: "2026-04-01".to_string(),
                product_count: 9,
                service_count: 9,
                product_revenue: Money::from_cents(1),
                service_revenue: Money::from_cents(1),
            },
        ];

        let (sales, revenue) = pad_breakdown(&range, rows);
        assert_eq!(sales.len(), 3);
        assert_eq!(sales[1].product_count, 2);
        assert_eq!(revenue[1].total_revenue, Money::from_cents(5050));
        assert_eq!(revenue[2].total_revenue, Money::zero());
    }

    #[test]
    fn test_filter_parsing_accepts_aliases() {
        assert_eq!("weekly".parse::<PeriodFilter>().unwrap(), PeriodFilter::ThisWeek);
        assert_eq!("this_year".parse::<PeriodFilter>().unwrap(), PeriodFilter::ThisYear);
        assert!("quarterly".parse::<PeriodFilter>().is_err());

        let query: MetricsQuery =
            serde_json::from_str(r#"{ "filter": "monthly", "startDate": "2026-10-01" }"#).unwrap();
        assert_eq!(query.filter, Some(PeriodFilter::ThisMonth));
        assert_eq!(query.start_date, Some(date(2026, 10, 1)));
    }

    #[test]
    fn test_range_serializes_breakdown_name() {
        let range = ReportRange {
            start: date(2026, 1, 1),
            end: date(2026, 1, 31),
            granularity: Granularity::Daily,
        };
        assert_eq!(
            serde_json::to_value(range).unwrap(),
            serde_json::json!({ "start": "2026-01-01", "end": "2026-01-31", "breakdown": "daily" })
        );
    }
}
