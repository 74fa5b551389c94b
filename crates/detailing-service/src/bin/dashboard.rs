//! # Dashboard Metrics Printer
//!
//! Prints dashboard metrics for the configured database as JSON.
//!
//! ## Usage
//! ```bash
//! # Jan 1 through today (daily up to 32 days, monthly beyond)
//! cargo run -p detailing-service --bin dashboard
//!
//! # This week, daily breakdown
//! cargo run -p detailing-service --bin dashboard -- --filter this_week
//!
//! # Explicit window
//! cargo run -p detailing-service --bin dashboard -- --start 2026-03-01 --end 2026-03-31
//! ```
//!
//! The database path and log filter come from the `DETAILING_*` variables.

use std::env;

use chrono::NaiveDate;

use detailing_core::report::{MetricsQuery, PeriodFilter};
use detailing_service::telemetry::init_tracing;
use detailing_service::{Backoffice, ServiceConfig};

fn parse_date(flag: &str, value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("{flag} expects YYYY-MM-DD, got '{value}'"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut query = MetricsQuery::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--filter" | "-f" => {
                if i + 1 < args.len() {
                    query.filter = Some(args[i + 1].parse::<PeriodFilter>()?);
                    i += 1;
                }
            }
            "--start" | "-s" => {
                if i + 1 < args.len() {
                    query.start_date = Some(parse_date("--start", &args[i + 1])?);
                    i += 1;
                }
            }
            "--end" | "-e" => {
                if i + 1 < args.len() {
                    query.end_date = Some(parse_date("--end", &args[i + 1])?);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Detailing Shop Dashboard");
                println!();
                println!("Usage: dashboard [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -f, --filter <NAME>  this_week | this_month | this_year");
                println!("  -s, --start <DATE>   Window start (YYYY-MM-DD)");
                println!("  -e, --end <DATE>     Window end (YYYY-MM-DD)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = ServiceConfig::load()?;
    init_tracing(&config.log_filter);

    let backoffice = Backoffice::open(&config).await?;
    let metrics = backoffice.metrics().dashboard(query).await?;

    println!("{}", serde_json::to_string_pretty(&metrics)?);

    backoffice.database().close().await;
    Ok(())
}
