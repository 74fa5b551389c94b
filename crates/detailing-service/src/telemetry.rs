//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` overrides `default_filter` entirely
/// - `RUST_LOG=detailing_service=trace` traces the service crate only
/// - `audit` target carries the audit trail from `TracingAuditSink`
///
/// Returns `false` when a subscriber was already installed (tests, or a host
/// application that configured its own).
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
