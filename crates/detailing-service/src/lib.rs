//! # detailing-service
//!
//! Sales transactions and dashboard metrics for the detailing shop backend.
//!
//! ## Module Organization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        detailing-service                                │
//! │                                                                         │
//! │  Backoffice (this file)   wires one Database + one AuditSink            │
//! │   ├── sales()      SaleBuilder     create_product_sale                  │
//! │   │                                create_service_sale                  │
//! │   ├── statuses()   StatusMachine   update_payment_status                │
//! │   │                                update_service_status                │
//! │   ├── metrics()    MetricsEngine   dashboard / dashboard_on             │
//! │   └── queries()    SaleQueries     list_product_sales, get_sale,        │
//! │                                    home_summary                         │
//! │                                                                         │
//! │  audit.rs      AuditSink, queued / tracing / memory sinks               │
//! │  config.rs     ServiceConfig from DETAILING_* variables                 │
//! │  error.rs      ServiceError { kind, message }                           │
//! │  telemetry.rs  tracing-subscriber setup                                 │
//! │  tx.rs         transaction deadline                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let config = ServiceConfig::load()?;
//! let backoffice = Backoffice::open(&config).await?;
//!
//! let receipt = backoffice
//!     .sales()
//!     .create_service_sale(&Actor::new(3), request)
//!     .await?;
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod metrics;
pub mod queries;
pub mod sales;
pub mod status;
pub mod telemetry;
pub mod tx;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use detailing_db::Database;

pub use audit::{AuditError, AuditSink, MemoryAuditSink, QueuedAuditSink, TracingAuditSink};
pub use config::{ConfigError, ServiceConfig};
pub use error::{ServiceError, ServiceResult};
pub use metrics::MetricsEngine;
pub use queries::SaleQueries;
pub use sales::SaleBuilder;
pub use status::StatusMachine;

/// Entry point for the routing layer: every core operation behind one
/// handle. Cheap to clone.
#[derive(Clone)]
pub struct Backoffice {
    db: Database,
    audit: Arc<dyn AuditSink>,
    tx_timeout: Duration,
}

impl Backoffice {
    pub fn new(db: Database, audit: Arc<dyn AuditSink>, tx_timeout: Duration) -> Self {
        Backoffice {
            db,
            audit,
            tx_timeout,
        }
    }

    /// Opens the configured database and starts the queued audit trail.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn open(config: &ServiceConfig) -> ServiceResult<Self> {
        let db = Database::new(config.db_config()).await?;

        let (audit, _worker) =
            QueuedAuditSink::spawn(Arc::new(TracingAuditSink), config.audit_queue_capacity);

        info!(
            path = %config.database_path,
            tx_timeout_ms = config.tx_timeout_ms,
            "Backoffice ready"
        );

        Ok(Backoffice::new(db, Arc::new(audit), config.tx_timeout()))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn sales(&self) -> SaleBuilder {
        SaleBuilder::new(self.db.clone(), self.audit.clone(), self.tx_timeout)
    }

    pub fn statuses(&self) -> StatusMachine {
        StatusMachine::new(self.db.clone(), self.audit.clone(), self.tx_timeout)
    }

    pub fn metrics(&self) -> MetricsEngine {
        MetricsEngine::new(self.db.clone())
    }

    pub fn queries(&self) -> SaleQueries {
        SaleQueries::new(self.db.clone())
    }
}

impl std::fmt::Debug for Backoffice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backoffice")
            .field("db", &self.db)
            .field("tx_timeout", &self.tx_timeout)
            .finish_non_exhaustive()
    }
}
