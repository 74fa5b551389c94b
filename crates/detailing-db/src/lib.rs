//! # detailing-db
//!
//! SQLite data access for the detailing shop backend.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pool.rs         Database / DbConfig, begin(), repository accessors     │
//! │  migrations.rs   embedded schema migrations                             │
//! │  repository/                                                            │
//! │    catalog.rs    clients, vehicles, products, services, stock           │
//! │    sale.rs       sale headers, lines, status updates, listings          │
//! │    metrics.rs    dashboard aggregates                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Kinds of Repository Calls
//! - Methods on `&self` run on the pool and suit standalone reads.
//! - Associated functions taking `&mut SqliteConnection` run inside a
//!   caller-owned transaction (`db.begin()`), so a sale's reads, inserts and
//!   stock decrements commit or roll back together.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::catalog::{CatalogRepository, NewClient, NewProduct, NewService, NewVehicle};
pub use repository::metrics::MetricsRepository;
pub use repository::sale::{NewSale, SaleRepository};
