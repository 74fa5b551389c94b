//! # Repositories
//!
//! One repository per aggregate. Each holds a pool handle for standalone
//! reads and exposes transaction-scoped associated functions for the
//! write paths.

pub mod catalog;
pub mod metrics;
pub mod sale;
