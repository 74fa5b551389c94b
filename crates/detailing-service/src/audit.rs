//! # Audit Sinks
//!
//! Every sale mutation hands one [`AuditEntry`] to an [`AuditSink`] after the
//! transaction settles: SUCCESS once committed, FAILURE with the error
//! message once rolled back.
//!
//! ## Delivery
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleBuilder / StatusMachine                                            │
//! │        │ emit(entry)   never fails the business operation               │
//! │        ▼                                                                │
//! │  QueuedAuditSink ── try_send ──► mpsc (bounded) ──► worker task         │
//! │                                                        │                │
//! │                                                        ▼                │
//! │                                            inner sink (Tracing, ...)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! A full queue drops the entry with a warning instead of stalling sales.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use detailing_core::{AuditEntry, AuditStatus};

/// Why an entry could not be recorded.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit queue is full")]
    QueueFull,

    #[error("Audit worker has stopped")]
    Closed,

    #[error("Audit sink failed: {0}")]
    Sink(String),
}

/// Destination for audit entries.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

/// Hands `entry` to `sink`, logging instead of failing when it is refused.
pub fn emit(sink: &dyn AuditSink, entry: AuditEntry) {
    let entry_id = entry.id;
    if let Err(e) = sink.record(entry) {
        warn!(%entry_id, error = %e, "Dropped audit entry");
    }
}

// =============================================================================
// Tracing Sink
// =============================================================================

/// Writes entries as structured events on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let changes = match &entry.changes {
            Some(changes) => {
                serde_json::to_string(changes).map_err(|e| AuditError::Sink(e.to_string()))?
            }
            None => String::new(),
        };

        match entry.status {
            AuditStatus::Success => info!(
                target: "audit",
                id = %entry.id,
                user_id = entry.user_id,
                username = entry.username.as_deref().unwrap_or(""),
                action = ?entry.action_type,
                entity = %entry.entity_type,
                entity_id = entry.entity_id,
                ip = entry.ip_address.as_deref().unwrap_or(""),
                %changes,
                "SUCCESS"
            ),
            AuditStatus::Failure => warn!(
                target: "audit",
                id = %entry.id,
                user_id = entry.user_id,
                username = entry.username.as_deref().unwrap_or(""),
                action = ?entry.action_type,
                entity = %entry.entity_type,
                entity_id = entry.entity_id,
                ip = entry.ip_address.as_deref().unwrap_or(""),
                error = entry.error_message.as_deref().unwrap_or(""),
                "FAILURE"
            ),
        }

        Ok(())
    }
}

// =============================================================================
// Queued Sink
// =============================================================================

/// Forwards entries to an inner sink from a background task.
#[derive(Debug, Clone)]
pub struct QueuedAuditSink {
    tx: mpsc::Sender<AuditEntry>,
}

impl QueuedAuditSink {
    /// Spawns the worker on the current runtime.
    ///
    /// The worker exits once every clone of the returned sink is dropped and
    /// the queue has drained.
    pub fn spawn(inner: Arc<dyn AuditSink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<AuditEntry>(capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some(entry) = rx.recv().await {
                let entry_id = entry.id;
                if let Err(e) = inner.record(entry) {
                    warn!(%entry_id, error = %e, "Audit sink rejected entry");
                }
            }
            info!("Audit worker stopped");
        });

        (QueuedAuditSink { tx }, worker)
    }
}

impl AuditSink for QueuedAuditSink {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.tx.try_send(entry).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AuditError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => AuditError::Closed,
        })
    }
}

// =============================================================================
// Memory Sink
// =============================================================================

/// Keeps entries in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryAuditSink {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every entry recorded so far, oldest first.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AuditError::Sink(e.to_string()))?;
        entries.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use detailing_core::{Actor, AuditAction};

    fn entry() -> AuditEntry {
        AuditEntry::new(&Actor::new(1), AuditAction::Create, "sales").entity_id(10)
    }

    #[test]
    fn test_memory_sink_shares_buffer() {
        let sink = MemoryAuditSink::new();
        let clone = sink.clone();

        emit(&clone, entry());
        emit(&clone, entry().failed("boom"));

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].status, AuditStatus::Failure);
    }

    #[test]
    fn test_tracing_sink_accepts_entries() {
        let sink = TracingAuditSink;
        assert!(sink.record(entry()).is_ok());
        assert!(sink.record(entry().failed("Product not found: 9")).is_ok());
    }

    #[tokio::test]
    async fn test_queued_sink_forwards_then_stops() {
        let memory = MemoryAuditSink::new();
        let (queued, worker) = QueuedAuditSink::spawn(Arc::new(memory.clone()), 8);

        queued.record(entry()).unwrap();
        queued.record(entry()).unwrap();
        drop(queued);

        worker.await.unwrap();
        assert_eq!(memory.entries().len(), 2);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_without_blocking() {
        let memory = MemoryAuditSink::new();
        let (queued, _worker) = QueuedAuditSink::spawn(Arc::new(memory), 1);

        // The worker has not been polled yet on this single-threaded runtime
        queued.record(entry()).unwrap();
        assert!(matches!(queued.record(entry()), Err(AuditError::QueueFull)));
    }
}
