//! # Sale Status State Machine
//!
//! Applies payment and service status changes to existing sales.
//!
//! ```text
//! payment:  Pending ──► Confirmed ──► Canceled
//!              └──────────────────────► Canceled      (terminal)
//!
//! service:  Pending ──► In-Progress ──► Completed
//!              └────────────┴──────────► Canceled
//!
//! Canceling the payment of a SERVICE sale also cancels its service status,
//! whatever that status was.
//! ```
//!
//! Each change reads the current statuses, plans the transition with the
//! pure rules in `detailing_core::status`, and writes it with an update
//! guarded on the statuses it read, all in one transaction.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{info, instrument, warn};

use detailing_core::status::{plan_payment_transition, plan_service_transition};
use detailing_core::{
    Actor, AuditAction, AuditEntry, CoreError, ErrorKind, PaymentStatus, PaymentStatusChanged,
    PaymentStatusUpdate, SaleStatusSnapshot, ServiceStatus, ServiceStatusChanged,
    ServiceStatusUpdate,
};
use detailing_db::{Database, SaleRepository};

use crate::audit::{emit, AuditSink};
use crate::error::{ServiceError, ServiceResult};
use crate::sales::SALES_ENTITY;
use crate::tx::with_deadline;

/// Applies status transitions to sales.
#[derive(Clone)]
pub struct StatusMachine {
    db: Database,
    audit: Arc<dyn AuditSink>,
    tx_timeout: Duration,
}

fn snapshot_value(snapshot: &SaleStatusSnapshot) -> serde_json::Value {
    json!({
        "payment_status_id": snapshot.payment_status.id(),
        "service_status_id": snapshot.service_status.map(|s| s.id()),
    })
}

fn concurrent_change(sale_id: i64) -> ServiceError {
    ServiceError::new(
        ErrorKind::InvalidState,
        format!("Sale {sale_id} changed while updating its status"),
    )
}

impl StatusMachine {
    pub fn new(db: Database, audit: Arc<dyn AuditSink>, tx_timeout: Duration) -> Self {
        StatusMachine {
            db,
            audit,
            tx_timeout,
        }
    }

    /// Changes the payment status of a sale.
    #[instrument(skip(self, update), fields(user_id = actor.user_id))]
    pub async fn update_payment_status(
        &self,
        actor: &Actor,
        sale_id: i64,
        update: PaymentStatusUpdate,
    ) -> ServiceResult<PaymentStatusChanged> {
        let result = with_deadline(
            "update_payment_status",
            self.tx_timeout,
            self.payment_tx(actor, sale_id, update),
        )
        .await;

        let entry = AuditEntry::new(actor, AuditAction::Update, SALES_ENTITY).entity_id(sale_id);
        match result {
            Ok((before, changed)) => {
                info!(
                    sale_id,
                    from = %before.payment_status,
                    payment_status_id = changed.payment_status_id,
                    cascaded = changed.service_status_id.is_some(),
                    "Payment status updated"
                );
                emit(
                    self.audit.as_ref(),
                    entry.changes(
                        Some(snapshot_value(&before)),
                        serde_json::to_value(changed).ok(),
                    ),
                );
                Ok(changed)
            }
            Err(e) => {
                warn!(sale_id, kind = ?e.kind, error = %e.message, "Payment status update rejected");
                emit(
                    self.audit.as_ref(),
                    entry
                        .changes(None, Some(json!({ "payment_status_id": update.payment_status_id })))
                        .failed(e.message.clone()),
                );
                Err(e)
            }
        }
    }

    async fn payment_tx(
        &self,
        actor: &Actor,
        sale_id: i64,
        update: PaymentStatusUpdate,
    ) -> ServiceResult<(SaleStatusSnapshot, PaymentStatusChanged)> {
        let target = PaymentStatus::try_from(update.payment_status_id)?;

        let mut tx = self.db.begin_write().await?;

        let before = SaleRepository::status_snapshot(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Sale", sale_id))?;
        let plan = plan_payment_transition(&before, target)?;

        let applied = SaleRepository::update_payment_status(
            &mut tx,
            sale_id,
            before.payment_status,
            plan.payment_status,
            plan.service_status,
            actor.user_id,
        )
        .await?;
        if !applied {
            return Err(concurrent_change(sale_id));
        }

        tx.commit().await?;

        let changed = PaymentStatusChanged {
            sale_id,
            payment_status_id: plan.payment_status.id(),
            service_status_id: plan.service_status.map(|s| s.id()),
        };
        Ok((before, changed))
    }

    /// Changes the service status of a SERVICE sale.
    #[instrument(skip(self, update), fields(user_id = actor.user_id))]
    pub async fn update_service_status(
        &self,
        actor: &Actor,
        sale_id: i64,
        update: ServiceStatusUpdate,
    ) -> ServiceResult<ServiceStatusChanged> {
        let result = with_deadline(
            "update_service_status",
            self.tx_timeout,
            self.service_tx(actor, sale_id, update),
        )
        .await;

        let entry = AuditEntry::new(actor, AuditAction::Update, SALES_ENTITY).entity_id(sale_id);
        match result {
            Ok((before, changed)) => {
                info!(
                    sale_id,
                    service_status_id = changed.service_status_id,
                    "Service status updated"
                );
                emit(
                    self.audit.as_ref(),
                    entry.changes(
                        Some(snapshot_value(&before)),
                        serde_json::to_value(changed).ok(),
                    ),
                );
                Ok(changed)
            }
            Err(e) => {
                warn!(sale_id, kind = ?e.kind, error = %e.message, "Service status update rejected");
                emit(
                    self.audit.as_ref(),
                    entry
                        .changes(None, Some(json!({ "service_status_id": update.service_status_id })))
                        .failed(e.message.clone()),
                );
                Err(e)
            }
        }
    }

    async fn service_tx(
        &self,
        actor: &Actor,
        sale_id: i64,
        update: ServiceStatusUpdate,
    ) -> ServiceResult<(SaleStatusSnapshot, ServiceStatusChanged)> {
        let target = ServiceStatus::try_from(update.service_status_id)?;

        let mut tx = self.db.begin_write().await?;

        let before = SaleRepository::status_snapshot(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Sale", sale_id))?;
        let next = plan_service_transition(&before, target)?;

        let applied = SaleRepository::update_service_status(
            &mut tx,
            sale_id,
            before.service_status,
            next,
            actor.user_id,
        )
        .await?;
        if !applied {
            return Err(concurrent_change(sale_id));
        }

        tx.commit().await?;

        Ok((
            before,
            ServiceStatusChanged {
                sale_id,
                service_status_id: next.id(),
            },
        ))
    }
}

impl std::fmt::Debug for StatusMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusMachine")
            .field("tx_timeout", &self.tx_timeout)
            .finish_non_exhaustive()
    }
}
