//! # Sale Status State Machine
//!
//! Transition rules for the two status fields of a sale.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  payment_status                                                         │
//! │    Pending ──► Confirmed ──► Canceled (terminal)                        │
//! │       └───────────────────────►┘                                        │
//! │                                                                         │
//! │    Canceled cascades: a SERVICE sale's service_status becomes Canceled  │
//! │    in the same update, whatever it was before (Completed included).     │
//! │                                                                         │
//! │  service_status (SERVICE sales only)                                    │
//! │    Pending ──► InProgress ──► Completed (terminal)                      │
//! │       └────────────┴─────────► Canceled  (terminal)                     │
//! │                                                                         │
//! │  Moving to the current value is rejected, never silently accepted.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::{PaymentStatus, SaleStatusSnapshot, SaleType, ServiceStatus};

/// Field values a payment transition writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentTransition {
    pub payment_status: PaymentStatus,
    /// `Some` when the cancel cascade rewrites the service status.
    pub service_status: Option<ServiceStatus>,
}

/// Whether `from → to` is a legal payment transition.
pub fn payment_transition_allowed(from: PaymentStatus, to: PaymentStatus) -> bool {
    use PaymentStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed) | (Pending, Canceled) | (Confirmed, Canceled)
    )
}

/// Whether `from → to` is a legal service transition.
pub fn service_transition_allowed(from: ServiceStatus, to: ServiceStatus) -> bool {
    use ServiceStatus::*;
    matches!(
        (from, to),
        (Pending, InProgress) | (InProgress, Completed) | (Pending, Canceled) | (InProgress, Canceled)
    )
}

/// Plans a payment status change for `sale`.
pub fn plan_payment_transition(
    sale: &SaleStatusSnapshot,
    target: PaymentStatus,
) -> CoreResult<PaymentTransition> {
    if sale.payment_status == target {
        return Err(CoreError::AlreadyInStatus {
            sale_id: sale.id,
            status: target.to_string(),
        });
    }

    if !payment_transition_allowed(sale.payment_status, target) {
        return Err(CoreError::IllegalTransition {
            sale_id: sale.id,
            field: "payment status",
            from: sale.payment_status.to_string(),
            to: target.to_string(),
        });
    }

    let service_status = match (target, sale.sale_type) {
        (PaymentStatus::Canceled, SaleType::Service) => Some(ServiceStatus::Canceled),
        _ => None,
    };

    Ok(PaymentTransition {
        payment_status: target,
        service_status,
    })
}

/// Plans a service status change for `sale`.
///
/// Product sales have no service status and are reported as not found.
pub fn plan_service_transition(
    sale: &SaleStatusSnapshot,
    target: ServiceStatus,
) -> CoreResult<ServiceStatus> {
    if sale.sale_type != SaleType::Service {
        return Err(CoreError::not_found("Service sale", sale.id));
    }

    let current = sale.service_status.unwrap_or_default();
    if current == target {
        return Err(CoreError::AlreadyInStatus {
            sale_id: sale.id,
            status: target.to_string(),
        });
    }

    if !service_transition_allowed(current, target) {
        return Err(CoreError::IllegalTransition {
            sale_id: sale.id,
            field: "service status",
            from: current.to_string(),
            to: target.to_string(),
        });
    }

    Ok(target)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn service_sale(payment: PaymentStatus, service: ServiceStatus) -> SaleStatusSnapshot {
        SaleStatusSnapshot {
            id: 10,
            sale_type: SaleType::Service,
            payment_status: payment,
            service_status: Some(service),
        }
    }

    fn product_sale(payment: PaymentStatus) -> SaleStatusSnapshot {
        SaleStatusSnapshot {
            id: 11,
            sale_type: SaleType::Product,
            payment_status: payment,
            service_status: None,
        }
    }

    #[test]
    fn test_cancel_cascades_from_every_service_status() {
        for service in ServiceStatus::ALL {
            for payment in [PaymentStatus::Pending, PaymentStatus::Confirmed] {
                let plan =
                    plan_payment_transition(&service_sale(payment, service), PaymentStatus::Canceled)
                        .unwrap();
                assert_eq!(plan.service_status, Some(ServiceStatus::Canceled));
            }
        }
    }

    #[test]
    fn test_cancel_product_sale_has_no_cascade() {
        let plan =
            plan_payment_transition(&product_sale(PaymentStatus::Pending), PaymentStatus::Canceled)
                .unwrap();
        assert_eq!(plan.payment_status, PaymentStatus::Canceled);
        assert_eq!(plan.service_status, None);
    }

    #[test]
    fn test_confirm_leaves_service_status_alone() {
        let plan = plan_payment_transition(
            &service_sale(PaymentStatus::Pending, ServiceStatus::InProgress),
            PaymentStatus::Confirmed,
        )
        .unwrap();
        assert_eq!(plan.service_status, None);
    }

    #[test]
    fn test_same_payment_status_is_rejected() {
        for status in PaymentStatus::ALL {
            let err = plan_payment_transition(&product_sale(status), status).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidState);
            assert!(err.to_string().contains("already in requested status"));
        }
    }

    #[test]
    fn test_illegal_payment_transitions() {
        let err =
            plan_payment_transition(&product_sale(PaymentStatus::Canceled), PaymentStatus::Pending)
                .unwrap_err();
        assert!(matches!(err, CoreError::IllegalTransition { .. }));
        assert!(!payment_transition_allowed(PaymentStatus::Confirmed, PaymentStatus::Pending));
        assert!(!payment_transition_allowed(PaymentStatus::Canceled, PaymentStatus::Confirmed));
    }

    #[test]
    fn test_service_happy_path() {
        let sale = service_sale(PaymentStatus::Pending, ServiceStatus::Pending);
        assert_eq!(
            plan_service_transition(&sale, ServiceStatus::InProgress).unwrap(),
            ServiceStatus::InProgress
        );

        let sale = service_sale(PaymentStatus::Pending, ServiceStatus::InProgress);
        assert_eq!(
            plan_service_transition(&sale, ServiceStatus::Completed).unwrap(),
            ServiceStatus::Completed
        );
    }

    #[test]
    fn test_service_terminal_states() {
        let done = service_sale(PaymentStatus::Confirmed, ServiceStatus::Completed);
        assert!(plan_service_transition(&done, ServiceStatus::Canceled).is_err());
        assert!(plan_service_transition(&done, ServiceStatus::InProgress).is_err());

        let skipped = service_sale(PaymentStatus::Pending, ServiceStatus::Pending);
        assert!(plan_service_transition(&skipped, ServiceStatus::Completed).is_err());
    }

    #[test]
    fn test_service_status_on_product_sale_is_not_found() {
        let err = plan_service_transition(&product_sale(PaymentStatus::Pending), ServiceStatus::InProgress)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_same_service_status_is_rejected() {
        let sale = service_sale(PaymentStatus::Pending, ServiceStatus::InProgress);
        let err = plan_service_transition(&sale, ServiceStatus::InProgress).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyInStatus { sale_id: 10, .. }));
    }
}
