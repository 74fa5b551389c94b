//! # Validation Module
//!
//! Request validation that runs before any database work.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: Routing layer (schema validation, out of this workspace)      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - shape rules the domain relies on                │
//! │  ├── at least one line, at most MAX_SALE_LINES                          │
//! │  ├── quantity in 1..=MAX_LINE_QUANTITY                                  │
//! │  ├── positive ids, known status ids                                     │
//! │  └── observations length                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (CHECK stock >= 0, CHECK quantity >= 1, FKs)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::dto::{ProductSaleRequest, ServiceSaleRequest};
use crate::error::ValidationError;
use crate::types::PaymentStatus;
use crate::{MAX_LINE_QUANTITY, MAX_OBSERVATIONS_LEN, MAX_SALE_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a line quantity (1 to MAX_LINE_QUANTITY).
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if !(1..=MAX_LINE_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a foreign key id supplied by the caller.
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates the optional observations text.
pub fn validate_observations(observations: Option<&str>) -> ValidationResult<()> {
    match observations {
        Some(text) if text.chars().count() > MAX_OBSERVATIONS_LEN => {
            Err(ValidationError::TooLong {
                field: "observations".to_string(),
                max: MAX_OBSERVATIONS_LEN,
            })
        }
        _ => Ok(()),
    }
}

/// Validates the number of lines on a sale.
pub fn validate_line_count(field: &str, count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if count > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }
    Ok(())
}

/// Resolves the optional payment status id, defaulting to Pending.
pub fn resolve_payment_status(id: Option<i64>) -> ValidationResult<PaymentStatus> {
    id.map(PaymentStatus::try_from)
        .transpose()
        .map(Option::unwrap_or_default)
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates a product sale request and returns its payment status.
pub fn validate_product_sale(req: &ProductSaleRequest) -> ValidationResult<PaymentStatus> {
    validate_id("client_id", req.client_id)?;
    validate_id("payment_method_id", req.payment_method_id)?;
    validate_observations(req.observations.as_deref())?;
    validate_line_count("products", req.products.len())?;

    for line in &req.products {
        validate_id("product_id", line.product_id)?;
        validate_quantity(line.quantity)?;
    }

    resolve_payment_status(req.payment_status_id)
}

/// Validates a service sale request and returns its payment status.
pub fn validate_service_sale(req: &ServiceSaleRequest) -> ValidationResult<PaymentStatus> {
    validate_id("client_id", req.client_id)?;
    validate_id("vehicle_id", req.vehicle_id)?;
    validate_id("payment_method_id", req.payment_method_id)?;
    validate_observations(req.observations.as_deref())?;
    validate_line_count("services", req.services.len())?;

    for line in &req.services {
        validate_id("service_id", line.service_id)?;
    }

    resolve_payment_status(req.payment_status_id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{ProductLineRequest, ServiceLineRequest};

    fn product_request(lines: Vec<(i64, i64)>) -> ProductSaleRequest {
        ProductSaleRequest {
            client_id: 1,
            payment_method_id: 1,
            payment_status_id: None,
            observations: None,
            products: lines
                .into_iter()
                .map(|(product_id, quantity)| ProductLineRequest {
                    product_id,
                    quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
        assert!(validate_quantity(MAX_LINE_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_product_sale_requires_lines() {
        let err = validate_product_sale(&product_request(vec![])).unwrap_err();
        assert_eq!(err.to_string(), "products is required");
    }

    #[test]
    fn test_product_sale_rejects_zero_quantity() {
        assert!(validate_product_sale(&product_request(vec![(1, 2), (2, 0)])).is_err());
    }

    #[test]
    fn test_product_sale_defaults_to_pending() {
        let status = validate_product_sale(&product_request(vec![(1, 2)])).unwrap();
        assert_eq!(status, PaymentStatus::Pending);

        let mut req = product_request(vec![(1, 2)]);
        req.payment_status_id = Some(2);
        assert_eq!(validate_product_sale(&req).unwrap(), PaymentStatus::Confirmed);

        req.payment_status_id = Some(9);
        assert!(validate_product_sale(&req).is_err());
    }

    #[test]
    fn test_too_many_lines() {
        let lines = (1..=(MAX_SALE_LINES as i64 + 1)).map(|id| (id, 1)).collect();
        assert!(validate_product_sale(&product_request(lines)).is_err());
    }

    #[test]
    fn test_service_sale_validation() {
        let mut req = ServiceSaleRequest {
            client_id: 1,
            vehicle_id: 3,
            payment_method_id: 1,
            payment_status_id: None,
            observations: Some("Pet hair in the back seats".to_string()),
            services: vec![ServiceLineRequest { service_id: 1 }],
        };
        assert!(validate_service_sale(&req).is_ok());

        req.vehicle_id = 0;
        assert!(validate_service_sale(&req).is_err());

        req.vehicle_id = 3;
        req.observations = Some("x".repeat(MAX_OBSERVATIONS_LEN + 1));
        assert!(validate_service_sale(&req).is_err());

        req.observations = None;
        req.services.clear();
        assert_eq!(
            validate_service_sale(&req).unwrap_err().to_string(),
            "services is required"
        );
    }
}
