//! # Error Types
//!
//! Domain-specific error types for porter-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  porter-core errors (this file)                                        │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  ├── PricingError     - Pricing a booking spec failed                  │
//! │  ├── DiscountError    - Discount code rejected                         │
//! │  └── LifecycleError   - Disallowed status transition                   │
//! │                                                                        │
//! │  porter-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                        │
//! │  Flow: ValidationError → PricingError → ServiceError → caller          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, tier, status, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-displayable message; collaborator
//!    internals (SQL errors, gateway stack traces) never ride along

use thiserror::Error;

use crate::types::{BookingStatus, PackageTier, ServiceType};

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a booking spec doesn't meet requirements, before any
/// pricing math runs. Rejected synchronously with a specific reason.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Count is below the configured service minimum.
    #[error("{field} must be at least {minimum}")]
    BelowMinimum { field: String, minimum: i64 },

    /// Invalid format (e.g., malformed postal code or discount code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The requested option is not offered for this tier.
    #[error("{option} is not offered for the {tier:?} tier")]
    NotOfferedForTier { option: String, tier: PackageTier },
}

// =============================================================================
// Pricing Error
// =============================================================================

/// Errors produced while pricing a booking spec.
///
/// Validation and reference variants carry enough structure to render a
/// user-facing message directly. Invariant variants abort the operation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// The spec names a service type the catalog doesn't know.
    #[error("Unknown service type: {0}")]
    UnknownServiceType(String),

    /// A field this service type requires was not provided.
    #[error("Missing required field for {service:?}: {field}")]
    MissingRequiredField { service: ServiceType, field: String },

    /// The referenced package doesn't exist or doesn't match the request.
    #[error("Invalid package: {reason}")]
    InvalidPackage { reason: String },

    /// A referenced specialty item is not in the catalog.
    #[error("Specialty item not found: {0}")]
    SpecialtyItemNotFound(String),

    /// A referenced organizing service is not in the catalog or wrong tier.
    #[error("Organizing service not available: {reason}")]
    OrganizingUnavailable { reason: String },

    /// No active standard delivery configuration exists.
    #[error("No active delivery configuration")]
    NoDeliveryConfig,

    /// An address is outside the service area.
    #[error("Address not serviceable: {message}")]
    Unserviceable { message: String },

    /// Input validation failed (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Discount code was rejected (wraps DiscountError).
    #[error("Discount rejected: {0}")]
    Discount(#[from] DiscountError),

    /// An internal invariant did not hold; the operation must abort.
    #[error("Pricing invariant violated: {0}")]
    InvariantViolation(String),
}

// =============================================================================
// Discount Error
// =============================================================================

/// Discount code rejection reasons, in validation order.
///
/// First failure wins; each variant's message is shown to the customer
/// verbatim at checkout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Unknown, inactive, or past its expiry.
    #[error("invalid or expired code")]
    InvalidOrExpired,

    /// The code's service allow-list doesn't include this booking's service.
    #[error("not valid for this service")]
    NotValidForService,

    /// Order total is below the code's configured minimum.
    #[error("order does not meet minimum")]
    BelowMinimumOrder,

    /// Global usage cap reached.
    #[error("code exhausted")]
    Exhausted,

    /// This customer already used the code its maximum number of times.
    #[error("already used by this customer")]
    AlreadyUsedByCustomer,
}

// =============================================================================
// Lifecycle Error
// =============================================================================

/// Status transition failures.
///
/// A disallowed edge is an explicit failure, never a silent no-op.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    /// The requested status string is outside the fixed status enum.
    #[error("Unknown booking status: {0}")]
    UnknownStatus(String),

    /// The edge from current to requested status is not legal.
    #[error("Cannot transition booking from {from:?} to {to:?}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// The booking is already in a terminal state.
    #[error("Booking is {status:?}, no further transitions allowed")]
    Terminal { status: BookingStatus },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Convenience alias for pricing results.
pub type PricingResult<T> = Result<T, PricingError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "postal code".to_string(),
        };
        assert_eq!(err.to_string(), "postal code is required");

        let err = ValidationError::BelowMinimum {
            field: "item count".to_string(),
            minimum: 3,
        };
        assert_eq!(err.to_string(), "item count must be at least 3");
    }

    #[test]
    fn test_discount_error_messages_are_customer_facing() {
        assert_eq!(
            DiscountError::InvalidOrExpired.to_string(),
            "invalid or expired code"
        );
        assert_eq!(
            DiscountError::NotValidForService.to_string(),
            "not valid for this service"
        );
        assert_eq!(
            DiscountError::BelowMinimumOrder.to_string(),
            "order does not meet minimum"
        );
        assert_eq!(DiscountError::Exhausted.to_string(), "code exhausted");
        assert_eq!(
            DiscountError::AlreadyUsedByCustomer.to_string(),
            "already used by this customer"
        );
    }

    #[test]
    fn test_lifecycle_error_names_both_states() {
        let err = LifecycleError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Pending,
        };
        assert!(err.to_string().contains("Completed"));
        assert!(err.to_string().contains("Pending"));
    }

    #[test]
    fn test_validation_converts_to_pricing_error() {
        let validation_err = ValidationError::Required {
            field: "pickup date".to_string(),
        };
        let pricing_err: PricingError = validation_err.into();
        assert!(matches!(pricing_err, PricingError::Validation(_)));
    }
}
