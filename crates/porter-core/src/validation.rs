//! # Validation Module
//!
//! Business-rule validation for booking specs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + pricing engine                                 │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Business rule validation (minimums, tier options)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::types::PackageTier;
use crate::{MAX_BAGS, MAX_DELIVERY_ITEMS, MAX_SPECIALTY_QUANTITY};

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a standard delivery item count against the configured minimum.
///
/// ## Example
/// ```rust
/// use porter_core::validation::validate_item_count;
///
/// assert!(validate_item_count(5, 3).is_ok());
/// assert!(validate_item_count(2, 3).is_err());
/// assert!(validate_item_count(0, 3).is_err());
/// ```
pub fn validate_item_count(count: i64, minimum: i64) -> ValidationResult<()> {
    if count <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "item count".to_string(),
        });
    }

    if count < minimum {
        return Err(ValidationError::BelowMinimum {
            field: "item count".to_string(),
            minimum,
        });
    }

    if count > MAX_DELIVERY_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "item count".to_string(),
            min: minimum,
            max: MAX_DELIVERY_ITEMS,
        });
    }

    Ok(())
}

/// Validates an airport transfer bag count.
pub fn validate_bag_count(count: i64) -> ValidationResult<()> {
    if count <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "bag count".to_string(),
        });
    }

    if count > MAX_BAGS {
        return Err(ValidationError::OutOfRange {
            field: "bag count".to_string(),
            min: 1,
            max: MAX_BAGS,
        });
    }

    Ok(())
}

/// Validates a specialty item quantity.
pub fn validate_specialty_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_SPECIALTY_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_SPECIALTY_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a customer-typed discount code before lookup.
///
/// ## Rules
/// - Must not be blank
/// - Maximum 40 characters
/// - Letters, numbers, hyphens, underscores only
pub fn validate_discount_code_format(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "discount code".to_string(),
        });
    }

    if code.len() > 40 {
        return Err(ValidationError::InvalidFormat {
            field: "discount code".to_string(),
            reason: "must be at most 40 characters".to_string(),
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "discount code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates an entity id (booking, package, item) before lookup.
///
/// ## Rules
/// - Must be a valid UUID v4 format
/// - 36 characters with hyphens: xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx
///
/// ## Example
/// ```rust
/// use porter_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Tier Option Validators
// =============================================================================

/// Validates a 1-hour pickup window request against the package tier.
///
/// The petite tier does not offer the option; standard pays the fee; full
/// includes it at no charge.
pub fn validate_window_request(tier: PackageTier, window_requested: bool) -> ValidationResult<()> {
    if window_requested && tier == PackageTier::Petite {
        return Err(ValidationError::NotOfferedForTier {
            option: "1-hour pickup window".to_string(),
            tier,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_item_count() {
        assert!(validate_item_count(3, 3).is_ok());
        assert!(validate_item_count(100, 3).is_ok());

        assert!(validate_item_count(0, 3).is_err());
        assert!(validate_item_count(-1, 3).is_err());
        assert!(validate_item_count(2, 3).is_err());
        assert!(validate_item_count(MAX_DELIVERY_ITEMS + 1, 3).is_err());
    }

    #[test]
    fn test_validate_bag_count() {
        assert!(validate_bag_count(1).is_ok());
        assert!(validate_bag_count(MAX_BAGS).is_ok());
        assert!(validate_bag_count(0).is_err());
        assert!(validate_bag_count(MAX_BAGS + 1).is_err());
    }

    #[test]
    fn test_validate_specialty_quantity() {
        assert!(validate_specialty_quantity(1).is_ok());
        assert!(validate_specialty_quantity(0).is_err());
        assert!(validate_specialty_quantity(MAX_SPECIALTY_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_discount_code_format() {
        assert!(validate_discount_code_format("MOVE20").is_ok());
        assert!(validate_discount_code_format("  move-20 ").is_ok());
        assert!(validate_discount_code_format("").is_err());
        assert!(validate_discount_code_format("has space").is_err());
        assert!(validate_discount_code_format(&"A".repeat(41)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
        assert!(validate_uuid("123").is_err());
    }

    #[test]
    fn test_window_not_offered_for_petite() {
        assert!(validate_window_request(PackageTier::Petite, false).is_ok());
        assert!(validate_window_request(PackageTier::Petite, true).is_err());
        assert!(validate_window_request(PackageTier::Standard, true).is_ok());
        assert!(validate_window_request(PackageTier::Full, true).is_ok());
    }
}
