//! # Discount Code Validator
//!
//! Pure eligibility checks and amount computation for discount codes.
//!
//! ## Validation Order (first failure wins)
//! ```text
//! 1. active and not expired        → "invalid or expired code"
//! 2. service allow-list            → "not valid for this service"
//! 3. minimum order                 → "order does not meet minimum"
//! 4. global usage cap              → "code exhausted"
//! 5. per-customer usage cap        → "already used by this customer"
//! ```
//!
//! This module only decides; it never records. Redemption (usage row +
//! counter increment) lives in the db layer and happens strictly after the
//! booking is durably persisted, so a failed booking creation never burns
//! a customer's single-use code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::DiscountError;
use crate::money::{Money, Rate};
use crate::types::ServiceType;

// =============================================================================
// Discount Kind
// =============================================================================

/// How a code's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// `value` is a whole percent (0-100) of the pre-discount total.
    Percentage,
    /// `value` is a fixed amount in cents.
    Fixed,
}

// =============================================================================
// Discount Code
// =============================================================================

/// A redeemable discount code with eligibility constraints and usage caps.
///
/// Codes are stored uppercase and matched case-insensitively via
/// [`normalize_code`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountCode {
    pub id: String,

    /// Uppercase code string, unique.
    pub code: String,

    pub kind: DiscountKind,

    /// Whole percent for [`DiscountKind::Percentage`], cents for
    /// [`DiscountKind::Fixed`].
    pub value: i64,

    /// Minimum order total in cents, if any.
    pub minimum_order_cents: Option<i64>,

    /// Cap on the computed amount for percentage codes, in cents.
    pub maximum_discount_cents: Option<i64>,

    /// Service types this code is valid for; None or empty means all.
    pub allowed_services: Option<Vec<ServiceType>>,

    /// Global redemption cap, if any.
    pub max_uses: Option<i64>,

    /// Per-customer redemption cap, if any.
    pub max_uses_per_customer: Option<i64>,

    /// Global redemption counter, maintained atomically by the db layer.
    pub times_used: i64,

    pub is_active: bool,

    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// One redemption. Written by the db layer after a booking is persisted;
/// the (code, booking) pair is unique.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DiscountUsage {
    pub id: String,
    pub code_id: String,
    pub customer_key: String,
    pub booking_id: String,
    pub amount_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Usage counts observed at validation time.
///
/// The counts are a snapshot; the guarded redemption statements in the db
/// layer re-check the caps atomically, so a stale snapshot can only cause
/// a late rejection, never an over-redemption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageSnapshot {
    pub global_uses: i64,
    pub customer_uses: i64,
}

// =============================================================================
// Validation & Computation
// =============================================================================

/// Normalizes a customer-typed code for lookup: trimmed, uppercased.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Validates a code and computes the discount amount in one pass.
///
/// `on` is the evaluation instant, passed in so the function stays pure.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use porter_core::discount::{compute_discount, DiscountCode, DiscountKind, UsageSnapshot};
/// use porter_core::money::Money;
/// use porter_core::types::ServiceType;
///
/// let code = DiscountCode {
///     id: "d-1".into(),
///     code: "MOVE20".into(),
///     kind: DiscountKind::Percentage,
///     value: 20,
///     minimum_order_cents: None,
///     maximum_discount_cents: None,
///     allowed_services: None,
///     max_uses: None,
///     max_uses_per_customer: None,
///     times_used: 0,
///     is_active: true,
///     expires_at: None,
///     created_at: Utc::now(),
/// };
///
/// let amount = compute_discount(
///     &code,
///     &UsageSnapshot::default(),
///     Money::from_cents(99_500),
///     ServiceType::MiniMove,
///     Utc::now(),
/// )
/// .unwrap();
/// assert_eq!(amount.cents(), 19_900);
/// ```
pub fn compute_discount(
    code: &DiscountCode,
    usage: &UsageSnapshot,
    order_total: Money,
    service: ServiceType,
    on: DateTime<Utc>,
) -> Result<Money, DiscountError> {
    // 1. Active and not expired
    if !code.is_active {
        return Err(DiscountError::InvalidOrExpired);
    }
    if let Some(expires_at) = code.expires_at {
        if on >= expires_at {
            return Err(DiscountError::InvalidOrExpired);
        }
    }

    // 2. Service allow-list; empty list behaves like no list
    if let Some(allowed) = &code.allowed_services {
        if !allowed.is_empty() && !allowed.contains(&service) {
            return Err(DiscountError::NotValidForService);
        }
    }

    // 3. Minimum order
    if let Some(minimum) = code.minimum_order_cents {
        if order_total.cents() < minimum {
            return Err(DiscountError::BelowMinimumOrder);
        }
    }

    // 4. Global cap
    if let Some(max_uses) = code.max_uses {
        if usage.global_uses >= max_uses {
            return Err(DiscountError::Exhausted);
        }
    }

    // 5. Per-customer cap
    if let Some(per_customer) = code.max_uses_per_customer {
        if usage.customer_uses >= per_customer {
            return Err(DiscountError::AlreadyUsedByCustomer);
        }
    }

    let amount = match code.kind {
        DiscountKind::Percentage => {
            let raw = order_total.percent_floor(Rate::from_percent(code.value.max(0) as u32));
            match code.maximum_discount_cents {
                Some(cap) => raw.min(Money::from_cents(cap)),
                None => raw,
            }
        }
        // A fixed discount never exceeds the order total
        DiscountKind::Fixed => Money::from_cents(code.value).min(order_total),
    };

    Ok(amount.clamp_non_negative())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_code() -> DiscountCode {
        DiscountCode {
            id: "d-1".to_string(),
            code: "MOVE20".to_string(),
            kind: DiscountKind::Percentage,
            value: 20,
            minimum_order_cents: None,
            maximum_discount_cents: None,
            allowed_services: None,
            max_uses: None,
            max_uses_per_customer: None,
            times_used: 0,
            is_active: true,
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    fn compute(code: &DiscountCode, usage: &UsageSnapshot, total: i64) -> Result<Money, DiscountError> {
        compute_discount(
            code,
            usage,
            Money::from_cents(total),
            ServiceType::MiniMove,
            Utc::now(),
        )
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  move20 "), "MOVE20");
        assert_eq!(normalize_code("MOVE20"), "MOVE20");
    }

    #[test]
    fn test_twenty_percent_off() {
        let amount = compute(&base_code(), &UsageSnapshot::default(), 99_500).unwrap();
        assert_eq!(amount.cents(), 19_900);
    }

    #[test]
    fn test_inactive_rejected() {
        let mut code = base_code();
        code.is_active = false;
        assert_eq!(
            compute(&code, &UsageSnapshot::default(), 99_500),
            Err(DiscountError::InvalidOrExpired)
        );
    }

    #[test]
    fn test_expired_rejected() {
        let mut code = base_code();
        code.expires_at = Some(Utc::now() - Duration::days(1));
        assert_eq!(
            compute(&code, &UsageSnapshot::default(), 99_500),
            Err(DiscountError::InvalidOrExpired)
        );
    }

    #[test]
    fn test_service_allow_list() {
        let mut code = base_code();
        code.allowed_services = Some(vec![ServiceType::StandardDelivery]);
        assert_eq!(
            compute(&code, &UsageSnapshot::default(), 99_500),
            Err(DiscountError::NotValidForService)
        );

        // Empty allow-list behaves like no restriction
        code.allowed_services = Some(vec![]);
        assert!(compute(&code, &UsageSnapshot::default(), 99_500).is_ok());
    }

    #[test]
    fn test_minimum_order() {
        let mut code = base_code();
        code.minimum_order_cents = Some(50_000);
        assert_eq!(
            compute(&code, &UsageSnapshot::default(), 49_999),
            Err(DiscountError::BelowMinimumOrder)
        );
        assert!(compute(&code, &UsageSnapshot::default(), 50_000).is_ok());
    }

    #[test]
    fn test_global_cap() {
        let mut code = base_code();
        code.max_uses = Some(100);
        let usage = UsageSnapshot {
            global_uses: 100,
            customer_uses: 0,
        };
        assert_eq!(compute(&code, &usage, 99_500), Err(DiscountError::Exhausted));
    }

    #[test]
    fn test_per_customer_cap() {
        let mut code = base_code();
        code.max_uses_per_customer = Some(1);
        let usage = UsageSnapshot {
            global_uses: 5,
            customer_uses: 1,
        };
        assert_eq!(
            compute(&code, &usage, 99_500),
            Err(DiscountError::AlreadyUsedByCustomer)
        );
    }

    #[test]
    fn test_validation_order_short_circuits() {
        // Expired AND wrong service: expiry wins because it is checked first
        let mut code = base_code();
        code.expires_at = Some(Utc::now() - Duration::days(1));
        code.allowed_services = Some(vec![ServiceType::AirportTransfer]);
        assert_eq!(
            compute(&code, &UsageSnapshot::default(), 99_500),
            Err(DiscountError::InvalidOrExpired)
        );
    }

    #[test]
    fn test_percentage_cap() {
        let mut code = base_code();
        code.maximum_discount_cents = Some(10_000);
        let amount = compute(&code, &UsageSnapshot::default(), 99_500).unwrap();
        assert_eq!(amount.cents(), 10_000);
    }

    #[test]
    fn test_fixed_never_exceeds_total() {
        let mut code = base_code();
        code.kind = DiscountKind::Fixed;
        code.value = 150_000;
        let amount = compute(&code, &UsageSnapshot::default(), 99_500).unwrap();
        assert_eq!(amount.cents(), 99_500);
    }

    #[test]
    fn test_fixed_amount() {
        let mut code = base_code();
        code.kind = DiscountKind::Fixed;
        code.value = 2_500;
        let amount = compute(&code, &UsageSnapshot::default(), 99_500).unwrap();
        assert_eq!(amount.cents(), 2_500);
    }
}
