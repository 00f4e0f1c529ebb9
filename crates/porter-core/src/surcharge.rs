//! # Surcharge Rule Evaluator
//!
//! Date- and weekday-triggered price additions: weekend rules, holiday
//! rules, and peak-date rules, each percentage- or fixed-amount based.
//!
//! Multiple applicable rules accumulate additively. There is no implicit
//! mutual exclusion; administrators scope rules by service type when two
//! rules must not stack.
//!
//! ## Caller Contract
//! Same-day bookings must skip this evaluator entirely. The same-day flat
//! rate already bakes in urgency pricing; stacking date-based surcharges
//! on top would double-charge. See `pricing::compute_breakdown`.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};
use crate::types::ServiceType;

// =============================================================================
// Rule Types
// =============================================================================

/// What kind of calendar trigger a rule encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Weekend,
    Holiday,
    PeakDate,
}

/// How the surcharge amount is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RuleCalculation {
    /// `value` is basis points of the base amount, floored to the cent.
    Percentage,
    /// `value` is a fixed amount in cents.
    FixedAmount,
}

// =============================================================================
// Surcharge Rule
// =============================================================================

/// A single date-based surcharge rule.
///
/// Applicability is the union of three triggers: a specific date match, an
/// inclusive date-range match, and Saturday/Sunday weekday flags.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SurchargeRule {
    pub id: String,
    pub name: String,
    pub rule_type: RuleType,
    pub calculation: RuleCalculation,

    /// Basis points for percentage rules, cents for fixed rules.
    pub value: i64,

    /// Exact-date trigger.
    #[ts(as = "Option<String>")]
    pub specific_date: Option<NaiveDate>,

    /// Inclusive range start.
    #[ts(as = "Option<String>")]
    pub starts_on: Option<NaiveDate>,

    /// Inclusive range end.
    #[ts(as = "Option<String>")]
    pub ends_on: Option<NaiveDate>,

    pub applies_saturday: bool,
    pub applies_sunday: bool,

    /// Limit this rule to one service type; None applies to all.
    pub service_scope: Option<ServiceType>,

    pub is_active: bool,
}

impl SurchargeRule {
    /// Whether this rule triggers for the given pickup date.
    ///
    /// ## Rules
    /// - specific date equal to the pickup date, OR
    /// - pickup date inside the inclusive [starts_on, ends_on] range
    ///   (open-ended when only one bound is set), OR
    /// - pickup weekday is Saturday/Sunday and the matching flag is set
    pub fn applies_to_date(&self, date: NaiveDate) -> bool {
        if self.specific_date == Some(date) {
            return true;
        }

        let in_range = match (self.starts_on, self.ends_on) {
            (Some(start), Some(end)) => date >= start && date <= end,
            (Some(start), None) => date >= start,
            (None, Some(end)) => date <= end,
            (None, None) => false,
        };
        if in_range {
            return true;
        }

        match date.weekday() {
            Weekday::Sat => self.applies_saturday,
            Weekday::Sun => self.applies_sunday,
            _ => false,
        }
    }

    /// Whether this rule is in scope for the given service type.
    pub fn in_scope(&self, service: ServiceType) -> bool {
        self.is_active && self.service_scope.map_or(true, |s| s == service)
    }

    /// The surcharge amount for a given base, per this rule's calculation.
    pub fn amount_for(&self, base: Money) -> Money {
        match self.calculation {
            RuleCalculation::Percentage => base.percent_floor(Rate::from_bps(self.value as u32)),
            RuleCalculation::FixedAmount => Money::from_cents(self.value),
        }
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// One rule that fired, with its computed amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedSurcharge {
    pub rule_name: String,
    pub amount_cents: i64,
}

/// Evaluates all in-scope, applicable rules against a base amount.
///
/// Amounts accumulate additively; callers sum [`AppliedSurcharge`] entries
/// into the breakdown's date-surcharge line.
pub fn evaluate(
    rules: &[SurchargeRule],
    service: ServiceType,
    base: Money,
    pickup_date: NaiveDate,
) -> Vec<AppliedSurcharge> {
    rules
        .iter()
        .filter(|rule| rule.in_scope(service) && rule.applies_to_date(pickup_date))
        .map(|rule| AppliedSurcharge {
            rule_name: rule.name.clone(),
            amount_cents: rule.amount_for(base).cents(),
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn weekend_rule(bps: i64) -> SurchargeRule {
        SurchargeRule {
            id: "r-weekend".to_string(),
            name: "Weekend surcharge".to_string(),
            rule_type: RuleType::Weekend,
            calculation: RuleCalculation::Percentage,
            value: bps,
            specific_date: None,
            starts_on: None,
            ends_on: None,
            applies_saturday: true,
            applies_sunday: true,
            service_scope: None,
            is_active: true,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekend_rule_fires_on_saturday() {
        let rule = weekend_rule(1500);
        // 2026-08-08 is a Saturday
        assert!(rule.applies_to_date(date(2026, 8, 8)));
        // 2026-08-09 is a Sunday
        assert!(rule.applies_to_date(date(2026, 8, 9)));
        // 2026-08-10 is a Monday
        assert!(!rule.applies_to_date(date(2026, 8, 10)));
    }

    #[test]
    fn test_saturday_only_flag() {
        let mut rule = weekend_rule(1500);
        rule.applies_sunday = false;
        assert!(rule.applies_to_date(date(2026, 8, 8)));
        assert!(!rule.applies_to_date(date(2026, 8, 9)));
    }

    #[test]
    fn test_specific_date_trigger() {
        let mut rule = weekend_rule(2000);
        rule.rule_type = RuleType::Holiday;
        rule.applies_saturday = false;
        rule.applies_sunday = false;
        rule.specific_date = Some(date(2026, 12, 25));

        assert!(rule.applies_to_date(date(2026, 12, 25)));
        assert!(!rule.applies_to_date(date(2026, 12, 24)));
    }

    #[test]
    fn test_date_range_inclusive_endpoints() {
        let mut rule = weekend_rule(1000);
        rule.rule_type = RuleType::PeakDate;
        rule.applies_saturday = false;
        rule.applies_sunday = false;
        rule.starts_on = Some(date(2026, 5, 28));
        rule.ends_on = Some(date(2026, 6, 1));

        assert!(rule.applies_to_date(date(2026, 5, 28)));
        assert!(rule.applies_to_date(date(2026, 6, 1)));
        assert!(rule.applies_to_date(date(2026, 5, 30)));
        assert!(!rule.applies_to_date(date(2026, 5, 27)));
        assert!(!rule.applies_to_date(date(2026, 6, 2)));
    }

    #[test]
    fn test_percentage_amount_floors() {
        let rule = weekend_rule(1500);
        // floor(99500 * 0.15) = 14925
        assert_eq!(rule.amount_for(Money::from_cents(99_500)).cents(), 14_925);
    }

    #[test]
    fn test_fixed_amount() {
        let mut rule = weekend_rule(0);
        rule.calculation = RuleCalculation::FixedAmount;
        rule.value = 2_500;
        assert_eq!(rule.amount_for(Money::from_cents(99_500)).cents(), 2_500);
    }

    #[test]
    fn test_multiple_rules_accumulate() {
        let weekend = weekend_rule(1500);
        let mut memorial = weekend_rule(0);
        memorial.id = "r-memorial".to_string();
        memorial.name = "Memorial Day".to_string();
        memorial.calculation = RuleCalculation::FixedAmount;
        memorial.value = 5_000;
        memorial.applies_saturday = false;
        memorial.applies_sunday = false;
        // 2026-05-30 is a Saturday inside the holiday weekend
        memorial.specific_date = Some(date(2026, 5, 30));

        let applied = evaluate(
            &[weekend, memorial],
            ServiceType::MiniMove,
            Money::from_cents(99_500),
            date(2026, 5, 30),
        );

        assert_eq!(applied.len(), 2);
        let total: i64 = applied.iter().map(|a| a.amount_cents).sum();
        assert_eq!(total, 14_925 + 5_000);
    }

    #[test]
    fn test_service_scope_filters() {
        let mut rule = weekend_rule(1500);
        rule.service_scope = Some(ServiceType::StandardDelivery);

        let applied = evaluate(
            std::slice::from_ref(&rule),
            ServiceType::MiniMove,
            Money::from_cents(10_000),
            date(2026, 8, 8),
        );
        assert!(applied.is_empty());

        let applied = evaluate(
            std::slice::from_ref(&rule),
            ServiceType::StandardDelivery,
            Money::from_cents(10_000),
            date(2026, 8, 8),
        );
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn test_inactive_rule_skipped() {
        let mut rule = weekend_rule(1500);
        rule.is_active = false;

        let applied = evaluate(
            &[rule],
            ServiceType::MiniMove,
            Money::from_cents(10_000),
            date(2026, 8, 8),
        );
        assert!(applied.is_empty());
    }
}
