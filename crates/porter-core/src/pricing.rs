//! # Pricing Engine
//!
//! Turns a [`BookingSpec`] plus a [`CatalogSnapshot`] into one itemized,
//! auditable [`PriceBreakdown`].
//!
//! ## Evaluation Order (fixed)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Base price        by service type                                   │
//! │  2. Organizing        add-ons + sales tax (mini move only)              │
//! │  3. COI fee           if requested and not bundled                      │
//! │  4. Geo surcharge     per out-of-core address (0, 1, or 2×)             │
//! │  5. Window surcharge  1-hour pickup window (standard tier only)         │
//! │  6. Date surcharge    weekend/holiday/peak rules (skipped same-day)     │
//! │  7. Discount          applied last, total clamped at ≥ 0               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step only moves the running total forward; the discount is the only
//! subtraction and it happens last, against the full pre-discount total.
//!
//! ## Purity
//! `compute_breakdown` is a pure function. It reads the snapshot, returns a
//! value, and touches nothing else. Persisting the result, recording
//! discount usage, and emitting notifications are separate steps owned by
//! the db layer. Pricing the same spec against the same snapshot twice
//! yields byte-identical breakdowns, which is what makes re-pricing on
//! edit safe to do and safe to skip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::discount::{self, DiscountCode, UsageSnapshot};
use crate::error::{PricingError, PricingResult};
use crate::money::Money;
use crate::surcharge::{self, SurchargeRule};
use crate::types::{
    BookingSpec, FeeSchedule, OrganizingService, PackageTier, ServicePackage, ServiceType,
    SpecialtyItem, StandardDeliveryConfig,
};
use crate::validation;
use crate::zone;
use crate::PETITE_COI_FEE_CENTS;

// =============================================================================
// Catalog Snapshot
// =============================================================================

/// The discount context captured when the snapshot was assembled.
#[derive(Debug, Clone)]
pub struct DiscountContext {
    pub code: DiscountCode,
    pub usage: UsageSnapshot,
    /// Instant the snapshot was taken; used for the expiry check so the
    /// engine itself never consults a clock.
    pub evaluated_at: DateTime<Utc>,
}

/// Everything the pricing engine is allowed to read.
///
/// Assembled by the catalog repository per request; the engine performs no
/// lookups of its own, so tests supply an in-memory fixture.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    /// The package referenced by the spec, when one was referenced.
    pub package: Option<ServicePackage>,
    /// The single active standard delivery configuration.
    pub delivery_config: Option<StandardDeliveryConfig>,
    /// Active specialty items referenced by the spec.
    pub specialty_items: Vec<SpecialtyItem>,
    /// Active organizing services for the package's tier.
    pub organizing_services: Vec<OrganizingService>,
    /// Active surcharge rules.
    pub surcharge_rules: Vec<SurchargeRule>,
    /// Active flat fees and rates.
    pub fees: FeeSchedule,
    /// Looked-up discount code, when the spec carries one that exists.
    pub discount: Option<DiscountContext>,
}

// =============================================================================
// Price Breakdown
// =============================================================================

/// One line of the itemized quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub label: String,
    /// Negative for the discount line.
    pub amount_cents: i64,
}

/// The itemized result of pricing one booking spec.
///
/// Immutable value; persistence writes these fields verbatim. The identity
/// `total = base + organizing + organizing_tax + coi + geo + window + date
/// - discount` holds exactly in integer cents, with the total clamped at
/// zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBreakdown {
    pub base_cents: i64,
    pub organizing_cents: i64,
    pub organizing_tax_cents: i64,
    pub coi_fee_cents: i64,
    pub geo_surcharge_cents: i64,
    pub time_window_cents: i64,
    pub date_surcharge_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,

    /// Human-readable notes about what was (or wasn't) charged.
    pub disclaimers: Vec<String>,
}

impl PriceBreakdown {
    /// Sum of all charge lines before the discount.
    pub fn pre_discount_total_cents(&self) -> i64 {
        self.base_cents
            + self.organizing_cents
            + self.organizing_tax_cents
            + self.coi_fee_cents
            + self.geo_surcharge_cents
            + self.time_window_cents
            + self.date_surcharge_cents
    }

    /// Whether the stored total matches the line sum (audit check).
    pub fn is_consistent(&self) -> bool {
        let expected = (self.pre_discount_total_cents() - self.discount_cents).max(0);
        self.total_cents == expected && self.total_cents >= 0
    }

    /// Renders the breakdown as labeled line items, omitting zero lines
    /// (the base line always renders).
    pub fn line_items(&self) -> Vec<LineItem> {
        let mut items = vec![LineItem {
            label: "Base price".to_string(),
            amount_cents: self.base_cents,
        }];

        let mut push = |label: &str, amount: i64| {
            if amount != 0 {
                items.push(LineItem {
                    label: label.to_string(),
                    amount_cents: amount,
                });
            }
        };

        push("Organizing services", self.organizing_cents);
        push("Organizing sales tax", self.organizing_tax_cents);
        push("Certificate of Insurance", self.coi_fee_cents);
        push("Extended area surcharge", self.geo_surcharge_cents);
        push("1-hour pickup window", self.time_window_cents);
        push("Date surcharge", self.date_surcharge_cents);
        push("Discount", -self.discount_cents);

        items
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Prices one booking spec against a catalog snapshot.
///
/// Deterministic: no clock, no randomness, no I/O. Errors are typed and
/// carry a user-displayable reason; see [`PricingError`].
pub fn compute_breakdown(
    spec: &BookingSpec,
    catalog: &CatalogSnapshot,
) -> PricingResult<PriceBreakdown> {
    let mut disclaimers = Vec::new();

    // -------------------------------------------------------------------------
    // Step 1: base price by service type
    // -------------------------------------------------------------------------
    let base = match spec.service_type {
        ServiceType::MiniMove => mini_move_base(spec, catalog)?,
        ServiceType::StandardDelivery => standard_delivery_base(spec, catalog, &mut disclaimers)?,
        ServiceType::SpecialtyDelivery => specialty_base(spec, catalog)?,
        ServiceType::AirportTransfer => airport_base(spec, catalog)?,
    };

    // -------------------------------------------------------------------------
    // Step 2: organizing add-ons + tax (mini move only)
    // -------------------------------------------------------------------------
    let (organizing, organizing_tax) = organizing_lines(spec, catalog)?;

    // -------------------------------------------------------------------------
    // Step 3: COI fee
    // -------------------------------------------------------------------------
    let coi_fee = coi_fee_for(spec, catalog);

    // -------------------------------------------------------------------------
    // Step 4: geographic surcharge (0, 1, or 2 addresses)
    // -------------------------------------------------------------------------
    let geo_surcharge = geo_surcharge_for(spec, catalog, &mut disclaimers)?;

    // -------------------------------------------------------------------------
    // Step 5: 1-hour pickup window (standard tier pays, full includes it)
    // -------------------------------------------------------------------------
    let window_fee = window_fee_for(spec, catalog, &mut disclaimers)?;

    // -------------------------------------------------------------------------
    // Step 6: date-based surcharges (skipped entirely for same-day)
    // -------------------------------------------------------------------------
    let date_surcharge = if spec.same_day {
        Money::zero()
    } else {
        let applied = surcharge::evaluate(
            &catalog.surcharge_rules,
            spec.service_type,
            base,
            spec.pickup_date,
        );
        for rule in &applied {
            disclaimers.push(format!("Includes {}", rule.rule_name));
        }
        Money::from_cents(applied.iter().map(|a| a.amount_cents).sum())
    };

    // -------------------------------------------------------------------------
    // Step 7: discount, last, against the pre-discount total
    // -------------------------------------------------------------------------
    let pre_discount =
        base + organizing + organizing_tax + coi_fee + geo_surcharge + window_fee + date_surcharge;

    let discount_amount = discount_for(spec, catalog, pre_discount)?;

    let total = (pre_discount - discount_amount).clamp_non_negative();

    let breakdown = PriceBreakdown {
        base_cents: base.cents(),
        organizing_cents: organizing.cents(),
        organizing_tax_cents: organizing_tax.cents(),
        coi_fee_cents: coi_fee.cents(),
        geo_surcharge_cents: geo_surcharge.cents(),
        time_window_cents: window_fee.cents(),
        date_surcharge_cents: date_surcharge.cents(),
        discount_cents: discount_amount.cents(),
        total_cents: total.cents(),
        disclaimers,
    };

    if !breakdown.is_consistent() {
        return Err(PricingError::InvariantViolation(format!(
            "breakdown does not sum: {breakdown:?}"
        )));
    }

    Ok(breakdown)
}

// =============================================================================
// Step 1 helpers: base price
// =============================================================================

fn mini_move_base(spec: &BookingSpec, catalog: &CatalogSnapshot) -> PricingResult<Money> {
    let package_id =
        spec.package_id
            .as_deref()
            .ok_or_else(|| PricingError::MissingRequiredField {
                service: ServiceType::MiniMove,
                field: "package_id".to_string(),
            })?;

    let package = resolve_package(package_id, catalog)?;
    Ok(package.base_price())
}

fn resolve_package<'a>(
    package_id: &str,
    catalog: &'a CatalogSnapshot,
) -> PricingResult<&'a ServicePackage> {
    let package = catalog
        .package
        .as_ref()
        .filter(|p| p.id == package_id)
        .ok_or_else(|| PricingError::InvalidPackage {
            reason: format!("package {package_id} not found"),
        })?;

    if !package.is_active {
        return Err(PricingError::InvalidPackage {
            reason: format!("package {} is no longer offered", package.name),
        });
    }

    Ok(package)
}

fn standard_delivery_base(
    spec: &BookingSpec,
    catalog: &CatalogSnapshot,
    disclaimers: &mut Vec<String>,
) -> PricingResult<Money> {
    let config = catalog
        .delivery_config
        .as_ref()
        .ok_or(PricingError::NoDeliveryConfig)?;

    let count = spec
        .item_count
        .ok_or_else(|| PricingError::MissingRequiredField {
            service: ServiceType::StandardDelivery,
            field: "item_count".to_string(),
        })?;

    validation::validate_item_count(count, config.minimum_items)?;

    let mut base = config.per_item().multiply_quantity(count).max(config.minimum_charge());

    if spec.same_day {
        // Same-day urgency pricing is this flat rate; date-based rules are
        // skipped in step 6 so urgency is never charged twice.
        base += config.same_day_flat();
        disclaimers.push("Same-day rate applied; date surcharges do not apply".to_string());
    }

    Ok(base)
}

fn specialty_base(spec: &BookingSpec, catalog: &CatalogSnapshot) -> PricingResult<Money> {
    if spec.specialty_items.is_empty() {
        return Err(PricingError::MissingRequiredField {
            service: ServiceType::SpecialtyDelivery,
            field: "specialty_items".to_string(),
        });
    }

    let mut base = Money::zero();
    for selection in &spec.specialty_items {
        validation::validate_specialty_quantity(selection.quantity)?;

        let item = catalog
            .specialty_items
            .iter()
            .find(|i| i.id == selection.item_id && i.is_active)
            .ok_or_else(|| PricingError::SpecialtyItemNotFound(selection.item_id.clone()))?;

        base += item.price().multiply_quantity(selection.quantity);
    }

    Ok(base)
}

fn airport_base(spec: &BookingSpec, catalog: &CatalogSnapshot) -> PricingResult<Money> {
    let bags = spec
        .bag_count
        .ok_or_else(|| PricingError::MissingRequiredField {
            service: ServiceType::AirportTransfer,
            field: "bag_count".to_string(),
        })?;

    validation::validate_bag_count(bags)?;

    let per_bag = Money::from_cents(catalog.fees.airport_per_bag_cents);
    let minimum = Money::from_cents(catalog.fees.airport_minimum_cents);

    // Minimum enforced even for a single bag
    Ok(per_bag.multiply_quantity(bags).max(minimum))
}

// =============================================================================
// Step 2 helpers: organizing
// =============================================================================

fn organizing_lines(
    spec: &BookingSpec,
    catalog: &CatalogSnapshot,
) -> PricingResult<(Money, Money)> {
    if spec.organizing_ids.is_empty() {
        return Ok((Money::zero(), Money::zero()));
    }

    if spec.service_type != ServiceType::MiniMove {
        return Err(PricingError::OrganizingUnavailable {
            reason: "organizing services are only offered with mini moves".to_string(),
        });
    }

    // Base resolution already validated the package reference
    let package = resolve_package(spec.package_id.as_deref().unwrap_or_default(), catalog)?;

    let mut total = Money::zero();
    for id in &spec.organizing_ids {
        let service = catalog
            .organizing_services
            .iter()
            .find(|s| s.id == *id && s.is_active)
            .ok_or_else(|| PricingError::OrganizingUnavailable {
                reason: format!("organizing service {id} not found"),
            })?;

        if service.tier != package.tier {
            return Err(PricingError::OrganizingUnavailable {
                reason: format!(
                    "{} is offered with the {:?} tier, not {:?}",
                    service.name, service.tier, package.tier
                ),
            });
        }

        total += service.price();
    }

    // Sales tax applies to organizing services only, never the base price
    let tax = total.percent_floor(catalog.fees.organizing_tax_rate());
    Ok((total, tax))
}

// =============================================================================
// Step 3 helpers: COI
// =============================================================================

/// COI fee for this spec.
///
/// The petite tier charges a fixed fee that deliberately ignores the
/// package's own `coi_fee_cents` field. Observed billing behavior; do not
/// unify the two without a product decision (see DESIGN.md).
fn coi_fee_for(spec: &BookingSpec, catalog: &CatalogSnapshot) -> Money {
    if !spec.coi_required || spec.service_type != ServiceType::MiniMove {
        return Money::zero();
    }

    match catalog.package.as_ref() {
        Some(package) if !package.coi_included => match package.tier {
            PackageTier::Petite => Money::from_cents(PETITE_COI_FEE_CENTS),
            _ => Money::from_cents(package.coi_fee_cents),
        },
        _ => Money::zero(),
    }
}

// =============================================================================
// Step 4 helpers: geography
// =============================================================================

fn geo_surcharge_for(
    spec: &BookingSpec,
    catalog: &CatalogSnapshot,
    disclaimers: &mut Vec<String>,
) -> PricingResult<Money> {
    let codes: Vec<&str> = [
        spec.pickup_postal_code.as_deref(),
        spec.delivery_postal_code.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();

    if codes.is_empty() {
        // Bookings captured before postal codes were collected carry a
        // single flat surcharge when flagged
        if spec.outer_area_fallback {
            disclaimers.push("Extended area surcharge applied".to_string());
            return Ok(catalog.fees.geo_surcharge());
        }
        return Ok(Money::zero());
    }

    let mut surcharged = 0i64;
    for code in codes {
        let result = zone::classify(code);
        if !result.serviceable {
            return Err(PricingError::Unserviceable {
                message: result
                    .message
                    .unwrap_or_else(|| "address is outside our service area".to_string()),
            });
        }
        if result.requires_surcharge {
            surcharged += 1;
        }
    }

    if surcharged > 0 {
        disclaimers.push(format!(
            "Extended area surcharge applied to {surcharged} address(es)"
        ));
    }

    Ok(catalog.fees.geo_surcharge().multiply_quantity(surcharged))
}

// =============================================================================
// Step 5 helpers: pickup window
// =============================================================================

fn window_fee_for(
    spec: &BookingSpec,
    catalog: &CatalogSnapshot,
    disclaimers: &mut Vec<String>,
) -> PricingResult<Money> {
    if !spec.one_hour_window || spec.service_type != ServiceType::MiniMove {
        return Ok(Money::zero());
    }

    let package = resolve_package(spec.package_id.as_deref().unwrap_or_default(), catalog)?;
    validation::validate_window_request(package.tier, true)?;

    match package.tier {
        PackageTier::Standard => Ok(catalog.fees.time_window_fee()),
        PackageTier::Full => {
            disclaimers.push("1-hour pickup window included with your package".to_string());
            Ok(Money::zero())
        }
        // Rejected by validate_window_request above
        PackageTier::Petite => Ok(Money::zero()),
    }
}

// =============================================================================
// Step 7 helpers: discount
// =============================================================================

fn discount_for(
    spec: &BookingSpec,
    catalog: &CatalogSnapshot,
    pre_discount: Money,
) -> PricingResult<Money> {
    let Some(raw_code) = spec.discount_code.as_deref() else {
        return Ok(Money::zero());
    };

    validation::validate_discount_code_format(raw_code)?;

    let Some(ctx) = catalog.discount.as_ref() else {
        // The spec names a code the snapshot assembler couldn't find
        return Err(PricingError::Discount(
            crate::error::DiscountError::InvalidOrExpired,
        ));
    };

    if discount::normalize_code(raw_code) != ctx.code.code {
        return Err(PricingError::Discount(
            crate::error::DiscountError::InvalidOrExpired,
        ));
    }

    let amount = discount::compute_discount(
        &ctx.code,
        &ctx.usage,
        pre_discount,
        spec.service_type,
        ctx.evaluated_at,
    )?;

    Ok(amount)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::DiscountKind;
    use crate::surcharge::{RuleCalculation, RuleType};
    use crate::types::{OrganizingKind, SpecialtySelection};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn petite_package() -> ServicePackage {
        ServicePackage {
            id: "pkg-petite".to_string(),
            tier: PackageTier::Petite,
            name: "Petite Move".to_string(),
            base_price_cents: 99_500,
            max_items: Some(10),
            max_weight_lbs: None,
            coi_included: false,
            coi_fee_cents: 7_500,
            priority_scheduling: false,
            protective_wrapping: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn standard_package() -> ServicePackage {
        ServicePackage {
            id: "pkg-standard".to_string(),
            tier: PackageTier::Standard,
            name: "Standard Move".to_string(),
            base_price_cents: 179_500,
            max_items: Some(25),
            max_weight_lbs: None,
            coi_included: false,
            coi_fee_cents: 7_500,
            priority_scheduling: true,
            protective_wrapping: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn full_package() -> ServicePackage {
        ServicePackage {
            id: "pkg-full".to_string(),
            tier: PackageTier::Full,
            name: "Full Move".to_string(),
            base_price_cents: 299_500,
            max_items: None,
            max_weight_lbs: None,
            coi_included: true,
            coi_fee_cents: 0,
            priority_scheduling: true,
            protective_wrapping: true,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn delivery_config() -> StandardDeliveryConfig {
        StandardDeliveryConfig {
            id: "cfg-1".to_string(),
            per_item_cents: 9_500,
            minimum_items: 1,
            minimum_charge_cents: 28_500,
            same_day_flat_cents: 36_000,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    fn weekend_rule() -> SurchargeRule {
        SurchargeRule {
            id: "r-weekend".to_string(),
            name: "Weekend surcharge".to_string(),
            rule_type: RuleType::Weekend,
            calculation: RuleCalculation::Percentage,
            value: 1_500,
            specific_date: None,
            starts_on: None,
            ends_on: None,
            applies_saturday: true,
            applies_sunday: true,
            service_scope: None,
            is_active: true,
        }
    }

    fn catalog_with(package: Option<ServicePackage>) -> CatalogSnapshot {
        CatalogSnapshot {
            package,
            delivery_config: Some(delivery_config()),
            specialty_items: vec![
                SpecialtyItem {
                    id: "sp-bike".to_string(),
                    name: "Bike".to_string(),
                    price_cents: 12_500,
                    is_active: true,
                },
                SpecialtyItem {
                    id: "sp-surfboard".to_string(),
                    name: "Surfboard".to_string(),
                    price_cents: 15_000,
                    is_active: true,
                },
            ],
            organizing_services: vec![
                OrganizingService {
                    id: "org-petite-pack".to_string(),
                    kind: OrganizingKind::Packing,
                    tier: PackageTier::Petite,
                    name: "Petite packing".to_string(),
                    price_cents: 30_000,
                    duration_hours: 2,
                    organizer_count: 1,
                    supplies_allowance_cents: 5_000,
                    is_active: true,
                },
                OrganizingService {
                    id: "org-full-pack".to_string(),
                    kind: OrganizingKind::Packing,
                    tier: PackageTier::Full,
                    name: "Full packing".to_string(),
                    price_cents: 80_000,
                    duration_hours: 5,
                    organizer_count: 3,
                    supplies_allowance_cents: 15_000,
                    is_active: true,
                },
            ],
            surcharge_rules: vec![],
            fees: FeeSchedule::default(),
            discount: None,
        }
    }

    /// Weekday spec with nothing optional selected.
    fn mini_move_spec(package_id: &str) -> BookingSpec {
        BookingSpec {
            service_type: ServiceType::MiniMove,
            package_id: Some(package_id.to_string()),
            item_count: None,
            same_day: false,
            specialty_items: vec![],
            bag_count: None,
            organizing_ids: vec![],
            coi_required: false,
            pickup_postal_code: None,
            delivery_postal_code: None,
            outer_area_fallback: false,
            // 2026-08-12 is a Wednesday
            pickup_date: date(2026, 8, 12),
            one_hour_window: false,
            discount_code: None,
        }
    }

    // -------------------------------------------------------------------------
    // Worked scenarios
    // -------------------------------------------------------------------------

    #[test]
    fn scenario_petite_weekday_no_addons() {
        let catalog = catalog_with(Some(petite_package()));
        let spec = mini_move_spec("pkg-petite");

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.base_cents, 99_500);
        assert_eq!(breakdown.total_cents, 99_500);
        assert!(breakdown.is_consistent());
    }

    #[test]
    fn scenario_petite_saturday_weekend_surcharge() {
        let mut catalog = catalog_with(Some(petite_package()));
        catalog.surcharge_rules = vec![weekend_rule()];

        let mut spec = mini_move_spec("pkg-petite");
        // 2026-08-08 is a Saturday
        spec.pickup_date = date(2026, 8, 8);

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.date_surcharge_cents, 14_925);
        assert_eq!(breakdown.total_cents, 114_425);
    }

    #[test]
    fn scenario_standard_delivery_five_items() {
        let catalog = catalog_with(None);
        let mut spec = mini_move_spec("unused");
        spec.service_type = ServiceType::StandardDelivery;
        spec.package_id = None;
        spec.item_count = Some(5);

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.base_cents, 47_500);
        assert_eq!(breakdown.total_cents, 47_500);
    }

    #[test]
    fn scenario_same_day_minimum_plus_flat() {
        let mut catalog = catalog_with(None);
        // Weekend rule active but must not apply to same-day
        catalog.surcharge_rules = vec![weekend_rule()];

        let mut spec = mini_move_spec("unused");
        spec.service_type = ServiceType::StandardDelivery;
        spec.package_id = None;
        spec.item_count = Some(3);
        spec.same_day = true;
        // Saturday: the weekend rule would fire if not suppressed
        spec.pickup_date = date(2026, 8, 8);

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        // 3 × $95 = $285, floored by the $285 minimum, plus the $360 flat
        assert_eq!(breakdown.base_cents, 28_500 + 36_000);
        assert_eq!(breakdown.date_surcharge_cents, 0);
        assert_eq!(breakdown.total_cents, 64_500);
    }

    #[test]
    fn scenario_airport_single_bag_minimum() {
        let catalog = catalog_with(None);
        let mut spec = mini_move_spec("unused");
        spec.service_type = ServiceType::AirportTransfer;
        spec.package_id = None;
        spec.bag_count = Some(1);

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.base_cents, 15_000);

        spec.bag_count = Some(3);
        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.base_cents, 22_500);
    }

    #[test]
    fn scenario_twenty_percent_discount() {
        let mut catalog = catalog_with(Some(petite_package()));
        catalog.discount = Some(DiscountContext {
            code: DiscountCode {
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
            },
            usage: UsageSnapshot::default(),
            evaluated_at: Utc::now(),
        });

        let mut spec = mini_move_spec("pkg-petite");
        spec.discount_code = Some("move20".to_string());

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.discount_cents, 19_900);
        assert_eq!(breakdown.total_cents, 79_600);
    }

    // -------------------------------------------------------------------------
    // COI behavior
    // -------------------------------------------------------------------------

    #[test]
    fn petite_coi_is_fixed_fifty_dollars() {
        let catalog = catalog_with(Some(petite_package()));
        let mut spec = mini_move_spec("pkg-petite");
        spec.coi_required = true;

        // Fixed $50, not the package's configured $75
        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.coi_fee_cents, 5_000);
    }

    #[test]
    fn standard_coi_uses_package_fee() {
        let catalog = catalog_with(Some(standard_package()));
        let mut spec = mini_move_spec("pkg-standard");
        spec.coi_required = true;

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.coi_fee_cents, 7_500);
    }

    #[test]
    fn bundled_coi_is_free() {
        let catalog = catalog_with(Some(full_package()));
        let mut spec = mini_move_spec("pkg-full");
        spec.coi_required = true;

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.coi_fee_cents, 0);
    }

    // -------------------------------------------------------------------------
    // Organizing
    // -------------------------------------------------------------------------

    #[test]
    fn organizing_total_and_tax() {
        let catalog = catalog_with(Some(petite_package()));
        let mut spec = mini_move_spec("pkg-petite");
        spec.organizing_ids = vec!["org-petite-pack".to_string()];

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.organizing_cents, 30_000);
        // floor(30000 * 0.0825) = 2475, taxed on organizing only
        assert_eq!(breakdown.organizing_tax_cents, 2_475);
        assert_eq!(breakdown.total_cents, 99_500 + 30_000 + 2_475);
    }

    #[test]
    fn organizing_wrong_tier_rejected() {
        let catalog = catalog_with(Some(petite_package()));
        let mut spec = mini_move_spec("pkg-petite");
        spec.organizing_ids = vec!["org-full-pack".to_string()];

        let err = compute_breakdown(&spec, &catalog).unwrap_err();
        assert!(matches!(err, PricingError::OrganizingUnavailable { .. }));
    }

    #[test]
    fn organizing_outside_mini_move_rejected() {
        let catalog = catalog_with(None);
        let mut spec = mini_move_spec("unused");
        spec.service_type = ServiceType::StandardDelivery;
        spec.package_id = None;
        spec.item_count = Some(5);
        spec.organizing_ids = vec!["org-petite-pack".to_string()];

        let err = compute_breakdown(&spec, &catalog).unwrap_err();
        assert!(matches!(err, PricingError::OrganizingUnavailable { .. }));
    }

    // -------------------------------------------------------------------------
    // Geography
    // -------------------------------------------------------------------------

    #[test]
    fn geo_surcharge_per_out_of_core_address() {
        let catalog = catalog_with(Some(petite_package()));

        // Manhattan to Manhattan: no surcharge
        let mut spec = mini_move_spec("pkg-petite");
        spec.pickup_postal_code = Some("10001".to_string());
        spec.delivery_postal_code = Some("10022".to_string());
        assert_eq!(
            compute_breakdown(&spec, &catalog).unwrap().geo_surcharge_cents,
            0
        );

        // Manhattan to Brooklyn: one surcharge
        spec.delivery_postal_code = Some("11215".to_string());
        assert_eq!(
            compute_breakdown(&spec, &catalog).unwrap().geo_surcharge_cents,
            2_500
        );

        // Brooklyn to Queens: two surcharges
        spec.pickup_postal_code = Some("11201".to_string());
        spec.delivery_postal_code = Some("11101".to_string());
        assert_eq!(
            compute_breakdown(&spec, &catalog).unwrap().geo_surcharge_cents,
            5_000
        );
    }

    #[test]
    fn legacy_fallback_single_surcharge() {
        let catalog = catalog_with(Some(petite_package()));
        let mut spec = mini_move_spec("pkg-petite");
        spec.outer_area_fallback = true;

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.geo_surcharge_cents, 2_500);

        // Postal codes, when present, win over the legacy flag
        spec.pickup_postal_code = Some("10001".to_string());
        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.geo_surcharge_cents, 0);
    }

    #[test]
    fn unserviceable_address_rejected_with_suggestion() {
        let catalog = catalog_with(Some(petite_package()));
        let mut spec = mini_move_spec("pkg-petite");
        spec.pickup_postal_code = Some("60601".to_string());

        let err = compute_breakdown(&spec, &catalog).unwrap_err();
        match err {
            PricingError::Unserviceable { message } => {
                assert!(message.contains("custom quote"));
            }
            other => panic!("expected Unserviceable, got {other:?}"),
        }
    }

    // -------------------------------------------------------------------------
    // Pickup window
    // -------------------------------------------------------------------------

    #[test]
    fn window_fee_by_tier() {
        // Standard tier pays the fee
        let catalog = catalog_with(Some(standard_package()));
        let mut spec = mini_move_spec("pkg-standard");
        spec.one_hour_window = true;
        assert_eq!(
            compute_breakdown(&spec, &catalog).unwrap().time_window_cents,
            2_500
        );

        // Full tier includes it
        let catalog = catalog_with(Some(full_package()));
        let mut spec = mini_move_spec("pkg-full");
        spec.one_hour_window = true;
        assert_eq!(
            compute_breakdown(&spec, &catalog).unwrap().time_window_cents,
            0
        );

        // Petite tier doesn't offer it
        let catalog = catalog_with(Some(petite_package()));
        let mut spec = mini_move_spec("pkg-petite");
        spec.one_hour_window = true;
        let err = compute_breakdown(&spec, &catalog).unwrap_err();
        assert!(matches!(err, PricingError::Validation(_)));
    }

    // -------------------------------------------------------------------------
    // Specialty + missing fields
    // -------------------------------------------------------------------------

    #[test]
    fn specialty_items_sum_with_quantities() {
        let catalog = catalog_with(None);
        let mut spec = mini_move_spec("unused");
        spec.service_type = ServiceType::SpecialtyDelivery;
        spec.package_id = None;
        spec.specialty_items = vec![
            SpecialtySelection {
                item_id: "sp-bike".to_string(),
                quantity: 2,
            },
            SpecialtySelection {
                item_id: "sp-surfboard".to_string(),
                quantity: 1,
            },
        ];

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.base_cents, 2 * 12_500 + 15_000);
    }

    #[test]
    fn missing_required_fields_rejected() {
        let catalog = catalog_with(None);

        let mut spec = mini_move_spec("unused");
        spec.package_id = None;
        assert!(matches!(
            compute_breakdown(&spec, &catalog).unwrap_err(),
            PricingError::MissingRequiredField { .. }
        ));

        let mut spec = mini_move_spec("unused");
        spec.service_type = ServiceType::StandardDelivery;
        spec.package_id = None;
        spec.item_count = None;
        assert!(matches!(
            compute_breakdown(&spec, &catalog).unwrap_err(),
            PricingError::MissingRequiredField { .. }
        ));

        let mut spec = mini_move_spec("unused");
        spec.service_type = ServiceType::AirportTransfer;
        spec.package_id = None;
        spec.bag_count = None;
        assert!(matches!(
            compute_breakdown(&spec, &catalog).unwrap_err(),
            PricingError::MissingRequiredField { .. }
        ));
    }

    // -------------------------------------------------------------------------
    // Invariants
    // -------------------------------------------------------------------------

    #[test]
    fn total_never_negative_with_fixed_discount() {
        let mut catalog = catalog_with(None);
        catalog.discount = Some(DiscountContext {
            code: DiscountCode {
                id: "d-big".to_string(),
                code: "BIGFIXED".to_string(),
                kind: DiscountKind::Fixed,
                value: 1_000_000,
                minimum_order_cents: None,
                maximum_discount_cents: None,
                allowed_services: None,
                max_uses: None,
                max_uses_per_customer: None,
                times_used: 0,
                is_active: true,
                expires_at: None,
                created_at: Utc::now(),
            },
            usage: UsageSnapshot::default(),
            evaluated_at: Utc::now(),
        });

        let mut spec = mini_move_spec("unused");
        spec.service_type = ServiceType::StandardDelivery;
        spec.package_id = None;
        spec.item_count = Some(5);
        spec.discount_code = Some("BIGFIXED".to_string());

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(breakdown.total_cents, 0);
        assert!(breakdown.is_consistent());
    }

    #[test]
    fn line_items_sum_to_total() {
        let mut catalog = catalog_with(Some(standard_package()));
        catalog.surcharge_rules = vec![weekend_rule()];

        let mut spec = mini_move_spec("pkg-standard");
        spec.pickup_date = date(2026, 8, 8);
        spec.coi_required = true;
        spec.one_hour_window = true;
        spec.pickup_postal_code = Some("10001".to_string());
        spec.delivery_postal_code = Some("11215".to_string());

        let breakdown = compute_breakdown(&spec, &catalog).unwrap();
        let sum: i64 = breakdown.line_items().iter().map(|l| l.amount_cents).sum();
        assert_eq!(sum, breakdown.total_cents);
    }

    #[test]
    fn repricing_is_deterministic() {
        let mut catalog = catalog_with(Some(standard_package()));
        catalog.surcharge_rules = vec![weekend_rule()];

        let mut spec = mini_move_spec("pkg-standard");
        spec.pickup_date = date(2026, 8, 8);

        let first = compute_breakdown(&spec, &catalog).unwrap();
        let second = compute_breakdown(&spec, &catalog).unwrap();
        assert_eq!(first, second);
    }
}
