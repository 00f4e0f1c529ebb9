//! # Domain Types
//!
//! Core domain types used throughout Porter.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ ServicePackage  │   │    Booking      │   │ CustomerStats   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  customer_key   │       │
//! │  │  tier           │   │  booking_number │   │  total_bookings │       │
//! │  │  base_price     │   │  status         │   │  total_spent    │       │
//! │  └─────────────────┘   │  breakdown      │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ServiceType    │   │  BookingStatus  │   │  PackageTier    │       │
//! │  │  MiniMove       │   │  Pending        │   │  Petite         │       │
//! │  │  StandardDeliv. │   │  Confirmed      │   │  Standard       │       │
//! │  │  SpecialtyDeliv.│   │  Paid           │   │  Full           │       │
//! │  │  AirportTransfer│   │  Completed      │   └─────────────────┘       │
//! │  └─────────────────┘   │  Cancelled      │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every booking has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `booking_number`: human-readable monotonic sequence, assigned once at
//!   creation by the database counter, never mutated

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};

// =============================================================================
// Service Type
// =============================================================================

/// The four bookable service lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// Multi-item relocation, offered in tiers (see [`PackageTier`]).
    MiniMove,
    /// Per-item delivery with a minimum charge and optional same-day rate.
    StandardDelivery,
    /// Flat-priced named items (bike, surfboard, ...) with quantities.
    SpecialtyDelivery,
    /// Bag-count-priced transfer with an enforced minimum charge.
    AirportTransfer,
}

impl ServiceType {
    /// Parses a wire/storage name into a service type.
    pub fn parse(s: &str) -> Option<ServiceType> {
        match s {
            "mini_move" => Some(ServiceType::MiniMove),
            "standard_delivery" => Some(ServiceType::StandardDelivery),
            "specialty_delivery" => Some(ServiceType::SpecialtyDelivery),
            "airport_transfer" => Some(ServiceType::AirportTransfer),
            _ => None,
        }
    }

    /// Storage/wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::MiniMove => "mini_move",
            ServiceType::StandardDelivery => "standard_delivery",
            ServiceType::SpecialtyDelivery => "specialty_delivery",
            ServiceType::AirportTransfer => "airport_transfer",
        }
    }
}

// =============================================================================
// Package Tier
// =============================================================================

/// Mini-move package tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PackageTier {
    Petite,
    Standard,
    Full,
}

// =============================================================================
// Booking Status
// =============================================================================

/// The status of a booking.
///
/// Legal edges are defined by [`crate::lifecycle`]; this enum is only the
/// vocabulary. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Created and priced, awaiting confirmation.
    Pending,
    /// Confirmed by staff or customer, awaiting payment.
    Confirmed,
    /// Payment captured.
    Paid,
    /// Delivery performed; feeds customer statistics exactly once.
    Completed,
    /// Cancelled before completion.
    Cancelled,
}

impl BookingStatus {
    /// Parses a wire/storage name into a status.
    pub fn parse(s: &str) -> Option<BookingStatus> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "paid" => Some(BookingStatus::Paid),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Storage/wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Paid => "paid",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states accept no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

// =============================================================================
// Organizing Kind
// =============================================================================

/// Packing or unpacking add-on, scoped to one mini-move tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrganizingKind {
    Packing,
    Unpacking,
}

// =============================================================================
// Service Package
// =============================================================================

/// A mini-move package tier offering.
///
/// Immutable once referenced by a priced booking; edits happen out-of-band
/// by deactivating a row and inserting a replacement.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ServicePackage {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tier this package implements.
    pub tier: PackageTier,

    /// Display name shown at checkout.
    pub name: String,

    /// Base price in cents.
    pub base_price_cents: i64,

    /// Item limit, if the tier caps items.
    pub max_items: Option<i64>,

    /// Weight limit in pounds, if the tier caps weight.
    pub max_weight_lbs: Option<i64>,

    /// Whether a Certificate of Insurance is bundled into the base price.
    pub coi_included: bool,

    /// COI fee in cents when not bundled.
    /// The petite tier ignores this field; see `pricing::coi_fee_for`.
    pub coi_fee_cents: i64,

    /// Priority scheduling feature flag.
    pub priority_scheduling: bool,

    /// Protective wrapping feature flag.
    pub protective_wrapping: bool,

    /// Whether this package is bookable (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ServicePackage {
    /// Returns the base price as Money.
    #[inline]
    pub fn base_price(&self) -> Money {
        Money::from_cents(self.base_price_cents)
    }
}

// =============================================================================
// Standard Delivery Config
// =============================================================================

/// Per-item delivery pricing configuration.
///
/// Exactly one active row is authoritative at any time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StandardDeliveryConfig {
    pub id: String,

    /// Price per item in cents.
    pub per_item_cents: i64,

    /// Minimum item count accepted for a booking.
    pub minimum_items: i64,

    /// Minimum charge in cents; applied when per-item math falls short.
    pub minimum_charge_cents: i64,

    /// Flat same-day rate in cents, added on top of the computed base.
    /// Same-day bookings skip date-based surcharges; urgency pricing is
    /// already baked into this rate.
    pub same_day_flat_cents: i64,

    pub is_active: bool,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StandardDeliveryConfig {
    #[inline]
    pub fn per_item(&self) -> Money {
        Money::from_cents(self.per_item_cents)
    }

    #[inline]
    pub fn minimum_charge(&self) -> Money {
        Money::from_cents(self.minimum_charge_cents)
    }

    #[inline]
    pub fn same_day_flat(&self) -> Money {
        Money::from_cents(self.same_day_flat_cents)
    }
}

// =============================================================================
// Specialty Item
// =============================================================================

/// A named flat-priced item type (bike, surfboard, ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SpecialtyItem {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub is_active: bool,
}

impl SpecialtyItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

/// A specialty item reference on a booking spec.
///
/// Selections are a list, not a set: the same item id may appear with
/// different quantities across edits and the last write wins at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SpecialtySelection {
    pub item_id: String,
    pub quantity: i64,
}

// =============================================================================
// Organizing Service
// =============================================================================

/// A packing or unpacking add-on, scoped to one mini-move tier.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrganizingService {
    pub id: String,
    pub kind: OrganizingKind,

    /// Tier this add-on may be attached to.
    pub tier: PackageTier,

    pub name: String,
    pub price_cents: i64,

    /// Scheduled duration in hours.
    pub duration_hours: i64,

    /// Number of organizers staffed.
    pub organizer_count: i64,

    /// Included supplies allowance in cents.
    pub supplies_allowance_cents: i64,

    pub is_active: bool,
}

impl OrganizingService {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Fee Schedule
// =============================================================================

/// Flat fees and rates that are not per-catalog-row.
///
/// One active row is authoritative; the seed migration installs defaults.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FeeSchedule {
    pub id: String,

    /// Fixed surcharge per out-of-core address (0, 1, or 2 per booking).
    pub geo_surcharge_cents: i64,

    /// Fixed fee for a 1-hour pickup window on the standard tier.
    pub time_window_fee_cents: i64,

    /// Sales tax applied to organizing services only, in basis points.
    pub organizing_tax_bps: i64,

    /// Airport transfer price per bag in cents.
    pub airport_per_bag_cents: i64,

    /// Airport transfer minimum charge in cents.
    pub airport_minimum_cents: i64,

    pub is_active: bool,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Launch-era defaults, also installed by the seed migration.
impl Default for FeeSchedule {
    fn default() -> Self {
        FeeSchedule {
            id: String::new(),
            geo_surcharge_cents: 2_500,
            time_window_fee_cents: 2_500,
            organizing_tax_bps: 825,
            airport_per_bag_cents: 7_500,
            airport_minimum_cents: 15_000,
            is_active: true,
            updated_at: DateTime::UNIX_EPOCH,
        }
    }
}

impl FeeSchedule {
    #[inline]
    pub fn geo_surcharge(&self) -> Money {
        Money::from_cents(self.geo_surcharge_cents)
    }

    #[inline]
    pub fn time_window_fee(&self) -> Money {
        Money::from_cents(self.time_window_fee_cents)
    }

    #[inline]
    pub fn organizing_tax_rate(&self) -> Rate {
        Rate::from_bps(self.organizing_tax_bps as u32)
    }
}

// =============================================================================
// Customer Identity
// =============================================================================

/// Who a booking belongs to: an authenticated account or a guest contact.
///
/// The enum makes the one-of invariant unrepresentable to violate in core
/// code; the database backs it with a CHECK constraint for writes that
/// bypass this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CustomerIdentity {
    /// Authenticated customer account.
    Account { user_id: String },
    /// Guest checkout contact.
    Guest {
        email: String,
        name: Option<String>,
    },
}

impl CustomerIdentity {
    /// Stable key used for discount usage caps and statistics rows.
    ///
    /// Guests are keyed by lowercased email so repeat guests accumulate
    /// into one statistics row.
    pub fn customer_key(&self) -> String {
        match self {
            CustomerIdentity::Account { user_id } => format!("user:{user_id}"),
            CustomerIdentity::Guest { email, .. } => {
                format!("guest:{}", email.trim().to_lowercase())
            }
        }
    }
}

// =============================================================================
// Booking Spec
// =============================================================================

/// Everything the customer chose; the input to the pricing engine.
///
/// A spec is a value. Pricing it mutates nothing; the same spec priced
/// against the same catalog snapshot always produces the same breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookingSpec {
    pub service_type: ServiceType,

    /// Selected package id (mini move only).
    pub package_id: Option<String>,

    /// Item count (standard delivery only).
    pub item_count: Option<i64>,

    /// Same-day flag (standard delivery only). Same-day bookings use the
    /// flat rate and skip date-based surcharge rules entirely.
    pub same_day: bool,

    /// Specialty item selections (specialty delivery only).
    pub specialty_items: Vec<SpecialtySelection>,

    /// Bag count (airport transfer only).
    pub bag_count: Option<i64>,

    /// Selected organizing add-on ids (mini move only).
    pub organizing_ids: Vec<String>,

    /// Whether the customer requested a Certificate of Insurance.
    pub coi_required: bool,

    /// Pickup address postal code, when collected.
    pub pickup_postal_code: Option<String>,

    /// Delivery address postal code, when collected.
    pub delivery_postal_code: Option<String>,

    /// Legacy flat-surcharge flag for bookings captured before postal
    /// codes were collected. Ignored when either postal code is present.
    pub outer_area_fallback: bool,

    #[ts(as = "String")]
    pub pickup_date: NaiveDate,

    /// Whether a specific 1-hour pickup window was requested.
    pub one_hour_window: bool,

    /// Discount code as typed by the customer, if any.
    pub discount_code: Option<String>,
}

// =============================================================================
// Booking
// =============================================================================

/// The priced aggregate.
///
/// `breakdown` is a snapshot produced by the pricing engine; persistence
/// writes it verbatim. The booking number is assigned once at creation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Booking {
    pub id: String,
    pub booking_number: String,
    pub customer: CustomerIdentity,
    pub spec: BookingSpec,
    pub breakdown: crate::pricing::PriceBreakdown,
    pub status: BookingStatus,

    /// Set once when this booking's completion was folded into customer
    /// statistics. Guards the aggregator against duplicate triggers.
    pub stats_recorded: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Customer Stats
// =============================================================================

/// Derived per-customer aggregates. Never the source of truth for price.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CustomerStats {
    pub customer_key: String,
    pub total_bookings: i64,
    pub total_spent_cents: i64,

    #[ts(as = "Option<String>")]
    pub last_booking_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_round_trip() {
        for st in [
            ServiceType::MiniMove,
            ServiceType::StandardDelivery,
            ServiceType::SpecialtyDelivery,
            ServiceType::AirportTransfer,
        ] {
            assert_eq!(ServiceType::parse(st.as_str()), Some(st));
        }
        assert_eq!(ServiceType::parse("teleportation"), None);
    }

    #[test]
    fn test_status_round_trip_and_terminal() {
        for s in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Paid,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(s.as_str()), Some(s));
        }
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
        assert!(!BookingStatus::Paid.is_terminal());
    }

    #[test]
    fn test_customer_key_normalizes_guest_email() {
        let guest = CustomerIdentity::Guest {
            email: " Ada@Example.COM ".to_string(),
            name: None,
        };
        assert_eq!(guest.customer_key(), "guest:ada@example.com");

        let account = CustomerIdentity::Account {
            user_id: "u-123".to_string(),
        };
        assert_eq!(account.customer_key(), "user:u-123");
    }

    #[test]
    fn test_status_default() {
        assert_eq!(BookingStatus::default(), BookingStatus::Pending);
    }
}
