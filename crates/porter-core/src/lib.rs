//! # porter-core: Pure Business Logic for Porter
//!
//! This crate is the **heart** of the Porter booking platform. It contains
//! all pricing and lifecycle logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Porter Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 API / Frontend (out of scope here)              │   │
//! │  │    Quote UI ──► Checkout ──► Staff dashboard ──► Webhooks       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ porter-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  pricing  │  │ lifecycle │  │ discount  │  │ surcharge │  │   │
//! │  │   │ breakdown │  │ FSM+      │  │ validator │  │ evaluator │  │   │
//! │  │   │   math    │  │  effects  │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                 │   │
//! │  │   │   money   │  │   zone    │  │   types   │                 │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    porter-db (Database Layer)                   │   │
//! │  │        SQLite repositories, BookingService orchestration        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (ServicePackage, Booking, CustomerStats, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - The breakdown engine: one deterministic itemized quote
//! - [`lifecycle`] - Status state machine returning explicit effects
//! - [`zone`] - Postal code → service zone classification
//! - [`surcharge`] - Weekend/holiday/peak date rule evaluation
//! - [`discount`] - Discount code validation and amount computation
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Same spec + same catalog snapshot = same breakdown
//! 2. **No I/O**: Database, network, clocks are FORBIDDEN here
//! 3. **Integer Money**: All monetary values are cents (i64); percentage
//!    lines floor, so a breakdown always sums exactly
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use porter_core::money::{Money, Rate};
//!
//! // Create money from cents (never from floats!)
//! let base = Money::from_cents(99_500); // $995.00
//!
//! // A 15% weekend surcharge, floored to the cent
//! let surcharge = base.percent_floor(Rate::from_bps(1500));
//! assert_eq!(surcharge.cents(), 14_925);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod pricing;
pub mod surcharge;
pub mod types;
pub mod validation;
pub mod zone;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use porter_core::Money` instead of
// `use porter_core::money::Money`

pub use error::{DiscountError, LifecycleError, PricingError, ValidationError};
pub use money::{Money, Rate};
pub use pricing::{compute_breakdown, CatalogSnapshot, PriceBreakdown};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// COI fee in cents for the petite tier.
///
/// Deliberately distinct from `ServicePackage::coi_fee_cents`: petite
/// bookings have always billed a flat $50 COI regardless of the package
/// row's configured fee. Preserved as observed; flagged in DESIGN.md
/// rather than unified.
pub const PETITE_COI_FEE_CENTS: i64 = 5_000;

/// Maximum item count accepted for a standard delivery booking.
///
/// Prevents accidental over-ordering (e.g., typing 100 instead of 10)
/// from producing an absurd quote. Larger jobs go through a custom quote.
pub const MAX_DELIVERY_ITEMS: i64 = 200;

/// Maximum bag count for an airport transfer.
pub const MAX_BAGS: i64 = 30;

/// Maximum quantity of a single specialty item.
pub const MAX_SPECIALTY_QUANTITY: i64 = 50;
