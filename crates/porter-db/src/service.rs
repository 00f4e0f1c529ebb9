//! # Booking Service
//!
//! Orchestrates the pure engine and the repositories into the operations
//! callers actually invoke.
//!
//! ## Shape of Every Operation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  read catalog ──► porter-core (pure decision) ──► guarded writes        │
//! │                                                        │                │
//! │                                                        ▼                │
//! │                                             fire-and-forget effects     │
//! │                                             (notify, dispatch)          │
//! │                                                                         │
//! │  Effects never roll back a committed write; a failed notification is    │
//! │  a log line, not an error.                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Re-pricing is explicit: `update_booking` takes `reprice: bool`. Customer
//! facing edits pass true; internal bookkeeping edits pass false and the
//! stored price stays exactly what the customer saw.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use porter_core::discount::normalize_code;
use porter_core::error::{DiscountError, LifecycleError, PricingError};
use porter_core::lifecycle::{self, Effect};
use porter_core::pricing::{compute_breakdown, CatalogSnapshot, DiscountContext, PriceBreakdown};
use porter_core::types::{Booking, BookingSpec, BookingStatus, CustomerIdentity};

use crate::collaborators::{
    CollaboratorError, LogNotifier, LogOrchestrator, NotificationSender, PaymentGateway,
    PaymentIntent, TaskOrchestrator,
};
use crate::error::DbError;
use crate::pool::Database;
use crate::repository::booking::{CreateOutcome, RedemptionChange, RedemptionPlan};
use crate::retry::{retry_until_some, RetryPolicy};

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by [`BookingService`] operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Re-pricing was requested for a booking the customer already paid.
    #[error("Booking is {status:?}; price is locked")]
    RepriceNotAllowed { status: BookingStatus },

    /// Payment can only start once a booking is confirmed.
    #[error("Booking is {status:?}; payment is not open")]
    NotPayable { status: BookingStatus },

    /// The booking's status changed between read and write; retry.
    #[error("Booking {booking_id} was modified concurrently; retry")]
    StaleStatus { booking_id: String },

    /// Gateway failure. Local state is untouched; the caller may retry.
    #[error("Payment gateway error: {0}")]
    Gateway(#[from] CollaboratorError),

    #[error(transparent)]
    Db(#[from] DbError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Service
// =============================================================================

/// The engine's front door: pricing, booking creation, updates, status
/// transitions, and webhook handling.
#[derive(Clone)]
pub struct BookingService {
    db: Database,
    notifier: Arc<dyn NotificationSender>,
    orchestrator: Arc<dyn TaskOrchestrator>,
    retry_policy: RetryPolicy,
}

impl BookingService {
    /// Creates a service with logging collaborators (development default).
    pub fn new(db: Database) -> Self {
        BookingService {
            db,
            notifier: Arc::new(LogNotifier),
            orchestrator: Arc::new(LogOrchestrator),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Creates a service with explicit collaborator implementations.
    pub fn with_collaborators(
        db: Database,
        notifier: Arc<dyn NotificationSender>,
        orchestrator: Arc<dyn TaskOrchestrator>,
    ) -> Self {
        BookingService {
            db,
            notifier,
            orchestrator,
            retry_policy: RetryPolicy::default(),
        }
    }

    // -------------------------------------------------------------------------
    // Pricing
    // -------------------------------------------------------------------------

    /// Prices a spec without persisting anything.
    pub async fn quote(
        &self,
        customer: &CustomerIdentity,
        spec: &BookingSpec,
    ) -> ServiceResult<PriceBreakdown> {
        let snapshot = self.assemble_snapshot(customer, spec, None).await?;
        Ok(compute_breakdown(spec, &snapshot)?)
    }

    /// Gathers everything the engine reads into one snapshot.
    ///
    /// `exclude_booking` keeps a booking's own redemption out of the usage
    /// counts when that same booking is being re-priced.
    async fn assemble_snapshot(
        &self,
        customer: &CustomerIdentity,
        spec: &BookingSpec,
        exclude_booking: Option<&str>,
    ) -> ServiceResult<CatalogSnapshot> {
        let catalog = self.db.catalog();

        let package = match spec.package_id.as_deref() {
            Some(id) => catalog.active_package(id).await?,
            None => None,
        };

        let organizing_services = match &package {
            Some(p) => catalog.organizing_for_tier(p.tier).await?,
            None => vec![],
        };

        let discount = match spec.discount_code.as_deref() {
            Some(raw) => {
                let discounts = self.db.discounts();
                match discounts.find_by_code(&normalize_code(raw)).await? {
                    Some(code) => {
                        let usage = discounts
                            .usage_snapshot(&code, &customer.customer_key(), exclude_booking)
                            .await?;
                        Some(DiscountContext {
                            code,
                            usage,
                            evaluated_at: Utc::now(),
                        })
                    }
                    // Unknown code: the engine rejects it as invalid
                    None => None,
                }
            }
            None => None,
        };

        Ok(CatalogSnapshot {
            package,
            delivery_config: catalog.active_delivery_config().await?,
            specialty_items: catalog.active_specialty_items().await?,
            organizing_services,
            surcharge_rules: catalog.active_surcharge_rules().await?,
            fees: catalog.active_fee_schedule().await?,
            discount,
        })
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Prices a spec, persists the booking, and records the redemption.
    ///
    /// The redemption is written in the same transaction as the booking
    /// row; a booking that fails to persist never burns a customer's code.
    pub async fn create_booking(
        &self,
        customer: CustomerIdentity,
        spec: BookingSpec,
    ) -> ServiceResult<Booking> {
        let snapshot = self.assemble_snapshot(&customer, &spec, None).await?;
        let breakdown = compute_breakdown(&spec, &snapshot)?;

        let bookings = self.db.bookings();
        let booking_number = bookings.allocate_booking_number().await?;
        let now = Utc::now();

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            booking_number,
            customer,
            spec,
            breakdown,
            status: BookingStatus::Pending,
            stats_recorded: false,
            created_at: now,
            updated_at: now,
        };

        let plan = redemption_plan(&booking, &snapshot);
        match bookings.create(&booking, plan.as_ref()).await? {
            CreateOutcome::Created => {}
            CreateOutcome::DiscountExhausted => {
                return Err(PricingError::from(DiscountError::Exhausted).into());
            }
            CreateOutcome::DiscountCustomerCapReached => {
                return Err(PricingError::from(DiscountError::AlreadyUsedByCustomer).into());
            }
        }

        info!(
            booking_number = %booking.booking_number,
            service = booking.spec.service_type.as_str(),
            total = booking.breakdown.total_cents,
            "Booking created"
        );

        Ok(booking)
    }

    // -------------------------------------------------------------------------
    // Updates
    // -------------------------------------------------------------------------

    /// Applies a spec edit.
    ///
    /// `reprice: true` recomputes the breakdown against the current
    /// catalog (customer-facing changes). `reprice: false` stores the spec
    /// edit and leaves the price untouched (internal bookkeeping).
    pub async fn update_booking(
        &self,
        booking_id: &str,
        spec: BookingSpec,
        reprice: bool,
    ) -> ServiceResult<Booking> {
        let bookings = self.db.bookings();
        let existing = bookings
            .get(booking_id)
            .await?
            .ok_or_else(|| ServiceError::BookingNotFound(booking_id.to_string()))?;

        if !reprice {
            bookings
                .update_spec_only(booking_id, &spec, Utc::now())
                .await?;
            return self.reload(booking_id).await;
        }

        // A paid price is settled; edits past that point go through support
        if !matches!(
            existing.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Err(ServiceError::RepriceNotAllowed {
                status: existing.status,
            });
        }

        let snapshot = self
            .assemble_snapshot(&existing.customer, &spec, Some(booking_id))
            .await?;
        let breakdown = compute_breakdown(&spec, &snapshot)?;

        let change = self
            .plan_redemption_change(&existing, &breakdown, &snapshot)
            .await?;

        match bookings
            .update_priced(booking_id, &spec, &breakdown, &change, Utc::now())
            .await?
        {
            CreateOutcome::Created => {}
            CreateOutcome::DiscountExhausted => {
                return Err(PricingError::from(DiscountError::Exhausted).into());
            }
            CreateOutcome::DiscountCustomerCapReached => {
                return Err(PricingError::from(DiscountError::AlreadyUsedByCustomer).into());
            }
        }

        info!(
            booking_number = %existing.booking_number,
            total = breakdown.total_cents,
            "Booking re-priced"
        );

        self.reload(booking_id).await
    }

    /// Works out how a re-price moves discount accounting.
    async fn plan_redemption_change(
        &self,
        existing: &Booking,
        breakdown: &PriceBreakdown,
        snapshot: &CatalogSnapshot,
    ) -> ServiceResult<RedemptionChange> {
        let old_code = match existing.spec.discount_code.as_deref() {
            Some(raw) => {
                self.db
                    .discounts()
                    .find_by_code(&normalize_code(raw))
                    .await?
            }
            None => None,
        };

        let new_ctx = snapshot
            .discount
            .as_ref()
            .filter(|_| breakdown.discount_cents > 0);

        Ok(match (old_code, new_ctx) {
            (None, None) => RedemptionChange::Unchanged,
            (Some(old), None) => RedemptionChange::Release {
                code_id: old.id,
            },
            (old, Some(ctx)) => {
                let plan = RedemptionPlan {
                    code_id: ctx.code.id.clone(),
                    customer_key: existing.customer.customer_key(),
                    amount_cents: breakdown.discount_cents,
                    max_uses: ctx.code.max_uses,
                    max_uses_per_customer: ctx.code.max_uses_per_customer,
                };
                match old {
                    Some(old) if old.id == ctx.code.id => RedemptionChange::Amount {
                        code_id: old.id,
                        amount_cents: breakdown.discount_cents,
                    },
                    Some(old) => RedemptionChange::Redeem {
                        release: Some(old.id),
                        plan,
                    },
                    None => RedemptionChange::Redeem {
                        release: None,
                        plan,
                    },
                }
            }
        })
    }

    // -------------------------------------------------------------------------
    // Status transitions
    // -------------------------------------------------------------------------

    /// Moves a booking along a legal edge and executes the owed effects.
    ///
    /// The status write is guarded on the status that was read, so a
    /// re-delivered event fails with [`ServiceError::StaleStatus`] instead
    /// of re-running side effects.
    pub async fn change_status(
        &self,
        booking_id: &str,
        requested: BookingStatus,
    ) -> ServiceResult<Vec<Effect>> {
        let bookings = self.db.bookings();
        let booking = bookings
            .get(booking_id)
            .await?
            .ok_or_else(|| ServiceError::BookingNotFound(booking_id.to_string()))?;

        let effects = lifecycle::transition(booking.status, requested)?;

        let moved = bookings
            .set_status(booking_id, booking.status, requested, Utc::now())
            .await?;
        if !moved {
            return Err(ServiceError::StaleStatus {
                booking_id: booking_id.to_string(),
            });
        }

        info!(
            booking_number = %booking.booking_number,
            from = booking.status.as_str(),
            to = requested.as_str(),
            "Booking status changed"
        );

        for effect in &effects {
            match effect {
                Effect::Notify(event) => {
                    if let Err(e) = self.notifier.notify(&booking.booking_number, *event) {
                        warn!(
                            booking_number = %booking.booking_number,
                            error = %e,
                            "notification failed; continuing"
                        );
                    }
                }
                Effect::RecordCompletion => {
                    self.record_completion(&booking).await?;
                }
            }
        }

        // Logistics gets the final priced booking once payment lands
        if requested == BookingStatus::Paid {
            if let Err(e) = self.orchestrator.dispatch(&booking) {
                warn!(
                    booking_number = %booking.booking_number,
                    error = %e,
                    "delivery dispatch failed; continuing"
                );
            }
        }

        Ok(effects)
    }

    /// Folds a booking into customer statistics, exactly once.
    ///
    /// Safe to call repeatedly; only the first call per booking applies a
    /// delta.
    pub async fn record_completion(&self, booking: &Booking) -> ServiceResult<bool> {
        let applied = self
            .db
            .stats()
            .record_completion(
                &booking.id,
                &booking.customer.customer_key(),
                booking.breakdown.total_cents,
                Utc::now(),
            )
            .await?;
        Ok(applied)
    }

    // -------------------------------------------------------------------------
    // Payment boundary
    // -------------------------------------------------------------------------

    /// Creates a payment intent for a confirmed booking.
    ///
    /// A gateway failure leaves the booking exactly as it was; the caller
    /// is told to retry.
    pub async fn begin_payment<G: PaymentGateway>(
        &self,
        gateway: &G,
        booking_id: &str,
    ) -> ServiceResult<PaymentIntent> {
        let booking = self
            .db
            .bookings()
            .get(booking_id)
            .await?
            .ok_or_else(|| ServiceError::BookingNotFound(booking_id.to_string()))?;

        if booking.status != BookingStatus::Confirmed {
            return Err(ServiceError::NotPayable {
                status: booking.status,
            });
        }

        let metadata = vec![
            ("booking_number".to_string(), booking.booking_number.clone()),
            ("customer".to_string(), booking.customer.customer_key()),
        ];

        let intent = gateway
            .create_intent(booking.breakdown.total_cents, &metadata)
            .await?;

        info!(
            booking_number = %booking.booking_number,
            intent = %intent.id,
            "Payment intent created"
        );

        Ok(intent)
    }

    /// Handles a payment-succeeded webhook.
    ///
    /// The webhook can beat the booking's own commit; lookups retry with
    /// bounded backoff. Exhaustion returns `Ok(None)` after logging for
    /// manual reconciliation; nothing is silently dropped.
    pub async fn handle_payment_confirmed(
        &self,
        booking_number: &str,
    ) -> ServiceResult<Option<Vec<Effect>>> {
        let bookings = self.db.bookings();

        let booking = retry_until_some(&self.retry_policy, "booking by number", || {
            let bookings = bookings.clone();
            let number = booking_number.to_string();
            async move { bookings.get_by_number(&number).await }
        })
        .await?;

        match booking {
            Some(booking) => {
                let effects = self.change_status(&booking.id, BookingStatus::Paid).await?;
                Ok(Some(effects))
            }
            None => Ok(None),
        }
    }

    async fn reload(&self, booking_id: &str) -> ServiceResult<Booking> {
        self.db
            .bookings()
            .get(booking_id)
            .await?
            .ok_or_else(|| ServiceError::BookingNotFound(booking_id.to_string()))
    }
}

/// Builds the redemption plan for a freshly priced booking, when its
/// breakdown actually applied a discount.
fn redemption_plan(booking: &Booking, snapshot: &CatalogSnapshot) -> Option<RedemptionPlan> {
    if booking.breakdown.discount_cents <= 0 {
        return None;
    }

    snapshot.discount.as_ref().map(|ctx| RedemptionPlan {
        code_id: ctx.code.id.clone(),
        customer_key: booking.customer.customer_key(),
        amount_cents: booking.breakdown.discount_cents,
        max_uses: ctx.code.max_uses,
        max_uses_per_customer: ctx.code.max_uses_per_customer,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
