//! # External Collaborators
//!
//! Traits for the services the engine talks to but does not implement:
//! payment gateway, notification sender, and delivery task orchestrator.
//!
//! ## Boundary Rules
//! - The engine consumes *results* (intent ids, statuses), never wire
//!   protocols
//! - Notification and dispatch failures are logged and swallowed; they
//!   must not block or roll back a pricing/status operation
//! - Gateway failures leave the booking in its pre-call status; the
//!   caller is told to retry

use porter_core::lifecycle::BookingEvent;
use porter_core::types::Booking;
use thiserror::Error;
use tracing::info;

// =============================================================================
// Errors
// =============================================================================

/// Failure reported by an external collaborator.
///
/// Carries a summary only; provider stack traces stay inside the adapter
/// and its logs.
#[derive(Debug, Error)]
#[error("{collaborator}: {message}")]
pub struct CollaboratorError {
    pub collaborator: &'static str,
    pub message: String,
}

impl CollaboratorError {
    pub fn new(collaborator: &'static str, message: impl Into<String>) -> Self {
        CollaboratorError {
            collaborator,
            message: message.into(),
        }
    }
}

// =============================================================================
// Payment Gateway
// =============================================================================

/// A created payment intent; the engine stores the id and hands the client
/// secret to the frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Result of confirming an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Succeeded,
    Processing,
    Failed,
}

/// A created refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refund {
    pub id: String,
    pub amount_cents: i64,
}

/// Payment gateway operations, as opaque calls.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Creates a payment intent for `amount_cents` with attached metadata
    /// (booking number, customer key).
    async fn create_intent(
        &self,
        amount_cents: i64,
        metadata: &[(String, String)],
    ) -> Result<PaymentIntent, CollaboratorError>;

    /// Confirms an intent and reports its resulting status.
    async fn confirm(&self, intent_id: &str) -> Result<GatewayStatus, CollaboratorError>;

    /// Creates a refund against a captured intent.
    async fn create_refund(
        &self,
        intent_id: &str,
        amount_cents: i64,
        reason: &str,
    ) -> Result<Refund, CollaboratorError>;
}

// =============================================================================
// Notification Sender
// =============================================================================

/// Fire-and-forget outbound notifications.
///
/// Implementations that deliver over the network should enqueue internally
/// and return immediately; the caller only logs failures.
pub trait NotificationSender: Send + Sync {
    fn notify(&self, booking_number: &str, event: BookingEvent) -> Result<(), CollaboratorError>;
}

// =============================================================================
// Delivery Task Orchestrator
// =============================================================================

/// Hands a final priced booking to the logistics provider.
pub trait TaskOrchestrator: Send + Sync {
    fn dispatch(&self, booking: &Booking) -> Result<(), CollaboratorError>;
}

// =============================================================================
// Default Implementations
// =============================================================================

/// Logs notifications instead of delivering them. Used in development and
/// as the safe default until a provider adapter is wired in.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl NotificationSender for LogNotifier {
    fn notify(&self, booking_number: &str, event: BookingEvent) -> Result<(), CollaboratorError> {
        info!(booking_number, ?event, "notification event");
        Ok(())
    }
}

/// Logs dispatches instead of calling the logistics API.
#[derive(Debug, Default, Clone)]
pub struct LogOrchestrator;

impl TaskOrchestrator for LogOrchestrator {
    fn dispatch(&self, booking: &Booking) -> Result<(), CollaboratorError> {
        info!(
            booking_number = %booking.booking_number,
            total_cents = booking.breakdown.total_cents,
            "delivery task dispatch"
        );
        Ok(())
    }
}

// =============================================================================
// Test Doubles
// =============================================================================

/// Test doubles that record calls for assertions.
pub mod doubles {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    /// Records every notification; optionally fails to exercise the
    /// fire-and-forget contract.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, BookingEvent)>>,
        pub fail: bool,
    }

    impl NotificationSender for RecordingNotifier {
        fn notify(
            &self,
            booking_number: &str,
            event: BookingEvent,
        ) -> Result<(), CollaboratorError> {
            if self.fail {
                return Err(CollaboratorError::new("notifier", "delivery refused"));
            }
            self.sent
                .lock()
                .unwrap()
                .push((booking_number.to_string(), event));
            Ok(())
        }
    }

    /// In-memory gateway issuing sequential intent ids.
    #[derive(Debug, Default)]
    pub struct FakeGateway {
        counter: AtomicU64,
        pub fail: bool,
    }

    impl FakeGateway {
        /// A gateway that refuses every call.
        pub fn failing() -> Self {
            FakeGateway {
                counter: AtomicU64::new(0),
                fail: true,
            }
        }
    }

    impl PaymentGateway for FakeGateway {
        async fn create_intent(
            &self,
            amount_cents: i64,
            _metadata: &[(String, String)],
        ) -> Result<PaymentIntent, CollaboratorError> {
            if self.fail {
                return Err(CollaboratorError::new("gateway", "connection timed out"));
            }
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(PaymentIntent {
                id: format!("pi_{n:06}_{amount_cents}"),
                client_secret: format!("secret_{n:06}"),
            })
        }

        async fn confirm(&self, _intent_id: &str) -> Result<GatewayStatus, CollaboratorError> {
            if self.fail {
                return Err(CollaboratorError::new("gateway", "connection timed out"));
            }
            Ok(GatewayStatus::Succeeded)
        }

        async fn create_refund(
            &self,
            intent_id: &str,
            amount_cents: i64,
            _reason: &str,
        ) -> Result<Refund, CollaboratorError> {
            if self.fail {
                return Err(CollaboratorError::new("gateway", "connection timed out"));
            }
            Ok(Refund {
                id: format!("re_{intent_id}"),
                amount_cents,
            })
        }
    }
}
