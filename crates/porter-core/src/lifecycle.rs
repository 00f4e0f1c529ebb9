//! # Booking Lifecycle State Machine
//!
//! Validates status transitions and names their side effects in one
//! auditable place.
//!
//! ## Legal Edges
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   pending ──► confirmed ──► paid ──► completed                          │
//! │      │            │          │                                          │
//! │      └────────────┴──────────┴─────► cancelled                          │
//! │                                                                         │
//! │   completed and cancelled are terminal                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transition request either returns the list of effects to execute or a
//! typed rejection. Effects are data, not actions: the caller (the db
//! layer's `BookingService`) executes them, which keeps "what changed" and
//! "what to do about it" in one place instead of scattered hooks reacting
//! to field diffs.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::LifecycleError;
use crate::types::BookingStatus;

// =============================================================================
// Events & Effects
// =============================================================================

/// Outbound notification kinds emitted on entering a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BookingEvent {
    /// Booking was confirmed; customer gets a confirmation message.
    Confirmed,
    /// Payment captured; customer gets a receipt message.
    PaymentReceived,
}

/// A side effect owed after a successful transition.
///
/// Execution order matters: effects are returned in the order they must
/// run. Notification delivery is fire-and-forget; statistics recording is
/// idempotent at the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Emit a fire-and-forget notification event.
    Notify(BookingEvent),
    /// Fold this booking into customer statistics, exactly once.
    RecordCompletion,
}

// =============================================================================
// Transition Rules
// =============================================================================

/// Checks whether the edge from `from` to `to` is legal.
///
/// A disallowed edge is an explicit error, never a silent no-op; repeated
/// delivery of the same transition event therefore fails loudly on the
/// second attempt instead of re-running side effects.
pub fn validate_transition(from: BookingStatus, to: BookingStatus) -> Result<(), LifecycleError> {
    use BookingStatus::*;

    if from.is_terminal() {
        return Err(LifecycleError::Terminal { status: from });
    }

    // `from` is non-terminal past this point, so cancellation is always open
    let allowed = matches!(
        (from, to),
        (Pending, Confirmed) | (Confirmed, Paid) | (Paid, Completed)
    ) || to == Cancelled;

    if allowed {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition { from, to })
    }
}

/// Validates a transition and returns the effects the caller must execute.
pub fn transition(
    from: BookingStatus,
    to: BookingStatus,
) -> Result<Vec<Effect>, LifecycleError> {
    validate_transition(from, to)?;

    let effects = match to {
        BookingStatus::Confirmed => vec![Effect::Notify(BookingEvent::Confirmed)],
        BookingStatus::Paid => vec![Effect::Notify(BookingEvent::PaymentReceived)],
        BookingStatus::Completed => vec![Effect::RecordCompletion],
        BookingStatus::Pending | BookingStatus::Cancelled => vec![],
    };

    Ok(effects)
}

/// Parses a requested status string, rejecting anything outside the enum.
pub fn parse_requested_status(raw: &str) -> Result<BookingStatus, LifecycleError> {
    BookingStatus::parse(raw).ok_or_else(|| LifecycleError::UnknownStatus(raw.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================
