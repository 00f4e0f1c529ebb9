//! # Booking Repository
//!
//! Booking persistence: number allocation, the create-and-redeem
//! transaction, guarded status flips, and re-pricing updates.
//!
//! ## Booking Lifecycle at the SQL Level
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. ALLOCATE NUMBER                                                     │
//! │     └── UPDATE counters ... RETURNING  (atomic, gaps allowed)           │
//! │                                                                         │
//! │  2. CREATE (one transaction)                                            │
//! │     ├── INSERT booking row (breakdown written verbatim)                 │
//! │     ├── guarded counter increment     (global discount cap)             │
//! │     └── guarded usage-row insert      (per-customer discount cap)       │
//! │         any guard failing rolls the whole transaction back              │
//! │                                                                         │
//! │  3. STATUS CHANGES                                                      │
//! │     └── UPDATE ... WHERE id = ? AND status = <expected>                 │
//! │         a re-delivered transition event fails the guard loudly          │
//! │                                                                         │
//! │  4. STATS FLAG                                                          │
//! │     └── see repository::stats (flip + add in one transaction)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use porter_core::pricing::PriceBreakdown;
use porter_core::types::{Booking, BookingSpec, BookingStatus, CustomerIdentity};

// =============================================================================
// Redemption Plumbing
// =============================================================================

/// What to record when a priced booking carries a discount.
#[derive(Debug, Clone)]
pub struct RedemptionPlan {
    pub code_id: String,
    pub customer_key: String,
    pub amount_cents: i64,
    pub max_uses: Option<i64>,
    pub max_uses_per_customer: Option<i64>,
}

/// Outcome of a create or re-price write.
///
/// The caps are re-checked inside the guarded statements, so a snapshot
/// that passed validation can still lose the race here; callers map the
/// loss back to the matching discount rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    DiscountExhausted,
    DiscountCustomerCapReached,
}

/// How a re-price changes discount accounting.
#[derive(Debug, Clone)]
pub enum RedemptionChange {
    /// No discount before, none after.
    Unchanged,
    /// Same code kept; only the recorded amount moves.
    Amount { code_id: String, amount_cents: i64 },
    /// Code removed; release the usage row and counter.
    Release { code_id: String },
    /// Code added or swapped; optionally release the old one first.
    Redeem {
        release: Option<String>,
        plan: RedemptionPlan,
    },
}

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: String,
    booking_number: String,
    user_id: Option<String>,
    guest_email: Option<String>,
    guest_name: Option<String>,
    status: BookingStatus,
    spec: String,
    base_cents: i64,
    organizing_cents: i64,
    organizing_tax_cents: i64,
    coi_fee_cents: i64,
    geo_surcharge_cents: i64,
    time_window_cents: i64,
    date_surcharge_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    disclaimers: String,
    stats_recorded: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = DbError;

    fn try_from(row: BookingRow) -> DbResult<Booking> {
        // The CHECK constraint backs this, but a row written by hand could
        // still slip through a disabled check; refuse to surface it
        let customer = match (row.user_id, row.guest_email) {
            (Some(user_id), None) => CustomerIdentity::Account { user_id },
            (None, Some(email)) => CustomerIdentity::Guest {
                email,
                name: row.guest_name,
            },
            _ => {
                return Err(DbError::corrupt(
                    "Booking",
                    &row.id,
                    "exactly one of user_id/guest_email must be set",
                ))
            }
        };

        let spec: BookingSpec = serde_json::from_str(&row.spec)
            .map_err(|e| DbError::corrupt("Booking", &row.id, format!("spec: {e}")))?;

        let disclaimers: Vec<String> = serde_json::from_str(&row.disclaimers)
            .map_err(|e| DbError::corrupt("Booking", &row.id, format!("disclaimers: {e}")))?;

        Ok(Booking {
            id: row.id,
            booking_number: row.booking_number,
            customer,
            spec,
            breakdown: PriceBreakdown {
                base_cents: row.base_cents,
                organizing_cents: row.organizing_cents,
                organizing_tax_cents: row.organizing_tax_cents,
                coi_fee_cents: row.coi_fee_cents,
                geo_surcharge_cents: row.geo_surcharge_cents,
                time_window_cents: row.time_window_cents,
                date_surcharge_cents: row.date_surcharge_cents,
                discount_cents: row.discount_cents,
                total_cents: row.total_cents,
                disclaimers,
            },
            status: row.status,
            stats_recorded: row.stats_recorded,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const BOOKING_COLUMNS: &str = r#"
    id, booking_number, user_id, guest_email, guest_name,
    status, spec, base_cents, organizing_cents,
    organizing_tax_cents, coi_fee_cents, geo_surcharge_cents,
    time_window_cents, date_surcharge_cents, discount_cents, total_cents,
    disclaimers, stats_recorded, created_at, updated_at
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for booking database operations.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: SqlitePool,
}

impl BookingRepository {
    /// Creates a new BookingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookingRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Number allocation
    // -------------------------------------------------------------------------

    /// Allocates the next booking number.
    ///
    /// A single guarded UPDATE with RETURNING; SQLite serializes writers,
    /// so concurrent allocations can never observe the same value. Numbers
    /// burned by a later rollback leave gaps, which is fine; uniqueness is
    /// what matters and the bookings table enforces it again.
    pub async fn allocate_booking_number(&self) -> DbResult<String> {
        let value: i64 = sqlx::query_scalar(
            "UPDATE counters SET value = value + 1 WHERE scope = 'booking_number' RETURNING value",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(format!("PB-{value:06}"))
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    /// Inserts a priced booking and records its redemption, atomically.
    ///
    /// The redemption guards re-check both caps inside the transaction; a
    /// lost race rolls everything back, so a booking row never exists with
    /// a burned code and no usage row, or vice versa.
    pub async fn create(
        &self,
        booking: &Booking,
        redemption: Option<&RedemptionPlan>,
    ) -> DbResult<CreateOutcome> {
        let mut tx = self.pool.begin().await?;

        insert_booking(&mut tx, booking).await?;

        if let Some(plan) = redemption {
            match apply_redemption(&mut tx, booking.id.as_str(), plan).await? {
                CreateOutcome::Created => {}
                blocked => {
                    tx.rollback().await?;
                    return Ok(blocked);
                }
            }
        }

        tx.commit().await?;

        debug!(
            id = %booking.id,
            booking_number = %booking.booking_number,
            total = booking.breakdown.total_cents,
            "Booking created"
        );

        Ok(CreateOutcome::Created)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Gets a booking by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?");
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    /// Gets a booking by its human-readable number.
    pub async fn get_by_number(&self, booking_number: &str) -> DbResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_number = ?");
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking_number)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Booking::try_from).transpose()
    }

    /// Counts all bookings.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Updates
    // -------------------------------------------------------------------------

    /// Writes a re-priced spec + breakdown and adjusts discount accounting
    /// in one transaction.
    pub async fn update_priced(
        &self,
        booking_id: &str,
        spec: &BookingSpec,
        breakdown: &PriceBreakdown,
        change: &RedemptionChange,
        updated_at: DateTime<Utc>,
    ) -> DbResult<CreateOutcome> {
        let spec_json =
            serde_json::to_string(spec).map_err(|e| DbError::Internal(e.to_string()))?;
        let disclaimers_json = serde_json::to_string(&breakdown.disclaimers)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                spec = ?, service_type = ?, pickup_date = ?,
                base_cents = ?, organizing_cents = ?, organizing_tax_cents = ?,
                coi_fee_cents = ?, geo_surcharge_cents = ?, time_window_cents = ?,
                date_surcharge_cents = ?, discount_cents = ?, total_cents = ?,
                disclaimers = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&spec_json)
        .bind(spec.service_type)
        .bind(spec.pickup_date)
        .bind(breakdown.base_cents)
        .bind(breakdown.organizing_cents)
        .bind(breakdown.organizing_tax_cents)
        .bind(breakdown.coi_fee_cents)
        .bind(breakdown.geo_surcharge_cents)
        .bind(breakdown.time_window_cents)
        .bind(breakdown.date_surcharge_cents)
        .bind(breakdown.discount_cents)
        .bind(breakdown.total_cents)
        .bind(&disclaimers_json)
        .bind(updated_at)
        .bind(booking_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DbError::not_found("Booking", booking_id));
        }

        match change {
            RedemptionChange::Unchanged => {}
            RedemptionChange::Amount {
                code_id,
                amount_cents,
            } => {
                sqlx::query(
                    "UPDATE discount_usages SET amount_cents = ? WHERE code_id = ? AND booking_id = ?",
                )
                .bind(amount_cents)
                .bind(code_id)
                .bind(booking_id)
                .execute(&mut *tx)
                .await?;
            }
            RedemptionChange::Release { code_id } => {
                release_redemption(&mut tx, booking_id, code_id).await?;
            }
            RedemptionChange::Redeem { release, plan } => {
                if let Some(code_id) = release {
                    release_redemption(&mut tx, booking_id, code_id).await?;
                }
                match apply_redemption(&mut tx, booking_id, plan).await? {
                    CreateOutcome::Created => {}
                    blocked => {
                        tx.rollback().await?;
                        return Ok(blocked);
                    }
                }
            }
        }

        tx.commit().await?;
        Ok(CreateOutcome::Created)
    }

    /// Writes spec-only edits without touching the breakdown.
    ///
    /// This is the no-reprice path for internal updates; the stored price
    /// stays exactly what the customer saw.
    pub async fn update_spec_only(
        &self,
        booking_id: &str,
        spec: &BookingSpec,
        updated_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let spec_json =
            serde_json::to_string(spec).map_err(|e| DbError::Internal(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE bookings SET spec = ?, pickup_date = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&spec_json)
        .bind(spec.pickup_date)
        .bind(updated_at)
        .bind(booking_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Booking", booking_id));
        }

        Ok(())
    }

    /// Moves a booking from `expected` to `next`, guarded on the current
    /// status.
    ///
    /// Returns false when the row was not in `expected` status anymore; a
    /// re-delivered transition event lands here instead of re-running side
    /// effects.
    pub async fn set_status(
        &self,
        booking_id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        updated_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result =
            sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
                .bind(next)
                .bind(updated_at)
                .bind(booking_id)
                .bind(expected)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

async fn insert_booking(tx: &mut Transaction<'_, Sqlite>, booking: &Booking) -> DbResult<()> {
    let (user_id, guest_email, guest_name) = match &booking.customer {
        CustomerIdentity::Account { user_id } => (Some(user_id.as_str()), None, None),
        CustomerIdentity::Guest { email, name } => {
            (None, Some(email.as_str()), name.as_deref())
        }
    };

    let spec_json =
        serde_json::to_string(&booking.spec).map_err(|e| DbError::Internal(e.to_string()))?;
    let disclaimers_json = serde_json::to_string(&booking.breakdown.disclaimers)
        .map_err(|e| DbError::Internal(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO bookings (
            id, booking_number, user_id, guest_email, guest_name,
            service_type, status, pickup_date, spec,
            base_cents, organizing_cents, organizing_tax_cents, coi_fee_cents,
            geo_surcharge_cents, time_window_cents, date_surcharge_cents,
            discount_cents, total_cents, disclaimers, stats_recorded,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&booking.id)
    .bind(&booking.booking_number)
    .bind(user_id)
    .bind(guest_email)
    .bind(guest_name)
    .bind(booking.spec.service_type)
    .bind(booking.status)
    .bind(booking.spec.pickup_date)
    .bind(&spec_json)
    .bind(booking.breakdown.base_cents)
    .bind(booking.breakdown.organizing_cents)
    .bind(booking.breakdown.organizing_tax_cents)
    .bind(booking.breakdown.coi_fee_cents)
    .bind(booking.breakdown.geo_surcharge_cents)
    .bind(booking.breakdown.time_window_cents)
    .bind(booking.breakdown.date_surcharge_cents)
    .bind(booking.breakdown.discount_cents)
    .bind(booking.breakdown.total_cents)
    .bind(&disclaimers_json)
    .bind(booking.stats_recorded)
    .bind(booking.created_at)
    .bind(booking.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Guarded redemption: counter increment then usage-row insert, both
/// re-checking their cap in the statement itself.
async fn apply_redemption(
    tx: &mut Transaction<'_, Sqlite>,
    booking_id: &str,
    plan: &RedemptionPlan,
) -> DbResult<CreateOutcome> {
    let incremented = sqlx::query(
        r#"
        UPDATE discount_codes
        SET times_used = times_used + 1
        WHERE id = ? AND is_active = 1
          AND (? IS NULL OR times_used < ?)
        "#,
    )
    .bind(&plan.code_id)
    .bind(plan.max_uses)
    .bind(plan.max_uses)
    .execute(&mut **tx)
    .await?;

    if incremented.rows_affected() == 0 {
        return Ok(CreateOutcome::DiscountExhausted);
    }

    let usage_id = Uuid::new_v4().to_string();
    let inserted = sqlx::query(
        r#"
        INSERT INTO discount_usages (
            id, code_id, customer_key, booking_id, amount_cents, created_at
        )
        SELECT ?, ?, ?, ?, ?, ?
        WHERE ? IS NULL
           OR (SELECT COUNT(*) FROM discount_usages
               WHERE code_id = ? AND customer_key = ?) < ?
        "#,
    )
    .bind(&usage_id)
    .bind(&plan.code_id)
    .bind(&plan.customer_key)
    .bind(booking_id)
    .bind(plan.amount_cents)
    .bind(Utc::now())
    .bind(plan.max_uses_per_customer)
    .bind(&plan.code_id)
    .bind(&plan.customer_key)
    .bind(plan.max_uses_per_customer)
    .execute(&mut **tx)
    .await?;

    if inserted.rows_affected() == 0 {
        return Ok(CreateOutcome::DiscountCustomerCapReached);
    }

    Ok(CreateOutcome::Created)
}

/// Removes a booking's usage row and returns the count to the pool.
async fn release_redemption(
    tx: &mut Transaction<'_, Sqlite>,
    booking_id: &str,
    code_id: &str,
) -> DbResult<()> {
    let deleted = sqlx::query("DELETE FROM discount_usages WHERE code_id = ? AND booking_id = ?")
        .bind(code_id)
        .bind(booking_id)
        .execute(&mut **tx)
        .await?;

    if deleted.rows_affected() > 0 {
        sqlx::query(
            "UPDATE discount_codes SET times_used = MAX(times_used - 1, 0) WHERE id = ?",
        )
        .bind(code_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
