//! # Discount Repository
//!
//! Lookup and usage accounting for discount codes.
//!
//! ## Redemption Accounting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Two records back every redemption:                                     │
//! │                                                                         │
//! │  discount_codes.times_used   guarded atomic counter (global cap)        │
//! │  discount_usages row         one per (code, booking), unique;           │
//! │                              per-customer cap counts these rows         │
//! │                                                                         │
//! │  Both are written inside the booking-creation transaction, guarded by   │
//! │  their caps in the statement itself, so two concurrent redemptions      │
//! │  can never both pass a check-then-act gap.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guarded statements themselves live in
//! [`crate::repository::booking::BookingRepository`], which owns the
//! transaction; this repository covers lookup, snapshots, and admin writes.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use porter_core::discount::{DiscountCode, DiscountKind, DiscountUsage, UsageSnapshot};
use porter_core::types::ServiceType;

// =============================================================================
// Row Mapping
// =============================================================================

/// Raw discount code row; `allowed_services` is a JSON column.
#[derive(Debug, sqlx::FromRow)]
struct DiscountCodeRow {
    id: String,
    code: String,
    kind: DiscountKind,
    value: i64,
    minimum_order_cents: Option<i64>,
    maximum_discount_cents: Option<i64>,
    allowed_services: Option<String>,
    max_uses: Option<i64>,
    max_uses_per_customer: Option<i64>,
    times_used: i64,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl DiscountCodeRow {
    fn into_domain(self) -> DbResult<DiscountCode> {
        let allowed_services: Option<Vec<ServiceType>> = match &self.allowed_services {
            Some(json) => Some(
                serde_json::from_str(json)
                    .map_err(|e| DbError::corrupt("DiscountCode", &self.id, e.to_string()))?,
            ),
            None => None,
        };

        Ok(DiscountCode {
            id: self.id,
            code: self.code,
            kind: self.kind,
            value: self.value,
            minimum_order_cents: self.minimum_order_cents,
            maximum_discount_cents: self.maximum_discount_cents,
            allowed_services,
            max_uses: self.max_uses,
            max_uses_per_customer: self.max_uses_per_customer,
            times_used: self.times_used,
            is_active: self.is_active,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

const CODE_COLUMNS: &str = r#"
    id, code, kind, value, minimum_order_cents, maximum_discount_cents,
    allowed_services, max_uses, max_uses_per_customer, times_used,
    is_active, expires_at, created_at
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for discount codes and usage rows.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    /// Creates a new DiscountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Finds a code by its normalized (uppercase) string.
    pub async fn find_by_code(&self, normalized_code: &str) -> DbResult<Option<DiscountCode>> {
        let sql = format!("SELECT {CODE_COLUMNS} FROM discount_codes WHERE code = ?");
        let row = sqlx::query_as::<_, DiscountCodeRow>(&sql)
            .bind(normalized_code)
            .fetch_optional(&self.pool)
            .await?;

        row.map(DiscountCodeRow::into_domain).transpose()
    }

    /// Builds the usage snapshot the validator sees.
    ///
    /// `exclude_booking` removes an existing booking's own redemption from
    /// both counts so that re-pricing that booking doesn't count it against
    /// itself.
    pub async fn usage_snapshot(
        &self,
        code: &DiscountCode,
        customer_key: &str,
        exclude_booking: Option<&str>,
    ) -> DbResult<UsageSnapshot> {
        let excluded = match exclude_booking {
            Some(booking_id) => {
                let count: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM discount_usages WHERE code_id = ? AND booking_id = ?",
                )
                .bind(&code.id)
                .bind(booking_id)
                .fetch_one(&self.pool)
                .await?;
                count
            }
            None => 0,
        };

        let customer_uses: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM discount_usages
            WHERE code_id = ? AND customer_key = ?
              AND (? IS NULL OR booking_id <> ?)
            "#,
        )
        .bind(&code.id)
        .bind(customer_key)
        .bind(exclude_booking)
        .bind(exclude_booking)
        .fetch_one(&self.pool)
        .await?;

        Ok(UsageSnapshot {
            global_uses: (code.times_used - excluded).max(0),
            customer_uses,
        })
    }

    /// Lists redemptions recorded for a booking.
    pub async fn usages_for_booking(&self, booking_id: &str) -> DbResult<Vec<DiscountUsage>> {
        let usages = sqlx::query_as::<_, DiscountUsage>(
            r#"
            SELECT id, code_id, customer_key, booking_id, amount_cents, created_at
            FROM discount_usages
            WHERE booking_id = ?
            ORDER BY created_at
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(usages)
    }

    /// Current global redemption count for a code.
    pub async fn times_used(&self, code_id: &str) -> DbResult<i64> {
        let count: Option<i64> =
            sqlx::query_scalar("SELECT times_used FROM discount_codes WHERE id = ?")
                .bind(code_id)
                .fetch_optional(&self.pool)
                .await?;

        count.ok_or_else(|| DbError::not_found("DiscountCode", code_id))
    }

    /// Inserts a code (seed/tests; admin edits happen out-of-band).
    pub async fn insert_code(&self, code: &DiscountCode) -> DbResult<()> {
        debug!(code = %code.code, "Inserting discount code");

        let allowed_services = code
            .allowed_services
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO discount_codes (
                id, code, kind, value, minimum_order_cents,
                maximum_discount_cents, allowed_services, max_uses,
                max_uses_per_customer, times_used, is_active, expires_at,
                created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&code.id)
        .bind(&code.code)
        .bind(code.kind)
        .bind(code.value)
        .bind(code.minimum_order_cents)
        .bind(code.maximum_discount_cents)
        .bind(allowed_services)
        .bind(code.max_uses)
        .bind(code.max_uses_per_customer)
        .bind(code.times_used)
        .bind(code.is_active)
        .bind(code.expires_at)
        .bind(code.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
