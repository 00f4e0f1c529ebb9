//! # Customer Statistics Repository
//!
//! Derived per-customer aggregates, updated with atomic adds.
//!
//! ## Exactly-Once Guarantee
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_completion(booking)                                             │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    UPDATE bookings SET stats_recorded = 1                               │
//! │     WHERE id = ? AND stats_recorded = 0   ──► 0 rows? already folded,   │
//! │                                               rollback, report no-op    │
//! │    INSERT INTO customer_stats ... ON CONFLICT DO UPDATE                 │
//! │      SET total_bookings    = total_bookings + 1,                        │
//! │          total_spent_cents = total_spent_cents + delta                  │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  The flag flip and the add commit together, so a re-delivered           │
//! │  completion event, a duplicated webhook, or a second observer of the    │
//! │  same transition contributes nothing.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The adds are `SET x = x + delta`, never fetch-then-write, so concurrent
//! completions of different bookings for the same customer all land.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use porter_core::types::CustomerStats;

/// Repository for customer statistics.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    /// Creates a new StatsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    /// Folds one completed booking into its customer's statistics.
    ///
    /// Returns `true` when the delta was applied, `false` when this
    /// booking was already recorded (idempotent no-op).
    pub async fn record_completion(
        &self,
        booking_id: &str,
        customer_key: &str,
        total_cents: i64,
        completed_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let mut tx = self.pool.begin().await?;

        let flipped = sqlx::query(
            "UPDATE bookings SET stats_recorded = 1 WHERE id = ? AND stats_recorded = 0",
        )
        .bind(booking_id)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            tx.rollback().await?;
            debug!(booking_id, "completion already recorded, skipping stats");
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO customer_stats (
                customer_key, total_bookings, total_spent_cents, last_booking_at
            ) VALUES (?, 1, ?, ?)
            ON CONFLICT (customer_key) DO UPDATE SET
                total_bookings    = total_bookings + 1,
                total_spent_cents = total_spent_cents + excluded.total_spent_cents,
                last_booking_at   = excluded.last_booking_at
            "#,
        )
        .bind(customer_key)
        .bind(total_cents)
        .bind(completed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(booking_id, customer_key, total_cents, "stats delta applied");
        Ok(true)
    }

    /// Gets a customer's statistics row, if one exists yet.
    pub async fn get(&self, customer_key: &str) -> DbResult<Option<CustomerStats>> {
        let stats = sqlx::query_as::<_, CustomerStats>(
            r#"
            SELECT customer_key, total_bookings, total_spent_cents, last_booking_at
            FROM customer_stats
            WHERE customer_key = ?
            "#,
        )
        .bind(customer_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stats)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::booking::BookingRepository;
    use chrono::NaiveDate;
    use porter_core::pricing::PriceBreakdown;
    use porter_core::types::{
        Booking, BookingSpec, BookingStatus, CustomerIdentity, ServiceType,
    };
    use tokio::task::JoinSet;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn booking_for(id: &str, number: &str, total: i64) -> Booking {
        let now = Utc::now();
        Booking {
            id: id.to_string(),
            booking_number: number.to_string(),
            customer: CustomerIdentity::Guest {
                email: "ada@example.com".to_string(),
                name: None,
            },
            spec: BookingSpec {
                service_type: ServiceType::StandardDelivery,
                package_id: None,
                item_count: Some(5),
                same_day: false,
                specialty_items: vec![],
                bag_count: None,
                organizing_ids: vec![],
                coi_required: false,
                pickup_postal_code: None,
                delivery_postal_code: None,
                outer_area_fallback: false,
                pickup_date: NaiveDate::from_ymd_opt(2026, 8, 12).unwrap(),
                one_hour_window: false,
                discount_code: None,
            },
            breakdown: PriceBreakdown {
                base_cents: total,
                organizing_cents: 0,
                organizing_tax_cents: 0,
                coi_fee_cents: 0,
                geo_surcharge_cents: 0,
                time_window_cents: 0,
                date_surcharge_cents: 0,
                discount_cents: 0,
                total_cents: total,
                disclaimers: vec![],
            },
            status: BookingStatus::Completed,
            stats_recorded: false,
            created_at: now,
            updated_at: now,
        }
    }

    async fn seed_booking(repo: &BookingRepository, id: &str, number: &str, total: i64) {
        repo.create(&booking_for(id, number, total), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_first_completion_applies_delta() {
        let db = test_db().await;
        seed_booking(&db.bookings(), "b-1", "PB-800001", 47_500).await;

        let applied = db
            .stats()
            .record_completion("b-1", "guest:ada@example.com", 47_500, Utc::now())
            .await
            .unwrap();
        assert!(applied);

        let stats = db
            .stats()
            .get("guest:ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.total_bookings, 1);
        assert_eq!(stats.total_spent_cents, 47_500);
        assert!(stats.last_booking_at.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_completion_is_noop() {
        let db = test_db().await;
        seed_booking(&db.bookings(), "b-1", "PB-800001", 47_500).await;

        let stats = db.stats();
        assert!(stats
            .record_completion("b-1", "guest:ada@example.com", 47_500, Utc::now())
            .await
            .unwrap());

        // Webhook re-delivery fires the same event again
        assert!(!stats
            .record_completion("b-1", "guest:ada@example.com", 47_500, Utc::now())
            .await
            .unwrap());

        let row = stats.get("guest:ada@example.com").await.unwrap().unwrap();
        assert_eq!(row.total_bookings, 1);
        assert_eq!(row.total_spent_cents, 47_500);
    }

    #[tokio::test]
    async fn test_concurrent_completions_all_land() {
        let db = test_db().await;
        let bookings = db.bookings();

        let totals: Vec<i64> = (1..=20).map(|n| n * 1_000).collect();
        for (i, total) in totals.iter().enumerate() {
            seed_booking(
                &bookings,
                &format!("b-{i}"),
                &format!("PB-80{i:04}"),
                *total,
            )
            .await;
        }

        let mut set = JoinSet::new();
        for (i, total) in totals.iter().enumerate() {
            let stats = db.stats();
            let total = *total;
            set.spawn(async move {
                stats
                    .record_completion(
                        &format!("b-{i}"),
                        "guest:ada@example.com",
                        total,
                        Utc::now(),
                    )
                    .await
                    .unwrap()
            });
        }
        while let Some(result) = set.join_next().await {
            assert!(result.unwrap());
        }

        let row = db
            .stats()
            .get("guest:ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.total_bookings, totals.len() as i64);
        assert_eq!(row.total_spent_cents, totals.iter().sum::<i64>());
    }

    #[tokio::test]
    async fn test_missing_customer_has_no_row() {
        let db = test_db().await;
        assert!(db.stats().get("guest:nobody").await.unwrap().is_none());
    }
}
