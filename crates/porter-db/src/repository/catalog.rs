//! # Catalog Repository
//!
//! Read access to the pricing reference data: packages, the standard
//! delivery configuration, specialty items, organizing services, surcharge
//! rules, and the fee schedule.
//!
//! Catalog rows are created and edited by an out-of-band administrative
//! process; from the engine's perspective they are read-only at pricing
//! time. Insert methods exist for the seed binary and tests.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use porter_core::surcharge::SurchargeRule;
use porter_core::types::{
    FeeSchedule, OrganizingService, PackageTier, ServicePackage, SpecialtyItem,
    StandardDeliveryConfig,
};

/// Repository for catalog reference data.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Service packages
    // -------------------------------------------------------------------------

    /// Gets an active package by id.
    pub async fn active_package(&self, id: &str) -> DbResult<Option<ServicePackage>> {
        let package = sqlx::query_as::<_, ServicePackage>(
            r#"
            SELECT id, tier, name, base_price_cents, max_items, max_weight_lbs,
                   coi_included, coi_fee_cents, priority_scheduling,
                   protective_wrapping, is_active, created_at, updated_at
            FROM service_packages
            WHERE id = ? AND is_active = 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(package)
    }

    /// Lists active packages for a tier, cheapest first.
    pub async fn packages_for_tier(&self, tier: PackageTier) -> DbResult<Vec<ServicePackage>> {
        let packages = sqlx::query_as::<_, ServicePackage>(
            r#"
            SELECT id, tier, name, base_price_cents, max_items, max_weight_lbs,
                   coi_included, coi_fee_cents, priority_scheduling,
                   protective_wrapping, is_active, created_at, updated_at
            FROM service_packages
            WHERE tier = ? AND is_active = 1
            ORDER BY base_price_cents
            "#,
        )
        .bind(tier)
        .fetch_all(&self.pool)
        .await?;

        Ok(packages)
    }

    /// Inserts a package (seed/tests; admin edits happen out-of-band).
    pub async fn insert_package(&self, package: &ServicePackage) -> DbResult<()> {
        debug!(id = %package.id, name = %package.name, "Inserting service package");

        sqlx::query(
            r#"
            INSERT INTO service_packages (
                id, tier, name, base_price_cents, max_items, max_weight_lbs,
                coi_included, coi_fee_cents, priority_scheduling,
                protective_wrapping, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&package.id)
        .bind(package.tier)
        .bind(&package.name)
        .bind(package.base_price_cents)
        .bind(package.max_items)
        .bind(package.max_weight_lbs)
        .bind(package.coi_included)
        .bind(package.coi_fee_cents)
        .bind(package.priority_scheduling)
        .bind(package.protective_wrapping)
        .bind(package.is_active)
        .bind(package.created_at)
        .bind(package.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Standard delivery configuration
    // -------------------------------------------------------------------------

    /// Gets the single active delivery configuration, if one exists.
    pub async fn active_delivery_config(&self) -> DbResult<Option<StandardDeliveryConfig>> {
        let config = sqlx::query_as::<_, StandardDeliveryConfig>(
            r#"
            SELECT id, per_item_cents, minimum_items, minimum_charge_cents,
                   same_day_flat_cents, is_active, updated_at
            FROM standard_delivery_config
            WHERE is_active = 1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }

    /// Inserts a delivery configuration, deactivating any current one.
    pub async fn insert_delivery_config(&self, config: &StandardDeliveryConfig) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE standard_delivery_config SET is_active = 0")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO standard_delivery_config (
                id, per_item_cents, minimum_items, minimum_charge_cents,
                same_day_flat_cents, is_active, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&config.id)
        .bind(config.per_item_cents)
        .bind(config.minimum_items)
        .bind(config.minimum_charge_cents)
        .bind(config.same_day_flat_cents)
        .bind(config.is_active)
        .bind(config.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Specialty items
    // -------------------------------------------------------------------------

    /// Lists active specialty items by name.
    pub async fn active_specialty_items(&self) -> DbResult<Vec<SpecialtyItem>> {
        let items = sqlx::query_as::<_, SpecialtyItem>(
            "SELECT id, name, price_cents, is_active FROM specialty_items WHERE is_active = 1 ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inserts a specialty item.
    pub async fn insert_specialty_item(&self, item: &SpecialtyItem) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO specialty_items (id, name, price_cents, is_active) VALUES (?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(item.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Organizing services
    // -------------------------------------------------------------------------

    /// Lists active organizing services for a tier.
    pub async fn organizing_for_tier(&self, tier: PackageTier) -> DbResult<Vec<OrganizingService>> {
        let services = sqlx::query_as::<_, OrganizingService>(
            r#"
            SELECT id, kind, tier, name, price_cents, duration_hours,
                   organizer_count, supplies_allowance_cents, is_active
            FROM organizing_services
            WHERE tier = ? AND is_active = 1
            ORDER BY name
            "#,
        )
        .bind(tier)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    /// Inserts an organizing service.
    pub async fn insert_organizing(&self, service: &OrganizingService) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO organizing_services (
                id, kind, tier, name, price_cents, duration_hours,
                organizer_count, supplies_allowance_cents, is_active
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&service.id)
        .bind(service.kind)
        .bind(service.tier)
        .bind(&service.name)
        .bind(service.price_cents)
        .bind(service.duration_hours)
        .bind(service.organizer_count)
        .bind(service.supplies_allowance_cents)
        .bind(service.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Surcharge rules
    // -------------------------------------------------------------------------

    /// Lists active surcharge rules.
    pub async fn active_surcharge_rules(&self) -> DbResult<Vec<SurchargeRule>> {
        let rules = sqlx::query_as::<_, SurchargeRule>(
            r#"
            SELECT id, name, rule_type, calculation, value, specific_date,
                   starts_on, ends_on, applies_saturday, applies_sunday,
                   service_scope, is_active
            FROM surcharge_rules
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rules)
    }

    /// Inserts a surcharge rule.
    pub async fn insert_surcharge_rule(&self, rule: &SurchargeRule) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO surcharge_rules (
                id, name, rule_type, calculation, value, specific_date,
                starts_on, ends_on, applies_saturday, applies_sunday,
                service_scope, is_active
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&rule.id)
        .bind(&rule.name)
        .bind(rule.rule_type)
        .bind(rule.calculation)
        .bind(rule.value)
        .bind(rule.specific_date)
        .bind(rule.starts_on)
        .bind(rule.ends_on)
        .bind(rule.applies_saturday)
        .bind(rule.applies_sunday)
        .bind(rule.service_scope)
        .bind(rule.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Fee schedule
    // -------------------------------------------------------------------------

    /// Gets the active fee schedule. The seed migration guarantees one.
    pub async fn active_fee_schedule(&self) -> DbResult<FeeSchedule> {
        let fees = sqlx::query_as::<_, FeeSchedule>(
            r#"
            SELECT id, geo_surcharge_cents, time_window_fee_cents,
                   organizing_tax_bps, airport_per_bag_cents,
                   airport_minimum_cents, is_active, updated_at
            FROM fee_schedule
            WHERE is_active = 1
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        fees.ok_or_else(|| DbError::not_found("FeeSchedule", "active"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use porter_core::types::OrganizingKind;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sample_package() -> ServicePackage {
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

    #[tokio::test]
    async fn test_package_round_trip() {
        let db = test_db().await;
        let repo = db.catalog();

        repo.insert_package(&sample_package()).await.unwrap();

        let found = repo.active_package("pkg-petite").await.unwrap().unwrap();
        assert_eq!(found.tier, PackageTier::Petite);
        assert_eq!(found.base_price_cents, 99_500);
        assert!(!found.coi_included);

        let listed = repo.packages_for_tier(PackageTier::Petite).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(repo
            .packages_for_tier(PackageTier::Full)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_inactive_package_hidden() {
        let db = test_db().await;
        let repo = db.catalog();

        let mut package = sample_package();
        package.is_active = false;
        repo.insert_package(&package).await.unwrap();

        assert!(repo.active_package("pkg-petite").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_new_delivery_config_replaces_old() {
        let db = test_db().await;
        let repo = db.catalog();

        let old = StandardDeliveryConfig {
            id: "cfg-old".to_string(),
            per_item_cents: 9_000,
            minimum_items: 1,
            minimum_charge_cents: 27_000,
            same_day_flat_cents: 30_000,
            is_active: true,
            updated_at: Utc::now(),
        };
        repo.insert_delivery_config(&old).await.unwrap();

        let new = StandardDeliveryConfig {
            id: "cfg-new".to_string(),
            per_item_cents: 9_500,
            minimum_items: 1,
            minimum_charge_cents: 28_500,
            same_day_flat_cents: 36_000,
            is_active: true,
            updated_at: Utc::now(),
        };
        repo.insert_delivery_config(&new).await.unwrap();

        let active = repo.active_delivery_config().await.unwrap().unwrap();
        assert_eq!(active.id, "cfg-new");
        assert_eq!(active.per_item_cents, 9_500);
    }

    #[tokio::test]
    async fn test_organizing_scoped_by_tier() {
        let db = test_db().await;
        let repo = db.catalog();

        repo.insert_organizing(&OrganizingService {
            id: "org-1".to_string(),
            kind: OrganizingKind::Packing,
            tier: PackageTier::Petite,
            name: "Petite packing".to_string(),
            price_cents: 30_000,
            duration_hours: 2,
            organizer_count: 1,
            supplies_allowance_cents: 5_000,
            is_active: true,
        })
        .await
        .unwrap();

        assert_eq!(
            repo.organizing_for_tier(PackageTier::Petite)
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(repo
            .organizing_for_tier(PackageTier::Full)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_fee_schedule_seeded_by_migration() {
        let db = test_db().await;
        let fees = db.catalog().active_fee_schedule().await.unwrap();

        assert_eq!(fees.organizing_tax_bps, 825);
        assert_eq!(fees.airport_minimum_cents, 15_000);
    }
}
