//! # Seed Data Generator
//!
//! Populates the database with a development catalog.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p porter-db --bin seed
//!
//! # Specify database path
//! cargo run -p porter-db --bin seed -- --db ./data/porter.db
//! ```
//!
//! ## Generated Catalog
//! - Mini-move packages: petite / standard / full
//! - Standard delivery configuration ($95 per item, $285 minimum,
//!   $360 same-day flat)
//! - Specialty items (bike, surfboard, and friends)
//! - Organizing services per tier
//! - A weekend surcharge rule and two sample discount codes

use std::env;

use chrono::Utc;
use uuid::Uuid;

use porter_core::discount::{DiscountCode, DiscountKind};
use porter_core::surcharge::{RuleCalculation, RuleType, SurchargeRule};
use porter_core::types::{
    OrganizingKind, OrganizingService, PackageTier, ServicePackage, ServiceType, SpecialtyItem,
    StandardDeliveryConfig,
};
use porter_db::{Database, DbConfig};

/// (tier, name, base $, coi included, coi fee $, priority, wrapping)
const PACKAGES: &[(PackageTier, &str, i64, bool, i64, bool, bool)] = &[
    (PackageTier::Petite, "Petite Move", 995, false, 75, false, false),
    (PackageTier::Standard, "Standard Move", 1795, false, 75, true, true),
    (PackageTier::Full, "Full Move", 2995, true, 0, true, true),
];

/// (name, price $)
const SPECIALTY_ITEMS: &[(&str, i64)] = &[
    ("Bike", 125),
    ("Surfboard", 150),
    ("Golf bag", 95),
    ("Skis", 110),
    ("Large mirror", 135),
    ("Peloton", 250),
];

/// (kind, tier, name, price $, hours, organizers, supplies $)
const ORGANIZING: &[(OrganizingKind, PackageTier, &str, i64, i64, i64, i64)] = &[
    (OrganizingKind::Packing, PackageTier::Petite, "Petite packing", 300, 2, 1, 50),
    (OrganizingKind::Unpacking, PackageTier::Petite, "Petite unpacking", 300, 2, 1, 0),
    (OrganizingKind::Packing, PackageTier::Standard, "Standard packing", 550, 4, 2, 100),
    (OrganizingKind::Unpacking, PackageTier::Standard, "Standard unpacking", 550, 4, 2, 0),
    (OrganizingKind::Packing, PackageTier::Full, "Full packing", 800, 5, 3, 150),
    (OrganizingKind::Unpacking, PackageTier::Full, "Full unpacking", 800, 5, 3, 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./porter_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Porter Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./porter_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Porter Seed Data Generator");
    println!("==========================");
    println!("Database: {db_path}");
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let catalog = db.catalog();

    if !catalog.packages_for_tier(PackageTier::Petite).await?.is_empty() {
        println!("⚠ Catalog already seeded; delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    for (tier, name, base_dollars, coi_included, coi_fee_dollars, priority, wrapping) in PACKAGES {
        catalog
            .insert_package(&ServicePackage {
                id: Uuid::new_v4().to_string(),
                tier: *tier,
                name: name.to_string(),
                base_price_cents: base_dollars * 100,
                max_items: match tier {
                    PackageTier::Petite => Some(10),
                    PackageTier::Standard => Some(25),
                    PackageTier::Full => None,
                },
                max_weight_lbs: None,
                coi_included: *coi_included,
                coi_fee_cents: coi_fee_dollars * 100,
                priority_scheduling: *priority,
                protective_wrapping: *wrapping,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    println!("✓ {} packages", PACKAGES.len());

    catalog
        .insert_delivery_config(&StandardDeliveryConfig {
            id: Uuid::new_v4().to_string(),
            per_item_cents: 9_500,
            minimum_items: 1,
            minimum_charge_cents: 28_500,
            same_day_flat_cents: 36_000,
            is_active: true,
            updated_at: now,
        })
        .await?;
    println!("✓ delivery configuration");

    for (name, price_dollars) in SPECIALTY_ITEMS {
        catalog
            .insert_specialty_item(&SpecialtyItem {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                price_cents: price_dollars * 100,
                is_active: true,
            })
            .await?;
    }
    println!("✓ {} specialty items", SPECIALTY_ITEMS.len());

    for (kind, tier, name, price_dollars, hours, organizers, supplies_dollars) in ORGANIZING {
        catalog
            .insert_organizing(&OrganizingService {
                id: Uuid::new_v4().to_string(),
                kind: *kind,
                tier: *tier,
                name: name.to_string(),
                price_cents: price_dollars * 100,
                duration_hours: *hours,
                organizer_count: *organizers,
                supplies_allowance_cents: supplies_dollars * 100,
                is_active: true,
            })
            .await?;
    }
    println!("✓ {} organizing services", ORGANIZING.len());

    catalog
        .insert_surcharge_rule(&SurchargeRule {
            id: Uuid::new_v4().to_string(),
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
        })
        .await?;
    println!("✓ surcharge rules");

    let discounts = db.discounts();
    discounts
        .insert_code(&DiscountCode {
            id: Uuid::new_v4().to_string(),
            code: "WELCOME10".to_string(),
            kind: DiscountKind::Percentage,
            value: 10,
            minimum_order_cents: None,
            maximum_discount_cents: Some(25_000),
            allowed_services: None,
            max_uses: None,
            max_uses_per_customer: Some(1),
            times_used: 0,
            is_active: true,
            expires_at: None,
            created_at: now,
        })
        .await?;
    discounts
        .insert_code(&DiscountCode {
            id: Uuid::new_v4().to_string(),
            code: "MINIMOVE50".to_string(),
            kind: DiscountKind::Fixed,
            value: 5_000,
            minimum_order_cents: Some(99_500),
            maximum_discount_cents: None,
            allowed_services: Some(vec![ServiceType::MiniMove]),
            max_uses: Some(200),
            max_uses_per_customer: Some(1),
            times_used: 0,
            is_active: true,
            expires_at: None,
            created_at: now,
        })
        .await?;
    println!("✓ discount codes");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
