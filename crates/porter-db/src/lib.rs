//! # porter-db: Database Layer for Porter
//!
//! This crate provides persistence and orchestration for the Porter
//! booking platform. It uses SQLite for storage with sqlx for async
//! operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Porter Data Flow                                 │
//! │                                                                         │
//! │  API handler (create_booking, change_status, webhook)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     porter-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ BookingService│    │  Repositories │    │  Migrations  │  │   │
//! │  │   │ (service.rs)  │───►│ catalog       │    │  (embedded)  │  │   │
//! │  │   │               │    │ booking       │    │              │  │   │
//! │  │   │ orchestration │    │ discount      │    │ 001_init.sql │  │   │
//! │  │   │ + effects     │    │ stats         │    │ ...          │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                    │   │
//! │  │           └──► porter-core::compute_breakdown (pure)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL mode)                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`service`] - `BookingService`: the engine's front door
//! - [`collaborators`] - Payment/notification/logistics boundaries
//! - [`retry`] - Bounded backoff for webhook races
//!
//! ## Usage
//!
//! ```rust,ignore
//! use porter_db::{BookingService, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./porter.db")).await?;
//! let service = BookingService::new(db);
//!
//! let booking = service.create_booking(customer, spec).await?;
//! service.change_status(&booking.id, BookingStatus::Confirmed).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod collaborators;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod retry;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};
pub use service::{BookingService, ServiceError};

// Repository re-exports for convenience
pub use repository::booking::BookingRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::discount::DiscountRepository;
pub use repository::stats::StatsRepository;
