//! # Repository Module
//!
//! Database repository implementations for Porter.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  BookingService                                                        │
//! │       │                                                                 │
//! │       │  db.catalog().snapshot_parts(...)                              │
//! │       │  db.bookings().create(...)                                     │
//! │       ▼                                                                 │
//! │  Repository (SQL isolated here)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                │
//! │                                                                         │
//! │  Pricing math never sees SQL; repositories never price anything.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - packages, configs, items, rules, fees
//! - [`booking::BookingRepository`] - bookings, numbers, guarded status flips
//! - [`discount::DiscountRepository`] - codes and usage accounting
//! - [`stats::StatsRepository`] - atomic customer statistics

pub mod booking;
pub mod catalog;
pub mod discount;
pub mod stats;
