//! # sakila-db: Database Layer for the Sakila Rental Desk
//!
//! SQLite storage, repositories and the three rental services (ledger,
//! lifecycle, availability), all over one sqlx connection pool.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Rental Desk Data Flow                              │
//! │                                                                         │
//! │  Presentation layer (staff_id from its own session)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     sakila-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │   Services    │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ ledger        │    │  (embedded)  │  │   │
//! │  │   │               │◄───│ lifecycle     │    │              │  │   │
//! │  │   │ SqlitePool    │    │ availability  │    │ 0001_initial │  │   │
//! │  │   │               │◄───│ Repositories  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Catalog, inventory, customer, staff, payment access
//! - [`service`] - Inventory ledger, rental lifecycle, availability query
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sakila_db::{Database, StoreConfig};
//!
//! sakila_db::init_tracing();
//! let db = Database::new(StoreConfig::load()?.db_config()).await?;
//!
//! let rental = db.rental_manager().open_rental(42, 7, 1).await?;
//! assert!(!db.ledger().is_available(42).await?);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, StoreConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::actor::ActorRepository;
pub use repository::category::CategoryRepository;
pub use repository::customer::CustomerRepository;
pub use repository::film::FilmRepository;
pub use repository::inventory::InventoryRepository;
pub use repository::payment::PaymentRepository;
pub use repository::rental::RentalRepository;
pub use repository::staff::StaffRepository;

pub use service::availability::AvailabilityQuery;
pub use service::ledger::InventoryLedger;
pub use service::lifecycle::RentalManager;

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` overrides the default filter `info,sakila=debug,sqlx=warn`.
/// Calling it twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sakila=debug,sqlx=warn"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
