//! # sakila-core: Pure Rental Rules
//!
//! This crate holds the rules of the rental desk as pure functions and
//! plain data. It never touches the database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sakila Rental Desk Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Presentation (staff dashboard, out of tree)          │   │
//! │  │   passes staff_id / customer_id explicitly into every call      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          sakila-db services (ledger, lifecycle, availability)   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ uses                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ sakila-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │  ledger  │ │  money   │ │ pagination/valid.│  │   │
//! │  │   │  Rental  │ │UnitState │ │  Money   │ │  PageRequest     │  │   │
//! │  │   │  Film    │ │ derive   │ │  rates   │ │  validate_*      │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog and rental records (Film, InventoryUnit, Rental, ...)
//! - [`views`] - Read models assembled by queries (dashboards, listings)
//! - [`ledger`] - Per-unit `Available | CheckedOut` state machine
//! - [`money`] - Integer money (cents), rental rates
//! - [`pagination`] - Page requests and pages
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use sakila_core::ledger::UnitState;
//!
//! let state = UnitState::Available;
//! let state = state.check_out(42, 1001).unwrap();
//! assert!(!state.is_available());
//!
//! // A second checkout of the same unit is rejected
//! assert!(state.check_out(42, 1002).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod money;
pub mod pagination;
pub mod types;
pub mod validation;
pub mod views;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::UnitState;
pub use money::Money;
pub use pagination::{Page, PageRequest};
pub use types::*;
pub use views::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Rental period (in days) for films created without an explicit one.
pub const DEFAULT_RENTAL_DURATION_DAYS: i64 = 3;

/// Upper bound on copies added or retired in a single request.
pub const MAX_COPIES_PER_REQUEST: i64 = 50;
