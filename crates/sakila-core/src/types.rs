//! # Domain Types
//!
//! Catalog and rental records of the rental desk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Film       │◄──│  InventoryUnit  │◄──│     Rental      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  film_id        │   │  inventory_id   │   │  rental_id      │       │
//! │  │  title          │   │  film_id (FK)   │   │  inventory_id   │       │
//! │  │  rental_rate    │   │  retired_at     │   │  customer_id    │       │
//! │  │  rental_duration│   └─────────────────┘   │  staff_id       │       │
//! │  └─────────────────┘                         │  rental_date    │       │
//! │                                              │  return_date ?  │       │
//! │  ┌─────────────────┐   ┌─────────────────┐   │  rate_cents     │       │
//! │  │    Customer     │   │      Staff      │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                              ┌─────────────────┐       │
//! │                                              │     Payment     │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ids are the integer keys of the Sakila schema.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ledger::UnitState;
use crate::money::Money;

/// Film primary key.
pub type FilmId = i64;
/// Inventory unit (physical copy) primary key.
pub type InventoryId = i64;
/// Rental primary key.
pub type RentalId = i64;
/// Customer primary key.
pub type CustomerId = i64;
/// Staff primary key.
pub type StaffId = i64;
/// Payment primary key.
pub type PaymentId = i64;
/// Actor primary key.
pub type ActorId = i64;
/// Category primary key.
pub type CategoryId = i64;

// =============================================================================
// Film
// =============================================================================

/// MPAA rating as stored in the Sakila `film.rating` column.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum FilmRating {
    #[cfg_attr(feature = "sqlx", sqlx(rename = "G"))]
    #[serde(rename = "G")]
    G,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PG"))]
    #[serde(rename = "PG")]
    Pg,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "PG-13"))]
    #[serde(rename = "PG-13")]
    Pg13,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "R"))]
    #[serde(rename = "R")]
    R,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "NC-17"))]
    #[serde(rename = "NC-17")]
    Nc17,
}

/// A film in the catalog.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Film {
    pub film_id: FilmId,
    pub title: String,
    pub description: Option<String>,
    pub release_year: Option<i64>,
    /// Current rate per rental in cents. Copied into each new rental.
    pub rental_rate_cents: i64,
    /// Days a customer may keep a copy before it counts as overdue.
    pub rental_duration: i64,
    /// Running time in minutes.
    pub length: Option<i64>,
    pub rating: Option<FilmRating>,
    #[ts(as = "String")]
    pub last_update: DateTime<Utc>,
}

impl Film {
    /// Returns the current rental rate as Money.
    #[inline]
    pub fn rental_rate(&self) -> Money {
        Money::from_cents(self.rental_rate_cents)
    }
}

/// Input for adding a film to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewFilm {
    pub title: String,
    pub description: Option<String>,
    pub release_year: Option<i64>,
    pub rental_rate_cents: i64,
    /// Defaults to [`crate::DEFAULT_RENTAL_DURATION_DAYS`].
    pub rental_duration: Option<i64>,
    pub length: Option<i64>,
    pub rating: Option<FilmRating>,
    /// Category name; created on first use.
    pub category: Option<String>,
}

/// Partial update of a film. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FilmUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub rental_rate_cents: Option<i64>,
    pub rental_duration: Option<i64>,
    pub rating: Option<FilmRating>,
}

impl FilmUpdate {
    /// True when the update would not change anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.rental_rate_cents.is_none()
            && self.rental_duration.is_none()
            && self.rating.is_none()
    }
}

/// A film category (Action, Comedy, ...).
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub category_id: CategoryId,
    pub name: String,
}

/// A cast member of the catalog.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub actor_id: ActorId,
    pub first_name: String,
    pub last_name: String,
}

impl Actor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for adding or renaming an actor.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewActor {
    pub first_name: String,
    pub last_name: String,
}

// =============================================================================
// Inventory Unit
// =============================================================================

/// One physical, rentable copy of a film.
///
/// Whether the unit is checked out is never stored here; see
/// [`crate::ledger`].
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryUnit {
    pub inventory_id: InventoryId,
    pub film_id: FilmId,
    /// Set when the copy leaves the catalog. Retired copies keep their
    /// rental history but can no longer be rented or queried.
    #[ts(as = "Option<String>")]
    pub retired_at: Option<DateTime<Utc>>,
}

impl InventoryUnit {
    /// Whether the copy is still part of the catalog.
    #[inline]
    pub fn in_catalog(&self) -> bool {
        self.retired_at.is_none()
    }
}

// =============================================================================
// Rental
// =============================================================================

/// One checkout-to-return event for an inventory unit.
///
/// ## Lifecycle
/// ```text
/// open_rental()  ──► Rental { return_date: None }      (unit CheckedOut)
///       │
///       ▼
/// close_rental() ──► Rental { return_date: Some(..) }  (unit Available)
/// ```
/// Rows are never deleted; `return_date` is written exactly once.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rental {
    pub rental_id: RentalId,
    pub inventory_id: InventoryId,
    pub customer_id: CustomerId,
    /// Staff member who opened the rental.
    pub staff_id: StaffId,
    #[ts(as = "String")]
    pub rental_date: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub return_date: Option<DateTime<Utc>>,
    /// Film rate captured at checkout (frozen).
    pub rate_cents: i64,
    /// Staff member who processed the return.
    pub return_staff_id: Option<StaffId>,
}

impl Rental {
    /// True while the copy is still out.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    /// The rate captured at checkout.
    #[inline]
    pub fn rate(&self) -> Money {
        Money::from_cents(self.rate_cents)
    }

    /// The unit state this rental implies on its own.
    pub fn unit_state(&self) -> UnitState {
        if self.is_open() {
            UnitState::CheckedOut {
                rental_id: self.rental_id,
            }
        } else {
            UnitState::Available
        }
    }

    /// Whole days the copy has been (or was) out.
    ///
    /// Closed rentals count up to their return date, open ones up to `now`.
    pub fn days_rented(&self, now: DateTime<Utc>) -> i64 {
        let end = self.return_date.unwrap_or(now);
        (end - self.rental_date).num_days().max(0)
    }

    /// When the copy is due back given the film's rental duration.
    pub fn due_date(&self, rental_duration_days: i64) -> DateTime<Utc> {
        self.rental_date + Duration::days(rental_duration_days)
    }

    /// An open rental past its due date.
    pub fn is_overdue(&self, now: DateTime<Utc>, rental_duration_days: i64) -> bool {
        self.is_open() && now > self.due_date(rental_duration_days)
    }
}

// =============================================================================
// Customer & Staff
// =============================================================================

/// A customer of the store.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub active: bool,
    pub address: Option<String>,
    pub district: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    #[ts(as = "String")]
    pub create_date: DateTime<Utc>,
}

impl Customer {
    /// "First Last", as shown on the dashboard.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for registering a customer.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub district: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// A staff member. Authentication happens outside this workspace.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Staff {
    pub staff_id: StaffId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub active: bool,
    pub is_admin: bool,
}

impl Staff {
    /// "First Last", as shown on the dashboard.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for adding a staff member.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewStaff {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

// =============================================================================
// Payment
// =============================================================================

/// A payment taken by a staff member.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub payment_id: PaymentId,
    pub customer_id: CustomerId,
    pub staff_id: StaffId,
    pub rental_id: Option<RentalId>,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub payment_date: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Input for recording a payment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPayment {
    pub customer_id: CustomerId,
    pub staff_id: StaffId,
    pub rental_id: Option<RentalId>,
    pub amount_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
