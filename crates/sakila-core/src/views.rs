//! # Read Models
//!
//! Rows assembled by listing and dashboard queries. None of these are
//! stored; each is rebuilt from the base tables on every call.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{CustomerId, FilmId, InventoryId, PaymentId, RentalId, StaffId};

// =============================================================================
// Availability
// =============================================================================

/// Filter for the availability listings. Every field is optional and they
/// combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AvailabilityFilter {
    /// Only units of this film. An unknown film is a `NotFound`.
    pub film_id: Option<FilmId>,
    /// Case-insensitive substring of the film title.
    pub title: Option<String>,
    /// Exact category name.
    pub category: Option<String>,
}

impl AvailabilityFilter {
    pub fn for_film(film_id: FilmId) -> Self {
        AvailabilityFilter {
            film_id: Some(film_id),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// A unit that can be rented right now.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AvailableUnit {
    pub inventory_id: InventoryId,
    pub film_id: FilmId,
    pub title: String,
    pub category: Option<String>,
    pub rental_rate_cents: i64,
}

/// A film with at least one free copy.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FilmAvailability {
    pub film_id: FilmId,
    pub title: String,
    pub category: Option<String>,
    pub rental_rate_cents: i64,
    pub available_copies: i64,
}

/// Copy counts of one film for the inventory screen.
///
/// ```text
/// total_copies = rented_out + available_copies     (retired copies excluded)
/// ```
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FilmInventory {
    pub film_id: FilmId,
    pub title: String,
    pub description: Option<String>,
    pub release_year: Option<i64>,
    pub rental_rate_cents: i64,
    pub total_copies: i64,
    pub rented_out: i64,
}

impl FilmInventory {
    #[inline]
    pub fn available_copies(&self) -> i64 {
        self.total_copies - self.rented_out
    }

    #[inline]
    pub fn rental_rate(&self) -> Money {
        Money::from_cents(self.rental_rate_cents)
    }
}

// =============================================================================
// Rentals
// =============================================================================

/// An open rental as listed on the staff dashboard.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActiveRental {
    pub rental_id: RentalId,
    #[ts(as = "String")]
    pub rental_date: DateTime<Utc>,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub inventory_id: InventoryId,
    pub film_id: FilmId,
    pub film_title: String,
    pub rate_cents: i64,
    /// The film's allowed rental period in days.
    pub rental_duration: i64,
}

impl ActiveRental {
    /// Whole days since checkout.
    pub fn days_rented(&self, now: DateTime<Utc>) -> i64 {
        (now - self.rental_date).num_days().max(0)
    }

    /// Out for longer than the film's rental period.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.days_rented(now) > self.rental_duration
    }
}

// =============================================================================
// Customers
// =============================================================================

/// One row of the customer list.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerSummary {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub active: bool,
    pub rental_count: i64,
}

/// Customer record with address and lifetime totals.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerDetails {
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
    pub total_rentals: i64,
    /// Sum of the customer's payments.
    pub total_paid_cents: i64,
    #[ts(as = "Option<String>")]
    pub last_rental_date: Option<DateTime<Utc>>,
}

impl CustomerDetails {
    pub fn total_paid(&self) -> Money {
        Money::from_cents(self.total_paid_cents)
    }
}

/// Headline numbers shown when a customer is opened at the desk.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerDashboard {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub active_rentals: i64,
    pub total_rentals: i64,
    pub total_spent_cents: i64,
    #[ts(as = "Option<String>")]
    pub last_rental_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Staff & Payments
// =============================================================================

/// Day totals for one staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StaffDashboardStats {
    pub staff_id: StaffId,
    #[ts(as = "String")]
    pub day: NaiveDate,
    /// Open rentals this staff member checked out (any day).
    pub active_rentals: i64,
    /// Rentals this staff member opened on `day`.
    pub rentals_today: i64,
    /// Payments this staff member took on `day`.
    pub revenue_today_cents: i64,
    /// Distinct customers with a rental opened by this staff member.
    pub customers_served: i64,
}

impl StaffDashboardStats {
    pub fn revenue_today(&self) -> Money {
        Money::from_cents(self.revenue_today_cents)
    }
}

/// A payment with the names needed to list it.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRecord {
    pub payment_id: PaymentId,
    #[ts(as = "String")]
    pub payment_date: DateTime<Utc>,
    pub amount_cents: i64,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub rental_id: Option<RentalId>,
    pub film_title: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn active(rental_duration: i64) -> ActiveRental {
        ActiveRental {
            rental_id: 1,
            rental_date: Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap(),
            customer_id: 7,
            customer_name: "MARY SMITH".to_string(),
            inventory_id: 42,
            film_id: 5,
            film_title: "ALIEN CENTER".to_string(),
            rate_cents: 299,
            rental_duration,
        }
    }

    #[test]
    fn test_overdue_after_rental_duration() {
        let rental = active(3);
        let day_three = Utc.with_ymd_and_hms(2024, 6, 4, 19, 0, 0).unwrap();
        let day_four = Utc.with_ymd_and_hms(2024, 6, 5, 18, 0, 1).unwrap();

        assert_eq!(rental.days_rented(day_three), 3);
        assert!(!rental.is_overdue(day_three));
        assert_eq!(rental.days_rented(day_four), 4);
        assert!(rental.is_overdue(day_four));
    }

    #[test]
    fn test_available_copies() {
        let film = FilmInventory {
            film_id: 5,
            title: "ALIEN CENTER".to_string(),
            description: None,
            release_year: None,
            rental_rate_cents: 299,
            total_copies: 4,
            rented_out: 1,
        };
        assert_eq!(film.available_copies(), 3);
        assert_eq!(film.rental_rate().to_string(), "€2.99");
    }

    #[test]
    fn test_filter_builder() {
        let filter = AvailabilityFilter::for_film(5)
            .with_title("alien")
            .with_category("Horror");
        assert_eq!(filter.film_id, Some(5));
        assert_eq!(filter.title.as_deref(), Some("alien"));
        assert_eq!(filter.category.as_deref(), Some("Horror"));
        assert_eq!(AvailabilityFilter::default().film_id, None);
    }
}
