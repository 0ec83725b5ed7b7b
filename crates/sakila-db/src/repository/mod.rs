//! # Repository Module
//!
//! Database repository implementations for the rental store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Presentation layer                                                    │
//! │       │                                                                 │
//! │       │  db.customers().search("smith", 20)                            │
//! │       ▼                                                                 │
//! │  CustomerRepository                                                    │
//! │  ├── search(&self, term, limit)                                        │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, customer)                                           │
//! │  └── details(&self, id)                                                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories return [`DbResult`](crate::error::DbResult). Rental
//! open/close lives in [`crate::service`], which speaks `CoreError`.
//!
//! ## Available Repositories
//!
//! - [`actor::ActorRepository`] - Actor catalog CRUD
//! - [`film::FilmRepository`] - Catalog CRUD, rates, inventory overview
//! - [`category::CategoryRepository`] - Film categories
//! - [`inventory::InventoryRepository`] - Physical copies (add / retire)
//! - [`rental::RentalRepository`] - Rental history and staff dashboard rows
//! - [`customer::CustomerRepository`] - Customer CRUD, search, dashboards
//! - [`staff::StaffRepository`] - Staff lookups and day statistics
//! - [`payment::PaymentRepository`] - Payments

pub mod actor;
pub mod category;
pub mod customer;
pub mod film;
pub mod inventory;
pub mod payment;
pub mod rental;
pub mod staff;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

/// Columns of [`sakila_core::Rental`], in struct order.
pub(crate) const RENTAL_COLUMNS: &str = "rental_id, inventory_id, customer_id, staff_id, \
     rental_date, return_date, rate_cents, return_staff_id";

/// Turns a user search term into a `LIKE` pattern matching it anywhere.
///
/// `%`, `_` and `\` in the term match literally; queries use
/// `LIKE ? ESCAPE '\'`.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `[start, end)` of a calendar day in UTC.
pub(crate) fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("dino"), "%dino%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (start, end) = day_bounds(day);
        assert_eq!(start.to_rfc3339(), "2024-02-29T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }
}
