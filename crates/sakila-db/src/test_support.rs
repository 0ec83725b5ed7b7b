//! Fixtures shared by the unit tests of this crate.

use crate::pool::{Database, DbConfig};
use sakila_core::{Customer, Film, FilmId, InventoryId, NewCustomer, NewFilm, NewStaff, Staff};

/// Fresh, migrated in-memory database.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

/// A film with default duration (3 days) and no category.
pub(crate) async fn film(db: &Database, title: &str, rental_rate_cents: i64) -> Film {
    db.films()
        .insert(&NewFilm {
            title: title.to_string(),
            description: None,
            release_year: Some(2006),
            rental_rate_cents,
            rental_duration: None,
            length: None,
            rating: None,
            category: None,
        })
        .await
        .expect("insert film")
}

/// Adds `copies` units of a film and returns their ids in ascending order.
pub(crate) async fn add_copies(db: &Database, film_id: FilmId, copies: i64) -> Vec<InventoryId> {
    db.inventory()
        .add_copies(film_id, copies)
        .await
        .expect("add copies")
        .into_iter()
        .map(|unit| unit.inventory_id)
        .collect()
}

/// An active customer with email `first.last@sakilacustomer.org`.
pub(crate) async fn customer(db: &Database, first: &str, last: &str) -> Customer {
    db.customers()
        .insert(&NewCustomer {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{first}.{last}@sakilacustomer.org").to_lowercase(),
            address: "47 MySakila Drive".to_string(),
            district: Some("Alberta".to_string()),
            postal_code: None,
            city: Some("Lethbridge".to_string()),
            country: Some("Canada".to_string()),
        })
        .await
        .expect("insert customer")
}

/// An active, non-admin staff member.
pub(crate) async fn staff(db: &Database, first: &str, last: &str) -> Staff {
    db.staff()
        .insert(&NewStaff {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{first}.{last}@sakilastaff.com"),
            is_admin: false,
        })
        .await
        .expect("insert staff")
}
