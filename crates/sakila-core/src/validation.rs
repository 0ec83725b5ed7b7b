//! # Validation Module
//!
//! Input validation for catalog, customer and payment forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Presentation (out of tree)                                   │
//! │  └── Form parsing, Money::parse for amounts                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repositories / services (Rust)                               │
//! │  └── THIS MODULE: business rule validation, before any SQL             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── Foreign keys                                                      │
//! │  └── One open rental per unit (partial unique index)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sakila_core::validation::{validate_copies, validate_title};
//!
//! validate_title("ACADEMY DINOSAUR").unwrap();
//! validate_copies(3).unwrap();
//! assert!(validate_copies(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{NewActor, NewCustomer, NewFilm, NewStaff};
use crate::MAX_COPIES_PER_REQUEST;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest film title accepted.
pub const MAX_TITLE_LEN: usize = 255;

/// Longest first/last name, matching the `VARCHAR(45)` columns.
pub const MAX_NAME_LEN: usize = 45;

/// Longest email accepted.
pub const MAX_EMAIL_LEN: usize = 50;

/// Longest search term accepted.
pub const MAX_SEARCH_LEN: usize = 100;

/// Longest rental period a film may have, in days.
pub const MAX_RENTAL_DURATION_DAYS: i64 = 30;

/// Largest id list accepted by bulk operations.
pub const MAX_BULK_IDS: usize = 500;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a film title.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_TITLE_LEN`] characters
///
/// ## Example
/// ```rust
/// use sakila_core::validation::validate_title;
///
/// assert!(validate_title("ALIEN CENTER").is_ok());
/// assert!(validate_title("   ").is_err());
/// ```
pub fn validate_title(title: &str) -> ValidationResult<()> {
    required("title", title, MAX_TITLE_LEN)
}

/// Validates a first or last name.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    required(field, name, MAX_NAME_LEN)
}

/// Validates an email address.
///
/// Only the shape is checked: one `@` with text on both sides and a dot in
/// the domain part.
///
/// ## Example
/// ```rust
/// use sakila_core::validation::validate_email;
///
/// assert!(validate_email("mary.smith@sakilacustomer.org").is_ok());
/// assert!(validate_email("mary.smith").is_err());
/// assert!(validate_email("mary@localhost").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    required("email", email, MAX_EMAIL_LEN)?;

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid("missing @"))?;

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid("must look like name@domain.tld"));
    }

    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid("domain must contain a dot")),
    }
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (caller decides what an empty search means)
/// - Maximum [`MAX_SEARCH_LEN`] characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a film rental rate in cents. Free rentals are not offered.
pub fn validate_rental_rate(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "rental_rate".to_string(),
        });
    }
    Ok(())
}

/// Validates a rental period in days (1 to [`MAX_RENTAL_DURATION_DAYS`]).
pub fn validate_rental_duration(days: i64) -> ValidationResult<()> {
    if !(1..=MAX_RENTAL_DURATION_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "rental_duration".to_string(),
            min: 1,
            max: MAX_RENTAL_DURATION_DAYS,
        });
    }
    Ok(())
}

/// Validates the number of copies to add or retire.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Inventory: Add Copies                                                  │
/// │                                                                         │
/// │  Staff enters copies: 5                                                │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_copies(5) ← THIS FUNCTION                                    │
/// │       │                                                                 │
/// │       ├── copies <= 0? → Error: "copies must be between 1 and 50"      │
/// │       ├── copies > 50? → Error: "copies must be between 1 and 50"      │
/// │       └── OK → INSERT 5 inventory rows in one transaction              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_copies(copies: i64) -> ValidationResult<()> {
    if !(1..=MAX_COPIES_PER_REQUEST).contains(&copies) {
        return Err(ValidationError::OutOfRange {
            field: "copies".to_string(),
            min: 1,
            max: MAX_COPIES_PER_REQUEST,
        });
    }
    Ok(())
}

/// Validates a payment amount in cents (must be > 0).
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    Ok(())
}

/// Validates the id list of a bulk operation.
///
/// ## Returns
/// The ids sorted with duplicates removed.
pub fn validate_id_list(field: &str, ids: &[i64]) -> ValidationResult<Vec<i64>> {
    if ids.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if ids.len() > MAX_BULK_IDS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_BULK_IDS as i64,
        });
    }
    if ids.iter().any(|id| *id <= 0) {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates a new film before insert.
pub fn validate_new_film(film: &NewFilm) -> ValidationResult<()> {
    validate_title(&film.title)?;
    validate_rental_rate(film.rental_rate_cents)?;
    if let Some(days) = film.rental_duration {
        validate_rental_duration(days)?;
    }
    if let Some(length) = film.length {
        if length <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "length".to_string(),
            });
        }
    }
    if let Some(category) = &film.category {
        required("category", category, 25)?;
    }
    Ok(())
}

/// Validates a new customer before insert.
pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    validate_name("first_name", &customer.first_name)?;
    validate_name("last_name", &customer.last_name)?;
    validate_email(&customer.email)?;
    required("address", &customer.address, MAX_TITLE_LEN)?;
    Ok(())
}

/// Validates an actor's names before insert or update.
pub fn validate_new_actor(actor: &NewActor) -> ValidationResult<()> {
    validate_name("first_name", &actor.first_name)?;
    validate_name("last_name", &actor.last_name)
}

/// Validates a new staff member before insert.
pub fn validate_new_staff(staff: &NewStaff) -> ValidationResult<()> {
    validate_name("first_name", &staff.first_name)?;
    validate_name("last_name", &staff.last_name)?;
    validate_email(&staff.email)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_film() -> NewFilm {
        NewFilm {
            title: "ACADEMY DINOSAUR".to_string(),
            description: None,
            release_year: Some(2006),
            rental_rate_cents: 99,
            rental_duration: Some(6),
            length: Some(86),
            rating: None,
            category: Some("Documentary".to_string()),
        }
    }

    fn new_customer() -> NewCustomer {
        NewCustomer {
            first_name: "Mary".to_string(),
            last_name: "Smith".to_string(),
            email: "mary.smith@sakilacustomer.org".to_string(),
            address: "1913 Hanoi Way".to_string(),
            district: None,
            postal_code: None,
            city: None,
            country: None,
        }
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("ALIEN CENTER").is_ok());
        assert!(matches!(
            validate_title(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_title(&"X".repeat(MAX_TITLE_LEN + 1)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("@b.co").is_err());
        assert!(validate_email("a@@b.co").is_err());
        assert!(validate_email("a b@c.de").is_err());
        assert!(validate_email("a@.de").is_err());
    }

    #[test]
    fn test_validate_numbers() {
        assert!(validate_rental_rate(350).is_ok());
        assert!(validate_rental_rate(0).is_err());

        assert!(validate_rental_duration(1).is_ok());
        assert!(validate_rental_duration(30).is_ok());
        assert!(validate_rental_duration(0).is_err());
        assert!(validate_rental_duration(31).is_err());

        assert!(validate_copies(1).is_ok());
        assert!(validate_copies(MAX_COPIES_PER_REQUEST).is_ok());
        assert!(validate_copies(MAX_COPIES_PER_REQUEST + 1).is_err());
        assert!(validate_copies(-3).is_err());

        assert!(validate_payment_amount(1).is_ok());
        assert!(validate_payment_amount(0).is_err());
    }

    #[test]
    fn test_validate_id_list_dedups() {
        let ids = validate_id_list("film_ids", &[3, 1, 3, 2]).unwrap();
        assert_eq!(ids, vec![1, 2, 3]);

        assert!(validate_id_list("film_ids", &[]).is_err());
        assert!(validate_id_list("film_ids", &[1, 0]).is_err());
    }

    #[test]
    fn test_validate_search_query_trims() {
        assert_eq!(validate_search_query("  dino ").unwrap(), "dino");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }

    #[test]
    fn test_composite_validators() {
        assert!(validate_new_film(&new_film()).is_ok());

        let mut film = new_film();
        film.rental_rate_cents = 0;
        assert!(validate_new_film(&film).is_err());

        let mut film = new_film();
        film.rental_duration = Some(0);
        assert!(validate_new_film(&film).is_err());

        assert!(validate_new_customer(&new_customer()).is_ok());

        let actor = NewActor {
            first_name: "PENELOPE".to_string(),
            last_name: "GUINESS".to_string(),
        };
        assert!(validate_new_actor(&actor).is_ok());
        assert!(matches!(
            validate_new_actor(&NewActor {
                first_name: "  ".to_string(),
                ..actor
            }),
            Err(ValidationError::Required { .. })
        ));

        let mut customer = new_customer();
        customer.address = " ".to_string();
        assert!(matches!(
            validate_new_customer(&customer),
            Err(ValidationError::Required { .. })
        ));
    }
}
