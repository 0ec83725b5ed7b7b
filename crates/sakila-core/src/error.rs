//! # Error Types
//!
//! Domain-specific error types for sakila-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sakila-core errors (this file)                                        │
//! │  ├── CoreError        - Outcome kinds of rental operations             │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  sakila-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError → presentation layer      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retry Policy
//! Only [`CoreError::StoreUnavailable`] is transient. Every other kind is
//! permanent for the given input; retrying it unchanged yields the same
//! error.

use thiserror::Error;

use crate::types::{FilmId, InventoryId, RentalId};

// =============================================================================
// Core Error
// =============================================================================

/// Outcome kinds of rental-desk operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced id does not exist.
    ///
    /// ## When This Occurs
    /// - `close_rental` with an unknown rental id
    /// - ledger queries on an unknown or retired unit / film
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A foreign reference supplied by the caller is not usable.
    ///
    /// ## When This Occurs
    /// - `open_rental` with an unknown unit, customer or staff id
    /// - `open_rental` for an inactive customer
    #[error("Invalid {entity} reference {id}: {reason}")]
    InvalidReference {
        entity: String,
        id: String,
        reason: String,
    },

    /// The unit already has an open rental.
    ///
    /// ## User Workflow
    /// ```text
    /// Staff A: open_rental(42) ──► OK (rental 1001)
    /// Staff B: open_rental(42) ──► AlreadyRented { inventory_id: 42 }
    ///      │
    ///      ▼
    /// UI suggests another copy of the same film
    /// ```
    #[error("Inventory unit {inventory_id} is already rented out")]
    AlreadyRented { inventory_id: InventoryId },

    /// The rental was closed before.
    #[error("Rental {rental_id} has already been returned")]
    AlreadyReturned { rental_id: RentalId },

    /// Retiring copies would leave the film without a free copy.
    #[error("Film {film_id}: cannot retire {requested} copies, only {available} available")]
    InsufficientCopies {
        film_id: FilmId,
        available: i64,
        requested: i64,
    },

    /// A value that must be unique is already taken.
    ///
    /// ## When This Occurs
    /// - `insert` of a customer or staff member with a used email
    #[error("Duplicate {field}: '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// The data store was busy, locked or unreachable.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The data store rejected the statement (constraint, decode, migration).
    #[error("Store error: {0}")]
    StoreFailure(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates an InvalidReference error.
    pub fn invalid_reference(
        entity: impl Into<String>,
        id: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        CoreError::InvalidReference {
            entity: entity.into(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether a caller may retry the same request later.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any SQL runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email or amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::AlreadyRented { inventory_id: 42 };
        assert_eq!(err.to_string(), "Inventory unit 42 is already rented out");

        let err = CoreError::not_found("Rental", 999);
        assert_eq!(err.to_string(), "Rental not found: 999");

        let err = CoreError::InsufficientCopies {
            film_id: 5,
            available: 2,
            requested: 2,
        };
        assert_eq!(
            err.to_string(),
            "Film 5: cannot retire 2 copies, only 2 available"
        );
    }

    #[test]
    fn test_only_store_unavailable_is_transient() {
        assert!(CoreError::StoreUnavailable("locked".into()).is_transient());
        assert!(!CoreError::AlreadyRented { inventory_id: 1 }.is_transient());
        assert!(!CoreError::AlreadyReturned { rental_id: 1 }.is_transient());
        assert!(!CoreError::not_found("Film", 1).is_transient());
        assert!(!CoreError::invalid_reference("customer", 7, "unknown").is_transient());
        assert!(!CoreError::Duplicate {
            field: "customer.email".into(),
            value: "mary.smith@sakilacustomer.org".into(),
        }
        .is_transient());
        assert!(!CoreError::StoreFailure("CHECK constraint failed: rate_cents".into()).is_transient());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "title".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: title is required");
    }
}
