//! # Rental Lifecycle
//!
//! Opens and closes rentals, moving a unit between `Available` and
//! `CheckedOut`.
//!
//! ## Open Rental Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT INTO rental ... SELECT ...            (write lock taken here) │
//! │      WHERE unit in catalog AND customer active AND staff exists        │
//! │        AND NOT EXISTS (open rental of the unit)                        │
//! │      RETURNING ...                                                      │
//! │                                                                         │
//! │    row returned?  ──yes──► COMMIT, Ok(rental)                          │
//! │         │                                                               │
//! │         no                                                              │
//! │         ▼                                                               │
//! │    diagnostics SELECT (same transaction) ──► InvalidReference          │
//! │                                         └──► AlreadyRented             │
//! │  ROLLBACK                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because the first statement of the transaction is a write, a second
//! writer waits on the busy timeout and then re-reads a fresh snapshot, so
//! it sees the winner's rental and reports `AlreadyRented`. The partial
//! unique index `idx_rental_one_open` backs this up; its violation is also
//! reported as `AlreadyRented`.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::RENTAL_COLUMNS;
use sakila_core::{
    CoreError, CoreResult, CustomerId, InventoryId, Rental, RentalId, StaffId, UnitState,
};

/// Opens and closes rentals.
#[derive(Debug, Clone)]
pub struct RentalManager {
    pool: SqlitePool,
}

impl RentalManager {
    /// Creates a new RentalManager.
    pub fn new(pool: SqlitePool) -> Self {
        RentalManager { pool }
    }

    /// Checks a unit out to a customer, now.
    ///
    /// ## Returns
    /// * `Ok(Rental)` - The open rental, with the film's current rate
    /// * `Err(AlreadyRented)` - The unit has an open rental
    /// * `Err(InvalidReference)` - Unknown or retired unit, unknown or
    ///   inactive customer, unknown staff member
    /// * `Err(StoreUnavailable)` - Store stayed locked or was unreachable
    pub async fn open_rental(
        &self,
        inventory_id: InventoryId,
        customer_id: CustomerId,
        staff_id: StaffId,
    ) -> CoreResult<Rental> {
        self.open_rental_at(inventory_id, customer_id, staff_id, Utc::now())
            .await
    }

    /// Checks a unit out with an explicit rental date.
    pub async fn open_rental_at(
        &self,
        inventory_id: InventoryId,
        customer_id: CustomerId,
        staff_id: StaffId,
        rental_date: DateTime<Utc>,
    ) -> CoreResult<Rental> {
        debug!(inventory_id, customer_id, staff_id, "Opening rental");

        match self
            .try_open(inventory_id, customer_id, staff_id, rental_date)
            .await
        {
            Ok(rental) => {
                info!(
                    rental_id = rental.rental_id,
                    inventory_id,
                    customer_id,
                    staff_id,
                    rate = %rental.rate(),
                    "Rental opened"
                );
                Ok(rental)
            }
            Err(err) => {
                let err = open_error(inventory_id, err);
                warn!(inventory_id, customer_id, staff_id, error = %err, "Open rental refused");
                Err(err)
            }
        }
    }

    async fn try_open(
        &self,
        inventory_id: InventoryId,
        customer_id: CustomerId,
        staff_id: StaffId,
        rental_date: DateTime<Utc>,
    ) -> DbResult<Rental> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO rental (rental_date, inventory_id, customer_id, staff_id, rate_cents)
             SELECT ?4, i.inventory_id, c.customer_id, s.staff_id, f.rental_rate_cents
             FROM inventory i
             JOIN film f ON f.film_id = i.film_id
             JOIN customer c ON c.customer_id = ?2 AND c.active = 1
             JOIN staff s ON s.staff_id = ?3
             WHERE i.inventory_id = ?1
               AND i.retired_at IS NULL
               AND NOT EXISTS (
                   SELECT 1 FROM rental r
                   WHERE r.inventory_id = i.inventory_id AND r.return_date IS NULL
               )
             RETURNING {RENTAL_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Rental>(&sql)
            .bind(inventory_id)
            .bind(customer_id)
            .bind(staff_id)
            .bind(rental_date)
            .fetch_optional(&mut *tx)
            .await?;

        match inserted {
            Some(rental) => {
                tx.commit().await?;
                Ok(rental)
            }
            None => {
                let reason = refusal(&mut *tx, inventory_id, customer_id, staff_id).await?;
                tx.rollback().await?;
                Err(reason.into())
            }
        }
    }

    /// Returns a rented unit.
    ///
    /// `staff_id` is the staff member taking the copy back; it may differ
    /// from the one who opened the rental.
    ///
    /// ## Returns
    /// * `Ok(Rental)` - The closed rental
    /// * `Err(NotFound)` - Unknown rental
    /// * `Err(AlreadyReturned)` - Rental was closed before
    /// * `Err(InvalidReference)` - Unknown staff member
    pub async fn close_rental(&self, rental_id: RentalId, staff_id: StaffId) -> CoreResult<Rental> {
        debug!(rental_id, staff_id, "Closing rental");

        match self.try_close(rental_id, staff_id).await {
            Ok(rental) => {
                info!(
                    rental_id,
                    inventory_id = rental.inventory_id,
                    staff_id,
                    "Rental closed"
                );
                Ok(rental)
            }
            Err(err) => {
                let err = CoreError::from(err);
                warn!(rental_id, staff_id, error = %err, "Close rental refused");
                Err(err)
            }
        }
    }

    async fn try_close(&self, rental_id: RentalId, staff_id: StaffId) -> DbResult<Rental> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE rental SET return_date = ?3, return_staff_id = ?2
             WHERE rental_id = ?1
               AND return_date IS NULL
               AND EXISTS (SELECT 1 FROM staff WHERE staff_id = ?2)
             RETURNING {RENTAL_COLUMNS}"
        );
        let closed = sqlx::query_as::<_, Rental>(&sql)
            .bind(rental_id)
            .bind(staff_id)
            .bind(Utc::now())
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(rental) = closed {
            tx.commit().await?;
            return Ok(rental);
        }

        let sql = format!("SELECT {RENTAL_COLUMNS} FROM rental WHERE rental_id = ?1");
        let existing = sqlx::query_as::<_, Rental>(&sql)
            .bind(rental_id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.rollback().await?;

        let Some(rental) = existing else {
            return Err(DbError::not_found("Rental", rental_id));
        };

        // Closed rentals fail the check-in; open ones were blocked by staff
        rental.unit_state().check_in(rental_id)?;
        Err(CoreError::invalid_reference("staff", staff_id, "unknown staff member").into())
    }
}

/// Column guarded by the partial unique index `idx_rental_one_open`.
const OPEN_RENTAL_UNIQUE: &str = "rental.inventory_id";

/// Maps a failed open onto the domain kinds. The one-open-rental index
/// firing means a concurrent checkout won the unit.
fn open_error(inventory_id: InventoryId, err: DbError) -> CoreError {
    if err.is_unique_violation_on(OPEN_RENTAL_UNIQUE) {
        return CoreError::AlreadyRented { inventory_id };
    }
    CoreError::from(err)
}

/// Why the guarded insert of an open rental inserted nothing.
async fn refusal(
    conn: &mut SqliteConnection,
    inventory_id: InventoryId,
    customer_id: CustomerId,
    staff_id: StaffId,
) -> DbResult<CoreError> {
    let (unit_in_catalog, customer_active, staff_exists, open_rental): (
        i64,
        Option<i64>,
        i64,
        Option<RentalId>,
    ) = sqlx::query_as(
        "SELECT
            (SELECT COUNT(*) FROM inventory
              WHERE inventory_id = ?1 AND retired_at IS NULL),
            (SELECT active FROM customer WHERE customer_id = ?2),
            (SELECT COUNT(*) FROM staff WHERE staff_id = ?3),
            (SELECT rental_id FROM rental
              WHERE inventory_id = ?1 AND return_date IS NULL)",
    )
    .bind(inventory_id)
    .bind(customer_id)
    .bind(staff_id)
    .fetch_one(&mut *conn)
    .await?;

    let reason = if unit_in_catalog == 0 {
        CoreError::invalid_reference("inventory", inventory_id, "unknown or retired unit")
    } else if customer_active.is_none() {
        CoreError::invalid_reference("customer", customer_id, "unknown customer")
    } else if customer_active == Some(0) {
        CoreError::invalid_reference("customer", customer_id, "customer is inactive")
    } else if staff_exists == 0 {
        CoreError::invalid_reference("staff", staff_id, "unknown staff member")
    } else {
        match UnitState::from_open_rental(open_rental) {
            UnitState::CheckedOut { .. } => CoreError::AlreadyRented { inventory_id },
            // Every guard passed on re-read; only a concurrent change explains it
            UnitState::Available => CoreError::StoreUnavailable(format!(
                "open rental for unit {inventory_id} was not inserted"
            )),
        }
    };

    Ok(reason)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::{add_copies, customer, film, staff, test_db};
    use chrono::Duration;

    #[tokio::test]
    async fn test_open_captures_current_rate() {
        let db = test_db().await;
        let f = film(&db, "ACADEMY DINOSAUR", 350).await;
        let units = add_copies(&db, f.film_id, 1).await;
        let c = customer(&db, "MARY", "SMITH").await;
        let s = staff(&db, "Mike", "Hillyer").await;

        let rental = db
            .rental_manager()
            .open_rental(units[0], c.customer_id, s.staff_id)
            .await
            .unwrap();

        assert!(rental.is_open());
        assert_eq!(rental.rate_cents, 350);
        assert_eq!(rental.inventory_id, units[0]);
        assert_eq!(rental.customer_id, c.customer_id);
        assert_eq!(rental.staff_id, s.staff_id);
        assert!(!db.ledger().is_available(units[0]).await.unwrap());
    }

    #[tokio::test]
    async fn test_second_open_is_already_rented() {
        let db = test_db().await;
        let f = film(&db, "ACADEMY DINOSAUR", 350).await;
        let units = add_copies(&db, f.film_id, 1).await;
        let mary = customer(&db, "MARY", "SMITH").await;
        let linda = customer(&db, "LINDA", "WILLIAMS").await;
        let s = staff(&db, "Mike", "Hillyer").await;
        let manager = db.rental_manager();

        manager
            .open_rental(units[0], mary.customer_id, s.staff_id)
            .await
            .unwrap();
        let err = manager
            .open_rental(units[0], linda.customer_id, s.staff_id)
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::AlreadyRented { inventory_id } if inventory_id == units[0]));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_one_open_index_maps_to_already_rented() {
        let db = test_db().await;
        let f = film(&db, "AFRICAN EGG", 299).await;
        let units = add_copies(&db, f.film_id, 1).await;
        let c = customer(&db, "MARY", "SMITH").await;
        let s = staff(&db, "Mike", "Hillyer").await;

        db.rental_manager()
            .open_rental(units[0], c.customer_id, s.staff_id)
            .await
            .unwrap();

        // Bypasses the guarded insert so only the index can refuse it
        let err: DbError = sqlx::query(
            "INSERT INTO rental (rental_date, inventory_id, customer_id, staff_id, rate_cents)
             VALUES (?1, ?2, ?3, ?4, 299)",
        )
        .bind(Utc::now())
        .bind(units[0])
        .bind(c.customer_id)
        .bind(s.staff_id)
        .execute(db.pool())
        .await
        .unwrap_err()
        .into();
        assert!(err.is_unique_violation_on(OPEN_RENTAL_UNIQUE));

        let core = open_error(units[0], err);
        assert!(matches!(core, CoreError::AlreadyRented { inventory_id } if inventory_id == units[0]));
        assert!(!core.is_transient());

        let other = open_error(units[0], DbError::duplicate("customer.email", "a@b.c"));
        assert!(matches!(other, CoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_open_rejects_bad_references() {
        let db = test_db().await;
        let f = film(&db, "ACADEMY DINOSAUR", 350).await;
        let units = add_copies(&db, f.film_id, 2).await;
        let c = customer(&db, "MARY", "SMITH").await;
        let s = staff(&db, "Mike", "Hillyer").await;
        let manager = db.rental_manager();

        let err = manager
            .open_rental(999, c.customer_id, s.staff_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidReference { ref entity, .. } if entity == "inventory"));

        let err = manager
            .open_rental(units[0], 999, s.staff_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidReference { ref entity, .. } if entity == "customer"));

        let err = manager
            .open_rental(units[0], c.customer_id, 999)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidReference { ref entity, .. } if entity == "staff"));

        db.customers().set_active(c.customer_id, false).await.unwrap();
        let err = manager
            .open_rental(units[0], c.customer_id, s.staff_id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidReference { ref reason, .. } if reason.contains("inactive")
        ));

        // Retired units can't be rented
        db.customers().set_active(c.customer_id, true).await.unwrap();
        db.inventory().retire_copies(f.film_id, 1).await.unwrap();
        let err = manager
            .open_rental(units[1], c.customer_id, s.staff_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidReference { .. }));

        // Nothing was written by the refused calls
        assert!(db.rentals().open_for_film(f.film_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_close_once_then_already_returned() {
        let db = test_db().await;
        let f = film(&db, "ACADEMY DINOSAUR", 350).await;
        let units = add_copies(&db, f.film_id, 1).await;
        let c = customer(&db, "MARY", "SMITH").await;
        let mike = staff(&db, "Mike", "Hillyer").await;
        let jon = staff(&db, "Jon", "Stephens").await;
        let manager = db.rental_manager();

        let rental = manager
            .open_rental(units[0], c.customer_id, mike.staff_id)
            .await
            .unwrap();

        let closed = manager.close_rental(rental.rental_id, jon.staff_id).await.unwrap();
        assert!(!closed.is_open());
        assert_eq!(closed.staff_id, mike.staff_id);
        assert_eq!(closed.return_staff_id, Some(jon.staff_id));
        assert!(db.ledger().is_available(units[0]).await.unwrap());

        let err = manager
            .close_rental(rental.rental_id, jon.staff_id)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyReturned { rental_id } if rental_id == rental.rental_id));

        let history = db.rentals().history_for_unit(units[0]).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_open());
    }

    #[tokio::test]
    async fn test_close_unknown_rental_or_staff() {
        let db = test_db().await;
        let f = film(&db, "ACADEMY DINOSAUR", 350).await;
        let units = add_copies(&db, f.film_id, 1).await;
        let c = customer(&db, "MARY", "SMITH").await;
        let s = staff(&db, "Mike", "Hillyer").await;
        let manager = db.rental_manager();

        let err = manager.close_rental(999, s.staff_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));

        let rental = manager
            .open_rental(units[0], c.customer_id, s.staff_id)
            .await
            .unwrap();
        let err = manager.close_rental(rental.rental_id, 999).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidReference { ref entity, .. } if entity == "staff"));
        assert!(!db.ledger().is_available(units[0]).await.unwrap());
    }

    #[tokio::test]
    async fn test_rate_change_does_not_touch_open_rental() {
        let db = test_db().await;
        let f = film(&db, "ACADEMY DINOSAUR", 350).await;
        let units = add_copies(&db, f.film_id, 1).await;
        let c = customer(&db, "MARY", "SMITH").await;
        let s = staff(&db, "Mike", "Hillyer").await;
        let manager = db.rental_manager();

        let rental = manager
            .open_rental_at(units[0], c.customer_id, s.staff_id, Utc::now() - Duration::days(1))
            .await
            .unwrap();
        db.films().bulk_update_rates(&[f.film_id], 499).await.unwrap();

        let closed = manager.close_rental(rental.rental_id, s.staff_id).await.unwrap();
        assert_eq!(closed.rate_cents, 350);

        let next = manager
            .open_rental(units[0], c.customer_id, s.staff_id)
            .await
            .unwrap();
        assert_eq!(next.rate_cents, 499);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_open_has_one_winner() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("race.db")).max_connections(4))
            .await
            .unwrap();

        let f = film(&db, "ACADEMY DINOSAUR", 350).await;
        let units = add_copies(&db, f.film_id, 1).await;
        let mary = customer(&db, "MARY", "SMITH").await;
        let linda = customer(&db, "LINDA", "WILLIAMS").await;
        let mike = staff(&db, "Mike", "Hillyer").await;
        let jon = staff(&db, "Jon", "Stephens").await;

        let a = db.rental_manager();
        let b = db.rental_manager();
        let (first, second) = tokio::join!(
            a.open_rental(units[0], mary.customer_id, mike.staff_id),
            b.open_rental(units[0], linda.customer_id, jon.staff_id),
        );

        let outcomes = [first, second];
        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        let losers = outcomes
            .iter()
            .filter(|r| matches!(r, Err(CoreError::AlreadyRented { .. })))
            .count();
        assert_eq!(winners, 1);
        assert_eq!(losers, 1);

        let open = db.rentals().open_for_film(f.film_id).await.unwrap();
        assert_eq!(open.len(), 1);
    }
}
