//! # Rental Repository
//!
//! Read side of rentals: lookups, histories and the staff dashboard list.
//! Opening and closing rentals goes through
//! [`RentalManager`](crate::service::lifecycle::RentalManager).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::RENTAL_COLUMNS;
use sakila_core::{
    ActiveRental, CustomerId, FilmId, InventoryId, Page, PageRequest, Rental, RentalId, StaffId,
};

/// Repository for rental queries.
#[derive(Debug, Clone)]
pub struct RentalRepository {
    pool: SqlitePool,
}

impl RentalRepository {
    /// Creates a new RentalRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RentalRepository { pool }
    }

    /// Gets a rental by ID.
    pub async fn get_by_id(&self, rental_id: RentalId) -> DbResult<Option<Rental>> {
        let sql = format!("SELECT {RENTAL_COLUMNS} FROM rental WHERE rental_id = ?1");
        let rental = sqlx::query_as::<_, Rental>(&sql)
            .bind(rental_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rental)
    }

    /// The open rental of a unit, if it is checked out.
    pub async fn open_for_unit(&self, inventory_id: InventoryId) -> DbResult<Option<Rental>> {
        let sql = format!(
            "SELECT {RENTAL_COLUMNS} FROM rental
             WHERE inventory_id = ?1 AND return_date IS NULL"
        );
        let rental = sqlx::query_as::<_, Rental>(&sql)
            .bind(inventory_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rental)
    }

    /// Open rentals of all in-catalog units of a film.
    pub async fn open_for_film(&self, film_id: FilmId) -> DbResult<Vec<Rental>> {
        let sql = format!(
            "SELECT {RENTAL_COLUMNS} FROM rental
             WHERE return_date IS NULL
               AND inventory_id IN (
                   SELECT inventory_id FROM inventory
                   WHERE film_id = ?1 AND retired_at IS NULL
               )
             ORDER BY inventory_id"
        );
        let rentals = sqlx::query_as::<_, Rental>(&sql)
            .bind(film_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rentals)
    }

    /// Open rentals checked out by a staff member, newest first.
    ///
    /// ## Dashboard Row
    /// ```text
    /// #1001  MARY SMITH   ALIEN CENTER  €2.99  4 days  OVERDUE (duration 3)
    /// ```
    /// `days_rented` / `is_overdue` are computed on [`ActiveRental`].
    pub async fn active_for_staff(
        &self,
        staff_id: StaffId,
        page: PageRequest,
    ) -> DbResult<Page<ActiveRental>> {
        debug!(staff_id, page = page.page(), "Loading active rentals");

        let mut tx = self.pool.begin().await?;

        let total_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rental WHERE staff_id = ?1 AND return_date IS NULL",
        )
        .bind(staff_id)
        .fetch_one(&mut *tx)
        .await?;

        let items = sqlx::query_as::<_, ActiveRental>(
            "SELECT
                r.rental_id,
                r.rental_date,
                c.customer_id,
                c.first_name || ' ' || c.last_name AS customer_name,
                i.inventory_id,
                f.film_id,
                f.title AS film_title,
                r.rate_cents,
                f.rental_duration
             FROM rental r
             JOIN customer c ON c.customer_id = r.customer_id
             JOIN inventory i ON i.inventory_id = r.inventory_id
             JOIN film f ON f.film_id = i.film_id
             WHERE r.staff_id = ?1 AND r.return_date IS NULL
             ORDER BY r.rental_date DESC, r.rental_id DESC
             LIMIT ?2 OFFSET ?3",
        )
        .bind(staff_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(page.into_page(items, total_count))
    }

    /// A customer's rentals, newest first.
    pub async fn history_for_customer(
        &self,
        customer_id: CustomerId,
        page: PageRequest,
    ) -> DbResult<Page<Rental>> {
        let mut tx = self.pool.begin().await?;

        let total_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM rental WHERE customer_id = ?1")
                .bind(customer_id)
                .fetch_one(&mut *tx)
                .await?;

        let sql = format!(
            "SELECT {RENTAL_COLUMNS} FROM rental
             WHERE customer_id = ?1
             ORDER BY rental_date DESC, rental_id DESC
             LIMIT ?2 OFFSET ?3"
        );
        let items = sqlx::query_as::<_, Rental>(&sql)
            .bind(customer_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(page.into_page(items, total_count))
    }

    /// Every rental of a unit, newest first. Retired units keep their history.
    pub async fn history_for_unit(&self, inventory_id: InventoryId) -> DbResult<Vec<Rental>> {
        let sql = format!(
            "SELECT {RENTAL_COLUMNS} FROM rental
             WHERE inventory_id = ?1
             ORDER BY rental_date DESC, rental_id DESC"
        );
        let rentals = sqlx::query_as::<_, Rental>(&sql)
            .bind(inventory_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rentals)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
