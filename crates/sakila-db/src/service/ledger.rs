//! # Inventory Ledger
//!
//! Answers "is this copy on the shelf?" from rental rows. Nothing here
//! writes; the unit state is never stored.

use std::collections::{BTreeMap, BTreeSet};

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbError;
use crate::repository::RENTAL_COLUMNS;
use sakila_core::ledger::{available_units, derive_states};
use sakila_core::{CoreError, CoreResult, FilmId, InventoryId, Rental, RentalId, UnitState};

/// Read-only view of unit states.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    /// Creates a new InventoryLedger.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryLedger { pool }
    }

    /// True iff the unit has no open rental.
    ///
    /// ## Errors
    /// `NotFound` if the unit doesn't exist or was retired.
    pub async fn is_available(&self, inventory_id: InventoryId) -> CoreResult<bool> {
        Ok(self.unit_state(inventory_id).await?.is_available())
    }

    /// Current state of one unit.
    pub async fn unit_state(&self, inventory_id: InventoryId) -> CoreResult<UnitState> {
        let row: Option<(InventoryId, Option<RentalId>)> = sqlx::query_as(
            "SELECT
                i.inventory_id,
                (SELECT r.rental_id FROM rental r
                  WHERE r.inventory_id = i.inventory_id AND r.return_date IS NULL)
             FROM inventory i
             WHERE i.inventory_id = ?1 AND i.retired_at IS NULL",
        )
        .bind(inventory_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        let (_, open_rental) =
            row.ok_or_else(|| CoreError::not_found("InventoryUnit", inventory_id))?;
        let state = UnitState::from_open_rental(open_rental);

        debug!(inventory_id, available = state.is_available(), "Unit state");
        Ok(state)
    }

    /// Ids of the free in-catalog units of a film.
    ///
    /// ## Errors
    /// `NotFound` if the film doesn't exist.
    pub async fn available_units(&self, film_id: FilmId) -> CoreResult<BTreeSet<InventoryId>> {
        let states = self.unit_states_for_film(film_id).await?;
        Ok(available_units(&states))
    }

    /// State of every in-catalog unit of a film, keyed by unit id.
    pub async fn unit_states_for_film(
        &self,
        film_id: FilmId,
    ) -> CoreResult<BTreeMap<InventoryId, UnitState>> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM film WHERE film_id = ?1)")
                .bind(film_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(DbError::from)?;
        if !exists {
            return Err(CoreError::not_found("Film", film_id));
        }

        let units: Vec<InventoryId> = sqlx::query_scalar(
            "SELECT inventory_id FROM inventory
             WHERE film_id = ?1 AND retired_at IS NULL
             ORDER BY inventory_id",
        )
        .bind(film_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let sql = format!(
            "SELECT {RENTAL_COLUMNS} FROM rental
             WHERE return_date IS NULL
               AND inventory_id IN (SELECT inventory_id FROM inventory WHERE film_id = ?1)"
        );
        let open: Vec<Rental> = sqlx::query_as(&sql)
            .bind(film_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        Ok(derive_states(units, &open))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
