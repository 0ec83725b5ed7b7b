//! # Inventory Repository
//!
//! Physical copies of films.
//!
//! ## Copy Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_copies(film, n)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  inventory row (retired_at NULL) ◄──► rented / returned many times     │
//! │       │                                                                 │
//! │       │ retire_copies(film, n)   only free copies, at least one        │
//! │       ▼                          free copy must remain                 │
//! │  inventory row (retired_at set)  history kept, never rentable again    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use sakila_core::validation::{validate_copies, validate_id_list};
use sakila_core::{CoreError, FilmId, InventoryId, InventoryUnit};

/// Repository for inventory database operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets a unit by id, retired or not.
    pub async fn get_by_id(&self, inventory_id: InventoryId) -> DbResult<Option<InventoryUnit>> {
        let unit = sqlx::query_as::<_, InventoryUnit>(
            "SELECT inventory_id, film_id, retired_at FROM inventory WHERE inventory_id = ?1",
        )
        .bind(inventory_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Copies of a film still in the catalog, by id.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Film doesn't exist
    pub async fn list_for_film(&self, film_id: FilmId) -> DbResult<Vec<InventoryUnit>> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM film WHERE film_id = ?1)")
            .bind(film_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(DbError::not_found("Film", film_id));
        }

        let units = sqlx::query_as::<_, InventoryUnit>(
            "SELECT inventory_id, film_id, retired_at
             FROM inventory
             WHERE film_id = ?1 AND retired_at IS NULL
             ORDER BY inventory_id",
        )
        .bind(film_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(units)
    }

    /// Adds `copies` new units of a film.
    ///
    /// ## Returns
    /// * `Ok(Vec<InventoryUnit>)` - The new units, by id
    /// * `Err(DbError::NotFound)` - Film doesn't exist
    pub async fn add_copies(&self, film_id: FilmId, copies: i64) -> DbResult<Vec<InventoryUnit>> {
        validate_copies(copies)?;

        let mut tx = self.pool.begin().await?;
        let units = insert_copies(&mut *tx, film_id, copies).await?;
        tx.commit().await?;

        info!(film_id, copies, "Copies added");
        Ok(units)
    }

    /// Adds `copies` new units to each of several films in one transaction.
    ///
    /// An unknown film rolls the whole batch back.
    pub async fn bulk_add_copies(
        &self,
        film_ids: &[FilmId],
        copies: i64,
    ) -> DbResult<Vec<InventoryUnit>> {
        let film_ids = validate_id_list("film_ids", film_ids)?;
        validate_copies(copies)?;

        let mut tx = self.pool.begin().await?;
        let mut units = Vec::with_capacity(film_ids.len() * copies as usize);

        for film_id in film_ids.iter().copied() {
            match insert_copies(&mut *tx, film_id, copies).await {
                Ok(added) => units.extend(added),
                Err(err) => {
                    tx.rollback().await?;
                    return Err(err);
                }
            }
        }

        tx.commit().await?;

        info!(films = film_ids.len(), copies, "Copies added in bulk");
        Ok(units)
    }

    /// Retires `copies` free units of a film, newest first.
    ///
    /// Rented-out units are never retired, and at least one free unit
    /// must remain afterwards.
    ///
    /// ## Returns
    /// * `Ok(Vec<InventoryId>)` - The retired units
    /// * `Err(DbError::NotFound)` - Film doesn't exist
    /// * `Err(DbError::Domain(InsufficientCopies))` - Not enough free copies
    pub async fn retire_copies(&self, film_id: FilmId, copies: i64) -> DbResult<Vec<InventoryId>> {
        validate_copies(copies)?;

        debug!(film_id, copies, "Retiring copies");

        let mut tx = self.pool.begin().await?;

        // The write runs first so the transaction holds the write lock
        // before the remaining copies are counted.
        let mut retired: Vec<InventoryId> = sqlx::query_scalar(
            "UPDATE inventory SET retired_at = ?3
             WHERE inventory_id IN (
                 SELECT i.inventory_id FROM inventory i
                 WHERE i.film_id = ?1
                   AND i.retired_at IS NULL
                   AND NOT EXISTS (
                       SELECT 1 FROM rental r
                       WHERE r.inventory_id = i.inventory_id AND r.return_date IS NULL
                   )
                 ORDER BY i.inventory_id DESC
                 LIMIT ?2
             )
             RETURNING inventory_id",
        )
        .bind(film_id)
        .bind(copies)
        .bind(Utc::now())
        .fetch_all(&mut *tx)
        .await?;
        retired.sort_unstable_by(|a, b| b.cmp(a));

        let (film_exists, still_free): (bool, i64) = sqlx::query_as(
            "SELECT
                EXISTS (SELECT 1 FROM film WHERE film_id = ?1),
                (SELECT COUNT(*) FROM inventory i
                 WHERE i.film_id = ?1
                   AND i.retired_at IS NULL
                   AND NOT EXISTS (
                       SELECT 1 FROM rental r
                       WHERE r.inventory_id = i.inventory_id AND r.return_date IS NULL
                   ))",
        )
        .bind(film_id)
        .fetch_one(&mut *tx)
        .await?;

        if !film_exists {
            tx.rollback().await?;
            return Err(DbError::not_found("Film", film_id));
        }

        let requested = copies;
        if retired.len() as i64 != requested || still_free < 1 {
            tx.rollback().await?;
            let available = retired.len() as i64 + still_free;
            warn!(film_id, available, requested, "Refusing to retire copies");
            return Err(CoreError::InsufficientCopies {
                film_id,
                available,
                requested,
            }
            .into());
        }

        tx.commit().await?;

        info!(film_id, retired = retired.len(), "Copies retired");
        Ok(retired)
    }

    /// Counts copies of a film still in the catalog.
    pub async fn count_for_film(&self, film_id: FilmId) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM inventory WHERE film_id = ?1 AND retired_at IS NULL",
        )
        .bind(film_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

/// Inserts `copies` units of a film on an open transaction.
///
/// The insert selects from `film`, so an unknown film inserts nothing.
async fn insert_copies(
    conn: &mut SqliteConnection,
    film_id: FilmId,
    copies: i64,
) -> DbResult<Vec<InventoryUnit>> {
    let mut units = Vec::with_capacity(copies as usize);

    for _ in 0..copies {
        let unit = sqlx::query_as::<_, InventoryUnit>(
            "INSERT INTO inventory (film_id)
             SELECT film_id FROM film WHERE film_id = ?1
             RETURNING inventory_id, film_id, retired_at",
        )
        .bind(film_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::not_found("Film", film_id))?;

        units.push(unit);
    }

    Ok(units)
}

// =============================================================================
// Unit Tests
// =============================================================================
