//! # Film Repository
//!
//! Catalog operations for films.
//!
//! ## Key Operations
//! - CRUD (insert with category, partial update)
//! - Rate changes, single and bulk
//! - Inventory overview (copies per film, with search)
//!
//! ## Rate Changes and Open Rentals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  film.rental_rate_cents = 299                                          │
//! │       │                                                                 │
//! │       ├── open_rental() ──► rental.rate_cents = 299  (captured)        │
//! │       │                                                                 │
//! │  update(film, rental_rate_cents: 399)                                  │
//! │       │                                                                 │
//! │       ├── existing rental keeps 299                                    │
//! │       └── next open_rental() ──► rental.rate_cents = 399               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::category::get_or_create_in;
use crate::repository::like_pattern;
use sakila_core::validation::{
    validate_id_list, validate_new_film, validate_rental_duration, validate_rental_rate,
    validate_search_query, validate_title,
};
use sakila_core::{
    Category, Film, FilmId, FilmInventory, FilmUpdate, NewFilm, Page, PageRequest,
    DEFAULT_RENTAL_DURATION_DAYS,
};

const FILM_COLUMNS: &str = "film_id, title, description, release_year, rental_rate_cents, \
     rental_duration, length, rating, last_update";

/// Repository for film database operations.
#[derive(Debug, Clone)]
pub struct FilmRepository {
    pool: SqlitePool,
}

impl FilmRepository {
    /// Creates a new FilmRepository.
    pub fn new(pool: SqlitePool) -> Self {
        FilmRepository { pool }
    }

    /// Gets a film by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Film))` - Film found
    /// * `Ok(None)` - Film not found
    pub async fn get_by_id(&self, film_id: FilmId) -> DbResult<Option<Film>> {
        let sql = format!("SELECT {FILM_COLUMNS} FROM film WHERE film_id = ?1");
        let film = sqlx::query_as::<_, Film>(&sql)
            .bind(film_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(film)
    }

    /// Gets a film by its ID, or `NotFound`.
    pub async fn require(&self, film_id: FilmId) -> DbResult<Film> {
        self.get_by_id(film_id)
            .await?
            .ok_or_else(|| DbError::not_found("Film", film_id))
    }

    /// Inserts a new film, filing it under `category` when one is given.
    ///
    /// ## Returns
    /// * `Ok(Film)` - Inserted film with its generated id
    /// * `Err(DbError::Domain(Validation))` - Bad title, rate or duration
    pub async fn insert(&self, new: &NewFilm) -> DbResult<Film> {
        validate_new_film(new)?;

        debug!(title = %new.title, "Inserting film");

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO film (
                title, description, release_year, rental_rate_cents,
                rental_duration, length, rating, last_update
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING {FILM_COLUMNS}"
        );
        let film = sqlx::query_as::<_, Film>(&sql)
            .bind(new.title.trim())
            .bind(&new.description)
            .bind(new.release_year)
            .bind(new.rental_rate_cents)
            .bind(new.rental_duration.unwrap_or(DEFAULT_RENTAL_DURATION_DAYS))
            .bind(new.length)
            .bind(new.rating)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        if let Some(name) = &new.category {
            let category = get_or_create_in(&mut *tx, name).await?;
            sqlx::query("INSERT INTO film_category (film_id, category_id) VALUES (?1, ?2)")
                .bind(film.film_id)
                .bind(category.category_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(film_id = film.film_id, title = %film.title, "Film added to catalog");
        Ok(film)
    }

    /// Applies a partial update. Fields left `None` keep their value.
    ///
    /// ## Returns
    /// * `Ok(Film)` - The film after the update
    /// * `Err(DbError::NotFound)` - Film doesn't exist
    pub async fn update(&self, film_id: FilmId, update: &FilmUpdate) -> DbResult<Film> {
        if update.is_empty() {
            return self.require(film_id).await;
        }
        if let Some(title) = &update.title {
            validate_title(title)?;
        }
        if let Some(rate) = update.rental_rate_cents {
            validate_rental_rate(rate)?;
        }
        if let Some(days) = update.rental_duration {
            validate_rental_duration(days)?;
        }

        debug!(film_id, "Updating film");

        let sql = format!(
            "UPDATE film SET
                title = COALESCE(?2, title),
                description = COALESCE(?3, description),
                rental_rate_cents = COALESCE(?4, rental_rate_cents),
                rental_duration = COALESCE(?5, rental_duration),
                rating = COALESCE(?6, rating),
                last_update = ?7
            WHERE film_id = ?1
            RETURNING {FILM_COLUMNS}"
        );
        let film = sqlx::query_as::<_, Film>(&sql)
            .bind(film_id)
            .bind(update.title.as_deref().map(str::trim))
            .bind(&update.description)
            .bind(update.rental_rate_cents)
            .bind(update.rental_duration)
            .bind(update.rating)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Film", film_id))?;

        Ok(film)
    }

    /// Sets the rental rate of several films at once.
    ///
    /// All or nothing: an unknown id rolls the whole batch back.
    ///
    /// ## Returns
    /// Number of films updated.
    pub async fn bulk_update_rates(&self, film_ids: &[FilmId], rate_cents: i64) -> DbResult<u64> {
        let film_ids = validate_id_list("film_ids", film_ids)?;
        validate_rental_rate(rate_cents)?;

        debug!(count = film_ids.len(), rate_cents, "Updating film rates");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut updated = 0;

        for film_id in &film_ids {
            let result = sqlx::query(
                "UPDATE film SET rental_rate_cents = ?2, last_update = ?3 WHERE film_id = ?1",
            )
            .bind(film_id)
            .bind(rate_cents)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(DbError::not_found("Film", film_id));
            }
            updated += result.rows_affected();
        }

        tx.commit().await?;

        info!(updated, rate_cents, "Film rates updated");
        Ok(updated)
    }

    /// Files a film under a category, replacing its previous one.
    pub async fn set_category(&self, film_id: FilmId, name: &str) -> DbResult<Category> {
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction holds the write lock before reading
        let touched = sqlx::query("UPDATE film SET last_update = ?2 WHERE film_id = ?1")
            .bind(film_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DbError::not_found("Film", film_id));
        }

        let category = get_or_create_in(&mut *tx, name).await?;

        sqlx::query(
            "INSERT INTO film_category (film_id, category_id) VALUES (?1, ?2)
             ON CONFLICT (film_id) DO UPDATE SET category_id = excluded.category_id",
        )
        .bind(film_id)
        .bind(category.category_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(film_id, category = %category.name, "Film category set");
        Ok(category)
    }

    /// The film's category, if it has one.
    pub async fn category_of(&self, film_id: FilmId) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT c.category_id, c.name
             FROM film_category fc
             JOIN category c ON c.category_id = fc.category_id
             WHERE fc.film_id = ?1",
        )
        .bind(film_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Copy counts per film for the inventory screen.
    ///
    /// Lists films with at least one copy in the catalog, ordered by title.
    /// A non-blank `search` keeps films whose title or description contains
    /// it (case-insensitive).
    pub async fn inventory_overview(
        &self,
        search: &str,
        page: PageRequest,
    ) -> DbResult<Page<FilmInventory>> {
        let search = validate_search_query(search)?;
        let pattern = like_pattern(&search);

        debug!(search = %search, page = page.page(), "Loading inventory overview");

        let mut tx = self.pool.begin().await?;

        let total_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM film f
            WHERE EXISTS (
                SELECT 1 FROM inventory i
                WHERE i.film_id = f.film_id AND i.retired_at IS NULL
            )
            AND (?1 = '' OR f.title LIKE ?2 ESCAPE '\' OR f.description LIKE ?2 ESCAPE '\')
            "#,
        )
        .bind(&search)
        .bind(&pattern)
        .fetch_one(&mut *tx)
        .await?;

        let items = sqlx::query_as::<_, FilmInventory>(
            r#"
            SELECT
                f.film_id,
                f.title,
                f.description,
                f.release_year,
                f.rental_rate_cents,
                COUNT(i.inventory_id) AS total_copies,
                COUNT(r.rental_id) AS rented_out
            FROM film f
            JOIN inventory i ON i.film_id = f.film_id AND i.retired_at IS NULL
            LEFT JOIN rental r ON r.inventory_id = i.inventory_id AND r.return_date IS NULL
            WHERE (?1 = '' OR f.title LIKE ?2 ESCAPE '\' OR f.description LIKE ?2 ESCAPE '\')
            GROUP BY f.film_id
            ORDER BY f.title, f.film_id
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(&search)
        .bind(&pattern)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(page.into_page(items, total_count))
    }

    /// Counts films in the catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM film")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{add_copies, customer, film, staff, test_db};
    use sakila_core::{CoreError, FilmRating};

    fn new_film(title: &str) -> NewFilm {
        NewFilm {
            title: title.to_string(),
            description: Some("A Epic Drama of a Feminist".to_string()),
            release_year: Some(2006),
            rental_rate_cents: 99,
            rental_duration: None,
            length: Some(86),
            rating: Some(FilmRating::Pg),
            category: Some("Documentary".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.films();

        let inserted = repo.insert(&new_film("ACADEMY DINOSAUR")).await.unwrap();
        assert_eq!(inserted.rental_duration, DEFAULT_RENTAL_DURATION_DAYS);
        assert_eq!(inserted.rating, Some(FilmRating::Pg));

        let loaded = repo.get_by_id(inserted.film_id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "ACADEMY DINOSAUR");
        assert_eq!(loaded.rental_rate().cents(), 99);

        let category = repo.category_of(inserted.film_id).await.unwrap().unwrap();
        assert_eq!(category.name, "Documentary");

        assert!(repo.get_by_id(999).await.unwrap().is_none());
        assert!(matches!(
            repo.require(999).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_film() {
        let db = test_db().await;
        let mut bad = new_film("");
        bad.rental_rate_cents = 0;

        let err = db.films().insert(&bad).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
        assert_eq!(db.films().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = test_db().await;
        let f = film(&db, "ALIEN CENTER", 299).await;

        let updated = db
            .films()
            .update(
                f.film_id,
                &FilmUpdate {
                    rental_rate_cents: Some(399),
                    ..FilmUpdate::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.rental_rate_cents, 399);
        assert_eq!(updated.title, "ALIEN CENTER");

        let missing = db
            .films()
            .update(
                999,
                &FilmUpdate {
                    title: Some("X".into()),
                    ..FilmUpdate::default()
                },
            )
            .await;
        assert!(matches!(missing, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_bulk_update_rates_is_all_or_nothing() {
        let db = test_db().await;
        let a = film(&db, "A", 99).await;
        let b = film(&db, "B", 99).await;

        let err = db
            .films()
            .bulk_update_rates(&[a.film_id, b.film_id, 999], 499)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(db.films().require(a.film_id).await.unwrap().rental_rate_cents, 99);

        let updated = db
            .films()
            .bulk_update_rates(&[a.film_id, b.film_id, a.film_id], 499)
            .await
            .unwrap();
        assert_eq!(updated, 2);
        assert_eq!(db.films().require(b.film_id).await.unwrap().rental_rate_cents, 499);
    }

    #[tokio::test]
    async fn test_set_category_replaces_previous() {
        let db = test_db().await;
        let f = film(&db, "ALIEN CENTER", 299).await;

        db.films().set_category(f.film_id, "Horror").await.unwrap();
        db.films().set_category(f.film_id, "Sci-Fi").await.unwrap();

        let category = db.films().category_of(f.film_id).await.unwrap().unwrap();
        assert_eq!(category.name, "Sci-Fi");

        let err = db.films().set_category(999, "Horror").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_inventory_overview_counts_and_search() {
        let db = test_db().await;
        let alien = film(&db, "ALIEN CENTER", 299).await;
        let dino = film(&db, "ACADEMY DINOSAUR", 99).await;
        let _no_copies = film(&db, "ZORRO ARK", 499).await;

        let alien_units = add_copies(&db, alien.film_id, 3).await;
        add_copies(&db, dino.film_id, 2).await;

        let c = customer(&db, "MARY", "SMITH").await;
        let s = staff(&db, "Mike", "Hillyer").await;
        db.rental_manager()
            .open_rental(alien_units[0], c.customer_id, s.staff_id)
            .await
            .unwrap();

        let page = db
            .films()
            .inventory_overview("", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.items[0].title, "ACADEMY DINOSAUR");
        assert_eq!(page.items[1].total_copies, 3);
        assert_eq!(page.items[1].rented_out, 1);
        assert_eq!(page.items[1].available_copies(), 2);

        let page = db
            .films()
            .inventory_overview("alien", PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].film_id, alien.film_id);

        let page = db
            .films()
            .inventory_overview("no such words", PageRequest::default())
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }
}
