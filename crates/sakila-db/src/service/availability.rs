//! # Availability Query
//!
//! Paged listings of what can be rented right now. Every call re-derives
//! availability from the rental table; nothing is cached.
//!
//! ## Ordering
//! Units are ordered by film title, then inventory id. The order is total,
//! so consecutive pages never overlap or skip a unit while the data stands
//! still.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;
use sakila_core::validation::validate_search_query;
use sakila_core::{
    AvailabilityFilter, AvailableUnit, CoreResult, FilmAvailability, FilmId, Page, PageRequest,
};

/// Joins and predicates shared by every listing. Binds:
/// `?1` film id or NULL, `?2` title term, `?3` title pattern,
/// `?4` category name or NULL.
const AVAILABLE_FROM: &str = r#"
    FROM inventory i
    JOIN film f ON f.film_id = i.film_id
    LEFT JOIN film_category fc ON fc.film_id = f.film_id
    LEFT JOIN category c ON c.category_id = fc.category_id
    WHERE i.retired_at IS NULL
      AND NOT EXISTS (
          SELECT 1 FROM rental r
          WHERE r.inventory_id = i.inventory_id AND r.return_date IS NULL
      )
      AND (?1 IS NULL OR f.film_id = ?1)
      AND (?2 = '' OR f.title LIKE ?3 ESCAPE '\')
      AND (?4 IS NULL OR c.name = ?4)
"#;

/// Filter values ready for binding.
struct Bound {
    film_id: Option<FilmId>,
    title: String,
    pattern: String,
    category: Option<String>,
}

impl Bound {
    fn from_filter(filter: &AvailabilityFilter) -> DbResult<Self> {
        let title = validate_search_query(filter.title.as_deref().unwrap_or_default())?;
        let pattern = like_pattern(&title);
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        Ok(Bound {
            film_id: filter.film_id,
            title,
            pattern,
            category,
        })
    }
}

/// Paged availability listings.
#[derive(Debug, Clone)]
pub struct AvailabilityQuery {
    pool: SqlitePool,
}

impl AvailabilityQuery {
    /// Creates a new AvailabilityQuery.
    pub fn new(pool: SqlitePool) -> Self {
        AvailabilityQuery { pool }
    }

    /// Free units matching `filter`, one page at a time.
    ///
    /// ## Returns
    /// * `Ok(Page<AvailableUnit>)` - `total_count` counts all matches
    /// * `Err(NotFound)` - `filter.film_id` names no film
    /// * `Err(Validation)` - Title term too long
    pub async fn list_available(
        &self,
        filter: &AvailabilityFilter,
        page: PageRequest,
    ) -> CoreResult<Page<AvailableUnit>> {
        Ok(self.query_units(filter, page).await?)
    }

    /// Free units of one film.
    ///
    /// ## Example
    /// ```rust,ignore
    /// // 12 free copies of film 5
    /// let first = db.availability().list_available_for_film(5, 1, 10).await?;
    /// assert_eq!((first.items.len(), first.total_count), (10, 12));
    /// ```
    pub async fn list_available_for_film(
        &self,
        film_id: FilmId,
        page: u32,
        page_size: u32,
    ) -> CoreResult<Page<AvailableUnit>> {
        let page = PageRequest::new(page, page_size)?;
        self.list_available(&AvailabilityFilter::for_film(film_id), page)
            .await
    }

    /// Films with at least one free unit, with their free-unit count.
    pub async fn list_available_films(
        &self,
        filter: &AvailabilityFilter,
        page: PageRequest,
    ) -> CoreResult<Page<FilmAvailability>> {
        Ok(self.query_films(filter, page).await?)
    }

    async fn query_units(
        &self,
        filter: &AvailabilityFilter,
        page: PageRequest,
    ) -> DbResult<Page<AvailableUnit>> {
        let bound = Bound::from_filter(filter)?;

        debug!(
            film_id = ?bound.film_id,
            title = %bound.title,
            category = ?bound.category,
            page = page.page(),
            "Listing available units"
        );

        let mut tx = self.pool.begin().await?;
        ensure_film(&mut *tx, bound.film_id).await?;

        let count_sql = format!("SELECT COUNT(*) {AVAILABLE_FROM}");
        let total_count: i64 = sqlx::query_scalar(&count_sql)
            .bind(bound.film_id)
            .bind(&bound.title)
            .bind(&bound.pattern)
            .bind(&bound.category)
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            "SELECT
                i.inventory_id,
                f.film_id,
                f.title,
                c.name AS category,
                f.rental_rate_cents
             {AVAILABLE_FROM}
             ORDER BY f.title, i.inventory_id
             LIMIT ?5 OFFSET ?6"
        );
        let items = sqlx::query_as::<_, AvailableUnit>(&sql)
            .bind(bound.film_id)
            .bind(&bound.title)
            .bind(&bound.pattern)
            .bind(&bound.category)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(page.into_page(items, total_count))
    }

    async fn query_films(
        &self,
        filter: &AvailabilityFilter,
        page: PageRequest,
    ) -> DbResult<Page<FilmAvailability>> {
        let bound = Bound::from_filter(filter)?;

        let mut tx = self.pool.begin().await?;
        ensure_film(&mut *tx, bound.film_id).await?;

        let count_sql = format!("SELECT COUNT(DISTINCT f.film_id) {AVAILABLE_FROM}");
        let total_count: i64 = sqlx::query_scalar(&count_sql)
            .bind(bound.film_id)
            .bind(&bound.title)
            .bind(&bound.pattern)
            .bind(&bound.category)
            .fetch_one(&mut *tx)
            .await?;

        let sql = format!(
            "SELECT
                f.film_id,
                f.title,
                c.name AS category,
                f.rental_rate_cents,
                COUNT(i.inventory_id) AS available_copies
             {AVAILABLE_FROM}
             GROUP BY f.film_id
             ORDER BY f.title, f.film_id
             LIMIT ?5 OFFSET ?6"
        );
        let items = sqlx::query_as::<_, FilmAvailability>(&sql)
            .bind(bound.film_id)
            .bind(&bound.title)
            .bind(&bound.pattern)
            .bind(&bound.category)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(page.into_page(items, total_count))
    }
}

/// `NotFound` when a film filter names no film.
async fn ensure_film(conn: &mut SqliteConnection, film_id: Option<FilmId>) -> DbResult<()> {
    let Some(film_id) = film_id else {
        return Ok(());
    };

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM film WHERE film_id = ?1)")
        .bind(film_id)
        .fetch_one(&mut *conn)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(DbError::not_found("Film", film_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{add_copies, customer, film, staff, test_db};
    use sakila_core::{CoreError, InventoryId};
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_pages_are_stable_and_disjoint() {
        let db = test_db().await;
        for title in ["A", "B", "C", "D"] {
            film(&db, title, 99).await;
        }
        let f = film(&db, "ACADEMY DINOSAUR", 99).await;
        assert_eq!(f.film_id, 5);
        let units = add_copies(&db, f.film_id, 12).await;

        let query = db.availability();
        let first = query.list_available_for_film(5, 1, 10).await.unwrap();
        let second = query.list_available_for_film(5, 2, 10).await.unwrap();

        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_count, 12);
        assert!(first.has_next());
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.total_count, 12);
        assert!(!second.has_next());

        let listed: Vec<InventoryId> = first
            .items
            .iter()
            .chain(second.items.iter())
            .map(|u| u.inventory_id)
            .collect();
        let distinct: HashSet<_> = listed.iter().copied().collect();
        assert_eq!(distinct.len(), 12);
        assert_eq!(listed, units);

        let again = query.list_available_for_film(5, 1, 10).await.unwrap();
        assert_eq!(again.items, first.items);
    }

    #[tokio::test]
    async fn test_rented_units_drop_out() {
        let db = test_db().await;
        let f = film(&db, "ALIEN CENTER", 299).await;
        let units = add_copies(&db, f.film_id, 3).await;
        let c = customer(&db, "MARY", "SMITH").await;
        let s = staff(&db, "Mike", "Hillyer").await;

        let rental = db
            .rental_manager()
            .open_rental(units[0], c.customer_id, s.staff_id)
            .await
            .unwrap();

        let page = db
            .availability()
            .list_available_for_film(f.film_id, 1, 10)
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert!(page.items.iter().all(|u| u.inventory_id != units[0]));
        assert_eq!(page.items[0].rental_rate_cents, 299);

        db.rental_manager()
            .close_rental(rental.rental_id, s.staff_id)
            .await
            .unwrap();
        let page = db
            .availability()
            .list_available_for_film(f.film_id, 1, 10)
            .await
            .unwrap();
        assert_eq!(page.total_count, 3);
    }

    #[tokio::test]
    async fn test_filters() {
        let db = test_db().await;
        let alien = film(&db, "ALIEN CENTER", 299).await;
        let academy = film(&db, "ACADEMY DINOSAUR", 99).await;
        let agent = film(&db, "AGENT TRUMAN", 299).await;
        add_copies(&db, alien.film_id, 2).await;
        add_copies(&db, academy.film_id, 1).await;
        add_copies(&db, agent.film_id, 1).await;
        db.films().set_category(alien.film_id, "Sci-Fi").await.unwrap();
        db.films().set_category(academy.film_id, "Documentary").await.unwrap();

        let query = db.availability();

        let all = query
            .list_available(&AvailabilityFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.total_count, 4);
        let titles: Vec<_> = all.items.iter().map(|u| u.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["ACADEMY DINOSAUR", "AGENT TRUMAN", "ALIEN CENTER", "ALIEN CENTER"]
        );

        let by_title = query
            .list_available(
                &AvailabilityFilter::default().with_title("alien"),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_title.total_count, 2);
        assert_eq!(by_title.items[0].category.as_deref(), Some("Sci-Fi"));

        let by_category = query
            .list_available(
                &AvailabilityFilter::default().with_category("Documentary"),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_category.total_count, 1);
        assert_eq!(by_category.items[0].film_id, academy.film_id);

        // LIKE wildcards in the term match literally
        let wildcard = query
            .list_available(
                &AvailabilityFilter::default().with_title("%"),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(wildcard.total_count, 0);

        assert!(matches!(
            query.list_available_for_film(999, 1, 10).await,
            Err(CoreError::NotFound { .. })
        ));
        assert!(matches!(
            query.list_available_for_film(alien.film_id, 0, 10).await,
            Err(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_available_films_counts_free_copies() {
        let db = test_db().await;
        let alien = film(&db, "ALIEN CENTER", 299).await;
        let academy = film(&db, "ACADEMY DINOSAUR", 99).await;
        let lonely = film(&db, "ZORRO ARK", 499).await;
        let alien_units = add_copies(&db, alien.film_id, 3).await;
        add_copies(&db, academy.film_id, 1).await;
        let lonely_units = add_copies(&db, lonely.film_id, 1).await;
        let c = customer(&db, "MARY", "SMITH").await;
        let s = staff(&db, "Mike", "Hillyer").await;

        let manager = db.rental_manager();
        manager
            .open_rental(alien_units[0], c.customer_id, s.staff_id)
            .await
            .unwrap();
        manager
            .open_rental(lonely_units[0], c.customer_id, s.staff_id)
            .await
            .unwrap();

        let films = db
            .availability()
            .list_available_films(&AvailabilityFilter::default(), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(films.total_count, 2);
        assert_eq!(films.items[0].film_id, academy.film_id);
        assert_eq!(films.items[0].available_copies, 1);
        assert_eq!(films.items[1].film_id, alien.film_id);
        assert_eq!(films.items[1].available_copies, 2);
    }
}
