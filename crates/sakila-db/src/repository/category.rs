//! # Category Repository
//!
//! Film categories. Names are unique; a category is created the first
//! time a film is filed under it.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use sakila_core::{Category, ValidationError};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// All categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT category_id, name FROM category ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Gets a category by exact name.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT category_id, name FROM category WHERE name = ?1",
        )
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Returns the category with this name, creating it if needed.
    pub async fn get_or_create(&self, name: &str) -> DbResult<Category> {
        let mut conn = self.pool.acquire().await?;
        get_or_create_in(&mut *conn, name).await
    }
}

/// `get_or_create` on an existing connection or transaction.
pub(crate) async fn get_or_create_in(conn: &mut SqliteConnection, name: &str) -> DbResult<Category> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "category".to_string(),
        }
        .into());
    }

    debug!(name = %name, "Resolving category");

    sqlx::query("INSERT INTO category (name) VALUES (?1) ON CONFLICT (name) DO NOTHING")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    let category = sqlx::query_as::<_, Category>(
        "SELECT category_id, name FROM category WHERE name = ?1",
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(category)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::test_support::test_db;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let db = test_db().await;
        let repo = db.categories();

        let horror = repo.get_or_create("Horror").await.unwrap();
        let again = repo.get_or_create("  Horror ").await.unwrap();
        assert_eq!(horror, again);

        repo.get_or_create("Comedy").await.unwrap();
        let names: Vec<_> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Comedy", "Horror"]);

        assert_eq!(repo.get_by_name("Horror").await.unwrap(), Some(horror));
        assert_eq!(repo.get_by_name("Drama").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let db = test_db().await;
        let err = db.categories().get_or_create("   ").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }
}
