//! # Actor Repository
//!
//! The cast list of the catalog: list, add, rename and remove actors.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use sakila_core::validation::validate_new_actor;
use sakila_core::{Actor, ActorId, NewActor};

const ACTOR_COLUMNS: &str = "actor_id, first_name, last_name";

/// Repository for actor database operations.
#[derive(Debug, Clone)]
pub struct ActorRepository {
    pool: SqlitePool,
}

impl ActorRepository {
    /// Creates a new ActorRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ActorRepository { pool }
    }

    /// All actors ordered by last, first name.
    pub async fn list(&self) -> DbResult<Vec<Actor>> {
        let sql = format!(
            "SELECT {ACTOR_COLUMNS} FROM actor
             ORDER BY last_name, first_name, actor_id"
        );
        let actors = sqlx::query_as::<_, Actor>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = actors.len(), "Listed actors");
        Ok(actors)
    }

    /// Gets an actor by ID.
    pub async fn get_by_id(&self, actor_id: ActorId) -> DbResult<Option<Actor>> {
        let sql = format!("SELECT {ACTOR_COLUMNS} FROM actor WHERE actor_id = ?1");
        let actor = sqlx::query_as::<_, Actor>(&sql)
            .bind(actor_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(actor)
    }

    /// Adds an actor. Names are stored trimmed.
    pub async fn insert(&self, new: &NewActor) -> DbResult<Actor> {
        validate_new_actor(new)?;

        let sql = format!(
            "INSERT INTO actor (first_name, last_name) VALUES (?1, ?2)
             RETURNING {ACTOR_COLUMNS}"
        );
        let actor = sqlx::query_as::<_, Actor>(&sql)
            .bind(new.first_name.trim())
            .bind(new.last_name.trim())
            .fetch_one(&self.pool)
            .await?;

        info!(actor_id = actor.actor_id, name = %actor.full_name(), "Actor added");
        Ok(actor)
    }

    /// Renames an actor.
    ///
    /// ## Returns
    /// * `Ok(Actor)` - The actor as stored after the update
    /// * `Err(DbError::NotFound)` - Unknown actor id
    pub async fn update(&self, actor_id: ActorId, names: &NewActor) -> DbResult<Actor> {
        validate_new_actor(names)?;

        let sql = format!(
            "UPDATE actor SET first_name = ?2, last_name = ?3
             WHERE actor_id = ?1
             RETURNING {ACTOR_COLUMNS}"
        );
        let actor = sqlx::query_as::<_, Actor>(&sql)
            .bind(actor_id)
            .bind(names.first_name.trim())
            .bind(names.last_name.trim())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Actor", actor_id))?;

        info!(actor_id, name = %actor.full_name(), "Actor updated");
        Ok(actor)
    }

    /// Removes an actor.
    ///
    /// ## Returns
    /// * `Ok(())` - Actor deleted
    /// * `Err(DbError::NotFound)` - Unknown actor id
    pub async fn delete(&self, actor_id: ActorId) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM actor WHERE actor_id = ?1")
            .bind(actor_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Actor", actor_id));
        }

        info!(actor_id, "Actor deleted");
        Ok(())
    }

    /// Number of actors.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM actor")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
