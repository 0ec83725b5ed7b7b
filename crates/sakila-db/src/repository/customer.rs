//! # Customer Repository
//!
//! Customer registration, lookup and the desk's customer screens.
//!
//! ## Totals Without Fan-out
//! Rental and payment totals are computed with one correlated subquery per
//! figure. Joining rentals and payments in the same `GROUP BY` would
//! multiply each payment by the number of rentals.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::like_pattern;
use sakila_core::validation::{validate_new_customer, validate_search_query};
use sakila_core::{
    Customer, CustomerDashboard, CustomerDetails, CustomerId, CustomerSummary, NewCustomer, Page,
    PageRequest, MAX_PAGE_SIZE,
};

const CUSTOMER_COLUMNS: &str = "customer_id, first_name, last_name, email, active, \
     address, district, postal_code, city, country, create_date";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Registers a new, active customer.
    ///
    /// ## Returns
    /// * `Ok(Customer)` - Inserted customer
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn insert(&self, new: &NewCustomer) -> DbResult<Customer> {
        validate_new_customer(new)?;

        debug!(email = %new.email, "Inserting customer");

        let sql = format!(
            "INSERT INTO customer (
                first_name, last_name, email, active,
                address, district, postal_code, city, country, create_date
            ) VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING {CUSTOMER_COLUMNS}"
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(new.first_name.trim())
            .bind(new.last_name.trim())
            .bind(new.email.trim().to_lowercase())
            .bind(new.address.trim())
            .bind(&new.district)
            .bind(&new.postal_code)
            .bind(&new.city)
            .bind(&new.country)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        info!(customer_id = customer.customer_id, "Customer registered");
        Ok(customer)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, customer_id: CustomerId) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customer WHERE customer_id = ?1");
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Activates or deactivates a customer. Inactive customers cannot rent.
    pub async fn set_active(&self, customer_id: CustomerId, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE customer SET active = ?2 WHERE customer_id = ?1")
            .bind(customer_id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", customer_id));
        }

        info!(customer_id, active, "Customer status changed");
        Ok(())
    }

    /// Customers ordered by last name, first name, with rental counts.
    pub async fn list(&self, page: PageRequest) -> DbResult<Page<CustomerSummary>> {
        let mut tx = self.pool.begin().await?;

        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer")
            .fetch_one(&mut *tx)
            .await?;

        let items = sqlx::query_as::<_, CustomerSummary>(
            "SELECT
                c.customer_id, c.first_name, c.last_name, c.email, c.active,
                (SELECT COUNT(*) FROM rental r WHERE r.customer_id = c.customer_id) AS rental_count
             FROM customer c
             ORDER BY c.last_name, c.first_name, c.customer_id
             LIMIT ?1 OFFSET ?2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(page.into_page(items, total_count))
    }

    /// Quick search on first name, last name and email.
    ///
    /// A blank term returns no rows. `limit` is clamped to
    /// `1..=MAX_PAGE_SIZE`.
    pub async fn search(&self, term: &str, limit: u32) -> DbResult<Vec<CustomerSummary>> {
        let term = validate_search_query(term)?;
        if term.is_empty() {
            return Ok(Vec::new());
        }

        debug!(term = %term, limit, "Searching customers");

        let customers = sqlx::query_as::<_, CustomerSummary>(
            r#"
            SELECT
                c.customer_id, c.first_name, c.last_name, c.email, c.active,
                (SELECT COUNT(*) FROM rental r WHERE r.customer_id = c.customer_id) AS rental_count
            FROM customer c
            WHERE c.first_name LIKE ?1 ESCAPE '\'
               OR c.last_name LIKE ?1 ESCAPE '\'
               OR c.email LIKE ?1 ESCAPE '\'
            ORDER BY c.last_name, c.first_name, c.customer_id
            LIMIT ?2
            "#,
        )
        .bind(like_pattern(&term))
        .bind(i64::from(limit.clamp(1, MAX_PAGE_SIZE)))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = customers.len(), "Customer search returned rows");
        Ok(customers)
    }

    /// Customer record with address and lifetime totals.
    ///
    /// `total_paid_cents` sums every payment of the customer.
    pub async fn details(&self, customer_id: CustomerId) -> DbResult<CustomerDetails> {
        let details = sqlx::query_as::<_, CustomerDetails>(
            "SELECT
                c.customer_id, c.first_name, c.last_name, c.email, c.active,
                c.address, c.district, c.postal_code, c.city, c.country,
                (SELECT COUNT(*) FROM rental r WHERE r.customer_id = c.customer_id)
                    AS total_rentals,
                (SELECT COALESCE(SUM(p.amount_cents), 0) FROM payment p
                  WHERE p.customer_id = c.customer_id)
                    AS total_paid_cents,
                (SELECT MAX(r.rental_date) FROM rental r WHERE r.customer_id = c.customer_id)
                    AS last_rental_date
             FROM customer c
             WHERE c.customer_id = ?1",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", customer_id))?;

        Ok(details)
    }

    /// Headline numbers for the customer dashboard.
    pub async fn dashboard(&self, customer_id: CustomerId) -> DbResult<CustomerDashboard> {
        let dashboard = sqlx::query_as::<_, CustomerDashboard>(
            "SELECT
                c.customer_id,
                c.first_name || ' ' || c.last_name AS customer_name,
                (SELECT COUNT(*) FROM rental r
                  WHERE r.customer_id = c.customer_id AND r.return_date IS NULL)
                    AS active_rentals,
                (SELECT COUNT(*) FROM rental r WHERE r.customer_id = c.customer_id)
                    AS total_rentals,
                (SELECT COALESCE(SUM(p.amount_cents), 0) FROM payment p
                  WHERE p.customer_id = c.customer_id)
                    AS total_spent_cents,
                (SELECT MAX(r.rental_date) FROM rental r WHERE r.customer_id = c.customer_id)
                    AS last_rental_date
             FROM customer c
             WHERE c.customer_id = ?1",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Customer", customer_id))?;

        Ok(dashboard)
    }

    /// Counts registered customers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
