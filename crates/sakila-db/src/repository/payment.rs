//! # Payment Repository
//!
//! Payments taken at the desk. A payment may settle a rental of the same
//! customer or stand alone (late fees, deposits).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use sakila_core::validation::validate_payment_amount;
use sakila_core::{
    CoreError, CustomerId, Money, NewPayment, Payment, PaymentRecord, StaffId, MAX_PAGE_SIZE,
};

const PAYMENT_COLUMNS: &str =
    "payment_id, customer_id, staff_id, rental_id, amount_cents, payment_date";

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Records a payment.
    ///
    /// ## Returns
    /// * `Ok(Payment)` - Recorded payment
    /// * `Err(DbError::Domain(InvalidReference))` - `rental_id` belongs to
    ///   another customer or doesn't exist
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown customer or staff
    pub async fn record(&self, new: &NewPayment) -> DbResult<Payment> {
        validate_payment_amount(new.amount_cents)?;

        let sql = format!(
            "INSERT INTO payment (customer_id, staff_id, rental_id, amount_cents, payment_date)
             SELECT ?1, ?2, ?3, ?4, ?5
             WHERE ?3 IS NULL
                OR EXISTS (SELECT 1 FROM rental WHERE rental_id = ?3 AND customer_id = ?1)
             RETURNING {PAYMENT_COLUMNS}"
        );
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(new.customer_id)
            .bind(new.staff_id)
            .bind(new.rental_id)
            .bind(new.amount_cents)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        let Some(payment) = payment else {
            let rental_id = new.rental_id.unwrap_or_default();
            warn!(
                customer_id = new.customer_id,
                rental_id, "Payment refused: rental not of this customer"
            );
            return Err(CoreError::invalid_reference(
                "rental",
                rental_id,
                "no such rental for this customer",
            )
            .into());
        };

        info!(
            payment_id = payment.payment_id,
            customer_id = payment.customer_id,
            amount = %payment.amount(),
            "Payment recorded"
        );
        Ok(payment)
    }

    /// Most recent payments taken by a staff member.
    ///
    /// `limit` is clamped to `1..=MAX_PAGE_SIZE`.
    pub async fn recent_for_staff(
        &self,
        staff_id: StaffId,
        limit: u32,
    ) -> DbResult<Vec<PaymentRecord>> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);

        let records = sqlx::query_as::<_, PaymentRecord>(
            "SELECT
                p.payment_id,
                p.payment_date,
                p.amount_cents,
                c.customer_id,
                c.first_name || ' ' || c.last_name AS customer_name,
                p.rental_id,
                f.title AS film_title
             FROM payment p
             JOIN customer c ON c.customer_id = p.customer_id
             LEFT JOIN rental r ON r.rental_id = p.rental_id
             LEFT JOIN inventory i ON i.inventory_id = r.inventory_id
             LEFT JOIN film f ON f.film_id = i.film_id
             WHERE p.staff_id = ?1
             ORDER BY p.payment_date DESC, p.payment_id DESC
             LIMIT ?2",
        )
        .bind(staff_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Sum of everything a customer has paid.
    pub async fn total_for_customer(&self, customer_id: CustomerId) -> DbResult<Money> {
        let row: Option<i64> = sqlx::query_scalar(
            "SELECT (SELECT COALESCE(SUM(amount_cents), 0) FROM payment p
                     WHERE p.customer_id = c.customer_id)
             FROM customer c
             WHERE c.customer_id = ?1",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        let cents = row.ok_or_else(|| DbError::not_found("Customer", customer_id))?;
        Ok(Money::from_cents(cents))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
