//! # Staff Repository
//!
//! Staff lookups and the day statistics of the staff dashboard.
//! Credentials and sessions live outside this crate; callers pass a
//! `staff_id` they have already authenticated.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::day_bounds;
use sakila_core::validation::validate_new_staff;
use sakila_core::{NewStaff, Staff, StaffDashboardStats, StaffId};

const STAFF_COLUMNS: &str = "staff_id, first_name, last_name, email, active, is_admin";

/// Repository for staff database operations.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    /// Creates a new StaffRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    /// Adds an active staff member.
    pub async fn insert(&self, new: &NewStaff) -> DbResult<Staff> {
        validate_new_staff(new)?;

        let sql = format!(
            "INSERT INTO staff (first_name, last_name, email, active, is_admin)
             VALUES (?1, ?2, ?3, 1, ?4)
             RETURNING {STAFF_COLUMNS}"
        );
        let staff = sqlx::query_as::<_, Staff>(&sql)
            .bind(new.first_name.trim())
            .bind(new.last_name.trim())
            .bind(new.email.trim().to_lowercase())
            .bind(new.is_admin)
            .fetch_one(&self.pool)
            .await?;

        info!(staff_id = staff.staff_id, "Staff member added");
        Ok(staff)
    }

    /// Gets a staff member by ID.
    pub async fn get_by_id(&self, staff_id: StaffId) -> DbResult<Option<Staff>> {
        let sql = format!("SELECT {STAFF_COLUMNS} FROM staff WHERE staff_id = ?1");
        let staff = sqlx::query_as::<_, Staff>(&sql)
            .bind(staff_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(staff)
    }

    /// Gets a staff member by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Staff>> {
        let sql = format!("SELECT {STAFF_COLUMNS} FROM staff WHERE email = ?1");
        let staff = sqlx::query_as::<_, Staff>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(staff)
    }

    /// Dashboard figures of a staff member for one UTC day.
    ///
    /// ```text
    /// active_rentals       open rentals they checked out (any day)
    /// rentals_today        rentals they opened on `day`
    /// revenue_today_cents  payments they took on `day`
    /// customers_served     distinct customers they ever rented to
    /// ```
    pub async fn dashboard_stats(
        &self,
        staff_id: StaffId,
        day: NaiveDate,
    ) -> DbResult<StaffDashboardStats> {
        let (start, end) = day_bounds(day);

        debug!(staff_id, %day, "Loading staff dashboard");

        let row: Option<(i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT
                (SELECT COUNT(*) FROM rental r
                  WHERE r.staff_id = s.staff_id AND r.return_date IS NULL),
                (SELECT COUNT(*) FROM rental r
                  WHERE r.staff_id = s.staff_id
                    AND r.rental_date >= ?2 AND r.rental_date < ?3),
                (SELECT COALESCE(SUM(p.amount_cents), 0) FROM payment p
                  WHERE p.staff_id = s.staff_id
                    AND p.payment_date >= ?2 AND p.payment_date < ?3),
                (SELECT COUNT(DISTINCT r.customer_id) FROM rental r
                  WHERE r.staff_id = s.staff_id)
             FROM staff s
             WHERE s.staff_id = ?1",
        )
        .bind(staff_id)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;

        let (active_rentals, rentals_today, revenue_today_cents, customers_served) =
            row.ok_or_else(|| DbError::not_found("Staff", staff_id))?;

        let stats = StaffDashboardStats {
            staff_id,
            day,
            active_rentals,
            rentals_today,
            revenue_today_cents,
            customers_served,
        };
        debug!(
            staff_id,
            %day,
            rentals_today,
            revenue = %stats.revenue_today(),
            "Staff dashboard computed"
        );
        Ok(stats)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{add_copies, customer, film, staff, test_db};
    use chrono::{Duration, Utc};
    use sakila_core::{Money, NewPayment};

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = test_db().await;
        let mike = db
            .staff()
            .insert(&NewStaff {
                first_name: "Mike".into(),
                last_name: "Hillyer".into(),
                email: "Mike.Hillyer@sakilastaff.com".into(),
                is_admin: true,
            })
            .await
            .unwrap();
        assert!(mike.active && mike.is_admin);
        assert_eq!(mike.full_name(), "Mike Hillyer");

        let by_email = db
            .staff()
            .get_by_email("MIKE.HILLYER@sakilastaff.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.staff_id, mike.staff_id);
        assert!(db.staff().get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dashboard_stats_for_today() {
        let db = test_db().await;
        let f = film(&db, "ALIEN CENTER", 299).await;
        let units = add_copies(&db, f.film_id, 3).await;
        let mary = customer(&db, "MARY", "SMITH").await;
        let linda = customer(&db, "LINDA", "WILLIAMS").await;
        let s = staff(&db, "Mike", "Hillyer").await;

        let now = Utc::now();
        let manager = db.rental_manager();
        let today = manager
            .open_rental_at(units[0], mary.customer_id, s.staff_id, now)
            .await
            .unwrap();
        manager
            .open_rental_at(units[1], linda.customer_id, s.staff_id, now - Duration::days(3))
            .await
            .unwrap();
        let returned = manager
            .open_rental_at(units[2], mary.customer_id, s.staff_id, now - Duration::days(4))
            .await
            .unwrap();
        manager.close_rental(returned.rental_id, s.staff_id).await.unwrap();

        db.payments()
            .record(&NewPayment {
                customer_id: mary.customer_id,
                staff_id: s.staff_id,
                rental_id: Some(today.rental_id),
                amount_cents: 299,
            })
            .await
            .unwrap();

        let stats = db
            .staff()
            .dashboard_stats(s.staff_id, now.date_naive())
            .await
            .unwrap();
        assert_eq!(stats.active_rentals, 2);
        assert_eq!(stats.rentals_today, 1);
        assert_eq!(stats.revenue_today_cents, 299);
        assert_eq!(stats.revenue_today(), Money::from_cents(299));
        assert_eq!(stats.customers_served, 2);

        let earlier = db
            .staff()
            .dashboard_stats(s.staff_id, (now - Duration::days(10)).date_naive())
            .await
            .unwrap();
        assert_eq!(earlier.rentals_today, 0);
        assert_eq!(earlier.revenue_today_cents, 0);

        assert!(matches!(
            db.staff().dashboard_stats(999, now.date_naive()).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
