use std::fmt;
use std::str::FromStr;

use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// A payment settles exactly once: pending -> paid or pending -> failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            other => anyhow::bail!("unknown payment status: {other}"),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub exam_id: i64,
    pub amount: f64,
    pub payment_method: String,
    pub status: String,
    pub payment_date: OffsetDateTime,
}

/// Payment joined with the owning user's display name.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentWithStudent {
    pub student_name: String,
    pub amount: f64,
    pub payment_date: OffsetDateTime,
    pub status: String,
}

impl Payment {
    pub async fn create(
        db: &PgPool,
        user_id: i64,
        exam_id: i64,
        amount: f64,
        payment_method: &str,
    ) -> sqlx::Result<Payment> {
        sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (user_id, exam_id, amount, payment_method, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING id, user_id, exam_id, amount, payment_method, status, payment_date
            "#,
        )
        .bind(user_id)
        .bind(exam_id)
        .bind(amount)
        .bind(payment_method)
        .fetch_one(db)
        .await
    }

    /// Move a pending payment to its terminal status. Compare-and-swap on
    /// `pending`, so a payment cannot settle twice.
    pub async fn settle(
        db: &PgPool,
        payment_id: i64,
        status: PaymentStatus,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $2
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(payment_id)
        .bind(status.as_str())
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_user(db: &PgPool, user_id: i64) -> sqlx::Result<Vec<PaymentWithStudent>> {
        sqlx::query_as::<_, PaymentWithStudent>(
            r#"
            SELECT u.name AS student_name, p.amount, p.payment_date, p.status
            FROM payments p
            JOIN users u ON u.id = p.user_id
            WHERE p.user_id = $1
            ORDER BY p.payment_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn list_all(db: &PgPool) -> sqlx::Result<Vec<PaymentWithStudent>> {
        sqlx::query_as::<_, PaymentWithStudent>(
            r#"
            SELECT u.name AS student_name, p.amount, p.payment_date, p.status
            FROM payments p
            JOIN users u ON u.id = p.user_id
            ORDER BY p.payment_date DESC
            "#,
        )
        .fetch_all(db)
        .await
    }

    /// Sum of amounts over `paid` payments only; pending and failed rows
    /// do not count as revenue.
    pub async fn total_revenue(db: &PgPool) -> sqlx::Result<f64> {
        sqlx::query_scalar::<_, f64>(
            r#"
            SELECT COALESCE(SUM(amount), 0)::DOUBLE PRECISION
            FROM payments
            WHERE status = 'paid'
            "#,
        )
        .fetch_one(db)
        .await
    }

    pub async fn count_by_status(db: &PgPool, status: PaymentStatus) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payments WHERE status = $1")
            .bind(status.as_str())
            .fetch_one(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_an_error() {
        assert!("refunded".parse::<PaymentStatus>().is_err());
        assert!("Paid".parse::<PaymentStatus>().is_err());
    }
}
