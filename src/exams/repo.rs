use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};

/// Progress of one user's registration for one exam.
///
/// Transitions are one-way: registered -> started -> completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Registered,
    Started,
    Completed,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Started => "started",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "started" => Ok(Self::Started),
            "completed" => Ok(Self::Completed),
            other => anyhow::bail!("unknown registration status: {other}"),
        }
    }
}

/// Exam in the catalog. Read-only here; rows come from migrations
/// (admin tooling lives elsewhere).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Exam {
    pub id: i64,
    pub exam_name: String,
    pub subject: String,
    pub exam_date: Date,
    pub duration: String,
}

impl Exam {
    pub async fn list_available(db: &PgPool) -> sqlx::Result<Vec<Exam>> {
        sqlx::query_as::<_, Exam>(
            r#"
            SELECT id, exam_name, subject, exam_date, duration
            FROM exams
            ORDER BY exam_date, id
            "#,
        )
        .fetch_all(db)
        .await
    }

    pub async fn count(db: &PgPool) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM exams")
            .fetch_one(db)
            .await
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ExamRegistration {
    pub id: i64,
    pub user_id: i64,
    pub exam_id: i64,
    pub status: String,
    pub score: Option<f64>,
    pub created_at: OffsetDateTime,
}

/// Registration joined with its exam's display fields.
#[derive(Debug, Clone, FromRow)]
pub struct RegisteredExamRow {
    pub registration_id: i64,
    pub exam_id: i64,
    pub exam_name: String,
    pub subject: String,
    pub exam_date: Date,
    pub duration: String,
    pub status: String,
    pub score: Option<f64>,
}

impl ExamRegistration {
    /// Create a registration in the initial `registered` state. The unique
    /// index on (user_id, exam_id) rejects a duplicate registration.
    pub async fn create(db: &PgPool, user_id: i64, exam_id: i64) -> sqlx::Result<ExamRegistration> {
        sqlx::query_as::<_, ExamRegistration>(
            r#"
            INSERT INTO exam_registrations (user_id, exam_id, status)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, exam_id, status, score, created_at
            "#,
        )
        .bind(user_id)
        .bind(exam_id)
        .bind(RegistrationStatus::Registered.as_str())
        .fetch_one(db)
        .await
    }

    /// registered -> started, owner only. The status predicate makes the
    /// transition a compare-and-swap: of two concurrent starts, one loses
    /// and sees `false`.
    pub async fn start(db: &PgPool, registration_id: i64, user_id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE exam_registrations
            SET status = $3
            WHERE id = $1 AND user_id = $2 AND status = $4
            "#,
        )
        .bind(registration_id)
        .bind(user_id)
        .bind(RegistrationStatus::Started.as_str())
        .bind(RegistrationStatus::Registered.as_str())
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// started -> completed, owner only, recording the score. Same
    /// compare-and-swap shape as `start`, so a double completion cannot
    /// both succeed.
    pub async fn complete(
        db: &PgPool,
        registration_id: i64,
        user_id: i64,
        score: f64,
    ) -> sqlx::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE exam_registrations
            SET status = $4, score = $3
            WHERE id = $1 AND user_id = $2 AND status = $5
            "#,
        )
        .bind(registration_id)
        .bind(user_id)
        .bind(score)
        .bind(RegistrationStatus::Completed.as_str())
        .bind(RegistrationStatus::Started.as_str())
        .execute(db)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_user(db: &PgPool, user_id: i64) -> sqlx::Result<Vec<RegisteredExamRow>> {
        sqlx::query_as::<_, RegisteredExamRow>(
            r#"
            SELECT r.id AS registration_id,
                   e.id AS exam_id,
                   e.exam_name,
                   e.subject,
                   e.exam_date,
                   e.duration,
                   r.status,
                   r.score
            FROM exam_registrations r
            JOIN exams e ON e.id = r.exam_id
            WHERE r.user_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    /// (month, count) pairs for the given year; months with no
    /// registrations are absent and are zero-filled by the reporting layer.
    pub async fn monthly_counts(db: &PgPool, year: i32) -> sqlx::Result<Vec<(i32, i64)>> {
        sqlx::query_as::<_, (i32, i64)>(
            r#"
            SELECT CAST(EXTRACT(MONTH FROM created_at) AS INT4) AS month,
                   COUNT(*) AS count
            FROM exam_registrations
            WHERE CAST(EXTRACT(YEAR FROM created_at) AS INT4) = $1
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(year)
        .fetch_all(db)
        .await
    }

    /// Distinct registrants across all exams.
    pub async fn distinct_students(db: &PgPool) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT user_id) FROM exam_registrations")
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
            RegistrationStatus::Registered,
            RegistrationStatus::Started,
            RegistrationStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<RegistrationStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_an_error() {
        assert!("paused".parse::<RegistrationStatus>().is_err());
        assert!("REGISTERED".parse::<RegistrationStatus>().is_err());
    }
}
