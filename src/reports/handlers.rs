use axum::{
    extract::{Query, State},
    Json,
};
use time::OffsetDateTime;
use tracing::instrument;

use super::dto::{DashboardStatsResponse, MonthlyStatsQuery, MonthlyStatsResponse};
use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    exams::repo::{Exam, ExamRegistration},
    state::AppState,
};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Normalizes sparse (month, count) rows into twelve entries, Jan..Dec,
/// with zeros where no registrations exist.
pub(crate) fn fill_months(counts: &[(i32, i64)]) -> Vec<MonthlyStatsResponse> {
    MONTHS
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let month = (i + 1) as i32;
            let count = counts
                .iter()
                .find(|(m, _)| *m == month)
                .map(|(_, c)| *c)
                .unwrap_or(0);
            MonthlyStatsResponse {
                month: (*name).to_string(),
                count,
            }
        })
        .collect()
}

#[instrument(skip(state, _user))]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<DashboardStatsResponse>, AppError> {
    let total_exams = Exam::count(&state.db).await?;
    let total_students = ExamRegistration::distinct_students(&state.db).await?;
    Ok(Json(DashboardStatsResponse {
        total_exams,
        total_students,
    }))
}

#[instrument(skip(state, _user))]
pub async fn monthly_stats(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<MonthlyStatsQuery>,
) -> Result<Json<Vec<MonthlyStatsResponse>>, AppError> {
    let year = query
        .year
        .unwrap_or_else(|| OffsetDateTime::now_utc().year());
    let counts = ExamRegistration::monthly_counts(&state.db, year).await?;
    Ok(Json(fill_months(&counts)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_year_is_twelve_zeroes() {
        let stats = fill_months(&[]);
        assert_eq!(stats.len(), 12);
        assert!(stats.iter().all(|s| s.count == 0));
        assert_eq!(stats[0].month, "Jan");
        assert_eq!(stats[11].month, "Dec");
    }

    #[test]
    fn sparse_months_are_zero_filled() {
        // Registrations only in March and November.
        let stats = fill_months(&[(3, 5), (11, 2)]);
        assert_eq!(stats.len(), 12);
        assert_eq!(stats[2], MonthlyStatsResponse { month: "Mar".into(), count: 5 });
        assert_eq!(stats[10], MonthlyStatsResponse { month: "Nov".into(), count: 2 });
        assert_eq!(stats.iter().filter(|s| s.count == 0).count(), 10);
    }

    #[test]
    fn months_stay_in_calendar_order() {
        let stats = fill_months(&[(12, 1), (1, 4)]);
        assert_eq!(stats[0], MonthlyStatsResponse { month: "Jan".into(), count: 4 });
        assert_eq!(stats[11], MonthlyStatsResponse { month: "Dec".into(), count: 1 });
    }
}
