use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStatsResponse {
    pub total_exams: i64,
    pub total_students: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct MonthlyStatsResponse {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyStatsQuery {
    pub year: Option<i32>,
}
