use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date};

use super::repo::{Exam, RegisteredExamRow, RegistrationStatus};

pub(crate) fn yyyy_mm_dd(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// Catalog entry as shown to clients; the date is a plain yyyy-MM-dd string.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResponse {
    pub id: i64,
    pub exam_name: String,
    pub subject: String,
    pub exam_date: String,
    pub duration: String,
}

impl From<Exam> for ExamResponse {
    fn from(e: Exam) -> Self {
        Self {
            id: e.id,
            exam_name: e.exam_name,
            subject: e.subject,
            exam_date: yyyy_mm_dd(e.exam_date),
            duration: e.duration,
        }
    }
}

/// One of the caller's registrations, joined with exam display fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserExamResponse {
    pub exam_id: i64,
    pub exam_name: String,
    pub subject: String,
    pub date: String,
    pub duration: String,
    pub status: String,
    pub registration_id: i64,
    pub score: Option<f64>,
}

impl TryFrom<RegisteredExamRow> for UserExamResponse {
    type Error = anyhow::Error;

    /// A stored status outside the lifecycle is a data bug, not something
    /// to pass through to clients.
    fn try_from(r: RegisteredExamRow) -> Result<Self, Self::Error> {
        let status = r.status.parse::<RegistrationStatus>()?;
        Ok(Self {
            exam_id: r.exam_id,
            exam_name: r.exam_name,
            subject: r.subject,
            date: yyyy_mm_dd(r.exam_date),
            duration: r.duration,
            status: status.as_str().to_string(),
            registration_id: r.registration_id,
            score: r.score,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CompleteExamRequest {
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

impl SuccessResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn dates_render_as_yyyy_mm_dd() {
        assert_eq!(yyyy_mm_dd(date!(2024 - 03 - 07)), "2024-03-07");
        assert_eq!(yyyy_mm_dd(date!(2025 - 11 - 30)), "2025-11-30");
    }

    fn sample_row(status: &str) -> RegisteredExamRow {
        RegisteredExamRow {
            registration_id: 42,
            exam_id: 1,
            exam_name: "Mathematics Final".into(),
            subject: "Mathematics".into(),
            exam_date: date!(2024 - 06 - 15),
            duration: "120 min".into(),
            status: status.into(),
            score: Some(87.5),
        }
    }

    #[test]
    fn registered_exam_shape() {
        let response = UserExamResponse::try_from(sample_row("completed")).expect("convert");
        let json = serde_json::to_value(response).expect("serialize");
        assert_eq!(json["examId"], 1);
        assert_eq!(json["registrationId"], 42);
        assert_eq!(json["date"], "2024-06-15");
        assert_eq!(json["status"], "completed");
        assert_eq!(json["score"], 87.5);
    }

    #[test]
    fn row_with_unknown_status_is_rejected() {
        assert!(UserExamResponse::try_from(sample_row("archived")).is_err());
        assert!(UserExamResponse::try_from(sample_row("Completed")).is_err());
    }
}
