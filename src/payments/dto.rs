use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};

use super::repo::{Payment, PaymentWithStudent};

pub(crate) fn payment_day(at: OffsetDateTime) -> String {
    at.date()
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub exam_id: i64,
    pub amount: f64,
    pub payment_method: String,
}

/// The payment as returned right after creation (already settled).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPaymentResponse {
    pub id: i64,
    pub exam_id: i64,
    pub amount: f64,
    pub payment_method: String,
    pub status: String,
    pub date: String,
}

impl CreatedPaymentResponse {
    pub fn from_settled(payment: Payment, status: &str) -> Self {
        Self {
            id: payment.id,
            exam_id: payment.exam_id,
            amount: payment.amount,
            payment_method: payment.payment_method,
            status: status.to_string(),
            date: payment_day(payment.payment_date),
        }
    }
}

/// Payment list entry shown on invoices, joined with the student name.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub student_name: String,
    pub amount: f64,
    pub date: String,
    pub status: String,
}

impl From<PaymentWithStudent> for PaymentResponse {
    fn from(p: PaymentWithStudent) -> Self {
        Self {
            student_name: p.student_name,
            amount: p.amount,
            date: payment_day(p.payment_date),
            status: p.status,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatsResponse {
    pub total_revenue: f64,
    pub paid_invoices: i64,
    pub pending_invoices: i64,
}
