use axum::{extract::State, Json};
use tracing::{info, instrument, warn};

use super::{
    dto::{CreatePaymentRequest, CreatedPaymentResponse, PaymentResponse, PaymentStatsResponse},
    repo::{Payment, PaymentStatus},
};
use crate::{auth::extractors::CurrentUser, error::AppError, state::AppState};

/// Creates the payment and settles it as paid in one request. There is no
/// external gateway in this flow; the client is trusted.
#[instrument(skip(state, user, payload), fields(user_id))]
pub async fn create_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<Json<CreatedPaymentResponse>, AppError> {
    tracing::Span::current().record("user_id", user.id);

    if payload.amount <= 0.0 {
        return Err(AppError::bad_request("Amount must be positive"));
    }
    if payload.payment_method.trim().is_empty() {
        return Err(AppError::bad_request("Payment method is required"));
    }

    let payment = Payment::create(
        &state.db,
        user.id,
        payload.exam_id,
        payload.amount,
        payload.payment_method.trim(),
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(d) if d.is_foreign_key_violation() => {
            warn!(exam_id = payload.exam_id, "payment for unknown exam");
            AppError::bad_request("Failed to create payment")
        }
        _ => AppError::from(e),
    })?;

    let settled = Payment::settle(&state.db, payment.id, PaymentStatus::Paid).await?;
    if !settled {
        // Freshly inserted as pending; losing this swap means someone else
        // already settled the row.
        return Err(AppError::Internal(anyhow::anyhow!(
            "payment {} already settled",
            payment.id
        )));
    }

    info!(payment_id = payment.id, amount = payment.amount, "payment settled as paid");
    Ok(Json(CreatedPaymentResponse::from_settled(
        payment,
        PaymentStatus::Paid.as_str(),
    )))
}

#[instrument(skip(state, user), fields(user_id))]
pub async fn user_payments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    tracing::Span::current().record("user_id", user.id);
    let payments = Payment::list_for_user(&state.db, user.id).await?;
    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}

#[instrument(skip(state, _user))]
pub async fn all_payments(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    let payments = Payment::list_all(&state.db).await?;
    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}

#[instrument(skip(state, _user))]
pub async fn payment_stats(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<PaymentStatsResponse>, AppError> {
    let total_revenue = Payment::total_revenue(&state.db).await?;
    let paid_invoices = Payment::count_by_status(&state.db, PaymentStatus::Paid).await?;
    let pending_invoices = Payment::count_by_status(&state.db, PaymentStatus::Pending).await?;
    Ok(Json(PaymentStatsResponse {
        total_revenue,
        paid_invoices,
        pending_invoices,
    }))
}
