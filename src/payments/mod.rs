use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
mod handlers;
pub(crate) mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments/create", post(handlers::create_payment))
        .route("/payments", get(handlers::user_payments))
        .route("/payments/all", get(handlers::all_payments))
        .route("/payments/stats", get(handlers::payment_stats))
}
