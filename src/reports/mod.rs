use axum::{routing::get, Router};

use crate::state::AppState;

mod dto;
mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(handlers::dashboard_stats))
        .route("/reports/monthly-stats", get(handlers::monthly_stats))
}
