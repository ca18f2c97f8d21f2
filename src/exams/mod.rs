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
        .route("/exams/available", get(handlers::available_exams))
        .route("/exams/registered", get(handlers::registered_exams))
        .route("/exams/:exam_id/register", post(handlers::register_for_exam))
        .route("/exams/start/:registration_id", post(handlers::start_exam))
        .route(
            "/exams/complete/:registration_id",
            post(handlers::complete_exam),
        )
}
