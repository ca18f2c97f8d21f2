use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod dto;
pub(crate) mod extractors;
mod handlers;
pub(crate) mod jwt;
mod password;
pub(crate) mod repo;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(handlers::register))
        .route("/users/login", post(handlers::login))
        .route("/users/profile", get(handlers::profile))
}
