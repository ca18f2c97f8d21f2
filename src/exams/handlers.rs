use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{CompleteExamRequest, ExamResponse, SuccessResponse, UserExamResponse},
    repo::{Exam, ExamRegistration},
};
use crate::{auth::extractors::CurrentUser, error::AppError, state::AppState};

#[instrument(skip(state, _user))]
pub async fn available_exams(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<ExamResponse>>, AppError> {
    let exams = Exam::list_available(&state.db).await?;
    Ok(Json(exams.into_iter().map(ExamResponse::from).collect()))
}

#[instrument(skip(state, user), fields(user_id))]
pub async fn registered_exams(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<UserExamResponse>>, AppError> {
    tracing::Span::current().record("user_id", user.id);
    let rows = ExamRegistration::list_for_user(&state.db, user.id).await?;
    let items = rows
        .into_iter()
        .map(UserExamResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

#[instrument(skip(state, user), fields(user_id))]
pub async fn register_for_exam(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(exam_id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    tracing::Span::current().record("user_id", user.id);

    let registration = ExamRegistration::create(&state.db, user.id, exam_id)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(d) if d.is_unique_violation() => {
                warn!(exam_id, "duplicate registration");
                AppError::bad_request("Already registered for this exam")
            }
            sqlx::Error::Database(d) if d.is_foreign_key_violation() => {
                warn!(exam_id, "registration for unknown exam");
                AppError::bad_request("Failed to register for exam")
            }
            _ => AppError::from(e),
        })?;

    info!(registration_id = registration.id, exam_id, "registered for exam");
    Ok(Json(SuccessResponse::new("Successfully registered for exam")))
}

#[instrument(skip(state, user), fields(user_id))]
pub async fn start_exam(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(registration_id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    tracing::Span::current().record("user_id", user.id);

    // Unknown id, foreign registration and wrong current status all look
    // the same from outside.
    let started = ExamRegistration::start(&state.db, registration_id, user.id).await?;
    if !started {
        warn!(registration_id, "start exam refused");
        return Err(AppError::bad_request("Failed to start exam"));
    }

    info!(registration_id, "exam started");
    Ok(Json(SuccessResponse::new("Exam started successfully")))
}

#[instrument(skip(state, user, payload), fields(user_id))]
pub async fn complete_exam(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(registration_id): Path<i64>,
    Json(payload): Json<CompleteExamRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    tracing::Span::current().record("user_id", user.id);

    let completed =
        ExamRegistration::complete(&state.db, registration_id, user.id, payload.score).await?;
    if !completed {
        warn!(registration_id, "complete exam refused");
        return Err(AppError::bad_request(
            "Failed to complete exam. Registration not found for this user.",
        ));
    }

    info!(registration_id, score = payload.score, "exam completed");
    Ok(Json(SuccessResponse::new("Exam completed successfully")))
}
