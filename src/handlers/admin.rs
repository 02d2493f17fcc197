// src/handlers/admin.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::question::CreateQuestionRequest,
    store::DynStore,
    utils::{html::clean_question, json::Json},
};

/// Lists the question bank, newest first.
/// Admin only.
pub async fn list_questions(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    let questions = store.list_questions().await?;
    Ok(Json(questions))
}

/// Creates a new question. Text fields are sanitized first, so validation
/// sees what will actually be stored.
/// Admin only.
pub async fn create_question(
    State(store): State<DynStore>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let payload = clean_question(payload);
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = store.create_question(payload).await?;
    tracing::info!(question_id = question.id, topic = %question.topic, "Question created");

    Ok((StatusCode::CREATED, Json(question)))
}

/// Deletes a question. Attempts that used it grade it as incorrect from then on.
/// Admin only.
pub async fn delete_question(
    State(store): State<DynStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_question(id).await? {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
