// src/handlers/quiz.rs

use std::collections::{HashMap, HashSet};

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    activity::{ActivityEvent, DynActivityTracker},
    config::DEFAULT_QUESTION_COUNT,
    error::AppError,
    models::{
        question::Question,
        quiz::{
            AttemptResult, AttemptSummary, NewAttempt, QuizAttempt, StartQuizRequest,
            SubmitQuizRequest, SubmitResponse, UserAnswers,
        },
    },
    store::DynStore,
    utils::{
        grading::grade_attempt,
        json::Json,
        jwt::Claims,
        mapping::AnswerMappings,
        presentation::{present_questions, render_attempt},
    },
};

fn index_questions(questions: Vec<Question>) -> HashMap<i64, Question> {
    questions.into_iter().map(|q| (q.id, q)).collect()
}

async fn find_attempt(store: &DynStore, id: i64) -> Result<QuizAttempt, AppError> {
    store
        .fetch_attempt(id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Loads an attempt the caller wants to change. Someone else's attempt is 403.
async fn find_owned_attempt(
    store: &DynStore,
    id: i64,
    user_id: &str,
) -> Result<QuizAttempt, AppError> {
    let attempt = find_attempt(store, id).await?;
    if !attempt.is_owned_by(user_id) {
        return Err(AppError::Forbidden(
            "You do not have access to this quiz".to_string(),
        ));
    }
    Ok(attempt)
}

/// Shuffles every question's answers and stores the new attempt.
async fn begin_attempt(
    store: &DynStore,
    user_id: &str,
    questions: &[Question],
    retry_count: i32,
) -> Result<QuizAttempt, AppError> {
    let answer_mappings = AnswerMappings::generate(
        questions.iter().map(|q| (q.id, q.answers.len())),
        &mut rand::thread_rng(),
    );

    store
        .create_attempt(NewAttempt {
            user_id: user_id.to_string(),
            question_ids: questions.iter().map(|q| q.id).collect(),
            answer_mappings,
            retry_count,
        })
        .await
}

/// Starts a quiz.
///
/// * Picks explicit `questionIds` (all must exist) or samples `questionCount` by `topic`.
/// * Persists a shuffled answer order per question.
/// * Returns the attempt in shuffled order, without correctness.
pub async fn start_quiz(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let user_id = claims.user_id()?;

    let questions: Vec<Question> = match &req.question_ids {
        Some(ids) => {
            let mut ids = ids.clone();
            let mut seen = HashSet::new();
            ids.retain(|id| seen.insert(*id));

            let mut found = index_questions(store.fetch_questions(&ids).await?);
            if found.len() != ids.len() {
                return Err(AppError::NotFound("Question not found".to_string()));
            }
            ids.iter().filter_map(|id| found.remove(id)).collect()
        }
        None => {
            let limit = req
                .question_count
                .map(i64::from)
                .unwrap_or(DEFAULT_QUESTION_COUNT);
            store.sample_questions(req.topic.as_deref(), limit).await?
        }
    };

    if questions.is_empty() {
        return Err(AppError::NotFound(
            "No questions available for this quiz".to_string(),
        ));
    }

    let attempt = begin_attempt(&store, user_id, &questions, 0).await?;
    tracing::info!(
        attempt_id = attempt.id,
        user_id,
        questions = questions.len(),
        "Quiz started"
    );

    let view = render_attempt(&attempt, &index_questions(questions))?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Lists the caller's attempts, newest first.
pub async fn list_attempts(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let attempts = store.list_attempts(user_id).await?;

    let summaries: Vec<AttemptSummary> = attempts.iter().map(AttemptSummary::from).collect();
    Ok(Json(summaries))
}

/// Returns one attempt with answers in the order the user saw them.
/// Correctness is revealed only after submission. Other users' attempts are 404.
pub async fn get_attempt(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let attempt = find_attempt(&store, id).await?;
    if !attempt.is_owned_by(user_id) {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    let questions = index_questions(store.fetch_questions(&attempt.question_ids).await?);
    Ok(Json(render_attempt(&attempt, &questions)?))
}

/// Keeps the first entry per question, and only questions on the attempt.
fn collect_answers(attempt: &QuizAttempt, req: &SubmitQuizRequest) -> UserAnswers {
    let mut answers = UserAnswers::new();
    for ua in req.answers() {
        if !attempt.question_ids.contains(&ua.question_id) {
            tracing::debug!(
                attempt_id = attempt.id,
                question_id = ua.question_id,
                "Ignoring answer for question not on this attempt"
            );
            continue;
        }
        answers
            .entry(ua.question_id)
            .or_insert_with(|| ua.answer_index.clone().unwrap_or_default());
    }
    answers
}

/// Submits a quiz attempt.
///
/// * Translates shown positions to canonical ones and grades by set equality.
/// * Stores answers, score and timing in one update, only if still in progress (409 otherwise).
/// * Notifies the activity tracker in the background; its failures are only logged.
pub async fn submit_quiz(
    State(store): State<DynStore>,
    State(activity): State<DynActivityTracker>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(req): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let attempt = find_owned_attempt(&store, id, user_id).await?;
    if attempt.is_completed() {
        return Err(AppError::Conflict(
            "Quiz has already been submitted".to_string(),
        ));
    }

    let questions = index_questions(store.fetch_questions(&attempt.question_ids).await?);
    let user_answers = collect_answers(&attempt, &req);
    let grading = grade_attempt(
        &attempt.question_ids,
        &questions,
        &attempt.answer_mappings,
        &user_answers,
    );

    let result = AttemptResult {
        user_answers,
        score: grading.score,
        correct_count: grading.correct_count as i32,
        time_used: req.seconds_used(),
        completed_at: Utc::now(),
    };

    // Render before writing so a broken mapping leaves the attempt untouched.
    let completed = attempt.completed_with(&result);
    let question_views = present_questions(&completed, &questions, Some(&grading))?;

    let time_used = result.time_used;
    store
        .complete_attempt(id, result)
        .await?
        .ok_or(AppError::Conflict(
            "Quiz has already been submitted".to_string(),
        ))?;

    tracing::info!(
        attempt_id = id,
        user_id,
        score = grading.score,
        correct = grading.correct_count,
        total = grading.total_questions,
        "Quiz submitted"
    );

    let event = ActivityEvent::quiz_completed(
        user_id,
        completed.question_ids.iter().filter_map(|q| questions.get(q)),
        grading.correct_count as i32,
        time_used,
    );
    tokio::spawn(async move {
        if let Err(e) = activity.record(event).await {
            tracing::error!("Failed to record quiz activity for attempt {}: {}", id, e);
        }
    });

    Ok(Json(SubmitResponse {
        score: grading.score,
        correct_count: grading.correct_count,
        total_questions: grading.total_questions,
        questions: question_views,
    }))
}

/// Starts a new attempt over the same questions with a fresh shuffle.
pub async fn retry_quiz(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let source = find_owned_attempt(&store, id, user_id).await?;

    let mut found = index_questions(store.fetch_questions(&source.question_ids).await?);
    let questions: Vec<Question> = source
        .question_ids
        .iter()
        .filter_map(|q| found.remove(q))
        .collect();
    if questions.is_empty() {
        return Err(AppError::NotFound(
            "No questions available for this quiz".to_string(),
        ));
    }

    let attempt = begin_attempt(&store, user_id, &questions, source.retry_count + 1).await?;
    tracing::info!(
        attempt_id = attempt.id,
        retried_from = id,
        retry_count = attempt.retry_count,
        "Quiz retried"
    );

    let view = render_attempt(&attempt, &index_questions(questions))?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Deletes one of the caller's attempts.
pub async fn delete_attempt(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    find_owned_attempt(&store, id, user_id).await?;

    if !store.delete_attempt(id).await? {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
