// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, Question},
        quiz::{AttemptResult, AttemptStatus, NewAttempt, QuizAttempt, UserAnswers},
    },
    store::QuizStore,
    utils::mapping::AnswerMappings,
};

const QUESTION_COLUMNS: &str = "id, topic, content, answers, explanation, created_at";

const ATTEMPT_COLUMNS: &str = "id, user_id, question_ids, answer_mappings, user_answers, status, \
     score, correct_count, time_used, retry_count, started_at, completed_at";

/// Raw 'quiz_attempts' row. JSON columns decode straight into typed values, so a
/// stored mapping that is not a permutation fails here as a decode error.
#[derive(Debug, FromRow)]
struct AttemptRow {
    id: i64,
    user_id: String,
    question_ids: Json<Vec<i64>>,
    answer_mappings: Json<AnswerMappings>,
    user_answers: Option<Json<UserAnswers>>,
    status: String,
    score: Option<i32>,
    correct_count: Option<i32>,
    time_used: Option<i32>,
    retry_count: i32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<AttemptRow> for QuizAttempt {
    type Error = AppError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<AttemptStatus>().map_err(|e| {
            AppError::InternalServerError(format!("quiz_attempts row {}: {}", row.id, e))
        })?;

        Ok(QuizAttempt {
            id: row.id,
            user_id: row.user_id,
            question_ids: row.question_ids.0,
            answer_mappings: row.answer_mappings.0,
            user_answers: row.user_answers.map(|j| j.0),
            status,
            score: row.score,
            correct_count: row.correct_count,
            time_used: row.time_used,
            retry_count: row.retry_count,
            started_at: row.started_at,
            completed_at: row.completed_at,
        })
    }
}

/// `QuizStore` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn fetch_questions(&self, ids: &[i64]) -> Result<Vec<Question>, AppError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ANY($1)");
        let questions = sqlx::query_as::<_, Question>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch questions: {:?}", e);
                AppError::from(e)
            })?;

        Ok(questions)
    }

    async fn sample_questions(
        &self,
        topic: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Question>, AppError> {
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM questions \
             WHERE ($1::TEXT IS NULL OR topic = $1) \
             ORDER BY RANDOM() \
             LIMIT $2"
        );
        let questions = sqlx::query_as::<_, Question>(&sql)
            .bind(topic)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to sample questions: {:?}", e);
                AppError::from(e)
            })?;

        Ok(questions)
    }

    async fn list_questions(&self) -> Result<Vec<Question>, AppError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions ORDER BY id DESC");
        let questions = sqlx::query_as::<_, Question>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(questions)
    }

    async fn create_question(&self, req: CreateQuestionRequest) -> Result<Question, AppError> {
        let sql = format!(
            "INSERT INTO questions (topic, content, answers, explanation) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {QUESTION_COLUMNS}"
        );
        let question = sqlx::query_as::<_, Question>(&sql)
            .bind(&req.topic)
            .bind(&req.content)
            .bind(Json(&req.answers))
            .bind(&req.explanation)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create question: {:?}", e);
                AppError::from(e)
            })?;

        Ok(question)
    }

    async fn delete_question(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn fetch_attempt(&self, id: i64) -> Result<Option<QuizAttempt>, AppError> {
        let sql = format!("SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE id = $1");
        let row = sqlx::query_as::<_, AttemptRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch attempt {}: {:?}", id, e);
                AppError::from(e)
            })?;

        row.map(QuizAttempt::try_from).transpose()
    }

    async fn list_attempts(&self, user_id: &str) -> Result<Vec<QuizAttempt>, AppError> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts \
             WHERE user_id = $1 \
             ORDER BY started_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, AttemptRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(QuizAttempt::try_from).collect()
    }

    async fn create_attempt(&self, new: NewAttempt) -> Result<QuizAttempt, AppError> {
        let sql = format!(
            "INSERT INTO quiz_attempts (user_id, question_ids, answer_mappings, status, retry_count) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ATTEMPT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AttemptRow>(&sql)
            .bind(&new.user_id)
            .bind(Json(&new.question_ids))
            .bind(Json(&new.answer_mappings))
            .bind(AttemptStatus::InProgress.as_str())
            .bind(new.retry_count)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create quiz attempt: {:?}", e);
                AppError::from(e)
            })?;

        QuizAttempt::try_from(row)
    }

    async fn complete_attempt(
        &self,
        id: i64,
        result: AttemptResult,
    ) -> Result<Option<QuizAttempt>, AppError> {
        // Compare-and-swap on status: a concurrent second submission matches no row.
        let sql = format!(
            "UPDATE quiz_attempts SET \
                 user_answers = $2, \
                 score = $3, \
                 correct_count = $4, \
                 time_used = $5, \
                 completed_at = $6, \
                 status = $7 \
             WHERE id = $1 AND status = $8 \
             RETURNING {ATTEMPT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AttemptRow>(&sql)
            .bind(id)
            .bind(Json(&result.user_answers))
            .bind(result.score)
            .bind(result.correct_count)
            .bind(result.time_used)
            .bind(result.completed_at)
            .bind(AttemptStatus::Completed.as_str())
            .bind(AttemptStatus::InProgress.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to store result for attempt {}: {:?}", id, e);
                AppError::from(e)
            })?;

        row.map(QuizAttempt::try_from).transpose()
    }

    async fn delete_attempt(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM quiz_attempts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
