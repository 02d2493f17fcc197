// src/store/mod.rs

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, Question},
        quiz::{AttemptResult, NewAttempt, QuizAttempt},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub type DynStore = Arc<dyn QuizStore>;

/// Persistence for questions and quiz attempts.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Questions with the given ids, in no particular order. Unknown ids are skipped.
    async fn fetch_questions(&self, ids: &[i64]) -> Result<Vec<Question>, AppError>;

    /// Up to `limit` random questions, optionally restricted to one topic.
    async fn sample_questions(
        &self,
        topic: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Question>, AppError>;

    async fn list_questions(&self) -> Result<Vec<Question>, AppError>;

    async fn create_question(&self, req: CreateQuestionRequest) -> Result<Question, AppError>;

    /// Returns false when nothing was deleted.
    async fn delete_question(&self, id: i64) -> Result<bool, AppError>;

    async fn fetch_attempt(&self, id: i64) -> Result<Option<QuizAttempt>, AppError>;

    /// The user's attempts, newest first.
    async fn list_attempts(&self, user_id: &str) -> Result<Vec<QuizAttempt>, AppError>;

    async fn create_attempt(&self, new: NewAttempt) -> Result<QuizAttempt, AppError>;

    /// Stores the graded result and marks the attempt completed, but only if it
    /// is still in progress. `None` means it was already completed (or is gone).
    async fn complete_attempt(
        &self,
        id: i64,
        result: AttemptResult,
    ) -> Result<Option<QuizAttempt>, AppError>;

    /// Returns false when nothing was deleted.
    async fn delete_attempt(&self, id: i64) -> Result<bool, AppError>;
}
