// src/store/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use sqlx::types::Json;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, Question},
        quiz::{AttemptResult, AttemptStatus, NewAttempt, QuizAttempt},
    },
    store::QuizStore,
};

#[derive(Default)]
struct Tables {
    questions: BTreeMap<i64, Question>,
    attempts: BTreeMap<i64, QuizAttempt>,
    last_question_id: i64,
    last_attempt_id: i64,
}

/// Process-local `QuizStore`. Used by the test-suite and when no DATABASE_URL is configured.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn fetch_questions(&self, ids: &[i64]) -> Result<Vec<Question>, AppError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.questions.get(id).cloned())
            .collect())
    }

    async fn sample_questions(
        &self,
        topic: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Question>, AppError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<Question> = tables
            .questions
            .values()
            .filter(|q| topic.is_none_or(|t| q.topic == t))
            .cloned()
            .collect();
        matching.shuffle(&mut rand::thread_rng());
        matching.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(matching)
    }

    async fn list_questions(&self) -> Result<Vec<Question>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.questions.values().rev().cloned().collect())
    }

    async fn create_question(&self, req: CreateQuestionRequest) -> Result<Question, AppError> {
        let mut tables = self.tables.write().await;
        tables.last_question_id += 1;
        let question = Question {
            id: tables.last_question_id,
            topic: req.topic,
            content: req.content,
            answers: Json(req.answers),
            explanation: req.explanation,
            created_at: Some(Utc::now()),
        };
        tables.questions.insert(question.id, question.clone());
        Ok(question)
    }

    async fn delete_question(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.questions.remove(&id).is_some())
    }

    async fn fetch_attempt(&self, id: i64) -> Result<Option<QuizAttempt>, AppError> {
        Ok(self.tables.read().await.attempts.get(&id).cloned())
    }

    async fn list_attempts(&self, user_id: &str) -> Result<Vec<QuizAttempt>, AppError> {
        let tables = self.tables.read().await;
        let mut attempts: Vec<QuizAttempt> = tables
            .attempts
            .values()
            .filter(|a| a.is_owned_by(user_id))
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(b.id.cmp(&a.id)));
        Ok(attempts)
    }

    async fn create_attempt(&self, new: NewAttempt) -> Result<QuizAttempt, AppError> {
        let mut tables = self.tables.write().await;
        tables.last_attempt_id += 1;
        let attempt = QuizAttempt {
            id: tables.last_attempt_id,
            user_id: new.user_id,
            question_ids: new.question_ids,
            answer_mappings: new.answer_mappings,
            user_answers: None,
            status: AttemptStatus::InProgress,
            score: None,
            correct_count: None,
            time_used: None,
            retry_count: new.retry_count,
            started_at: Utc::now(),
            completed_at: None,
        };
        tables.attempts.insert(attempt.id, attempt.clone());
        Ok(attempt)
    }

    async fn complete_attempt(
        &self,
        id: i64,
        result: AttemptResult,
    ) -> Result<Option<QuizAttempt>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(attempt) = tables.attempts.get_mut(&id) else {
            return Ok(None);
        };
        if attempt.is_completed() {
            return Ok(None);
        }
        *attempt = attempt.clone().completed_with(&result);
        Ok(Some(attempt.clone()))
    }

    async fn delete_attempt(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.write().await.attempts.remove(&id).is_some())
    }
}
