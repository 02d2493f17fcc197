// src/activity.rs

use std::{collections::BTreeSet, sync::Arc};

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{PgPool, types::Json};

use crate::{error::AppError, models::question::Question};

pub type DynActivityTracker = Arc<dyn ActivityTracker>;

/// Emitted after a quiz is submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEvent {
    pub user_id: String,
    /// Distinct topics of the quiz's questions, sorted.
    pub question_topics: Vec<String>,
    pub correct_count: i32,
    pub duration_minutes: i32,
}

impl ActivityEvent {
    pub fn quiz_completed<'a>(
        user_id: &str,
        questions: impl IntoIterator<Item = &'a Question>,
        correct_count: i32,
        time_used_secs: i32,
    ) -> Self {
        let topics: BTreeSet<String> = questions.into_iter().map(|q| q.topic.clone()).collect();
        Self {
            user_id: user_id.to_string(),
            question_topics: topics.into_iter().collect(),
            correct_count,
            duration_minutes: (f64::from(time_used_secs) / 60.0).round() as i32,
        }
    }
}

/// Receives user activity. Callers log failures and carry on.
#[async_trait]
pub trait ActivityTracker: Send + Sync {
    async fn record(&self, event: ActivityEvent) -> Result<(), AppError>;
}

/// Appends events to the 'user_activity' table.
#[derive(Clone)]
pub struct PgActivityTracker {
    pool: PgPool,
}

impl PgActivityTracker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityTracker for PgActivityTracker {
    async fn record(&self, event: ActivityEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_activity (user_id, activity_type, question_topics, correct_count, duration_minutes)
            VALUES ($1, 'quiz', $2, $3, $4)
            "#,
        )
        .bind(&event.user_id)
        .bind(Json(&event.question_topics))
        .bind(event.correct_count)
        .bind(event.duration_minutes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Writes events to the log only. Paired with the in-memory store.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogActivityTracker;

#[async_trait]
impl ActivityTracker for LogActivityTracker {
    async fn record(&self, event: ActivityEvent) -> Result<(), AppError> {
        tracing::info!(
            user_id = %event.user_id,
            topics = ?event.question_topics,
            correct_count = event.correct_count,
            duration_minutes = event.duration_minutes,
            "Quiz activity"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::AnswerOption;

    fn question(topic: &str) -> Question {
        Question {
            id: 0,
            topic: topic.to_string(),
            content: String::new(),
            answers: Json(vec![AnswerOption { content: "x".into(), is_correct: true }]),
            explanation: None,
            created_at: None,
        }
    }

    #[test]
    fn test_event_dedups_topics_and_rounds_minutes() {
        let questions = [question("sql"), question("rust"), question("sql")];
        let event = ActivityEvent::quiz_completed("u1", &questions, 2, 150);

        assert_eq!(event.question_topics, vec!["rust", "sql"]);
        assert_eq!(event.duration_minutes, 3);
        assert_eq!(event.correct_count, 2);
    }

    #[test]
    fn test_short_quiz_rounds_down() {
        let event = ActivityEvent::quiz_completed("u1", &[question("rust")], 1, 29);
        assert_eq!(event.duration_minutes, 0);
    }

    #[tokio::test]
    async fn test_log_tracker_accepts_events() {
        let event = ActivityEvent::quiz_completed("u1", &[question("rust")], 1, 60);
        assert!(LogActivityTracker.record(event).await.is_ok());
    }
}
