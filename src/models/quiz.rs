// src/models/quiz.rs

use std::{collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::mapping::AnswerMappings;

/// Lifecycle of an attempt. The only transition is `InProgress -> Completed`, on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Completed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttemptStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(AttemptStatus::InProgress),
            "completed" => Ok(AttemptStatus::Completed),
            other => Err(format!("unknown attempt status '{}'", other)),
        }
    }
}

/// Selected shown positions per question id, exactly as the client sent them.
pub type UserAnswers = HashMap<i64, Vec<i64>>;

/// One user's run through a set of questions ('quiz_attempts' table).
#[derive(Debug, Clone, PartialEq)]
pub struct QuizAttempt {
    pub id: i64,
    /// Subject of the identity provider's token.
    pub user_id: String,
    /// Questions in the order they are displayed.
    pub question_ids: Vec<i64>,
    pub answer_mappings: AnswerMappings,
    /// Shown positions the user selected; set on submission.
    pub user_answers: Option<UserAnswers>,
    pub status: AttemptStatus,
    pub score: Option<i32>,
    pub correct_count: Option<i32>,
    /// Seconds the user spent, as reported by the client.
    pub time_used: Option<i32>,
    pub retry_count: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl QuizAttempt {
    pub fn is_completed(&self) -> bool {
        self.status == AttemptStatus::Completed
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// The attempt as it looks once `result` has been stored.
    pub fn completed_with(mut self, result: &AttemptResult) -> Self {
        self.user_answers = Some(result.user_answers.clone());
        self.score = Some(result.score);
        self.correct_count = Some(result.correct_count);
        self.time_used = Some(result.time_used);
        self.completed_at = Some(result.completed_at);
        self.status = AttemptStatus::Completed;
        self
    }
}

/// Everything needed to insert a fresh attempt.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub user_id: String,
    pub question_ids: Vec<i64>,
    pub answer_mappings: AnswerMappings,
    pub retry_count: i32,
}

/// Graded submission, written in one update.
#[derive(Debug, Clone)]
pub struct AttemptResult {
    pub user_answers: UserAnswers,
    pub score: i32,
    pub correct_count: i32,
    pub time_used: i32,
    pub completed_at: DateTime<Utc>,
}

/// DTO for starting a quiz. Either explicit question ids or a (topic, count) sample.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartQuizRequest {
    #[validate(length(min = 1, max = 100))]
    pub topic: Option<String>,
    #[validate(range(min = 1, max = 50))]
    pub question_count: Option<u32>,
    #[validate(length(min = 1, max = 50))]
    pub question_ids: Option<Vec<i64>>,
}

/// One question's selection, in shown positions.
/// A missing or null `answerIndex` is no selection; negative picks grade as wrong.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub question_id: i64,
    #[serde(default)]
    pub answer_index: Option<Vec<i64>>,
}

/// DTO for submitting a quiz attempt. Every field may be missing or null.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    #[serde(default)]
    pub user_answers: Option<Vec<UserAnswer>>,
    /// Seconds spent on the quiz, possibly fractional.
    #[serde(default)]
    pub time_used: Option<f64>,
}

impl SubmitQuizRequest {
    pub fn answers(&self) -> &[UserAnswer] {
        self.user_answers.as_deref().unwrap_or_default()
    }

    /// Whole seconds, clamped to `0..=i32::MAX`.
    pub fn seconds_used(&self) -> i32 {
        // NaN survives clamp and saturates to 0 in the cast.
        self.time_used
            .unwrap_or(0.0)
            .round()
            .clamp(0.0, f64::from(i32::MAX)) as i32
    }
}

/// An answer as displayed; `is_correct` only once the attempt is completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerView {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: i64,
    pub topic: String,
    pub content: String,
    pub answers: Vec<AnswerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Shown positions the user picked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

/// Full attempt as returned by `GET /api/quiz/{id}` and the start/retry endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptView {
    pub id: i64,
    pub status: AttemptStatus,
    pub score: Option<i32>,
    pub correct_count: Option<i32>,
    pub total_questions: usize,
    pub time_used: Option<i32>,
    pub retry_count: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub questions: Vec<QuestionView>,
}

/// Result of `POST /api/quiz/{id}/submit`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub score: i32,
    pub correct_count: usize,
    pub total_questions: usize,
    pub questions: Vec<QuestionView>,
}

/// List item for `GET /api/quiz`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub id: i64,
    pub status: AttemptStatus,
    pub score: Option<i32>,
    pub total_questions: usize,
    pub retry_count: i32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&QuizAttempt> for AttemptSummary {
    fn from(a: &QuizAttempt) -> Self {
        Self {
            id: a.id,
            status: a.status,
            score: a.score,
            total_questions: a.question_ids.len(),
            retry_count: a.retry_count,
            started_at: a.started_at,
            completed_at: a.completed_at,
        }
    }
}
