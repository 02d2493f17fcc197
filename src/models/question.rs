// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// One answer choice. Its position in `Question::answers` is its canonical index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub content: String,
    pub is_correct: bool,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Interview topic (e.g. "rust", "system-design"). Used for sampling and activity tracking.
    pub topic: String,

    /// The prompt shown to the user.
    pub content: String,

    /// Answer options in canonical order, stored as a JSON array.
    pub answers: Json<Vec<AnswerOption>>,

    pub explanation: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Question {
    /// Canonical indices of every option flagged correct.
    pub fn correct_indices(&self) -> Vec<usize> {
        self.answers
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_correct)
            .map(|(i, _)| i)
            .collect()
    }
}

/// DTO for creating a new question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 100))]
    pub topic: String,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[validate(custom(function = validate_answers))]
    pub answers: Vec<AnswerOption>,
    #[validate(length(max = 4000))]
    pub explanation: Option<String>,
}

fn validate_answers(answers: &[AnswerOption]) -> Result<(), validator::ValidationError> {
    if answers.len() < 2 {
        return Err(validator::ValidationError::new("at_least_two_answers"));
    }
    if answers.len() > 10 {
        return Err(validator::ValidationError::new("too_many_answers"));
    }
    for answer in answers {
        if answer.content.trim().is_empty() || answer.content.len() > 500 {
            return Err(validator::ValidationError::new("invalid_answer_content"));
        }
    }
    if !answers.iter().any(|a| a.is_correct) {
        return Err(validator::ValidationError::new("no_correct_answer"));
    }
    Ok(())
}
