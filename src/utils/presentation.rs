// src/utils/presentation.rs

use std::collections::HashMap;

use crate::{
    error::AppError,
    models::{
        question::Question,
        quiz::{AnswerView, AttemptView, QuestionView, QuizAttempt},
    },
    utils::grading::{GradingResult, grade_attempt},
};

/// Builds the client view of an attempt, answers in the order the user saw them.
///
/// Completed attempts are re-graded from the stored answers so every re-fetch
/// carries the same correctness flags. `score`, `correctCount` and
/// `totalQuestions` always come from the stored result. A question deleted
/// after submission drops out of `questions` while still counting in those totals.
pub fn render_attempt(
    attempt: &QuizAttempt,
    questions: &HashMap<i64, Question>,
) -> Result<AttemptView, AppError> {
    let grading = attempt.user_answers.as_ref().filter(|_| attempt.is_completed()).map(|answers| {
        grade_attempt(&attempt.question_ids, questions, &attempt.answer_mappings, answers)
    });

    Ok(AttemptView {
        id: attempt.id,
        status: attempt.status,
        score: attempt.score,
        correct_count: attempt.correct_count,
        total_questions: attempt.question_ids.len(),
        time_used: attempt.time_used,
        retry_count: attempt.retry_count,
        started_at: attempt.started_at,
        completed_at: attempt.completed_at,
        questions: present_questions(attempt, questions, grading.as_ref())?,
    })
}

/// Renders every question still present in the store, in attempt order.
/// Correctness, explanations and the user's picks are only included with a grading.
pub fn present_questions(
    attempt: &QuizAttempt,
    questions: &HashMap<i64, Question>,
    grading: Option<&GradingResult>,
) -> Result<Vec<QuestionView>, AppError> {
    attempt
        .question_ids
        .iter()
        .filter_map(|id| questions.get(id))
        .map(|q| present_question(attempt, q, grading))
        .collect()
}

fn present_question(
    attempt: &QuizAttempt,
    question: &Question,
    grading: Option<&GradingResult>,
) -> Result<QuestionView, AppError> {
    let revealed = grading.is_some();

    let canonical: Vec<AnswerView> = question
        .answers
        .iter()
        .map(|a| AnswerView {
            content: a.content.clone(),
            is_correct: revealed.then_some(a.is_correct),
        })
        .collect();

    let answers = attempt
        .answer_mappings
        .present(question.id, &canonical)
        .map_err(|e| {
            AppError::InternalServerError(format!(
                "Inconsistent answer mapping for attempt {} question {}: {}",
                attempt.id, question.id, e
            ))
        })?;

    let user_answer = revealed.then(|| {
        attempt
            .user_answers
            .as_ref()
            .and_then(|ua| ua.get(&question.id))
            .cloned()
            .unwrap_or_default()
    });

    Ok(QuestionView {
        id: question.id,
        topic: question.topic.clone(),
        content: question.content.clone(),
        answers,
        explanation: if revealed { question.explanation.clone() } else { None },
        user_answer,
        is_correct: grading.and_then(|g| g.is_correct(question.id)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            question::AnswerOption,
            quiz::{AttemptResult, AttemptStatus},
        },
        utils::mapping::{AnswerMappings, Permutation},
    };
    use chrono::Utc;
    use sqlx::types::Json;

    fn abc_question() -> Question {
        Question {
            id: 1,
            topic: "basics".to_string(),
            content: "Pick B".to_string(),
            answers: Json(vec![
                AnswerOption { content: "A".into(), is_correct: false },
                AnswerOption { content: "B".into(), is_correct: true },
                AnswerOption { content: "C".into(), is_correct: false },
            ]),
            explanation: Some("B is second".to_string()),
            created_at: None,
        }
    }

    fn attempt(mappings: AnswerMappings) -> QuizAttempt {
        QuizAttempt {
            id: 100,
            user_id: "user_1".to_string(),
            question_ids: vec![1],
            answer_mappings: mappings,
            user_answers: None,
            status: AttemptStatus::InProgress,
            score: None,
            correct_count: None,
            time_used: None,
            retry_count: 0,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    fn example_mappings() -> AnswerMappings {
        [(1, Permutation::try_from(vec![2, 0, 1]).unwrap())].into_iter().collect()
    }

    fn contents(view: &QuestionView) -> Vec<&str> {
        view.answers.iter().map(|a| a.content.as_str()).collect()
    }

    fn complete(attempt: QuizAttempt, picks: Vec<i64>) -> QuizAttempt {
        attempt.completed_with(&AttemptResult {
            user_answers: HashMap::from([(1, picks)]),
            score: 10,
            correct_count: 1,
            time_used: 30,
            completed_at: Utc::now(),
        })
    }

    #[test]
    fn test_in_progress_hides_correctness() {
        let questions = HashMap::from([(1, abc_question())]);
        let view = render_attempt(&attempt(example_mappings()), &questions).unwrap();

        let q = &view.questions[0];
        assert_eq!(contents(q), vec!["C", "A", "B"]);
        assert!(q.answers.iter().all(|a| a.is_correct.is_none()));
        assert!(q.explanation.is_none());
        assert!(q.is_correct.is_none());
        assert!(q.user_answer.is_none());
    }

    #[test]
    fn test_completed_reveals_in_shown_order() {
        let questions = HashMap::from([(1, abc_question())]);
        let done = complete(attempt(example_mappings()), vec![2]);

        let view = render_attempt(&done, &questions).unwrap();

        let q = &view.questions[0];
        assert_eq!(contents(q), vec!["C", "A", "B"]);
        let flags: Vec<Option<bool>> = q.answers.iter().map(|a| a.is_correct).collect();
        assert_eq!(flags, vec![Some(false), Some(false), Some(true)]);
        assert_eq!(q.user_answer, Some(vec![2]));
        assert_eq!(q.is_correct, Some(true));
        assert_eq!(q.explanation.as_deref(), Some("B is second"));
    }

    #[test]
    fn test_rendering_is_repeatable() {
        let questions = HashMap::from([(1, abc_question())]);
        let done = complete(attempt(example_mappings()), vec![0]);

        let first = serde_json::to_value(render_attempt(&done, &questions).unwrap()).unwrap();
        let second = serde_json::to_value(render_attempt(&done, &questions).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_mapping_uses_canonical_order() {
        let questions = HashMap::from([(1, abc_question())]);
        let done = complete(attempt(AnswerMappings::default()), vec![1]);

        let view = render_attempt(&done, &questions).unwrap();

        assert_eq!(contents(&view.questions[0]), vec!["A", "B", "C"]);
        assert_eq!(view.questions[0].is_correct, Some(true));
    }

    #[test]
    fn test_deleted_question_keeps_stored_totals() {
        let mut started = attempt(example_mappings());
        started.question_ids = vec![1, 2];
        let done = started.completed_with(&AttemptResult {
            user_answers: HashMap::from([(1, vec![2]), (2, vec![1])]),
            score: 10,
            correct_count: 2,
            time_used: 30,
            completed_at: Utc::now(),
        });

        // Question 2 is gone from the bank.
        let questions = HashMap::from([(1, abc_question())]);
        let view = render_attempt(&done, &questions).unwrap();

        assert_eq!(view.score, Some(10));
        assert_eq!(view.correct_count, Some(2));
        assert_eq!(view.total_questions, 2);
        assert_eq!(view.questions.len(), 1);
        assert_eq!(view.questions[0].is_correct, Some(true));
    }

    #[test]
    fn test_mapping_length_mismatch_is_internal_error() {
        let questions = HashMap::from([(1, abc_question())]);
        let bad: AnswerMappings = [(1, Permutation::identity(2))].into_iter().collect();

        let err = render_attempt(&attempt(bad), &questions).unwrap_err();
        assert!(matches!(err, AppError::InternalServerError(_)));
    }
}
