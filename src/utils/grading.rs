// src/utils/grading.rs

use std::collections::{BTreeSet, HashMap};

use crate::{
    config::SCORE_SCALE,
    models::{question::Question, quiz::UserAnswers},
    utils::mapping::AnswerMappings,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionGrade {
    pub question_id: i64,
    /// Canonical indices the user selected. Invalid picks are kept as sent.
    pub selected: Vec<i64>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradingResult {
    pub questions: Vec<QuestionGrade>,
    pub correct_count: usize,
    pub total_questions: usize,
    pub score: i32,
}

impl GradingResult {
    pub fn is_correct(&self, question_id: i64) -> Option<bool> {
        self.questions
            .iter()
            .find(|g| g.question_id == question_id)
            .map(|g| g.is_correct)
    }
}

/// A selection is correct when it is exactly the set of correct options.
/// Order and repeats do not matter.
pub fn is_correct(selected: &[i64], correct: &[usize]) -> bool {
    let selected: BTreeSet<i64> = selected.iter().copied().collect();
    let correct: BTreeSet<i64> = correct.iter().map(|&i| i as i64).collect();
    selected == correct
}

/// `round(correct / total * 10)`; an empty quiz scores 0.
pub fn calculate_score(correct_count: usize, total_questions: usize) -> i32 {
    if total_questions == 0 {
        return 0;
    }
    ((correct_count as f64 / total_questions as f64) * SCORE_SCALE).round() as i32
}

/// Grades every question on the attempt, in attempt order.
///
/// Unanswered questions count as an empty selection. A question that no
/// longer exists is graded incorrect but still counts towards the total.
pub fn grade_attempt(
    question_ids: &[i64],
    questions: &HashMap<i64, Question>,
    mappings: &AnswerMappings,
    answers: &UserAnswers,
) -> GradingResult {
    let grades: Vec<QuestionGrade> = question_ids
        .iter()
        .map(|&question_id| {
            let shown = answers.get(&question_id).map(Vec::as_slice).unwrap_or(&[]);
            let selected = mappings.translate(question_id, shown);
            let is_correct = match questions.get(&question_id) {
                Some(q) => is_correct(&selected, &q.correct_indices()),
                None => {
                    tracing::warn!(question_id, "Graded missing question as incorrect");
                    false
                }
            };
            QuestionGrade {
                question_id,
                selected,
                is_correct,
            }
        })
        .collect();

    let correct_count = grades.iter().filter(|g| g.is_correct).count();
    let total_questions = question_ids.len();

    GradingResult {
        questions: grades,
        correct_count,
        total_questions,
        score: calculate_score(correct_count, total_questions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::question::AnswerOption, utils::mapping::Permutation};
    use sqlx::types::Json;

    fn question(id: i64, answers: &[(&str, bool)]) -> Question {
        Question {
            id,
            topic: "general".to_string(),
            content: format!("Question {}", id),
            answers: Json(
                answers
                    .iter()
                    .map(|(c, ok)| AnswerOption {
                        content: c.to_string(),
                        is_correct: *ok,
                    })
                    .collect(),
            ),
            explanation: None,
            created_at: None,
        }
    }

    #[test]
    fn test_single_answer() {
        assert!(is_correct(&[2], &[2]));
        assert!(!is_correct(&[1], &[2]));
        assert!(!is_correct(&[], &[2]));
        assert!(!is_correct(&[2, 1], &[2]));
    }

    #[test]
    fn test_invalid_picks_are_incorrect() {
        assert!(!is_correct(&[-1], &[0]));
        assert!(!is_correct(&[0, -1], &[0]));
        assert!(!is_correct(&[7], &[0]));
    }

    #[test]
    fn test_multi_answer_is_order_independent() {
        assert!(is_correct(&[3, 1], &[1, 3]));
        assert!(!is_correct(&[1], &[1, 3]));
        assert!(!is_correct(&[1, 2, 3], &[1, 3]));
    }

    #[test]
    fn test_empty_selection_matches_only_empty_key() {
        assert!(is_correct(&[], &[]));
    }

    #[test]
    fn test_calculate_score() {
        assert_eq!(calculate_score(3, 5), 6);
        assert_eq!(calculate_score(5, 5), 10);
        assert_eq!(calculate_score(0, 5), 0);
        assert_eq!(calculate_score(1, 3), 3);
        assert_eq!(calculate_score(2, 3), 7);
        assert_eq!(calculate_score(0, 0), 0);
    }

    #[test]
    fn test_grade_attempt_with_mapping() {
        let q = question(1, &[("A", false), ("B", true), ("C", false)]);
        let questions = HashMap::from([(1, q)]);
        let mappings: AnswerMappings = [(1, Permutation::try_from(vec![2, 0, 1]).unwrap())]
            .into_iter()
            .collect();
        let answers = HashMap::from([(1, vec![2])]);

        let result = grade_attempt(&[1], &questions, &mappings, &answers);

        assert_eq!(result.questions[0].selected, vec![1]);
        assert!(result.questions[0].is_correct);
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.score, 10);
    }

    #[test]
    fn test_unanswered_questions_count_against_score() {
        let questions: HashMap<i64, Question> = (1..=5)
            .map(|id| (id, question(id, &[("yes", true), ("no", false)])))
            .collect();
        let mappings: AnswerMappings = (1..=5).map(|id| (id, Permutation::identity(2))).collect();
        // Three right, one wrong, one skipped.
        let answers = HashMap::from([(1, vec![0]), (2, vec![0]), (3, vec![0]), (4, vec![1])]);

        let result = grade_attempt(&[1, 2, 3, 4, 5], &questions, &mappings, &answers);

        assert_eq!(result.correct_count, 3);
        assert_eq!(result.total_questions, 5);
        assert_eq!(result.score, 6);
        assert_eq!(result.is_correct(5), Some(false));
    }

    #[test]
    fn test_missing_mapping_grades_shown_as_canonical() {
        let questions = HashMap::from([(9, question(9, &[("A", false), ("B", true)]))]);
        let answers = HashMap::from([(9, vec![1])]);

        let result = grade_attempt(&[9], &questions, &AnswerMappings::default(), &answers);

        assert!(result.questions[0].is_correct);
    }

    #[test]
    fn test_deleted_question_is_incorrect() {
        let answers = HashMap::from([(3, vec![0])]);
        let result = grade_attempt(&[3], &HashMap::new(), &AnswerMappings::default(), &answers);
        assert_eq!(result.correct_count, 0);
        assert_eq!(result.total_questions, 1);
        assert_eq!(result.score, 0);
    }
}
