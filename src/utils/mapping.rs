// src/utils/mapping.rs

use std::collections::HashMap;

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermutationError {
    #[error("index {index} is out of range for {len} answers")]
    OutOfRange { index: usize, len: usize },

    #[error("index {0} appears more than once")]
    Duplicate(usize),

    #[error("mapping covers {mapping} answers but the question has {answers}")]
    LengthMismatch { mapping: usize, answers: usize },
}

/// Display order of one question's answers.
///
/// Position `i` holds the canonical index of the answer shown at position `i`,
/// i.e. `mapping[shown] = canonical`. Always a permutation of `0..len`; every
/// constructor (including deserialization) checks that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Permutation(Vec<usize>);

impl Permutation {
    pub fn identity(len: usize) -> Self {
        Self((0..len).collect())
    }

    /// Uniformly random order of `len` answers (Fisher-Yates).
    /// Depends only on `len`, never on answer content.
    pub fn shuffled<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let mut order: Vec<usize> = (0..len).collect();
        if len > 1 {
            order.shuffle(rng);
        }
        Self(order)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Canonical index of the answer displayed at `shown`.
    pub fn canonical_index(&self, shown: usize) -> Option<usize> {
        self.0.get(shown).copied()
    }

    /// Translates shown positions to canonical indices, keeping cardinality.
    ///
    /// A negative position or one outside the mapping is passed through as-is.
    /// It can never match a real canonical index, so the selection grades as
    /// incorrect.
    pub fn to_canonical(&self, shown: &[i64]) -> Vec<i64> {
        shown
            .iter()
            .map(|&pos| {
                usize::try_from(pos)
                    .ok()
                    .and_then(|p| self.canonical_index(p))
                    .map_or(pos, |canonical| canonical as i64)
            })
            .collect()
    }

    /// Reorders a canonical list into the order the user saw it.
    pub fn present<T: Clone>(&self, canonical: &[T]) -> Result<Vec<T>, PermutationError> {
        if canonical.len() != self.len() {
            return Err(PermutationError::LengthMismatch {
                mapping: self.len(),
                answers: canonical.len(),
            });
        }
        Ok(self.0.iter().map(|&idx| canonical[idx].clone()).collect())
    }
}

impl TryFrom<Vec<usize>> for Permutation {
    type Error = PermutationError;

    fn try_from(order: Vec<usize>) -> Result<Self, Self::Error> {
        let len = order.len();
        let mut seen = vec![false; len];
        for &index in &order {
            if index >= len {
                return Err(PermutationError::OutOfRange { index, len });
            }
            if seen[index] {
                return Err(PermutationError::Duplicate(index));
            }
            seen[index] = true;
        }
        Ok(Self(order))
    }
}

impl From<Permutation> for Vec<usize> {
    fn from(p: Permutation) -> Self {
        p.0
    }
}

/// Per-question answer order for one quiz attempt, keyed by question id.
/// Generated once when the attempt is created and never rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMappings(HashMap<i64, Permutation>);

impl AnswerMappings {
    /// Shuffles every question's answers. Input is `(question_id, answer_count)`.
    pub fn generate<I, R>(questions: I, rng: &mut R) -> Self
    where
        I: IntoIterator<Item = (i64, usize)>,
        R: Rng + ?Sized,
    {
        Self(
            questions
                .into_iter()
                .map(|(id, count)| (id, Permutation::shuffled(count, rng)))
                .collect(),
        )
    }

    pub fn get(&self, question_id: i64) -> Option<&Permutation> {
        self.0.get(&question_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shown positions -> canonical indices for one question.
    /// Without a stored mapping the positions are taken as canonical.
    pub fn translate(&self, question_id: i64, shown: &[i64]) -> Vec<i64> {
        match self.get(question_id) {
            Some(mapping) => mapping.to_canonical(shown),
            None => {
                tracing::warn!(
                    question_id,
                    "No answer mapping stored; treating shown positions as canonical"
                );
                shown.to_vec()
            }
        }
    }

    /// Canonical answers -> shown order for one question.
    /// Without a stored mapping the canonical order is returned unchanged.
    pub fn present<T: Clone>(
        &self,
        question_id: i64,
        canonical: &[T],
    ) -> Result<Vec<T>, PermutationError> {
        match self.get(question_id) {
            Some(mapping) => mapping.present(canonical),
            None => {
                tracing::warn!(
                    question_id,
                    "No answer mapping stored; presenting canonical order"
                );
                Ok(canonical.to_vec())
            }
        }
    }
}

impl FromIterator<(i64, Permutation)> for AnswerMappings {
    fn from_iter<T: IntoIterator<Item = (i64, Permutation)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::HashMap;

    fn is_permutation(order: &[usize]) -> bool {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        sorted == (0..order.len()).collect::<Vec<_>>()
    }

    #[test]
    fn test_shuffled_is_always_a_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        for len in 1..=12 {
            for _ in 0..50 {
                let p = Permutation::shuffled(len, &mut rng);
                assert_eq!(p.len(), len);
                assert!(is_permutation(p.as_slice()), "bad order {:?}", p);
            }
        }
    }

    #[test]
    fn test_single_answer_is_identity() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Permutation::shuffled(1, &mut rng), Permutation::identity(1));
        assert!(Permutation::shuffled(0, &mut rng).is_empty());
    }

    #[test]
    fn test_shuffle_covers_all_orders_evenly() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<Vec<usize>, usize> = HashMap::new();
        for _ in 0..6000 {
            let p = Permutation::shuffled(3, &mut rng);
            *counts.entry(p.into()).or_default() += 1;
        }
        assert_eq!(counts.len(), 6);
        for (order, count) in counts {
            assert!((800..=1200).contains(&count), "{:?} seen {} times", order, count);
        }
    }

    #[test]
    fn test_try_from_rejects_invalid_orders() {
        assert_eq!(
            Permutation::try_from(vec![0, 3, 1]),
            Err(PermutationError::OutOfRange { index: 3, len: 3 })
        );
        assert_eq!(
            Permutation::try_from(vec![1, 1, 0]),
            Err(PermutationError::Duplicate(1))
        );
        assert!(Permutation::try_from(vec![2, 0, 1]).is_ok());
    }

    #[test]
    fn test_deserialize_rejects_non_permutation() {
        assert!(serde_json::from_str::<Permutation>("[0, 0]").is_err());
        let p: Permutation = serde_json::from_str("[1, 0]").unwrap();
        assert_eq!(p.as_slice(), &[1, 0]);
    }

    #[test]
    fn test_translate_then_present_restores_every_answer() {
        let mut rng = StdRng::seed_from_u64(99);
        let canonical = vec!["A", "B", "C", "D", "E"];
        for _ in 0..20 {
            let p = Permutation::shuffled(canonical.len(), &mut rng);
            let all_shown: Vec<i64> = (0..canonical.len() as i64).collect();

            // Every shown slot maps to a distinct canonical answer.
            let canon: Vec<usize> = p
                .to_canonical(&all_shown)
                .into_iter()
                .map(|c| c as usize)
                .collect();
            assert!(is_permutation(&canon));

            // Presenting puts the answer for canonical[i] at shown slot i.
            let shown = p.present(&canonical).unwrap();
            for (pos, answer) in shown.iter().enumerate() {
                assert_eq!(*answer, canonical[canon[pos]]);
            }

            // Undo the presentation via the translated indices.
            let mut restored = vec![""; canonical.len()];
            for (pos, &c) in canon.iter().enumerate() {
                restored[c] = shown[pos];
            }
            assert_eq!(restored, canonical);
        }
    }

    #[test]
    fn test_example_mapping_translates_and_presents() {
        let p = Permutation::try_from(vec![2, 0, 1]).unwrap();
        assert_eq!(p.to_canonical(&[2]), vec![1]);
        assert_eq!(p.present(&["A", "B", "C"]).unwrap(), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_out_of_range_shown_position_passes_through() {
        let p = Permutation::try_from(vec![1, 0]).unwrap();
        assert_eq!(p.to_canonical(&[0, 5]), vec![1, 5]);
    }

    #[test]
    fn test_negative_shown_position_passes_through() {
        let p = Permutation::try_from(vec![1, 0]).unwrap();
        assert_eq!(p.to_canonical(&[-1, 1]), vec![-1, 0]);
    }

    #[test]
    fn test_present_rejects_length_mismatch() {
        let p = Permutation::identity(3);
        assert_eq!(
            p.present(&["A", "B"]),
            Err(PermutationError::LengthMismatch { mapping: 3, answers: 2 })
        );
    }

    #[test]
    fn test_missing_mapping_falls_back_to_identity() {
        let mappings = AnswerMappings::default();
        assert_eq!(mappings.translate(10, &[2, 0]), vec![2, 0]);
        assert_eq!(mappings.present(10, &["A", "B", "C"]).unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_generate_one_mapping_per_question() {
        let mut rng = StdRng::seed_from_u64(3);
        let mappings = AnswerMappings::generate([(1, 4), (2, 1), (3, 6)], &mut rng);
        assert_eq!(mappings.len(), 3);
        assert_eq!(mappings.get(1).map(Permutation::len), Some(4));
        assert_eq!(mappings.get(2), Some(&Permutation::identity(1)));
        assert_eq!(mappings.get(3).map(Permutation::len), Some(6));
    }

    #[test]
    fn test_mappings_json_uses_question_id_keys() {
        let mappings: AnswerMappings = [(7, Permutation::try_from(vec![1, 0]).unwrap())]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&mappings).unwrap();
        assert_eq!(json, serde_json::json!({ "7": [1, 0] }));
    }
}
