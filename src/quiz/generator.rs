//! Question generation
//!
//! A generator produces `per_type` questions for every (type, material)
//! pair and shuffles the whole list. The placeholder generator builds demo
//! questions locally; real questions come from the backend's quiz endpoint.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{QuestionType, Question};

/// Parameters of one generation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest<'a> {
    pub course: &'a str,
    pub materials: &'a [String],
    pub types: &'a [QuestionType],
    pub per_type: usize,
}

/// Source of quiz questions
pub trait QuestionGenerator {
    fn generate(&mut self, request: &QuestionRequest<'_>) -> Vec<Question>;
}

/// Question id scheme shared by every generator
pub fn question_id(question_type: QuestionType, material: &str, index: usize) -> String {
    format!("{}-{}-{}", question_type.label(), material, index)
}

/// Build placeholder questions for every (type, material) pair and shuffle them
pub fn build_questions<R: Rng + ?Sized>(
    course: &str,
    materials: &[String],
    types: &[QuestionType],
    per_type: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mut questions = Vec::with_capacity(materials.len() * types.len() * per_type);

    for &question_type in types {
        for material in materials {
            for i in 0..per_type {
                let (choices, answer) = match question_type {
                    QuestionType::MultipleChoice => (
                        Some(
                            ["A", "B", "C", "D"]
                                .iter()
                                .map(|c| format!("Choice {}", c))
                                .collect(),
                        ),
                        Some(0),
                    ),
                    QuestionType::TrueFalse => {
                        (Some(vec!["O".to_string(), "X".to_string()]), Some(0))
                    }
                    _ => (None, None),
                };
                questions.push(Question {
                    id: question_id(question_type, material, i),
                    question_type,
                    text: format!(
                        "[demo] {} / {} · {} question {}",
                        course,
                        material,
                        question_type,
                        i + 1
                    ),
                    choices,
                    answer,
                    material: Some(material.clone()),
                });
            }
        }
    }

    // Fisher-Yates
    questions.shuffle(rng);
    questions
}

/// Local demo generator; the question count comes from each request
#[derive(Debug)]
pub struct PlaceholderGenerator {
    rng: SmallRng,
}

impl PlaceholderGenerator {
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Reproducible shuffles
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for PlaceholderGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionGenerator for PlaceholderGenerator {
    fn generate(&mut self, request: &QuestionRequest<'_>) -> Vec<Question> {
        build_questions(
            request.course,
            request.materials,
            request.types,
            request.per_type,
            &mut self.rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn materials(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cross_product_counts() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mats = materials(&["lecture1", "lecture2", "lecture3"]);
        let types = [QuestionType::MultipleChoice, QuestionType::Essay];
        let questions = build_questions("OS", &mats, &types, 4, &mut rng);

        assert_eq!(questions.len(), 3 * 2 * 4);

        let mut pairs: HashMap<(String, QuestionType), usize> = HashMap::new();
        for q in &questions {
            *pairs
                .entry((q.material.clone().unwrap(), q.question_type))
                .or_default() += 1;
        }
        assert_eq!(pairs.len(), 6);
        assert!(pairs.values().all(|&n| n == 4));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mats = materials(&["a", "b"]);
        let questions = build_questions("c", &mats, &QuestionType::ALL, 3, &mut rng);
        let mut ids: Vec<_> = questions.iter().map(|q| q.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), questions.len());
    }

    #[test]
    fn test_single_true_false_question() {
        let mut rng = SmallRng::seed_from_u64(0);
        let questions = build_questions(
            "OS",
            &materials(&["lecture1"]),
            &[QuestionType::TrueFalse],
            1,
            &mut rng,
        );
        assert_eq!(questions.len(), 1);
        let q = &questions[0];
        assert_eq!(q.id, "O/X-lecture1-0");
        assert_eq!(q.choices, Some(vec!["O".to_string(), "X".to_string()]));
        assert_eq!(q.answer, Some(0));
        assert!(q.is_auto_gradable());
    }

    #[test]
    fn test_text_types_carry_no_answer() {
        let mut rng = SmallRng::seed_from_u64(0);
        let questions = build_questions(
            "OS",
            &materials(&["m"]),
            &[QuestionType::ShortAnswer, QuestionType::FillInBlank],
            2,
            &mut rng,
        );
        assert!(questions.iter().all(|q| q.choices.is_none() && q.answer.is_none()));
    }

    #[test]
    fn test_seeded_generators_agree() {
        let mats = materials(&["a", "b", "c"]);
        let request = QuestionRequest {
            course: "OS",
            materials: &mats,
            types: &QuestionType::ALL,
            per_type: 2,
        };
        let first = PlaceholderGenerator::seeded(42).generate(&request);
        let second = PlaceholderGenerator::seeded(42).generate(&request);
        assert_eq!(first, second);
    }

    #[test]
    fn test_count_follows_each_request() {
        let mats = materials(&["m"]);
        let mut generator = PlaceholderGenerator::seeded(7);
        for per_type in [1, 3] {
            let request = QuestionRequest {
                course: "OS",
                materials: &mats,
                types: &[QuestionType::TrueFalse],
                per_type,
            };
            assert_eq!(generator.generate(&request).len(), per_type);
        }
    }

    #[test]
    fn test_empty_inputs_give_no_questions() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(build_questions("OS", &[], &QuestionType::ALL, 3, &mut rng).is_empty());
    }
}
