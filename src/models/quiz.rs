//! Quiz data models
//!
//! Questions, user answers and scores, plus the quiz payload produced by the
//! backend's generator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::StudyError;

/// Question kinds offered by the quiz selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "multiple-choice", alias = "객관식")]
    MultipleChoice,
    #[serde(rename = "O/X", alias = "true-false")]
    TrueFalse,
    #[serde(rename = "short-answer", alias = "주관식")]
    ShortAnswer,
    #[serde(rename = "fill-in-blank", alias = "단답형")]
    FillInBlank,
    #[serde(rename = "essay", alias = "서술형")]
    Essay,
}

impl QuestionType {
    /// Selector order
    pub const ALL: [QuestionType; 5] = [
        QuestionType::MultipleChoice,
        QuestionType::ShortAnswer,
        QuestionType::TrueFalse,
        QuestionType::FillInBlank,
        QuestionType::Essay,
    ];

    /// Label used in question ids and on screen
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::TrueFalse => "O/X",
            QuestionType::ShortAnswer => "short-answer",
            QuestionType::FillInBlank => "fill-in-blank",
            QuestionType::Essay => "essay",
        }
    }

    /// Types answered by picking one of `choices`
    pub fn is_choice_type(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }

    /// Essays get a multi-line answer box
    pub fn is_long_form(&self) -> bool {
        matches!(self, QuestionType::Essay)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for QuestionType {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "multiple-choice" | "객관식" => Ok(QuestionType::MultipleChoice),
            "O/X" | "true-false" => Ok(QuestionType::TrueFalse),
            "short-answer" | "주관식" => Ok(QuestionType::ShortAnswer),
            "fill-in-blank" | "단답형" => Ok(QuestionType::FillInBlank),
            "essay" | "서술형" => Ok(QuestionType::Essay),
            other => Err(StudyError::Validation(format!("Unknown question type: {}", other))),
        }
    }
}

/// One quiz question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique within a quiz
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub text: String,
    /// Present only for choice types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    /// Index into `choices` of the correct answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<usize>,
    /// Source material the question was drawn from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl Question {
    /// Gradable by exact index match: a choice type whose answer index is in bounds
    pub fn is_auto_gradable(&self) -> bool {
        if !self.question_type.is_choice_type() {
            return false;
        }
        match (&self.choices, self.answer) {
            (Some(choices), Some(answer)) => answer < choices.len(),
            _ => false,
        }
    }

    /// Text of the choice at `index`
    pub fn choice(&self, index: usize) -> Option<&str> {
        self.choices
            .as_ref()
            .and_then(|c| c.get(index))
            .map(String::as_str)
    }

    /// Whether `answer` earns the point for this question
    pub fn is_correct(&self, answer: Option<&Answer>) -> bool {
        if !self.is_auto_gradable() {
            return false;
        }
        match (answer, self.answer) {
            (Some(Answer::Choice(given)), Some(expected)) => *given == expected,
            _ => false,
        }
    }

    /// Correct answer as shown in a review, `-` when not auto-gradable
    pub fn correct_answer_text(&self) -> String {
        if !self.is_auto_gradable() {
            return "-".to_string();
        }
        self.answer
            .and_then(|idx| self.choice(idx))
            .unwrap_or("-")
            .to_string()
    }
}

/// A user's answer: an index for choice questions, free text otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Choice(usize),
    Text(String),
}

impl Answer {
    /// Answer as shown in a review; `None` when there is nothing to show
    pub fn display_text(&self, question: &Question) -> Option<String> {
        match self {
            Answer::Choice(idx) => question
                .choice(*idx)
                .map(str::to_string)
                .or_else(|| Some(idx.to_string())),
            Answer::Text(text) if text.trim().is_empty() => None,
            Answer::Text(text) => Some(text.clone()),
        }
    }
}

/// Parameters chosen on the selection step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizMeta {
    pub course: String,
    pub materials: Vec<String>,
    pub types: Vec<QuestionType>,
}

impl QuizMeta {
    pub fn new(
        course: impl Into<String>,
        materials: Vec<String>,
        types: Vec<QuestionType>,
    ) -> Self {
        Self {
            course: course.into(),
            materials,
            types,
        }
    }

    /// Joined type labels for headers, e.g. `multiple-choice, O/X`
    pub fn types_label(&self) -> String {
        self.types
            .iter()
            .map(QuestionType::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Auto-grading tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    /// Auto-gradable questions answered correctly
    pub score: usize,
    /// Auto-gradable questions
    pub max: usize,
    /// `round(score / max * 100)`, 0 when `max` is 0
    pub percent: u32,
}

impl Score {
    /// Tally `answers` against `questions`
    pub fn tally(questions: &[Question], answers: &HashMap<String, Answer>) -> Self {
        let mut score = 0;
        let mut max = 0;
        for question in questions.iter().filter(|q| q.is_auto_gradable()) {
            max += 1;
            if question.is_correct(answers.get(&question.id)) {
                score += 1;
            }
        }
        let percent = if max == 0 {
            0
        } else {
            ((score as f64 / max as f64) * 100.0).round() as u32
        };
        Self { score, max, percent }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}%)", self.score, self.max, self.percent)
    }
}

/// Requested difficulty for generated quizzes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Question as produced by the backend generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    pub question_type: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    /// Index or literal answer text
    #[serde(default)]
    pub answer: Option<serde_json::Value>,
}

impl GeneratedQuestion {
    /// Resolve the answer to a choice index when possible
    pub fn answer_index(&self) -> Option<usize> {
        match self.answer.as_ref()? {
            serde_json::Value::Number(n) => n.as_u64().map(|n| n as usize),
            serde_json::Value::String(s) => self
                .choices
                .as_ref()
                .and_then(|choices| choices.iter().position(|c| c == s)),
            _ => None,
        }
    }

    /// Answer rendered for an answer key
    pub fn answer_text(&self) -> Option<String> {
        match self.answer.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Quiz document returned by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuiz {
    #[serde(default, rename = "type")]
    pub quiz_type: Option<String>,
    #[serde(default)]
    pub questions: Vec<GeneratedQuestion>,
}

impl GeneratedQuiz {
    /// Convert into engine questions, keeping the backend's order
    pub fn into_questions(self) -> Vec<Question> {
        let quiz_type = self.quiz_type.clone();
        self.questions
            .into_iter()
            .enumerate()
            .map(|(i, q)| {
                let declared = q
                    .question_type
                    .as_deref()
                    .or(quiz_type.as_deref())
                    .and_then(|t| t.parse::<QuestionType>().ok());
                let question_type = declared.unwrap_or(match q.choices.as_ref() {
                    Some(c) if c.len() == 2 && c[0] == "O" && c[1] == "X" => {
                        QuestionType::TrueFalse
                    }
                    Some(_) => QuestionType::MultipleChoice,
                    None => QuestionType::ShortAnswer,
                });
                let id = match &q.id {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(serde_json::Value::Null) | None => format!("q-{}", i + 1),
                    Some(other) => other.to_string(),
                };
                let answer = if question_type.is_choice_type() {
                    q.answer_index()
                } else {
                    None
                };
                Question {
                    id,
                    question_type,
                    text: q.text,
                    choices: if question_type.is_choice_type() { q.choices } else { None },
                    answer,
                    material: None,
                }
            })
            .collect()
    }
}
