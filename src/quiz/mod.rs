//! Quiz engine
//!
//! Drives the quiz lifecycle and auto-grades the result:
//!
//! ```text
//! Selecting -> Running -> ShowingResult
//!                 ^             |
//!                 +---- retry --+
//! any step -> Selecting (close)
//! ```

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::models::{Answer, Question, QuizMeta, Score};
use crate::{Result, StudyError};

pub mod generator;
pub mod markdown;

pub use generator::{build_questions, PlaceholderGenerator, QuestionGenerator, QuestionRequest};

/// Lifecycle step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuizStep {
    #[default]
    Selecting,
    Running,
    ShowingResult,
}

/// One quiz run: the fixed question order and the answers given so far
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub meta: QuizMeta,
    questions: Vec<Question>,
    answers: HashMap<String, Answer>,
    started_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    fn new(meta: QuizMeta, questions: Vec<Question>) -> Self {
        Self {
            meta,
            questions,
            answers: HashMap::new(),
            started_at: Utc::now(),
            submitted_at: None,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &HashMap<String, Answer> {
        &self.answers
    }

    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Time from start to submission
    pub fn time_taken(&self) -> Option<chrono::Duration> {
        self.submitted_at.map(|end| end - self.started_at)
    }
}

/// Per-question line of the result screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub number: usize,
    pub question_id: String,
    pub text: String,
    /// `None` when unanswered
    pub given: Option<String>,
    /// `-` for questions that are not auto-gradable
    pub expected: String,
    pub auto_gradable: bool,
    pub correct: bool,
}

pub struct QuizEngine {
    generator: Box<dyn QuestionGenerator + Send>,
    per_type: usize,
    step: QuizStep,
    session: Option<QuizSession>,
    cursor: usize,
}

impl QuizEngine {
    pub fn new(generator: Box<dyn QuestionGenerator + Send>, per_type: usize) -> Self {
        Self {
            generator,
            per_type,
            step: QuizStep::Selecting,
            session: None,
            cursor: 0,
        }
    }

    /// Engine using local placeholder questions
    pub fn with_placeholder_questions(per_type: usize) -> Self {
        Self::new(Box::new(PlaceholderGenerator::new()), per_type)
    }

    pub fn step(&self) -> QuizStep {
        self.step
    }

    pub fn session(&self) -> Option<&QuizSession> {
        self.session.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        self.session
            .as_ref()
            .map(|s| s.questions.as_slice())
            .unwrap_or(&[])
    }

    /// Generate questions for `meta` and start running them
    pub fn start_quiz(&mut self, meta: QuizMeta) -> Result<()> {
        if meta.course.trim().is_empty() {
            return Err(StudyError::Validation("Choose a course first.".to_string()));
        }
        if meta.materials.is_empty() {
            return Err(StudyError::Validation(
                "Choose at least one material.".to_string(),
            ));
        }
        if meta.types.is_empty() {
            return Err(StudyError::Validation(
                "Choose at least one question type.".to_string(),
            ));
        }

        let questions = self.generator.generate(&QuestionRequest {
            course: &meta.course,
            materials: &meta.materials,
            types: &meta.types,
            per_type: self.per_type,
        });
        self.begin(meta, questions)
    }

    /// Run questions supplied by the caller, keeping their order
    pub fn start_with_questions(&mut self, meta: QuizMeta, questions: Vec<Question>) -> Result<()> {
        let mut seen = HashSet::new();
        if let Some(dup) = questions.iter().find(|q| !seen.insert(q.id.as_str())) {
            return Err(StudyError::Validation(format!(
                "Duplicate question id: {}",
                dup.id
            )));
        }
        self.begin(meta, questions)
    }

    fn begin(&mut self, meta: QuizMeta, questions: Vec<Question>) -> Result<()> {
        if questions.is_empty() {
            return Err(StudyError::Validation(
                "No questions were generated.".to_string(),
            ));
        }
        info!(
            course = %meta.course,
            types = %meta.types_label(),
            questions = questions.len(),
            "quiz started"
        );
        self.session = Some(QuizSession::new(meta, questions));
        self.cursor = 0;
        self.step = QuizStep::Running;
        Ok(())
    }

    fn running_session(&mut self, operation: &str) -> Result<&mut QuizSession> {
        if self.step != QuizStep::Running {
            return Err(StudyError::InvalidState(format!(
                "cannot {} while {:?}",
                operation, self.step
            )));
        }
        self.session
            .as_mut()
            .ok_or_else(|| StudyError::InvalidState("no quiz session".to_string()))
    }

    /// Store the answer to one question.
    ///
    /// The value is not checked against the question type.
    pub fn record_answer(&mut self, question_id: &str, answer: Answer) -> Result<()> {
        let session = self.running_session("record an answer")?;
        if !session.questions.iter().any(|q| q.id == question_id) {
            return Err(StudyError::QuestionNotFound(question_id.to_string()));
        }
        debug!(question_id, ?answer, "answer recorded");
        session.answers.insert(question_id.to_string(), answer);
        Ok(())
    }

    /// Replace all answers with `answers` and show the result
    pub fn submit(&mut self, answers: HashMap<String, Answer>) -> Result<Score> {
        let session = self.running_session("submit")?;
        session.answers = answers;
        session.submitted_at = Some(Utc::now());
        self.step = QuizStep::ShowingResult;

        let score = self.score();
        info!(%score, "quiz submitted");
        Ok(score)
    }

    /// Submit the answers recorded during the run
    pub fn submit_recorded(&mut self) -> Result<Score> {
        let answers = self.running_session("submit")?.answers.clone();
        self.submit(answers)
    }

    /// Run the same questions again with no answers
    pub fn retry(&mut self) -> Result<()> {
        if self.step != QuizStep::ShowingResult {
            return Err(StudyError::InvalidState(format!(
                "cannot retry while {:?}",
                self.step
            )));
        }
        if let Some(session) = self.session.as_mut() {
            session.answers.clear();
            session.started_at = Utc::now();
            session.submitted_at = None;
        }
        self.cursor = 0;
        self.step = QuizStep::Running;
        info!("quiz retried");
        Ok(())
    }

    /// Discard the session and return to selection
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            info!("quiz closed");
        }
        self.cursor = 0;
        self.step = QuizStep::Selecting;
    }

    /// Index of the question on screen
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_question(&self) -> Option<&Question> {
        if self.step != QuizStep::Running {
            return None;
        }
        self.questions().get(self.cursor)
    }

    /// Advance one question; false at the last one
    pub fn next(&mut self) -> bool {
        if self.step == QuizStep::Running && self.cursor + 1 < self.questions().len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Go back one question; false at the first one
    pub fn previous(&mut self) -> bool {
        if self.step == QuizStep::Running && self.cursor > 0 {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Submission is offered only on the last question
    pub fn can_submit(&self) -> bool {
        let len = self.questions().len();
        self.step == QuizStep::Running && len > 0 && self.cursor == len - 1
    }

    /// Current tally, computed from the questions and answers
    pub fn score(&self) -> Score {
        match &self.session {
            Some(session) => Score::tally(&session.questions, &session.answers),
            None => Score::default(),
        }
    }

    /// One row per question, in quiz order
    pub fn review(&self) -> Vec<ReviewRow> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        session
            .questions
            .iter()
            .enumerate()
            .map(|(i, question)| {
                let given = session.answers.get(&question.id);
                ReviewRow {
                    number: i + 1,
                    question_id: question.id.clone(),
                    text: question.text.clone(),
                    given: given.and_then(|a| a.display_text(question)),
                    expected: question.correct_answer_text(),
                    auto_gradable: question.is_auto_gradable(),
                    correct: question.is_correct(given),
                }
            })
            .collect()
    }
}
