use std::collections::{HashMap, HashSet};

use studydesk::models::{Answer, GeneratedQuiz, QuestionType, QuizMeta};
use studydesk::quiz::{PlaceholderGenerator, QuizEngine, QuizStep};
use studydesk::StudyError;

fn engine(per_type: usize) -> QuizEngine {
    QuizEngine::new(Box::new(PlaceholderGenerator::seeded(42)), per_type)
}

fn meta() -> QuizMeta {
    QuizMeta::new(
        "Computer Networks",
        vec!["TCP".into(), "Routing".into()],
        vec![
            QuestionType::MultipleChoice,
            QuestionType::TrueFalse,
            QuestionType::Essay,
        ],
    )
}

#[test]
fn test_full_quiz_session() {
    let mut quiz = engine(2);
    quiz.start_quiz(meta()).unwrap();
    assert_eq!(quiz.step(), QuizStep::Running);

    let questions = quiz.questions().to_vec();
    assert_eq!(questions.len(), 2 * 3 * 2);
    let ids: HashSet<&str> = questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids.len(), questions.len());

    // Walk forward answering each question the way the screen would
    loop {
        let question = quiz.current_question().unwrap().clone();
        let answer = if question.question_type.is_choice_type() {
            Answer::Choice(0)
        } else {
            Answer::Text("three-way handshake".into())
        };
        quiz.record_answer(&question.id, answer).unwrap();
        if quiz.can_submit() {
            break;
        }
        assert!(quiz.next());
    }
    assert!(!quiz.next());

    let score = quiz.submit_recorded().unwrap();
    assert_eq!(quiz.step(), QuizStep::ShowingResult);
    // Essays are not auto-graded
    assert_eq!(score.max, 8);
    assert_eq!(score.score, 8);
    assert_eq!(score.percent, 100);

    let review = quiz.review();
    assert_eq!(review.len(), questions.len());
    assert!(review
        .iter()
        .filter(|row| !row.auto_gradable)
        .all(|row| row.expected == "-"));

    quiz.retry().unwrap();
    assert_eq!(quiz.step(), QuizStep::Running);
    assert_eq!(quiz.cursor(), 0);
    assert_eq!(quiz.questions(), questions.as_slice());
    assert_eq!(quiz.score().score, 0);

    quiz.close();
    assert_eq!(quiz.step(), QuizStep::Selecting);
    assert!(quiz.session().is_none());
}

#[test]
fn test_wrong_answers_lower_the_score() {
    let mut quiz = engine(1);
    quiz.start_quiz(QuizMeta::new(
        "OS",
        vec!["Paging".into()],
        vec![QuestionType::MultipleChoice, QuestionType::TrueFalse],
    ))
    .unwrap();

    let answers: HashMap<String, Answer> = quiz
        .questions()
        .iter()
        .map(|q| {
            let pick = if q.question_type == QuestionType::TrueFalse { 1 } else { 0 };
            (q.id.clone(), Answer::Choice(pick))
        })
        .collect();
    let score = quiz.submit(answers).unwrap();
    assert_eq!((score.score, score.max, score.percent), (1, 2, 50));
}

#[test]
fn test_step_guards() {
    let mut quiz = engine(1);
    assert!(matches!(
        quiz.record_answer("x", Answer::Choice(0)),
        Err(StudyError::InvalidState(_))
    ));
    assert!(matches!(quiz.retry(), Err(StudyError::InvalidState(_))));
    assert!(matches!(
        quiz.start_quiz(QuizMeta::new("OS", vec![], vec![QuestionType::Essay])),
        Err(StudyError::Validation(_))
    ));

    quiz.start_quiz(meta()).unwrap();
    assert!(matches!(
        quiz.record_answer("missing", Answer::Choice(0)),
        Err(StudyError::QuestionNotFound(_))
    ));
    assert!(matches!(quiz.retry(), Err(StudyError::InvalidState(_))));
}

#[test]
fn test_backend_quiz_keeps_order() {
    let generated: GeneratedQuiz = serde_json::from_value(serde_json::json!({
        "type": "multiple-choice",
        "questions": [
            {"id": 1, "text": "Which layer routes packets?", "choices": ["Link", "Network", "Transport", "Session"], "answer": 1},
            {"id": 2, "text": "Which is connectionless?", "choices": ["TCP", "UDP", "SCTP", "QUIC"], "answer": "UDP"}
        ]
    }))
    .unwrap();
    let questions = generated.into_questions();

    let mut quiz = engine(1);
    quiz.start_with_questions(
        QuizMeta::new("Computer Networks", vec!["Routing".into()], vec![QuestionType::MultipleChoice]),
        questions,
    )
    .unwrap();

    let texts: Vec<&str> = quiz.questions().iter().map(|q| q.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["Which layer routes packets?", "Which is connectionless?"]
    );

    let first = quiz.questions()[0].id.clone();
    let second = quiz.questions()[1].id.clone();
    let score = quiz
        .submit(HashMap::from([
            (first, Answer::Choice(1)),
            (second, Answer::Choice(0)),
        ]))
        .unwrap();
    assert_eq!(score.to_string(), "1/2 (50%)");

    let review = quiz.review();
    assert_eq!(review[1].given.as_deref(), Some("TCP"));
    assert_eq!(review[1].expected, "UDP");
    assert!(!review[1].correct);
}
