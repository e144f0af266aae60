//! Generated quiz as a markdown document

use std::fmt::Write;

use crate::models::{Difficulty, GeneratedQuiz};

/// Render `quiz` for display in a tab: header, numbered questions with
/// lettered choices, then an answer key.
pub fn quiz_to_markdown(
    quiz: &GeneratedQuiz,
    base_title: &str,
    subject: &str,
    difficulty: Difficulty,
) -> String {
    let mut out = String::new();
    let quiz_type = quiz.quiz_type.as_deref().unwrap_or("mixed");

    // Writing to a String cannot fail
    let _ = writeln!(out, "# {} quiz", base_title);
    let _ = writeln!(out);
    let _ = writeln!(out, "- Subject: {}", subject);
    let _ = writeln!(out, "- Type: {}", quiz_type);
    let _ = writeln!(out, "- Difficulty: {}", difficulty.as_str());
    let _ = writeln!(out, "- Questions: {}", quiz.questions.len());

    for (i, question) in quiz.questions.iter().enumerate() {
        let _ = writeln!(out);
        let _ = writeln!(out, "## {}. {}", i + 1, question.text);
        if let Some(choices) = &question.choices {
            let _ = writeln!(out);
            for (letter, choice) in ('A'..='Z').zip(choices) {
                let _ = writeln!(out, "- {}. {}", letter, choice);
            }
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "---");
    let _ = writeln!(out);
    let _ = writeln!(out, "## Answer key");
    let _ = writeln!(out);
    for (i, question) in quiz.questions.iter().enumerate() {
        let answer = match (question.answer_index(), question.choices.as_ref()) {
            (Some(idx), Some(choices)) if idx < choices.len() && idx < 26 => {
                let letter = (b'A' + idx as u8) as char;
                format!("{} ({})", letter, choices[idx])
            }
            _ => question.answer_text().unwrap_or_else(|| "-".to_string()),
        };
        let _ = writeln!(out, "{}. {}", i + 1, answer);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeneratedQuestion;

    fn sample() -> GeneratedQuiz {
        GeneratedQuiz {
            quiz_type: Some("multiple-choice".into()),
            questions: vec![
                GeneratedQuestion {
                    text: "Which structure is FIFO?".into(),
                    choices: Some(vec!["Stack".into(), "Queue".into()]),
                    answer: Some(serde_json::json!(1)),
                    ..GeneratedQuestion::default()
                },
                GeneratedQuestion {
                    text: "Define a heap.".into(),
                    answer: Some(serde_json::json!("A complete binary tree")),
                    ..GeneratedQuestion::default()
                },
            ],
        }
    }

    #[test]
    fn test_header_and_questions() {
        let md = quiz_to_markdown(&sample(), "Week 2", "Data Structures", Difficulty::Hard);
        assert!(md.starts_with("# Week 2 quiz\n"));
        assert!(md.contains("- Subject: Data Structures"));
        assert!(md.contains("- Difficulty: hard"));
        assert!(md.contains("- Questions: 2"));
        assert!(md.contains("## 1. Which structure is FIFO?"));
        assert!(md.contains("- B. Queue"));
    }

    #[test]
    fn test_answer_key() {
        let md = quiz_to_markdown(&sample(), "Week 2", "DS", Difficulty::Easy);
        let key = md.split("## Answer key").nth(1).unwrap();
        assert!(key.contains("1. B (Queue)"));
        assert!(key.contains("2. A complete binary tree"));
    }

    #[test]
    fn test_empty_quiz() {
        let md = quiz_to_markdown(&GeneratedQuiz::default(), "Empty", "OS", Difficulty::Medium);
        assert!(md.contains("- Type: mixed"));
        assert!(md.contains("- Questions: 0"));
    }
}
