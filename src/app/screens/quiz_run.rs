//! Quiz run screen
//!
//! Shows one question at a time with strict previous/next movement.
//! Choice questions are answered from a list, the rest by typing.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::models::{Answer, Question};
use crate::quiz::QuizEngine;

#[derive(Debug, Default)]
pub struct QuizRunScreen {
    choice_state: ListState,
    input: String,
}

impl QuizRunScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the recorded answer of the current question into the widgets
    pub fn sync(&mut self, engine: &QuizEngine) {
        self.input.clear();
        self.choice_state.select(None);

        let Some(question) = engine.current_question() else {
            return;
        };
        let recorded = engine.session().and_then(|s| s.answer(&question.id));
        if question.question_type.is_choice_type() {
            let index = match recorded {
                Some(Answer::Choice(i)) => *i,
                _ => 0,
            };
            self.choice_state.select(Some(index));
        } else if let Some(Answer::Text(text)) = recorded {
            self.input = text.clone();
        }
    }

    pub fn highlighted_choice(&self) -> Option<usize> {
        self.choice_state.selected()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn select_next_choice(&mut self, question: &Question) {
        let len = question.choices.as_ref().map_or(0, Vec::len);
        if len == 0 {
            return;
        }
        let next = self.choice_state.selected().map(|i| (i + 1) % len).unwrap_or(0);
        self.choice_state.select(Some(next));
    }

    pub fn select_previous_choice(&mut self, question: &Question) {
        let len = question.choices.as_ref().map_or(0, Vec::len);
        if len == 0 {
            return;
        }
        let prev = match self.choice_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.choice_state.select(Some(prev));
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }

    /// Answer the widgets currently hold for `question`
    pub fn answer_for(&self, question: &Question) -> Option<Answer> {
        if question.question_type.is_choice_type() {
            self.choice_state.selected().map(Answer::Choice)
        } else {
            Some(Answer::Text(self.input.clone()))
        }
    }

    pub fn render(&mut self, f: &mut Frame, engine: &QuizEngine) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Progress
                Constraint::Min(8),    // Question
                Constraint::Length(3), // Help
            ])
            .split(f.size());

        let total = engine.questions().len();
        let header = engine
            .session()
            .map(|s| format!("{} · {}", s.meta.course, s.meta.types_label()))
            .unwrap_or_default();
        f.render_widget(
            Paragraph::new(header)
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            rows[0],
        );

        let answered = engine.session().map_or(0, |s| s.answers().len());
        let ratio = if total == 0 {
            0.0
        } else {
            (engine.cursor() + 1) as f64 / total as f64
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(ratio.clamp(0.0, 1.0))
            .label(format!(
                "Question {}/{}  ({} answered)",
                engine.cursor() + 1,
                total,
                answered
            ));
        f.render_widget(gauge, rows[1]);

        if let Some(question) = engine.current_question() {
            self.render_question(f, rows[2], question);
        }
        self.render_help(f, rows[3], engine.can_submit());
    }

    fn render_question(&mut self, f: &mut Frame, area: Rect, question: &Question) {
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(3)])
            .split(area);

        let mut title = format!(" {} ", question.question_type);
        if let Some(material) = &question.material {
            title.push_str(&format!("· {} ", material));
        }
        f.render_widget(
            Paragraph::new(question.text.clone())
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title(title)),
            parts[0],
        );

        match &question.choices {
            Some(choices) if question.question_type.is_choice_type() => {
                let items: Vec<ListItem> = choices
                    .iter()
                    .enumerate()
                    .map(|(i, c)| ListItem::new(format!("{}. {}", (b'A' + (i % 26) as u8) as char, c)))
                    .collect();
                let list = List::new(items)
                    .block(Block::default().borders(Borders::ALL).title("Answer"))
                    .highlight_style(Style::default().bg(Color::Cyan).fg(Color::Black))
                    .highlight_symbol(">> ");
                f.render_stateful_widget(list, parts[1], &mut self.choice_state);
            }
            _ => {
                let hint = if question.question_type.is_long_form() {
                    "Answer (essay)"
                } else {
                    "Answer"
                };
                f.render_widget(
                    Paragraph::new(format!("{}▏", self.input))
                        .wrap(Wrap { trim: false })
                        .block(
                            Block::default()
                                .borders(Borders::ALL)
                                .title(hint)
                                .border_style(Style::default().fg(Color::Cyan)),
                        ),
                    parts[1],
                );
            }
        }
    }

    fn render_help(&self, f: &mut Frame, area: Rect, can_submit: bool) {
        let key = |k: &'static str| {
            Span::styled(k, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        };
        let advance = if can_submit { " Submit  " } else { " Next  " };
        let line = Line::from(vec![
            key("←"),
            Span::raw(" Previous  "),
            key("→/Tab"),
            Span::raw(advance),
            key("↑↓ Enter"),
            Span::raw(" Choose  "),
            key("Esc"),
            Span::raw(" Quit quiz"),
        ]);
        f.render_widget(
            Paragraph::new(line).alignment(Alignment::Center).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow)),
            ),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuestionType, QuizMeta};
    use crate::quiz::PlaceholderGenerator;

    fn question(id: &str, question_type: QuestionType) -> Question {
        let choices = question_type
            .is_choice_type()
            .then(|| vec!["O".to_string(), "X".to_string()]);
        Question {
            id: id.to_string(),
            question_type,
            text: "?".to_string(),
            answer: choices.as_ref().map(|_| 0),
            choices,
            material: None,
        }
    }

    fn engine() -> QuizEngine {
        let mut engine = QuizEngine::new(Box::new(PlaceholderGenerator::seeded(0)), 1);
        engine
            .start_with_questions(
                QuizMeta::new("OS", vec!["m".into()], vec![]),
                vec![
                    question("1", QuestionType::TrueFalse),
                    question("2", QuestionType::ShortAnswer),
                ],
            )
            .unwrap();
        engine
    }

    #[test]
    fn test_sync_restores_recorded_answers() {
        let mut engine = engine();
        let mut screen = QuizRunScreen::new();

        engine.record_answer("1", Answer::Choice(1)).unwrap();
        screen.sync(&engine);
        assert_eq!(screen.highlighted_choice(), Some(1));

        engine.next();
        engine.record_answer("2", Answer::Text("paging".into())).unwrap();
        screen.sync(&engine);
        assert_eq!(screen.input(), "paging");
        assert!(screen.highlighted_choice().is_none());
    }

    #[test]
    fn test_choice_cycling_wraps() {
        let q = question("1", QuestionType::TrueFalse);
        let mut screen = QuizRunScreen::new();
        screen.select_previous_choice(&q);
        assert_eq!(screen.highlighted_choice(), Some(1));
        screen.select_next_choice(&q);
        assert_eq!(screen.highlighted_choice(), Some(0));
        assert_eq!(screen.answer_for(&q), Some(Answer::Choice(0)));
    }

    #[test]
    fn test_text_input_editing() {
        let q = question("2", QuestionType::Essay);
        let mut screen = QuizRunScreen::new();
        for c in "tlb".chars() {
            screen.push_char(c);
        }
        screen.pop_char();
        assert_eq!(screen.answer_for(&q), Some(Answer::Text("tl".into())));
    }
}
