//! Quiz result screen
//!
//! Score summary, a review table and the Retry / Close actions.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};

use crate::quiz::QuizEngine;

/// Available actions on the result screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultAction {
    Retry,
    Close,
}

impl ResultAction {
    pub fn all() -> [Self; 2] {
        [Self::Retry, Self::Close]
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            Self::Retry => "Retry",
            Self::Close => "Close",
        }
    }
}

#[derive(Debug)]
pub struct QuizResultScreen {
    selected_action: ResultAction,
    offset: usize,
}

impl QuizResultScreen {
    pub fn new() -> Self {
        Self {
            selected_action: ResultAction::Retry,
            offset: 0,
        }
    }

    /// Reset for a freshly submitted quiz
    pub fn reset(&mut self) {
        self.selected_action = ResultAction::Retry;
        self.offset = 0;
    }

    pub fn selected_action(&self) -> ResultAction {
        self.selected_action
    }

    pub fn select_next_action(&mut self) {
        let actions = ResultAction::all();
        let current = actions
            .iter()
            .position(|a| *a == self.selected_action)
            .unwrap_or(0);
        self.selected_action = actions[(current + 1) % actions.len()];
    }

    pub fn select_previous_action(&mut self) {
        // Two actions: previous and next coincide
        self.select_next_action();
    }

    pub fn scroll_down(&mut self, rows: usize) {
        if self.offset + 1 < rows {
            self.offset += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.offset = self.offset.saturating_sub(1);
    }

    pub fn render(&self, f: &mut Frame, engine: &QuizEngine) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5), // Score
                Constraint::Min(6),    // Review
                Constraint::Length(3), // Actions
                Constraint::Length(1), // Help
            ])
            .split(f.size());

        self.render_score(f, chunks[0], engine);
        self.render_review(f, chunks[1], engine);
        self.render_actions(f, chunks[2]);

        let help = Line::from(vec![
            Span::styled("←→", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(" Choose  "),
            Span::styled("↑↓", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(" Scroll  "),
            Span::styled("Enter", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(" Confirm"),
        ]);
        f.render_widget(Paragraph::new(help).alignment(Alignment::Center), chunks[3]);
    }

    fn render_score(&self, f: &mut Frame, area: Rect, engine: &QuizEngine) {
        let score = engine.score();
        let color = match score.percent {
            80..=100 => Color::Green,
            50..=79 => Color::Yellow,
            _ => Color::Red,
        };
        let taken = engine
            .session()
            .and_then(|s| s.time_taken())
            .and_then(|d| d.to_std().ok())
            .map(|d| crate::util::format_duration(std::time::Duration::from_secs(d.as_secs())))
            .unwrap_or_else(|| "-".to_string());

        let text = vec![
            Line::from(Span::styled(
                format!("{} / {}  ({}%)", score.score, score.max, score.percent),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "{} questions, {} auto-graded · time {}",
                engine.questions().len(),
                score.max,
                taken
            )),
        ];
        f.render_widget(
            Paragraph::new(text).alignment(Alignment::Center).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Result")
                    .border_style(Style::default().fg(Color::Cyan)),
            ),
            area,
        );
    }

    fn render_review(&self, f: &mut Frame, area: Rect, engine: &QuizEngine) {
        let rows: Vec<Row> = engine
            .review()
            .into_iter()
            .skip(self.offset)
            .map(|row| {
                let verdict = match (row.auto_gradable, row.correct) {
                    (false, _) => "·",
                    (true, true) => "✓",
                    (true, false) => "✗",
                };
                let style = match (row.auto_gradable, row.correct) {
                    (true, true) => Style::default().fg(Color::Green),
                    (true, false) => Style::default().fg(Color::Red),
                    _ => Style::default(),
                };
                Row::new(vec![
                    row.number.to_string(),
                    verdict.to_string(),
                    row.text,
                    row.given.unwrap_or_else(|| "(no answer)".to_string()),
                    row.expected,
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Length(2),
                Constraint::Percentage(50),
                Constraint::Percentage(25),
                Constraint::Percentage(25),
            ],
        )
        .header(
            Row::new(vec!["#", "", "Question", "Your answer", "Correct"])
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Review"))
        .column_spacing(1);
        f.render_widget(table, area);
    }

    fn render_actions(&self, f: &mut Frame, area: Rect) {
        let centered = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(30),
                Constraint::Min(0),
            ])
            .split(area)[1];
        let buttons = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(centered);

        for (action, slot) in ResultAction::all().into_iter().zip(buttons.iter()) {
            let selected = action == self.selected_action;
            let style = if selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let button = Paragraph::new(action.display_text())
                .style(style)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(button, *slot);
        }
    }
}

impl Default for QuizResultScreen {
    fn default() -> Self {
        Self::new()
    }
}
