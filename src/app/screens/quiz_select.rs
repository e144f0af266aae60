//! Quiz selection screen
//!
//! Three columns: course, materials of that course, question types.
//! Materials and types are multi-select.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::models::{QuestionType, QuizMeta};

/// Column with keyboard focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectSection {
    Course,
    Materials,
    Types,
}

impl SelectSection {
    fn next(self) -> Self {
        match self {
            SelectSection::Course => SelectSection::Materials,
            SelectSection::Materials => SelectSection::Types,
            SelectSection::Types => SelectSection::Course,
        }
    }

    fn previous(self) -> Self {
        match self {
            SelectSection::Course => SelectSection::Types,
            SelectSection::Materials => SelectSection::Course,
            SelectSection::Types => SelectSection::Materials,
        }
    }
}

#[derive(Debug)]
pub struct QuizSelectScreen {
    section: SelectSection,
    courses: Vec<String>,
    course: Option<usize>,
    course_state: ListState,
    materials: Vec<String>,
    picked_materials: Vec<bool>,
    material_state: ListState,
    picked_types: Vec<bool>,
    type_state: ListState,
    error: Option<String>,
}

impl QuizSelectScreen {
    pub fn new() -> Self {
        let mut type_state = ListState::default();
        type_state.select(Some(0));
        Self {
            section: SelectSection::Course,
            courses: Vec::new(),
            course: None,
            course_state: ListState::default(),
            materials: Vec::new(),
            picked_materials: Vec::new(),
            material_state: ListState::default(),
            picked_types: vec![false; QuestionType::ALL.len()],
            type_state,
            error: None,
        }
    }

    pub fn section(&self) -> SelectSection {
        self.section
    }

    /// Replace the course list; the previous pick is kept if still offered
    pub fn set_courses(&mut self, courses: Vec<String>) {
        let previous = self.selected_course().map(str::to_string);
        self.courses = courses;
        self.course = previous.and_then(|p| self.courses.iter().position(|c| *c == p));
        self.course_state
            .select(if self.courses.is_empty() { None } else { Some(self.course.unwrap_or(0)) });
        if self.course.is_none() {
            self.set_materials(Vec::new());
        }
    }

    /// Course under the cursor, used to load its materials
    pub fn highlighted_course(&self) -> Option<&str> {
        self.course_state
            .selected()
            .and_then(|i| self.courses.get(i))
            .map(String::as_str)
    }

    pub fn selected_course(&self) -> Option<&str> {
        self.course
            .and_then(|i| self.courses.get(i))
            .map(String::as_str)
    }

    /// Lock in the highlighted course. Materials must be supplied next.
    pub fn pick_highlighted_course(&mut self) -> Option<String> {
        let index = self.course_state.selected()?;
        self.course = Some(index);
        self.section = SelectSection::Materials;
        self.courses.get(index).cloned()
    }

    pub fn set_materials(&mut self, materials: Vec<String>) {
        self.picked_materials = vec![false; materials.len()];
        self.material_state
            .select(if materials.is_empty() { None } else { Some(0) });
        self.materials = materials;
    }

    pub fn next_section(&mut self) {
        self.section = self.section.next();
    }

    pub fn previous_section(&mut self) {
        self.section = self.section.previous();
    }

    fn focused(&mut self) -> (&mut ListState, usize) {
        match self.section {
            SelectSection::Course => (&mut self.course_state, self.courses.len()),
            SelectSection::Materials => (&mut self.material_state, self.materials.len()),
            SelectSection::Types => (&mut self.type_state, QuestionType::ALL.len()),
        }
    }

    pub fn select_next(&mut self) {
        let (state, len) = self.focused();
        if len == 0 {
            return;
        }
        let next = state.selected().map(|i| (i + 1) % len).unwrap_or(0);
        state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        let (state, len) = self.focused();
        if len == 0 {
            return;
        }
        let prev = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(prev));
    }

    /// Toggle the highlighted material or type
    pub fn toggle(&mut self) {
        match self.section {
            SelectSection::Materials => {
                if let Some(picked) = self
                    .material_state
                    .selected()
                    .and_then(|i| self.picked_materials.get_mut(i))
                {
                    *picked = !*picked;
                }
            }
            SelectSection::Types => {
                if let Some(picked) = self
                    .type_state
                    .selected()
                    .and_then(|i| self.picked_types.get_mut(i))
                {
                    *picked = !*picked;
                }
            }
            SelectSection::Course => {}
        }
    }

    /// Parameters as currently picked
    pub fn meta(&self) -> QuizMeta {
        let materials = self
            .materials
            .iter()
            .zip(&self.picked_materials)
            .filter(|(_, picked)| **picked)
            .map(|(m, _)| m.clone())
            .collect();
        let types = QuestionType::ALL
            .iter()
            .zip(&self.picked_types)
            .filter(|(_, picked)| **picked)
            .map(|(t, _)| *t)
            .collect();
        QuizMeta::new(self.selected_course().unwrap_or_default(), materials, types)
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn render(&mut self, f: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(f.size());

        let title = Paragraph::new("Start a quiz")
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(title, rows[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(40),
                Constraint::Percentage(30),
            ])
            .split(rows[1]);

        let course_items: Vec<ListItem> = self
            .courses
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mark = if self.course == Some(i) { "● " } else { "  " };
                ListItem::new(format!("{}{}", mark, c))
            })
            .collect();
        let material_items: Vec<ListItem> = self
            .materials
            .iter()
            .zip(&self.picked_materials)
            .map(|(m, picked)| ListItem::new(format!("{} {}", checkbox(*picked), m)))
            .collect();
        let type_items: Vec<ListItem> = QuestionType::ALL
            .iter()
            .zip(&self.picked_types)
            .map(|(t, picked)| ListItem::new(format!("{} {}", checkbox(*picked), t)))
            .collect();

        let section = self.section;
        render_column(
            f,
            columns[0],
            "Course",
            course_items,
            &mut self.course_state,
            section == SelectSection::Course,
        );
        render_column(
            f,
            columns[1],
            "Materials",
            material_items,
            &mut self.material_state,
            section == SelectSection::Materials,
        );
        render_column(
            f,
            columns[2],
            "Question types",
            type_items,
            &mut self.type_state,
            section == SelectSection::Types,
        );

        self.render_help(f, rows[2]);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let line = match &self.error {
            Some(error) => Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
            None => Line::from(vec![
                Span::styled("Tab", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw(" Column  "),
                Span::styled("Enter", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw(" Pick/Toggle  "),
                Span::styled("s", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw(" Start  "),
                Span::styled("Esc", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw(" Back"),
            ]),
        };
        let help = Paragraph::new(line).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
        f.render_widget(help, area);
    }
}

impl Default for QuizSelectScreen {
    fn default() -> Self {
        Self::new()
    }
}

fn checkbox(picked: bool) -> &'static str {
    if picked {
        "[x]"
    } else {
        "[ ]"
    }
}

fn render_column(
    f: &mut Frame,
    area: Rect,
    title: &str,
    items: Vec<ListItem>,
    state: &mut ListState,
    focused: bool,
) {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.to_string())
                .border_style(border),
        )
        .highlight_style(Style::default().bg(Color::Cyan).fg(Color::Black))
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, state);
}
