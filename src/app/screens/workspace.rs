//! Workspace screen
//!
//! Tab bar across the top, the active document in the middle, the content
//! library on the right and a status line at the bottom.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::library::ContentLibrary;
use crate::util::format_bytes;
use crate::workspace::{TabManager, TabRoute, UploadQueue};

/// One selectable sidebar row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub folder: String,
    pub title: String,
}

/// Dismissable message on the status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Everything the workspace shows, borrowed from the app
pub struct WorkspaceView<'a> {
    pub tabs: &'a TabManager,
    pub library: &'a ContentLibrary,
    pub uploads: &'a UploadQueue,
    pub pending_jobs: usize,
    /// Active tab holds a quiz that can be run
    pub quiz_ready: bool,
}

#[derive(Debug, Default)]
pub struct WorkspaceScreen {
    entries: Vec<LibraryEntry>,
    list_state: ListState,
    scroll: u16,
    status: Option<StatusMessage>,
}

impl WorkspaceScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild sidebar rows from the library, keeping the selection in range
    pub fn sync_library(&mut self, library: &ContentLibrary) {
        self.entries = library
            .grouped()
            .iter()
            .flat_map(|(folder, items)| {
                items.iter().map(move |item| LibraryEntry {
                    folder: folder.clone(),
                    title: item.title.clone(),
                })
            })
            .collect();

        let selected = match (self.entries.len(), self.list_state.selected()) {
            (0, _) => None,
            (len, Some(i)) => Some(i.min(len - 1)),
            (_, None) => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn selected_entry(&self) -> Option<&LibraryEntry> {
        self.list_state.selected().and_then(|i| self.entries.get(i))
    }

    pub fn select_next(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let next = match self.list_state.selected() {
            Some(i) if i + 1 < self.entries.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let prev = match self.list_state.selected() {
            Some(0) | None => self.entries.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(prev));
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(5);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(5);
    }

    /// Back to the top, e.g. after switching tabs
    pub fn reset_scroll(&mut self) {
        self.scroll = 0;
    }

    pub fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error,
        });
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn dismiss_status(&mut self) -> bool {
        self.status.take().is_some()
    }

    pub fn render(&mut self, f: &mut Frame, view: &WorkspaceView<'_>) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tab bar
                Constraint::Min(8),    // Document + sidebar
                Constraint::Length(3), // Status
                Constraint::Length(1), // Help
            ])
            .split(f.size());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(rows[1]);

        self.render_tab_bar(f, rows[0], view.tabs);
        self.render_document(f, columns[0], view.tabs);
        self.render_library(f, columns[1], view);
        self.render_status(f, rows[2], view);
        self.render_help(f, rows[3], view.quiz_ready);
    }

    fn render_tab_bar(&self, f: &mut Frame, area: Rect, tabs: &TabManager) {
        let titles: Vec<Line> = tabs
            .tabs()
            .iter()
            .map(|tab| {
                let marker = match tab.route {
                    TabRoute::Summary => "",
                    TabRoute::Quiz => "? ",
                };
                Line::from(format!("{}{}", marker, tab.title))
            })
            .collect();

        let bar = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Tabs"))
            .select(tabs.active_index().unwrap_or(0))
            .highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(bar, area);
    }

    fn render_document(&self, f: &mut Frame, area: Rect, tabs: &TabManager) {
        let Some(tab) = tabs.active_tab() else {
            let empty = Paragraph::new(vec![
                Line::from(""),
                Line::from("No document open"),
                Line::from(""),
                Line::from("Pick an item from the library, or pass files on the command line."),
            ])
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
            f.render_widget(empty, area);
            return;
        };

        let mut title = format!(" {} ", tab.folder());
        if let Some(size) = tab.file.size {
            title.push_str(&format!("· {} ", format_bytes(size)));
        }
        let body = tab
            .file
            .summary
            .clone()
            .or_else(|| tab.file.transcript.clone())
            .unwrap_or_else(|| "No summary available.".to_string());

        let document = Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(Color::Cyan)),
            );
        f.render_widget(document, area);
    }

    fn render_library(&mut self, f: &mut Frame, area: Rect, view: &WorkspaceView<'_>) {
        let highlighted = view.tabs.selected_activity_id();
        let mut current_folder: Option<&str> = None;
        let items: Vec<ListItem> = if self.entries.is_empty() {
            vec![ListItem::new("No stored material")]
        } else {
            self.entries
                .iter()
                .map(|entry| {
                    let mut lines = Vec::new();
                    if current_folder != Some(entry.folder.as_str()) {
                        current_folder = Some(entry.folder.as_str());
                        lines.push(Line::from(Span::styled(
                            entry.folder.clone(),
                            Style::default()
                                .fg(Color::Yellow)
                                .add_modifier(Modifier::BOLD),
                        )));
                    }
                    let key = crate::library::activity_key(&entry.folder, &entry.title);
                    let style = if highlighted == Some(key.as_str()) {
                        Style::default().fg(Color::Green)
                    } else {
                        Style::default()
                    };
                    lines.push(Line::from(Span::styled(format!("  {}", entry.title), style)));
                    ListItem::new(lines)
                })
                .collect()
        };

        let recent = view
            .library
            .recent()
            .iter()
            .map(|item| item.title.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Library")
                    .title_bottom(format!(" Recent: {} ", recent)),
            )
            .highlight_style(Style::default().bg(Color::Cyan).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn render_status(&self, f: &mut Frame, area: Rect, view: &WorkspaceView<'_>) {
        let mut spans = vec![Span::raw(format!(
            "{} tab(s)  {} queued  {} running",
            view.tabs.len(),
            view.uploads.len(),
            view.pending_jobs
        ))];
        if let Some(status) = &self.status {
            let style = if status.is_error {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Green)
            };
            spans.push(Span::raw("  |  "));
            spans.push(Span::styled(status.text.clone(), style));
        }

        let status = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
        f.render_widget(status, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect, quiz_ready: bool) {
        let key = |k: &'static str| {
            Span::styled(
                k,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        };
        let mut spans = vec![
            key("Tab"),
            Span::raw(" Switch  "),
            key("↑↓"),
            Span::raw(" Library  "),
            key("Enter"),
            Span::raw(" Open  "),
            key("x"),
            Span::raw(" Close  "),
            key("d"),
            Span::raw(" Delete  "),
            key("r"),
            Span::raw(" Reload  "),
            key("u"),
            Span::raw(" Upload  "),
            key("o"),
            Span::raw(" Reopen uploads  "),
            key("g"),
            Span::raw(" Make quiz  "),
            key("z"),
            Span::raw(" Quiz  "),
        ];
        if quiz_ready {
            spans.push(key("p"));
            spans.push(Span::raw(" Play  "));
        }
        spans.push(key("Q"));
        spans.push(Span::raw(" Quit"));

        f.render_widget(
            Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
            area,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryContentApi;
    use crate::config::UploadLimits;
    use crate::models::FileContent;
    use ratatui::{backend::TestBackend, Terminal};

    async fn library() -> ContentLibrary {
        let api = InMemoryContentApi::new();
        api.insert_item("OS", "Paging", "p");
        api.insert_item("OS", "Threads", "t");
        api.insert_item("Networks", "TCP", "h");
        let mut library = ContentLibrary::new();
        library.load(&api).await.unwrap();
        library
    }

    #[tokio::test]
    async fn test_sidebar_rows_follow_folder_order() {
        let mut screen = WorkspaceScreen::new();
        screen.sync_library(&library().await);

        let titles: Vec<_> = screen.entries().iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["TCP", "Paging", "Threads"]);
        assert_eq!(screen.selected_entry().unwrap().title, "TCP");

        screen.select_previous();
        assert_eq!(screen.selected_entry().unwrap().title, "Threads");
        screen.select_next();
        assert_eq!(screen.selected_entry().unwrap().title, "TCP");
    }

    #[tokio::test]
    async fn test_selection_clamped_when_library_shrinks() {
        let mut screen = WorkspaceScreen::new();
        screen.sync_library(&library().await);
        screen.select_previous();

        screen.sync_library(&ContentLibrary::new());
        assert!(screen.selected_entry().is_none());
    }

    #[test]
    fn test_status_message_dismissal() {
        let mut screen = WorkspaceScreen::new();
        assert!(!screen.dismiss_status());
        screen.set_status("Upload failed", true);
        assert!(screen.status().unwrap().is_error);
        assert!(screen.dismiss_status());
        assert!(screen.status().is_none());
    }

    #[tokio::test]
    async fn test_render_shows_active_document() {
        let library = library().await;
        let mut tabs = TabManager::new();
        tabs.open_file_tab("OS", FileContent::new("Paging", "Pages map to frames"));
        let uploads = UploadQueue::new(UploadLimits::default());

        let mut screen = WorkspaceScreen::new();
        screen.sync_library(&library);
        let view = WorkspaceView {
            tabs: &tabs,
            library: &library,
            uploads: &uploads,
            pending_jobs: 0,
            quiz_ready: false,
        };

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| screen.render(f, &view)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Pages map to frames"));
        assert!(text.contains("Library"));
    }
}
