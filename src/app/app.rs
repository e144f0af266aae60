//! Main application controller
//!
//! Owns the workspace, the quiz engine and the screens. Background job
//! results are drained once per tick, before the frame is drawn.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Alignment,
    style::{Color, Style},
    widgets::{Paragraph, Wrap},
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    api::ContentApi,
    app::{
        screens::{
            QuizResultScreen, QuizRunScreen, QuizSelectScreen, ResultAction, SelectSection,
            WorkspaceScreen, WorkspaceView,
        },
        state::{AppState, NavigationAction, StateManager},
        tui::{Tui, MIN_HEIGHT, MIN_WIDTH},
    },
    config::AppConfig,
    error::user_friendly_message,
    library::ContentLibrary,
    models::{Question, QuizMeta},
    quiz::QuizEngine,
    workspace::{
        apply_job_event, JobOutcome, JobResolution, JobRunner, PendingFile, QuizGenerationParams,
        TabId, TabManager, UploadQueue,
    },
    Result, StudyError,
};

/// TUI application controller
pub struct App {
    /// Terminal UI handler
    tui: Tui,
    /// Application state manager
    state_manager: StateManager,
    /// Application config
    config: AppConfig,
    tabs: TabManager,
    library: ContentLibrary,
    jobs: JobRunner,
    uploads: UploadQueue,
    quiz: QuizEngine,
    /// Quizzes generated by the backend, keyed by the tab showing them
    generated: HashMap<TabId, (QuizMeta, Vec<Question>)>,
    /// Screen components
    workspace_screen: WorkspaceScreen,
    quiz_select_screen: QuizSelectScreen,
    quiz_run_screen: QuizRunScreen,
    quiz_result_screen: QuizResultScreen,
}

impl App {
    /// Create a new application instance
    pub fn new(config: AppConfig, api: Arc<dyn ContentApi>) -> Result<Self> {
        Ok(Self {
            tui: Tui::new()?,
            state_manager: StateManager::new(),
            tabs: TabManager::new(),
            library: ContentLibrary::new(),
            jobs: JobRunner::new(api, config.request_timeout),
            uploads: UploadQueue::new(config.upload.clone()),
            quiz: QuizEngine::with_placeholder_questions(config.quiz.questions_per_type),
            generated: HashMap::new(),
            workspace_screen: WorkspaceScreen::new(),
            quiz_select_screen: QuizSelectScreen::new(),
            quiz_run_screen: QuizRunScreen::new(),
            quiz_result_screen: QuizResultScreen::new(),
            config,
        })
    }

    /// Queue files for upload; they are sent when the loop starts
    pub fn queue_files(&mut self, paths: &[PathBuf]) -> Result<usize> {
        let files = paths
            .iter()
            .map(PendingFile::from_path)
            .collect::<Result<Vec<_>>>()?;
        self.uploads.merge(files)
    }

    /// Initialize the application and TUI
    pub fn init(&mut self) -> Result<()> {
        self.tui.init()
    }

    /// Give the terminal back
    pub fn restore(&mut self) -> Result<()> {
        self.tui.restore()
    }

    /// Run the main application loop
    pub async fn run(&mut self) -> Result<()> {
        self.reload_library().await;
        if !self.uploads.is_empty() {
            self.submit_uploads();
        }

        while !self.state_manager.should_quit() {
            self.drain_jobs().await;
            self.draw()?;
            if let Some(key) = self.tui.next_key()? {
                self.handle_key(key).await;
            }
        }
        info!(pending = self.jobs.pending(), "leaving main loop");
        Ok(())
    }

    /// Draw the current screen
    fn draw(&mut self) -> Result<()> {
        let adequate = self.tui.is_size_adequate()?;
        let quiz_ready = self
            .tabs
            .active_tab_id()
            .is_some_and(|id| self.generated.contains_key(&id));

        let Self {
            tui,
            state_manager,
            tabs,
            library,
            jobs,
            uploads,
            quiz,
            workspace_screen,
            quiz_select_screen,
            quiz_run_screen,
            quiz_result_screen,
            ..
        } = self;
        let view = WorkspaceView {
            tabs,
            library,
            uploads,
            pending_jobs: jobs.pending(),
            quiz_ready,
        };

        tui.draw(|f| {
            if !adequate {
                let message = Paragraph::new(format!(
                    "Terminal too small. Resize to at least {}x{}.",
                    MIN_WIDTH, MIN_HEIGHT
                ))
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
                f.render_widget(message, f.size());
                return;
            }
            match state_manager.current_state() {
                AppState::Workspace => workspace_screen.render(f, &view),
                AppState::QuizSelect => quiz_select_screen.render(f),
                AppState::QuizRunning => quiz_run_screen.render(f, quiz),
                AppState::QuizResult => quiz_result_screen.render(f, quiz),
            }
        })
    }

    /// Apply every finished background job
    async fn drain_jobs(&mut self) {
        let mut reload = false;
        while let Some(event) = self.jobs.try_next() {
            let label = event.label.clone();
            let uploaded = matches!(event.outcome, Ok(JobOutcome::Summarized(_)));

            match apply_job_event(&mut self.tabs, event) {
                JobResolution::Completed(_) => {
                    self.workspace_screen.reset_scroll();
                    self.workspace_screen
                        .set_status(format!("{} is ready.", label), false);
                    reload |= uploaded;
                }
                JobResolution::QuizReady {
                    tab_id,
                    meta,
                    questions,
                } => {
                    self.generated.insert(tab_id, (meta, questions));
                    self.workspace_screen.reset_scroll();
                    self.workspace_screen
                        .set_status(format!("{} is ready. Press p to take it.", label), false);
                }
                JobResolution::AlreadyOpen(_) => {
                    self.workspace_screen
                        .set_status(format!("{} is already open.", label), false);
                }
                JobResolution::Failed(err) => {
                    self.workspace_screen.set_status(
                        format!("{}: {}", label, user_friendly_message(&err)),
                        true,
                    );
                }
                JobResolution::Orphaned => {}
            }
        }

        let tabs = &self.tabs;
        self.generated.retain(|id, _| tabs.tab(*id).is_some());

        if reload {
            self.reload_library().await;
        }
    }

    async fn reload_library(&mut self) {
        let api = self.jobs.api();
        if let Err(err) = self.library.load(api.as_ref()).await {
            self.workspace_screen
                .set_status(user_friendly_message(&err), true);
        }
        self.workspace_screen.sync_library(&self.library);
    }

    async fn open_stored_uploads(&mut self) {
        let api = self.jobs.api();
        let opened = self.library.open_uploaded(&mut self.tabs, api.as_ref()).await;
        let text = match opened.len() {
            0 => "All stored uploads are already open".to_string(),
            1 => "Opened 1 stored upload".to_string(),
            n => format!("Opened {} stored uploads", n),
        };
        self.workspace_screen.set_status(text, false);
    }

    fn report(&mut self, result: Result<()>) {
        if let Err(err) = result {
            warn!(error = %err, "action failed");
            self.workspace_screen
                .set_status(user_friendly_message(&err), true);
        }
    }

    /// Handle one key press for the current screen
    async fn handle_key(&mut self, key: KeyEvent) {
        match self.state_manager.current_state().clone() {
            AppState::Workspace => self.handle_workspace_key(key).await,
            AppState::QuizSelect => self.handle_quiz_select_key(key),
            AppState::QuizRunning => self.handle_quiz_run_key(key),
            AppState::QuizResult => self.handle_quiz_result_key(key),
        }
    }

    async fn handle_workspace_key(&mut self, key: KeyEvent) {
        if !key.modifiers.contains(KeyModifiers::CONTROL) {
            let handled = match key.code {
                KeyCode::Char('x') => {
                    self.close_active_tab();
                    true
                }
                KeyCode::Char('d') => {
                    self.delete_selected_item().await;
                    true
                }
                KeyCode::Char('r') => {
                    self.reload_library().await;
                    true
                }
                KeyCode::Char('u') => {
                    self.submit_uploads();
                    true
                }
                KeyCode::Char('o') => {
                    self.open_stored_uploads().await;
                    true
                }
                KeyCode::Char('g') => {
                    self.generate_quiz();
                    true
                }
                KeyCode::Char('z') => {
                    self.open_quiz_select();
                    true
                }
                KeyCode::Char('p') => {
                    self.take_generated_quiz();
                    true
                }
                KeyCode::PageDown => {
                    self.workspace_screen.scroll_down();
                    true
                }
                KeyCode::PageUp => {
                    self.workspace_screen.scroll_up();
                    true
                }
                _ => false,
            };
            if handled {
                return;
            }
        }

        match StateManager::key_to_navigation(key) {
            NavigationAction::Next | NavigationAction::Right => {
                self.tabs.activate_next();
                self.workspace_screen.reset_scroll();
            }
            NavigationAction::Previous | NavigationAction::Left => {
                self.tabs.activate_previous();
                self.workspace_screen.reset_scroll();
            }
            NavigationAction::Up => self.workspace_screen.select_previous(),
            NavigationAction::Down => self.workspace_screen.select_next(),
            NavigationAction::Select => self.open_selected_item().await,
            NavigationAction::Back => {
                // First Esc only dismisses the message
                if !self.workspace_screen.dismiss_status() {
                    self.state_manager.handle_navigation(NavigationAction::Back);
                }
            }
            action => self.state_manager.handle_navigation(action),
        }
    }

    fn close_active_tab(&mut self) {
        let Some(id) = self.tabs.active_tab_id() else {
            return;
        };
        let result = self.tabs.close_tab(id).map(|_| ());
        self.generated.remove(&id);
        self.workspace_screen.reset_scroll();
        self.report(result);
    }

    async fn open_selected_item(&mut self) {
        let Some(entry) = self.workspace_screen.selected_entry().cloned() else {
            return;
        };
        let api = self.jobs.api();
        self.library
            .open_item(&mut self.tabs, api.as_ref(), &entry.folder, &entry.title)
            .await;
        self.workspace_screen.reset_scroll();
    }

    async fn delete_selected_item(&mut self) {
        let Some(entry) = self.workspace_screen.selected_entry().cloned() else {
            return;
        };
        let api = self.jobs.api();
        let result = self
            .library
            .delete_item(&mut self.tabs, api.as_ref(), &entry.folder, &entry.title)
            .await;
        self.workspace_screen.sync_library(&self.library);
        match result {
            Ok(()) => self
                .workspace_screen
                .set_status(format!("Deleted {}.", entry.title), false),
            Err(err) => self.report(Err(err)),
        }
    }

    fn submit_uploads(&mut self) {
        if self.uploads.is_empty() {
            self.workspace_screen.set_status(
                "No files queued. Pass file paths on the command line.",
                false,
            );
            return;
        }
        let files = self.uploads.take();
        match self.jobs.submit_uploads(&mut self.tabs, files, None) {
            Ok(ids) => self
                .workspace_screen
                .set_status(format!("Uploading {} file(s)…", ids.len()), false),
            Err(err) => self.report(Err(err)),
        }
    }

    fn generate_quiz(&mut self) {
        let Some(tab) = self.tabs.active_tab() else {
            self.report(Err(StudyError::Validation(
                "Open a document to generate a quiz from.".to_string(),
            )));
            return;
        };
        let source = tab.file.clone();
        let params = QuizGenerationParams::from_defaults(&self.config.quiz, tab.folder());
        let result = self
            .jobs
            .submit_quiz_generation(&mut self.tabs, &source, params)
            .map(|_| ());
        self.workspace_screen.reset_scroll();
        self.report(result);
    }

    fn take_generated_quiz(&mut self) {
        let generated = self
            .tabs
            .active_tab_id()
            .and_then(|id| self.generated.get(&id))
            .cloned();
        let Some((meta, questions)) = generated else {
            self.workspace_screen
                .set_status("This tab has no quiz to take.", false);
            return;
        };
        match self.quiz.start_with_questions(meta, questions) {
            Ok(()) => {
                self.quiz_run_screen.sync(&self.quiz);
                self.state_manager.follow_quiz(self.quiz.step());
            }
            Err(err) => self.report(Err(err)),
        }
    }

    fn open_quiz_select(&mut self) {
        let mut courses = self.library.courses();
        if courses.is_empty() {
            courses = self.config.subjects.clone();
        }
        self.quiz.close();
        self.quiz_select_screen.set_courses(courses);
        if let Some(course) = self.quiz_select_screen.selected_course().map(str::to_string) {
            self.quiz_select_screen
                .set_materials(self.library.materials(&course));
        }
        self.quiz_select_screen.set_error(None);
        self.state_manager.transition_to(AppState::QuizSelect);
    }

    fn handle_quiz_select_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('s') {
            let meta = self.quiz_select_screen.meta();
            match self.quiz.start_quiz(meta) {
                Ok(()) => {
                    self.quiz_select_screen.set_error(None);
                    self.quiz_run_screen.sync(&self.quiz);
                    self.state_manager.follow_quiz(self.quiz.step());
                }
                Err(err) => self
                    .quiz_select_screen
                    .set_error(Some(user_friendly_message(&err))),
            }
            return;
        }

        match StateManager::key_to_navigation(key) {
            NavigationAction::Next | NavigationAction::Right => {
                self.quiz_select_screen.next_section()
            }
            NavigationAction::Previous | NavigationAction::Left => {
                self.quiz_select_screen.previous_section()
            }
            NavigationAction::Up => self.quiz_select_screen.select_previous(),
            NavigationAction::Down => self.quiz_select_screen.select_next(),
            NavigationAction::Select => {
                if self.quiz_select_screen.section() == SelectSection::Course {
                    if let Some(course) = self.quiz_select_screen.pick_highlighted_course() {
                        self.quiz_select_screen
                            .set_materials(self.library.materials(&course));
                    }
                } else {
                    self.quiz_select_screen.toggle();
                }
            }
            NavigationAction::Back => {
                self.quiz.close();
                self.state_manager.handle_navigation(NavigationAction::Back);
            }
            action => self.state_manager.handle_navigation(action),
        }
    }

    fn handle_quiz_run_key(&mut self, key: KeyEvent) {
        let Some(question) = self.quiz.current_question().cloned() else {
            return;
        };
        let choice = question.question_type.is_choice_type();

        if !choice && !key.modifiers.contains(KeyModifiers::CONTROL) {
            let edited = match key.code {
                KeyCode::Char(c) => {
                    self.quiz_run_screen.push_char(c);
                    true
                }
                KeyCode::Backspace => {
                    self.quiz_run_screen.pop_char();
                    true
                }
                _ => false,
            };
            if edited {
                self.record_current(&question);
                return;
            }
        }

        let action = if choice {
            StateManager::key_to_navigation(key)
        } else {
            StateManager::key_to_text_navigation(key)
        };
        match action {
            NavigationAction::Up if choice => self.quiz_run_screen.select_previous_choice(&question),
            NavigationAction::Down if choice => self.quiz_run_screen.select_next_choice(&question),
            NavigationAction::Select if choice => self.record_current(&question),
            NavigationAction::Next | NavigationAction::Right => {
                if self.quiz.can_submit() {
                    self.submit_quiz();
                } else if self.quiz.next() {
                    self.quiz_run_screen.sync(&self.quiz);
                }
            }
            NavigationAction::Previous | NavigationAction::Left => {
                if self.quiz.previous() {
                    self.quiz_run_screen.sync(&self.quiz);
                }
            }
            NavigationAction::Back => {
                self.quiz.close();
                self.state_manager.handle_navigation(NavigationAction::Back);
            }
            NavigationAction::Quit => self.state_manager.quit(),
            _ => {}
        }
    }

    fn record_current(&mut self, question: &Question) {
        let Some(answer) = self.quiz_run_screen.answer_for(question) else {
            return;
        };
        if let Err(err) = self.quiz.record_answer(&question.id, answer) {
            warn!(error = %err, question = %question.id, "answer not recorded");
        }
    }

    fn submit_quiz(&mut self) {
        match self.quiz.submit_recorded() {
            Ok(score) => {
                info!(%score, "quiz submitted");
                self.quiz_result_screen.reset();
                self.state_manager.follow_quiz(self.quiz.step());
            }
            Err(err) => warn!(error = %err, "quiz submit failed"),
        }
    }

    fn handle_quiz_result_key(&mut self, key: KeyEvent) {
        match StateManager::key_to_navigation(key) {
            NavigationAction::Left | NavigationAction::Previous => {
                self.quiz_result_screen.select_previous_action()
            }
            NavigationAction::Right | NavigationAction::Next => {
                self.quiz_result_screen.select_next_action()
            }
            NavigationAction::Up => self.quiz_result_screen.scroll_up(),
            NavigationAction::Down => {
                let rows = self.quiz.questions().len();
                self.quiz_result_screen.scroll_down(rows);
            }
            NavigationAction::Select => match self.quiz_result_screen.selected_action() {
                ResultAction::Retry => {
                    if let Err(err) = self.quiz.retry() {
                        warn!(error = %err, "quiz retry failed");
                        return;
                    }
                    self.quiz_run_screen.sync(&self.quiz);
                    self.state_manager.follow_quiz(self.quiz.step());
                }
                ResultAction::Close => {
                    self.quiz.close();
                    self.state_manager.follow_quiz(self.quiz.step());
                }
            },
            NavigationAction::Back => {
                self.quiz.close();
                self.state_manager.handle_navigation(NavigationAction::Back);
            }
            NavigationAction::Quit => self.state_manager.quit(),
            NavigationAction::None => {}
        }
    }
}
