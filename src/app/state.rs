//! Application state management
//!
//! Handles screen transitions, navigation logic, and keyboard event processing
//! for the TUI application.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::quiz::QuizStep;

/// Application screens/states
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AppState {
    /// Open tabs, the active document and the library sidebar
    #[default]
    Workspace,
    /// Course, material and question type selection
    QuizSelect,
    /// One question at a time
    QuizRunning,
    /// Score and per-question review
    QuizResult,
}

impl AppState {
    /// Screen showing a quiz engine step
    pub fn for_quiz_step(step: QuizStep) -> Self {
        match step {
            QuizStep::Selecting => AppState::QuizSelect,
            QuizStep::Running => AppState::QuizRunning,
            QuizStep::ShowingResult => AppState::QuizResult,
        }
    }

    pub fn is_quiz(&self) -> bool {
        !matches!(self, AppState::Workspace)
    }
}

/// Navigation actions that can be triggered by keyboard input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationAction {
    /// Move selection up (arrow up, k)
    Up,
    /// Move selection down (arrow down, j)
    Down,
    /// Move selection left (arrow left, h)
    Left,
    /// Move selection right (arrow right, l)
    Right,
    /// Confirm selection (Enter, Space)
    Select,
    /// Go back/cancel (Esc)
    Back,
    /// Next item (Tab)
    Next,
    /// Previous item (Shift+Tab)
    Previous,
    /// Quit application (q, Q, Ctrl+C)
    Quit,
    /// No action
    None,
}

/// Application state manager
#[derive(Debug)]
pub struct StateManager {
    current_state: AppState,
    previous_state: Option<AppState>,
    should_quit: bool,
}

impl StateManager {
    /// Create a new state manager starting at the workspace
    pub fn new() -> Self {
        Self {
            current_state: AppState::Workspace,
            previous_state: None,
            should_quit: false,
        }
    }

    /// Get the current application state
    pub fn current_state(&self) -> &AppState {
        &self.current_state
    }

    /// Get the previous state if available
    pub fn previous_state(&self) -> Option<&AppState> {
        self.previous_state.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Transition to a new state
    pub fn transition_to(&mut self, new_state: AppState) {
        if new_state != self.current_state {
            self.previous_state = Some(self.current_state.clone());
            self.current_state = new_state;
        }
    }

    /// Go back to the previous state if available, otherwise to the workspace
    pub fn go_back(&mut self) {
        self.current_state = self.previous_state.take().unwrap_or_default();
    }

    /// Follow the quiz engine onto the screen for its step
    pub fn follow_quiz(&mut self, step: QuizStep) {
        self.transition_to(AppState::for_quiz_step(step));
    }

    /// Apply the actions every screen shares
    pub fn handle_navigation(&mut self, action: NavigationAction) {
        match action {
            NavigationAction::Quit => self.should_quit = true,
            NavigationAction::Back => match self.current_state {
                AppState::Workspace => self.should_quit = true,
                // Leaving the quiz always lands on the workspace
                AppState::QuizSelect => {
                    self.previous_state = None;
                    self.current_state = AppState::Workspace;
                }
                _ => self.transition_to(AppState::QuizSelect),
            },
            // Everything else is screen specific
            _ => {}
        }
    }

    /// Convert keyboard event to navigation action
    pub fn key_to_navigation(key: KeyEvent) -> NavigationAction {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => NavigationAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                NavigationAction::Quit
            }

            KeyCode::Up | KeyCode::Char('k') => NavigationAction::Up,
            KeyCode::Down | KeyCode::Char('j') => NavigationAction::Down,
            KeyCode::Left | KeyCode::Char('h') => NavigationAction::Left,
            KeyCode::Right | KeyCode::Char('l') => NavigationAction::Right,

            KeyCode::Enter | KeyCode::Char(' ') => NavigationAction::Select,

            KeyCode::Esc => NavigationAction::Back,

            KeyCode::BackTab => NavigationAction::Previous,
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    NavigationAction::Previous
                } else {
                    NavigationAction::Next
                }
            }

            _ => NavigationAction::None,
        }
    }

    /// Convert keys for a free-text field: only control keys navigate
    pub fn key_to_text_navigation(key: KeyEvent) -> NavigationAction {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                NavigationAction::Quit
            }
            KeyCode::Char(_) => NavigationAction::None,
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                Self::key_to_navigation(key)
            }
            KeyCode::Enter => NavigationAction::Next,
            _ => Self::key_to_navigation(key),
        }
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_state_manager_creation() {
        let state_manager = StateManager::new();
        assert_eq!(*state_manager.current_state(), AppState::Workspace);
        assert!(!state_manager.should_quit());
        assert!(state_manager.previous_state().is_none());
    }

    #[test]
    fn test_state_transitions() {
        let mut state_manager = StateManager::new();

        state_manager.transition_to(AppState::QuizSelect);
        assert_eq!(*state_manager.current_state(), AppState::QuizSelect);
        assert_eq!(state_manager.previous_state(), Some(&AppState::Workspace));

        state_manager.transition_to(AppState::QuizRunning);
        assert_eq!(state_manager.previous_state(), Some(&AppState::QuizSelect));

        // Same state is not recorded twice
        state_manager.transition_to(AppState::QuizRunning);
        assert_eq!(state_manager.previous_state(), Some(&AppState::QuizSelect));
    }

    #[test]
    fn test_go_back() {
        let mut state_manager = StateManager::new();

        state_manager.transition_to(AppState::QuizSelect);
        state_manager.go_back();
        assert_eq!(*state_manager.current_state(), AppState::Workspace);
        assert!(state_manager.previous_state().is_none());

        state_manager.go_back();
        assert_eq!(*state_manager.current_state(), AppState::Workspace);
    }

    #[test]
    fn test_follow_quiz_steps() {
        let mut state_manager = StateManager::new();
        state_manager.follow_quiz(QuizStep::Running);
        assert_eq!(*state_manager.current_state(), AppState::QuizRunning);
        state_manager.follow_quiz(QuizStep::ShowingResult);
        assert_eq!(*state_manager.current_state(), AppState::QuizResult);
        state_manager.follow_quiz(QuizStep::Running);
        assert_eq!(*state_manager.current_state(), AppState::QuizRunning);
        assert!(state_manager.current_state().is_quiz());
    }

    #[test]
    fn test_back_navigation() {
        let mut state_manager = StateManager::new();
        state_manager.transition_to(AppState::QuizSelect);
        state_manager.transition_to(AppState::QuizRunning);

        state_manager.handle_navigation(NavigationAction::Back);
        assert_eq!(*state_manager.current_state(), AppState::QuizSelect);

        state_manager.handle_navigation(NavigationAction::Back);
        assert_eq!(*state_manager.current_state(), AppState::Workspace);
        assert!(!state_manager.should_quit());

        state_manager.handle_navigation(NavigationAction::Back);
        assert!(state_manager.should_quit());
    }

    #[test]
    fn test_key_to_navigation() {
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Char('q'))),
            NavigationAction::Quit
        );
        assert_eq!(
            StateManager::key_to_navigation(KeyEvent::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL
            )),
            NavigationAction::Quit
        );
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Char('k'))),
            NavigationAction::Up
        );
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Down)),
            NavigationAction::Down
        );
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Enter)),
            NavigationAction::Select
        );
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Esc)),
            NavigationAction::Back
        );
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::Tab)),
            NavigationAction::Next
        );
        assert_eq!(
            StateManager::key_to_navigation(key(KeyCode::BackTab)),
            NavigationAction::Previous
        );
    }

    #[test]
    fn test_text_navigation_lets_letters_through() {
        assert_eq!(
            StateManager::key_to_text_navigation(key(KeyCode::Char('q'))),
            NavigationAction::None
        );
        assert_eq!(
            StateManager::key_to_text_navigation(key(KeyCode::Char(' '))),
            NavigationAction::None
        );
        assert_eq!(
            StateManager::key_to_text_navigation(key(KeyCode::Enter)),
            NavigationAction::Next
        );
        assert_eq!(
            StateManager::key_to_text_navigation(key(KeyCode::Esc)),
            NavigationAction::Back
        );
    }
}
