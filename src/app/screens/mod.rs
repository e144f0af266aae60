//! TUI screen components
//!
//! One screen per application state: the tabbed workspace and the three
//! quiz steps.

pub mod quiz_result;
pub mod quiz_run;
pub mod quiz_select;
pub mod workspace;

pub use quiz_result::{QuizResultScreen, ResultAction};
pub use quiz_run::QuizRunScreen;
pub use quiz_select::{QuizSelectScreen, SelectSection};
pub use workspace::{LibraryEntry, StatusMessage, WorkspaceScreen, WorkspaceView};
