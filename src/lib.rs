//! studydesk - lecture study workspace
//!
//! Keeps uploaded lecture material open as tabs, shows the generated
//! summaries, and runs auto-graded quizzes over the material. The content
//! backend (summarization and quiz generation) is reached over HTTP.

use std::fmt;

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod library;
pub mod logging;
pub mod models;
pub mod quiz;
pub mod util;
pub mod workspace;

use workspace::TabId;

// Common error types
#[derive(Debug)]
pub enum StudyError {
    /// I/O operation failed
    IoError(std::io::Error),
    /// Configuration validation or parsing error
    ConfigError(String),
    /// Input rejected before any state was touched
    Validation(String),
    /// No open tab has this id
    TabNotFound(TabId),
    /// Another open tab already shows this content identifier
    DuplicateTab(String),
    /// The running quiz has no question with this id
    QuestionNotFound(String),
    /// Quiz operation not allowed in the current step
    InvalidState(String),
    /// Backend answered with an error
    ApiError(String),
    /// Backend could not be reached
    NetworkError(String),
    /// Backend payload could not be decoded
    DecodeError(String),
    /// Backend did not answer in time
    Timeout(String),
    /// TUI rendering or interaction error
    TuiError(String),
}

impl fmt::Display for StudyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudyError::IoError(err) => write!(f, "I/O error: {}", err),
            StudyError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            StudyError::Validation(msg) => write!(f, "Invalid input: {}", msg),
            StudyError::TabNotFound(id) => write!(f, "Tab not found: {}", id),
            StudyError::DuplicateTab(ident) => write!(f, "Tab already open: {}", ident),
            StudyError::QuestionNotFound(id) => write!(f, "Question not found: {}", id),
            StudyError::InvalidState(msg) => write!(f, "Invalid quiz state: {}", msg),
            StudyError::ApiError(msg) => write!(f, "Backend error: {}", msg),
            StudyError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            StudyError::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            StudyError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            StudyError::TuiError(msg) => write!(f, "TUI error: {}", msg),
        }
    }
}

impl std::error::Error for StudyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StudyError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StudyError {
    fn from(err: std::io::Error) -> Self {
        StudyError::IoError(err)
    }
}

impl From<serde_json::Error> for StudyError {
    fn from(err: serde_json::Error) -> Self {
        StudyError::DecodeError(format!("JSON error: {}", err))
    }
}

impl From<toml::de::Error> for StudyError {
    fn from(err: toml::de::Error) -> Self {
        StudyError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for StudyError {
    fn from(err: toml::ser::Error) -> Self {
        StudyError::ConfigError(format!("TOML serialization error: {}", err))
    }
}

impl From<reqwest::Error> for StudyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StudyError::Timeout(err.to_string())
        } else if err.is_decode() {
            StudyError::DecodeError(err.to_string())
        } else {
            StudyError::NetworkError(err.to_string())
        }
    }
}

/// Result type alias for studydesk operations
pub type Result<T> = std::result::Result<T, StudyError>;

/// Error handling utilities
pub mod error {
    use super::{Result, StudyError};
    use std::time::Duration;
    use tokio::time::sleep;

    /// Retry configuration for transient operations
    #[derive(Debug, Clone)]
    pub struct RetryConfig {
        /// Maximum number of retry attempts
        pub max_attempts: usize,
        /// Initial delay between retries
        pub initial_delay: Duration,
        /// Multiplier for exponential backoff
        pub backoff_multiplier: f64,
        /// Maximum delay between retries
        pub max_delay: Duration,
    }

    impl Default for RetryConfig {
        fn default() -> Self {
            Self {
                max_attempts: 3,
                initial_delay: Duration::from_millis(200),
                backoff_multiplier: 2.0,
                max_delay: Duration::from_secs(5),
            }
        }
    }

    /// Retry a fallible async operation with exponential backoff
    pub async fn retry_async<F, Fut, T>(operation: F, config: RetryConfig) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut delay = config.initial_delay;
        let mut last_error = None;

        for attempt in 0..config.max_attempts {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    let retryable = is_retryable_error(&err);
                    tracing::debug!(attempt, error = %err, retryable, "request failed");
                    last_error = Some(err);

                    if !retryable {
                        break;
                    }

                    // Don't sleep after the last attempt
                    if attempt + 1 < config.max_attempts {
                        sleep(delay).await;
                        delay = std::cmp::min(
                            Duration::from_millis(
                                (delay.as_millis() as f64 * config.backoff_multiplier) as u64,
                            ),
                            config.max_delay,
                        );
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            StudyError::NetworkError("Retry failed with no error".to_string())
        }))
    }

    /// Check if an error is retryable
    pub fn is_retryable_error(error: &StudyError) -> bool {
        match error {
            StudyError::IoError(io_err) => {
                matches!(
                    io_err.kind(),
                    std::io::ErrorKind::Interrupted
                        | std::io::ErrorKind::WouldBlock
                        | std::io::ErrorKind::TimedOut
                        | std::io::ErrorKind::ConnectionAborted
                        | std::io::ErrorKind::ConnectionReset
                )
            }
            StudyError::NetworkError(_) | StudyError::Timeout(_) => true,
            _ => false,
        }
    }

    /// Convert error to the dismissable message shown to the user
    pub fn user_friendly_message(error: &StudyError) -> String {
        match error {
            StudyError::NetworkError(_) => {
                "Could not reach the study server. Check your connection and try again."
                    .to_string()
            }
            StudyError::Timeout(_) => {
                "The study server took too long to answer. Try again later.".to_string()
            }
            StudyError::ApiError(msg) => format!("The study server reported an error: {}", msg),
            StudyError::Validation(msg) => msg.clone(),
            StudyError::ConfigError(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            StudyError::TabNotFound(_) => "That tab is no longer open.".to_string(),
            _ => error.to_string(),
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "studydesk";
pub const CONFIG_FILE: &str = "studydesk.toml";
pub const LOG_FILE: &str = "studydesk.log";
/// Folder for tabs opened from freshly uploaded files
pub const UPLOADED_FOLDER: &str = "uploaded";
/// Folder for generated quiz documents
pub const GENERAL_FOLDER: &str = "general";
/// Number of entries kept in the recent-items list
pub const MAX_RECENT_ITEMS: usize = 5;
/// Display titles longer than this are truncated
pub const MAX_TAB_TITLE_CHARS: usize = 80;
