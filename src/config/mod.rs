//! Configuration management module
//!
//! Handles loading, saving, and validation of the application settings:
//! where the content backend lives, upload limits and quiz defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::Difficulty;
use crate::util::units::{bytes_serde, duration_serde};
use crate::{Result, StudyError, APP_NAME, CONFIG_FILE};

/// Environment variable overriding `api_base_url`
pub const API_URL_ENV: &str = "STUDYDESK_API_URL";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the content/quiz backend, including the `/api` prefix
    pub api_base_url: String,
    /// Upper bound for any single backend request
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Course list offered when the backend has none
    pub subjects: Vec<String>,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Upload restrictions
    pub upload: UploadLimits,
    /// Quiz defaults
    pub quiz: QuizDefaults,
}

/// Limits checked before files are queued
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    /// Files per upload batch
    pub max_files: usize,
    /// Largest accepted file (in bytes)
    #[serde(with = "bytes_serde")]
    pub max_file_size: u64,
    /// Lower-case extensions without the dot
    pub allowed_extensions: Vec<String>,
}

/// Quiz parameters used when the user doesn't pick them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizDefaults {
    /// Placeholder questions per (type, material) pair
    pub questions_per_type: usize,
    /// Questions requested from the backend generator
    pub question_count: usize,
    pub difficulty: Difficulty,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001/api".to_string(),
            request_timeout: Duration::from_secs(60),
            subjects: [
                "Data Structures",
                "Operating Systems",
                "Computer Networks",
                "Computer Graphics",
                "Information Security",
                "Databases",
                "Software Engineering",
                "Algorithms",
                "Web Programming",
                "Artificial Intelligence",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            log_level: "info".to_string(),
            upload: UploadLimits::default(),
            quiz: QuizDefaults::default(),
        }
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_file_size: 1024 * 1024 * 1024, // 1 GiB
            allowed_extensions: [
                "pdf", "mp4", "mkv", "avi", "mov", "wmv", "mp3", "wav", "flac", "ogg", "aac",
                "txt", "doc", "docx",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl UploadLimits {
    pub fn allows_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.allowed_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
    }
}

impl Default for QuizDefaults {
    fn default() -> Self {
        Self {
            questions_per_type: 3,
            question_count: 5,
            difficulty: Difficulty::Medium,
        }
    }
}

impl AppConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.api_base_url).map_err(|e| {
            StudyError::ConfigError(format!("Invalid api_base_url '{}': {}", self.api_base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(StudyError::ConfigError(format!(
                "api_base_url must be http or https, got {}",
                url.scheme()
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(StudyError::ConfigError(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        const MAX_TIMEOUT: Duration = Duration::from_secs(3600);
        if self.request_timeout > MAX_TIMEOUT {
            return Err(StudyError::ConfigError(format!(
                "Request timeout too long: {}s (max: {}s)",
                self.request_timeout.as_secs(),
                MAX_TIMEOUT.as_secs()
            )));
        }

        if self.upload.max_files == 0 {
            return Err(StudyError::ConfigError(
                "max_files must be greater than 0".to_string(),
            ));
        }

        const MAX_FILES: usize = 50;
        if self.upload.max_files > MAX_FILES {
            return Err(StudyError::ConfigError(format!(
                "Too many files per upload: {} (max: {})",
                self.upload.max_files, MAX_FILES
            )));
        }

        if self.upload.max_file_size == 0 {
            return Err(StudyError::ConfigError(
                "max_file_size must be greater than 0".to_string(),
            ));
        }

        if self.upload.allowed_extensions.is_empty() {
            return Err(StudyError::ConfigError(
                "allowed_extensions must not be empty".to_string(),
            ));
        }

        if self.quiz.questions_per_type == 0 {
            return Err(StudyError::ConfigError(
                "questions_per_type must be greater than 0".to_string(),
            ));
        }

        if !(1..=20).contains(&self.quiz.question_count) {
            return Err(StudyError::ConfigError(format!(
                "question_count must be between 1 and 20, got {}",
                self.quiz.question_count
            )));
        }

        Ok(())
    }

    /// Set the backend base URL
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Apply overrides from the environment
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_file_path()?)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            StudyError::ConfigError(format!(
                "Failed to read config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            StudyError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the standard config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Validate before saving
        self.validate()?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StudyError::ConfigError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| {
            StudyError::ConfigError(format!(
                "Failed to write config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/studydesk/studydesk.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            StudyError::ConfigError("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.upload.max_files, 5);
        assert_eq!(config.quiz.questions_per_type, 3);
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::default().with_request_timeout(Duration::from_secs(90));
        let toml_str = toml::to_string(&config).expect("Failed to serialize to TOML");
        assert!(toml_str.contains("request_timeout = \"1m 30s\""));

        let deserialized: AppConfig =
            toml::from_str(&toml_str).expect("Failed to deserialize from TOML");
        assert_eq!(deserialized, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            api_base_url = "https://study.example.com/api"

            [upload]
            max_file_size = "200 MiB"
            "#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://study.example.com/api");
        assert_eq!(config.upload.max_file_size, 200 * 1024 * 1024);
        assert_eq!(config.upload.max_files, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_validation_failures() {
        let bad_url = AppConfig::default().with_api_base_url("not a url");
        assert!(matches!(bad_url.validate(), Err(StudyError::ConfigError(_))));

        let ftp = AppConfig::default().with_api_base_url("ftp://example.com");
        assert!(ftp.validate().is_err());

        let zero_timeout = AppConfig::default().with_request_timeout(Duration::ZERO);
        assert!(zero_timeout.validate().is_err());

        let mut no_ext = AppConfig::default();
        no_ext.upload.allowed_extensions.clear();
        assert!(no_ext.validate().is_err());

        let mut too_many_questions = AppConfig::default();
        too_many_questions.quiz.question_count = 21;
        assert!(too_many_questions.validate().is_err());
    }

    #[test]
    fn test_save_and_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = AppConfig::default();
        config.upload.max_files = 3;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.upload.max_files, 3);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = AppConfig::load_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, AppConfig::default());
    }

    #[test]
    fn test_allows_extension() {
        let limits = UploadLimits::default();
        assert!(limits.allows_extension("PDF"));
        assert!(limits.allows_extension(".mp3"));
        assert!(!limits.allows_extension("exe"));
    }

    #[test]
    fn test_config_file_path() {
        let path = AppConfig::config_file_path();
        assert!(path.is_ok());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("studydesk"));
        assert!(path.to_string_lossy().contains("studydesk.toml"));
    }
}
