//! Content backend interface
//!
//! The backend stores summarized lecture material by folder and generates
//! quizzes. Every call is a single request/response; callers decide how a
//! failure rolls back their own placeholder state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{
    ContentItem, Difficulty, GeneratedQuiz, ItemDetail, ItemKey, ItemOrder, QuestionType,
    UploadResponse,
};
use crate::workspace::PendingFile;
use crate::Result;

pub mod http;
pub mod memory;

pub use http::HttpContentApi;
pub use memory::InMemoryContentApi;

/// Folder name -> items in folder order
pub type GroupedContent = BTreeMap<String, Vec<ContentItem>>;

/// Body of a quiz generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizGenerationRequest {
    /// Source text the questions are drawn from
    pub content: String,
    pub quiz_type: QuestionType,
    pub subject: String,
    pub question_count: usize,
    pub difficulty: Difficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_prompt: Option<String>,
    /// Title of the source document
    pub base_title: String,
}

/// Operations offered by the content backend
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Upload files for summarization; per-file failures are reported in
    /// the matching entry's `error` field
    async fn upload(&self, files: Vec<PendingFile>, prompt: Option<String>)
        -> Result<UploadResponse>;

    /// Stored items grouped by folder
    async fn grouped(&self) -> Result<GroupedContent>;

    /// Stored items, most recent first
    async fn recent(&self) -> Result<Vec<ContentItem>>;

    /// Full content of one stored item
    async fn item_detail(&self, folder: &str, title: &str) -> Result<ItemDetail>;

    async fn delete_item(&self, key: &ItemKey) -> Result<()>;

    async fn create_folder(&self, name: &str) -> Result<()>;

    async fn delete_folder(&self, name: &str) -> Result<()>;

    async fn move_item(&self, id: &str, to_folder: &str) -> Result<()>;

    async fn reorder(&self, folder: &str, orders: &[ItemOrder]) -> Result<()>;

    /// Generate a quiz from source text
    async fn generate_quiz(&self, request: &QuizGenerationRequest) -> Result<GeneratedQuiz>;
}
