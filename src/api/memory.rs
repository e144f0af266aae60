//! In-process content backend
//!
//! Keeps stored items in memory. Used for offline demos (`--offline`) and as
//! the collaborator in tests, where failures and latency can be injected.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::{ContentApi, GroupedContent, QuizGenerationRequest};
use crate::models::{
    ContentItem, GeneratedQuestion, GeneratedQuiz, ItemDetail, ItemKey, ItemOrder, QuestionType,
    UploadResponse, UploadedFile,
};
use crate::workspace::PendingFile;
use crate::{Result, StudyError, UPLOADED_FOLDER};

#[derive(Debug, Clone)]
struct StoredItem {
    id: String,
    folder: String,
    title: String,
    summary: Option<String>,
    size: Option<u64>,
    mime_type: Option<String>,
    order: usize,
    created_at: DateTime<Utc>,
}

impl StoredItem {
    fn listing(&self) -> ContentItem {
        ContentItem {
            id: Some(self.id.clone()),
            title: self.title.clone(),
            folder: Some(self.folder.clone()),
            created_at: Some(self.created_at),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    folders: BTreeSet<String>,
    items: Vec<StoredItem>,
    next_id: u64,
    upload_errors: HashMap<String, String>,
    offline: bool,
    latency: Duration,
    upload_calls: usize,
}

impl MemoryState {
    fn insert(&mut self, folder: &str, title: &str, summary: Option<String>) -> String {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let order = self.items.iter().filter(|i| i.folder == folder).count();
        // Spread timestamps so "recent" ordering is stable within one test
        let created_at = Utc::now() + ChronoDuration::milliseconds(self.next_id as i64);
        self.folders.insert(folder.to_string());
        self.items.push(StoredItem {
            id: id.clone(),
            folder: folder.to_string(),
            title: title.to_string(),
            summary,
            size: None,
            mime_type: None,
            order,
            created_at,
        });
        id
    }

    fn position(&self, key: &ItemKey) -> Option<usize> {
        self.items.iter().position(|item| match key {
            ItemKey::Id(id) => &item.id == id,
            ItemKey::Location { folder, title } => &item.folder == folder && &item.title == title,
        })
    }
}

/// `ContentApi` backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryContentApi {
    state: Mutex<MemoryState>,
}

impl InMemoryContentApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store an item directly, returning its id
    pub fn insert_item(&self, folder: &str, title: &str, summary: impl Into<String>) -> String {
        self.state().insert(folder, title, Some(summary.into()))
    }

    /// Make uploads of `name` report a per-file error
    pub fn set_upload_error(&self, name: impl Into<String>, message: impl Into<String>) {
        self.state().upload_errors.insert(name.into(), message.into());
    }

    /// Fail every call with `NetworkError` while set
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Delay applied before every call
    pub fn set_latency(&self, latency: Duration) {
        self.state().latency = latency;
    }

    /// Number of upload requests received
    pub fn upload_calls(&self) -> usize {
        self.state().upload_calls
    }

    /// Number of stored items
    pub fn item_count(&self) -> usize {
        self.state().items.len()
    }

    async fn simulate(&self) -> Result<()> {
        let (latency, offline) = {
            let state = self.state();
            (state.latency, state.offline)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if offline {
            return Err(StudyError::NetworkError(
                "in-memory backend is offline".to_string(),
            ));
        }
        Ok(())
    }
}

fn placeholder_questions(request: &QuizGenerationRequest) -> Vec<GeneratedQuestion> {
    (0..request.question_count)
        .map(|i| {
            let text = format!(
                "{} question {} about {}",
                request.quiz_type,
                i + 1,
                request.base_title
            );
            let (choices, answer) = match request.quiz_type {
                QuestionType::MultipleChoice => (
                    Some(
                        ["A", "B", "C", "D"]
                            .iter()
                            .map(|c| format!("Option {}", c))
                            .collect(),
                    ),
                    Some(serde_json::json!(0)),
                ),
                QuestionType::TrueFalse => (
                    Some(vec!["O".to_string(), "X".to_string()]),
                    Some(serde_json::json!("O")),
                ),
                _ => (None, Some(serde_json::json!(format!("Answer {}", i + 1)))),
            };
            GeneratedQuestion {
                id: Some(serde_json::json!(i + 1)),
                question_type: Some(request.quiz_type.label().to_string()),
                text,
                choices,
                answer,
            }
        })
        .collect()
}

#[async_trait]
impl ContentApi for InMemoryContentApi {
    async fn upload(
        &self,
        files: Vec<PendingFile>,
        _prompt: Option<String>,
    ) -> Result<UploadResponse> {
        self.simulate().await?;
        let mut state = self.state();
        state.upload_calls += 1;

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            if let Some(message) = state.upload_errors.get(&file.name).cloned() {
                results.push(UploadedFile {
                    name: file.name,
                    error: Some(message),
                    ..UploadedFile::default()
                });
                continue;
            }
            let summary = format!("# {}\n\nSummary of {}.", file.name, file.name);
            let id = state.insert(UPLOADED_FOLDER, &file.name, Some(summary.clone()));
            if let Some(item) = state.items.last_mut() {
                item.size = Some(file.size);
                item.mime_type = file.mime_type.clone();
            }
            results.push(UploadedFile {
                id: Some(id),
                name: file.name,
                size: Some(file.size),
                mime_type: file.mime_type,
                summary: Some(summary),
                transcript: None,
                error: None,
            });
        }

        Ok(UploadResponse {
            success: true,
            files: results,
        })
    }

    async fn grouped(&self) -> Result<GroupedContent> {
        self.simulate().await?;
        let state = self.state();
        let mut grouped: GroupedContent = state
            .folders
            .iter()
            .map(|f| (f.clone(), Vec::new()))
            .collect();
        let mut items: Vec<&StoredItem> = state.items.iter().collect();
        items.sort_by_key(|i| i.order);
        for item in items {
            grouped
                .entry(item.folder.clone())
                .or_default()
                .push(item.listing());
        }
        Ok(grouped)
    }

    async fn recent(&self) -> Result<Vec<ContentItem>> {
        self.simulate().await?;
        let state = self.state();
        let mut items: Vec<&StoredItem> = state.items.iter().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items.into_iter().map(StoredItem::listing).collect())
    }

    async fn item_detail(&self, folder: &str, title: &str) -> Result<ItemDetail> {
        self.simulate().await?;
        let state = self.state();
        let key = ItemKey::Location {
            folder: folder.to_string(),
            title: title.to_string(),
        };
        let item = state
            .position(&key)
            .map(|i| &state.items[i])
            .ok_or_else(|| StudyError::ApiError(format!("No stored item '{}' in '{}'", title, folder)))?;
        Ok(ItemDetail {
            id: Some(item.id.clone()),
            title: item.title.clone(),
            summary: item.summary.clone(),
            transcript: None,
            size: item.size,
            mime_type: item.mime_type.clone(),
        })
    }

    async fn delete_item(&self, key: &ItemKey) -> Result<()> {
        self.simulate().await?;
        let mut state = self.state();
        let index = state
            .position(key)
            .ok_or_else(|| StudyError::ApiError("Item not found".to_string()))?;
        state.items.remove(index);
        Ok(())
    }

    async fn create_folder(&self, name: &str) -> Result<()> {
        self.simulate().await?;
        let name = name.trim();
        if name.is_empty() {
            return Err(StudyError::ApiError("Folder name is required".to_string()));
        }
        if !self.state().folders.insert(name.to_string()) {
            return Err(StudyError::ApiError(format!("Folder '{}' already exists", name)));
        }
        Ok(())
    }

    async fn delete_folder(&self, name: &str) -> Result<()> {
        self.simulate().await?;
        let mut state = self.state();
        if !state.folders.remove(name) {
            return Err(StudyError::ApiError(format!("Folder '{}' not found", name)));
        }
        state.items.retain(|item| item.folder != name);
        Ok(())
    }

    async fn move_item(&self, id: &str, to_folder: &str) -> Result<()> {
        self.simulate().await?;
        let mut state = self.state();
        let index = state
            .position(&ItemKey::Id(id.to_string()))
            .ok_or_else(|| StudyError::ApiError("Item not found".to_string()))?;
        let order = state.items.iter().filter(|i| i.folder == to_folder).count();
        state.folders.insert(to_folder.to_string());
        let item = &mut state.items[index];
        item.folder = to_folder.to_string();
        item.order = order;
        Ok(())
    }

    async fn reorder(&self, folder: &str, orders: &[ItemOrder]) -> Result<()> {
        self.simulate().await?;
        let mut state = self.state();
        for entry in orders {
            if let Some(item) = state
                .items
                .iter_mut()
                .find(|i| i.id == entry.id && i.folder == folder)
            {
                item.order = entry.order;
            }
        }
        Ok(())
    }

    async fn generate_quiz(&self, request: &QuizGenerationRequest) -> Result<GeneratedQuiz> {
        self.simulate().await?;
        if request.content.trim().is_empty() {
            return Err(StudyError::ApiError("Content is required".to_string()));
        }
        Ok(GeneratedQuiz {
            quiz_type: Some(request.quiz_type.label().to_string()),
            questions: placeholder_questions(request),
        })
    }
}
