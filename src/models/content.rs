//! Content payload models
//!
//! Summarized lecture material as returned by the backend, and the payload
//! a workspace tab carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Result, StudyError};

/// Payload shown by a file tab
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileContent {
    /// Title used for the content identifier
    pub title: String,
    /// Generated summary (markdown)
    #[serde(default)]
    pub summary: Option<String>,
    /// Transcript for audio/video material
    #[serde(default)]
    pub transcript: Option<String>,
    /// Original file size in bytes
    #[serde(default)]
    pub size: Option<u64>,
    /// MIME type of the original file
    #[serde(default, rename = "type", alias = "mimeType")]
    pub mime_type: Option<String>,
    /// Identifier of the stored item on the backend
    #[serde(default, rename = "id", deserialize_with = "de_opt_id")]
    pub backend_id: Option<String>,
}

impl FileContent {
    /// Create a payload with a title and summary only
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: Some(summary.into()),
            ..Self::default()
        }
    }
}

/// Per-file result of an upload request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    /// Set when this file failed; the rest of the batch is unaffected
    #[serde(default)]
    pub error: Option<String>,
}

impl UploadedFile {
    /// Turn a per-file error into `Err`
    pub fn into_result(self) -> Result<Self> {
        match self.error {
            Some(msg) => Err(StudyError::ApiError(format!("{}: {}", self.name, msg))),
            None => Ok(self),
        }
    }

    /// Payload for a tab showing this file
    pub fn to_file_content(&self) -> FileContent {
        FileContent {
            title: self.name.clone(),
            summary: self.summary.clone(),
            transcript: self.transcript.clone(),
            size: self.size,
            mime_type: self.mime_type.clone(),
            backend_id: self.id.clone(),
        }
    }
}

/// Response of the multi-file upload endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub files: Vec<UploadedFile>,
}

/// Entry in the grouped or recent content listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "subject")]
    pub folder: Option<String>,
    #[serde(default, rename = "createdAt", alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ContentItem {
    pub fn new(title: impl Into<String>, folder: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            folder: Some(folder.into()),
            created_at: None,
        }
    }

    /// Minimal payload when no detail is available
    pub fn to_file_content(&self) -> FileContent {
        FileContent {
            title: self.title.clone(),
            backend_id: self.id.clone(),
            ..FileContent::default()
        }
    }
}

/// Full stored item as returned by the detail endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
}

impl From<ItemDetail> for FileContent {
    fn from(item: ItemDetail) -> Self {
        FileContent {
            title: item.title,
            summary: item.summary,
            transcript: item.transcript,
            size: item.size,
            mime_type: item.mime_type,
            backend_id: item.id,
        }
    }
}

/// How a stored item is addressed for deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKey {
    Id(String),
    Location { folder: String, title: String },
}

/// New position of an item inside its folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemOrder {
    pub id: String,
    pub order: usize,
}

/// Backend ids arrive as either JSON strings or numbers
fn de_opt_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_response_decoding() {
        let json = r##"{
            "success": true,
            "files": [
                {"id": 17, "name": "os.pdf", "size": 2048, "type": "application/pdf", "summary": "# OS"},
                {"name": "broken.mp4", "error": "unsupported codec"}
            ]
        }"##;
        let resp: UploadResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        assert_eq!(resp.files[0].id.as_deref(), Some("17"));
        assert_eq!(resp.files[0].mime_type.as_deref(), Some("application/pdf"));
        assert!(resp.files[0].clone().into_result().is_ok());
        assert!(matches!(
            resp.files[1].clone().into_result(),
            Err(StudyError::ApiError(_))
        ));
    }

    #[test]
    fn test_item_detail_into_file_content() {
        let json = r#"{"id": "a1", "title": "Paging", "summary": "s", "mimeType": "text/plain", "size": 10}"#;
        let detail: ItemDetail = serde_json::from_str(json).unwrap();
        let file: FileContent = detail.into();
        assert_eq!(file.title, "Paging");
        assert_eq!(file.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(file.backend_id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_content_item_accepts_subject_alias() {
        let json = r#"{"title": "Trees", "subject": "Data Structures"}"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.folder.as_deref(), Some("Data Structures"));
        assert!(item.created_at.is_none());
    }
}
