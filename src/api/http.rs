//! HTTP implementation of the content backend

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use url::Url;

use super::{ContentApi, GroupedContent, QuizGenerationRequest};
use crate::config::AppConfig;
use crate::error::{retry_async, RetryConfig};
use crate::models::{ContentItem, GeneratedQuiz, ItemDetail, ItemKey, ItemOrder, UploadResponse};
use crate::workspace::PendingFile;
use crate::{Result, StudyError};

#[derive(Debug, Deserialize)]
struct GroupedResponse {
    #[serde(default)]
    grouped: GroupedContent,
}

#[derive(Debug, Deserialize)]
struct RecentResponse {
    #[serde(default)]
    items: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    item: Option<ItemDetail>,
}

#[derive(Debug, Deserialize)]
struct QuizResponse {
    #[serde(default)]
    quiz: Option<GeneratedQuiz>,
}

/// `ContentApi` over the backend's REST endpoints
#[derive(Debug, Clone)]
pub struct HttpContentApi {
    /// Always ends in `/` so endpoints join below it
    base_url: Url,
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpContentApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| {
            StudyError::ConfigError(format!("Invalid api_base_url '{}': {}", base_url, e))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url,
            client,
            retry: RetryConfig::default(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `endpoint` (relative, no leading slash) below the base URL
    fn url(&self, endpoint: &str) -> Result<Url> {
        self.base_url.join(endpoint).map_err(|e| {
            StudyError::ApiError(format!("Invalid endpoint '{}': {}", endpoint, e))
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        debug!(endpoint, "GET");
        let response = self.client.get(self.url(endpoint)?).send().await?;
        read_json(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T> {
        debug!(endpoint, "POST");
        let response = self.client.post(self.url(endpoint)?).json(body).send().await?;
        read_json(response).await
    }

    async fn delete_with_query(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<()> {
        debug!(endpoint, "DELETE");
        let response = self
            .client
            .delete(self.url(endpoint)?)
            .query(query)
            .send()
            .await?;
        read_json::<serde_json::Value>(response).await.map(|_| ())
    }
}

/// Decode a success body, or turn an error reply into `ApiError`
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body
            .get("error")
            .and_then(|e| e.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
        warn!(status = status.as_u16(), %message, "backend returned an error");
        return Err(StudyError::ApiError(message));
    }
    Ok(response.json::<T>().await?)
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn upload(
        &self,
        files: Vec<PendingFile>,
        prompt: Option<String>,
    ) -> Result<UploadResponse> {
        let mut form = Form::new();
        for file in files {
            let handle = tokio::fs::File::open(&file.path).await?;
            let length = handle.metadata().await?.len();
            let body = reqwest::Body::wrap_stream(ReaderStream::new(handle));
            let mut part = Part::stream_with_length(body, length).file_name(file.name.clone());
            if let Some(mime) = file.mime_type.as_deref() {
                part = part.mime_str(mime)?;
            }
            form = form.part("files", part);
        }
        if let Some(message) = prompt.filter(|p| !p.trim().is_empty()) {
            form = form.text("message", message);
        }

        let response = self
            .client
            .post(self.url("summary/upload-multiple")?)
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = read_json(response).await?;
        if !body.success || body.files.is_empty() {
            return Err(StudyError::ApiError("Unexpected upload response".to_string()));
        }
        Ok(body)
    }

    async fn grouped(&self) -> Result<GroupedContent> {
        let body: GroupedResponse = retry_async(
            || self.get_json("summary/db/grouped"),
            self.retry.clone(),
        )
        .await?;
        Ok(body.grouped)
    }

    async fn recent(&self) -> Result<Vec<ContentItem>> {
        let body: RecentResponse =
            retry_async(|| self.get_json("summary/db/recent"), self.retry.clone()).await?;
        Ok(body.items)
    }

    async fn item_detail(&self, folder: &str, title: &str) -> Result<ItemDetail> {
        let response = self
            .client
            .get(self.url("summary/db/item")?)
            .query(&[("subject", folder), ("title", title)])
            .send()
            .await?;
        let body: DetailResponse = read_json(response).await?;
        match body.item {
            Some(item) if body.success => Ok(item),
            _ => Err(StudyError::ApiError(format!(
                "No stored item '{}' in '{}'",
                title, folder
            ))),
        }
    }

    async fn delete_item(&self, key: &ItemKey) -> Result<()> {
        match key {
            ItemKey::Id(id) => {
                self.delete_with_query("summary/db/item", &[("id", id.as_str())])
                    .await
            }
            ItemKey::Location { folder, title } => {
                self.delete_with_query(
                    "summary/db/item",
                    &[("subject", folder.as_str()), ("title", title.as_str())],
                )
                .await
            }
        }
    }

    async fn create_folder(&self, name: &str) -> Result<()> {
        self.post_json::<serde_json::Value>(
            "summary/db/folder",
            &serde_json::json!({ "name": name }),
        )
        .await
        .map(|_| ())
    }

    async fn delete_folder(&self, name: &str) -> Result<()> {
        self.delete_with_query("summary/db/folder", &[("name", name)])
            .await
    }

    async fn move_item(&self, id: &str, to_folder: &str) -> Result<()> {
        self.post_json::<serde_json::Value>(
            "summary/db/move",
            &serde_json::json!({ "id": id, "toFolder": to_folder }),
        )
        .await
        .map(|_| ())
    }

    async fn reorder(&self, folder: &str, orders: &[ItemOrder]) -> Result<()> {
        self.post_json::<serde_json::Value>(
            "summary/db/reorder",
            &serde_json::json!({ "folder": folder, "orders": orders }),
        )
        .await
        .map(|_| ())
    }

    async fn generate_quiz(&self, request: &QuizGenerationRequest) -> Result<GeneratedQuiz> {
        let body = serde_json::to_value(request)?;
        let response: QuizResponse = self.post_json("quiz/generate", &body).await?;
        response
            .quiz
            .ok_or_else(|| StudyError::ApiError("Quiz missing from response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_join_below_base_path() {
        for base in ["http://localhost:3001/api", "http://localhost:3001/api/"] {
            let api = HttpContentApi::new(base, Duration::from_secs(5)).unwrap();
            assert_eq!(api.base_url().as_str(), "http://localhost:3001/api/");
            assert_eq!(
                api.url("summary/db/grouped").unwrap().as_str(),
                "http://localhost:3001/api/summary/db/grouped"
            );
        }

        let root = HttpContentApi::new("https://study.example.com", Duration::from_secs(5)).unwrap();
        assert_eq!(
            root.url("quiz/generate").unwrap().as_str(),
            "https://study.example.com/quiz/generate"
        );
    }

    #[test]
    fn test_invalid_base_url_is_a_config_error() {
        let err = HttpContentApi::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, StudyError::ConfigError(_)));
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig::default();
        let api = HttpContentApi::from_config(&config).unwrap();
        assert_eq!(
            api.base_url().as_str().trim_end_matches('/'),
            config.api_base_url
        );
    }

    #[tokio::test]
    async fn test_upload_of_missing_file_fails_before_sending() {
        let dir = tempfile::TempDir::new().unwrap();
        let api = HttpContentApi::new("http://127.0.0.1:9/api", Duration::from_secs(1)).unwrap();
        let mut file = PendingFile::new("gone.pdf", 3);
        file.path = dir.path().join("gone.pdf");

        let err = api.upload(vec![file], None).await.unwrap_err();
        assert!(matches!(err, StudyError::IoError(_)));
    }

    #[test]
    fn test_listing_payloads_decode() {
        let grouped: GroupedResponse = serde_json::from_str(
            r#"{"grouped": {"OS": [{"title": "Paging"}, {"title": "Threads"}], "Networks": []}}"#,
        )
        .unwrap();
        assert_eq!(grouped.grouped["OS"].len(), 2);

        let recent: RecentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(recent.items.is_empty());
    }
}
