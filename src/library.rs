//! Content library
//!
//! Local mirror of what the backend has stored: items grouped by folder
//! plus the most recent few. A failed load leaves an empty library rather
//! than stale data.

use tracing::{info, warn};

use crate::api::{ContentApi, GroupedContent};
use crate::models::{ContentItem, FileContent, ItemKey, ItemOrder, UploadedFile};
use crate::workspace::{content_identifier, TabId, TabManager};
use crate::{Result, MAX_RECENT_ITEMS, UPLOADED_FOLDER};

/// Sidebar highlight key for a stored item
pub fn activity_key(folder: &str, title: &str) -> String {
    format!("{}-{}", folder, title)
}

#[derive(Debug, Default)]
pub struct ContentLibrary {
    grouped: GroupedContent,
    recent: Vec<ContentItem>,
}

impl ContentLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grouped(&self) -> &GroupedContent {
        &self.grouped
    }

    pub fn recent(&self) -> &[ContentItem] {
        &self.recent
    }

    pub fn is_empty(&self) -> bool {
        self.grouped.values().all(Vec::is_empty) && self.recent.is_empty()
    }

    /// Fetch both listings.
    ///
    /// `&mut self` keeps loads from overlapping. On failure the library is
    /// emptied and the error returned.
    pub async fn load(&mut self, api: &dyn ContentApi) -> Result<()> {
        let result = tokio::try_join!(api.grouped(), api.recent());

        match result {
            Ok((grouped, recent)) => {
                self.grouped = grouped;
                self.recent = recent.into_iter().take(MAX_RECENT_ITEMS).collect();
                info!(
                    folders = self.grouped.len(),
                    recent = self.recent.len(),
                    "library loaded"
                );
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "library load failed, clearing listing");
                self.clear();
                Err(err)
            }
        }
    }

    /// Refresh only the recent list
    pub async fn refresh_recent(&mut self, api: &dyn ContentApi) -> Result<()> {
        match api.recent().await {
            Ok(recent) => {
                self.recent = recent.into_iter().take(MAX_RECENT_ITEMS).collect();
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "recent list refresh failed");
                self.recent.clear();
                Err(err)
            }
        }
    }

    pub fn clear(&mut self) {
        self.grouped.clear();
        self.recent.clear();
    }

    /// Folder names, in order
    pub fn courses(&self) -> Vec<String> {
        self.grouped.keys().cloned().collect()
    }

    /// Titles stored under `course`
    pub fn materials(&self, course: &str) -> Vec<String> {
        self.grouped
            .get(course)
            .map(|items| {
                items
                    .iter()
                    .filter(|item| !item.title.trim().is_empty())
                    .map(|item| item.title.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn listing_entry(&self, folder: &str, title: &str) -> Option<&ContentItem> {
        self.grouped
            .get(folder)
            .and_then(|items| items.iter().find(|item| item.title == title))
    }

    /// Open a stored item in a tab and highlight it.
    ///
    /// Falls back to the listing entry when the detail request fails.
    pub async fn open_item(
        &self,
        tabs: &mut TabManager,
        api: &dyn ContentApi,
        folder: &str,
        title: &str,
    ) -> TabId {
        let file = match api.item_detail(folder, title).await {
            Ok(detail) => FileContent::from(detail),
            Err(err) => {
                warn!(folder, title, error = %err, "item detail failed, using listing entry");
                self.listing_entry(folder, title)
                    .map(ContentItem::to_file_content)
                    .unwrap_or_else(|| FileContent {
                        title: title.to_string(),
                        ..FileContent::default()
                    })
            }
        };

        let id = tabs.open_file_tab(folder, file);
        tabs.set_selected_activity(Some(activity_key(folder, title)));
        id
    }

    /// Reopen every stored upload in a background tab.
    ///
    /// Uploads already open are skipped and the active tab is kept.
    pub async fn open_uploaded(&self, tabs: &mut TabManager, api: &dyn ContentApi) -> Vec<TabId> {
        let Some(items) = self.grouped.get(UPLOADED_FOLDER) else {
            return Vec::new();
        };

        let mut files = Vec::with_capacity(items.len());
        for item in items.iter().filter(|item| !item.title.trim().is_empty()) {
            let file = match api.item_detail(UPLOADED_FOLDER, &item.title).await {
                Ok(detail) => UploadedFile {
                    id: detail.id,
                    name: detail.title,
                    size: detail.size,
                    mime_type: detail.mime_type,
                    summary: detail.summary,
                    transcript: detail.transcript,
                    error: None,
                },
                Err(err) => {
                    warn!(title = %item.title, error = %err, "item detail failed, using listing entry");
                    UploadedFile {
                        id: item.id.clone(),
                        name: item.title.clone(),
                        ..UploadedFile::default()
                    }
                }
            };
            files.push(file);
        }
        tabs.open_many_file_tabs(&files)
    }

    /// Delete a stored item, close its tab and reload
    pub async fn delete_item(
        &mut self,
        tabs: &mut TabManager,
        api: &dyn ContentApi,
        folder: &str,
        title: &str,
    ) -> Result<()> {
        let key = match self.listing_entry(folder, title).and_then(|item| item.id.clone()) {
            Some(id) => ItemKey::Id(id),
            None => ItemKey::Location {
                folder: folder.to_string(),
                title: title.to_string(),
            },
        };
        api.delete_item(&key).await?;

        let identifier = content_identifier(folder, title);
        if let Some(id) = tabs.find_by_identifier(&identifier).map(|t| t.id()) {
            tabs.close_tab(id)?;
        }
        info!(folder, title, "item deleted");
        self.load(api).await
    }

    pub async fn create_folder(&mut self, api: &dyn ContentApi, name: &str) -> Result<()> {
        api.create_folder(name).await?;
        self.load(api).await
    }

    pub async fn delete_folder(&mut self, api: &dyn ContentApi, name: &str) -> Result<()> {
        api.delete_folder(name).await?;
        self.load(api).await
    }

    pub async fn move_item(&mut self, api: &dyn ContentApi, id: &str, to_folder: &str) -> Result<()> {
        api.move_item(id, to_folder).await?;
        self.load(api).await
    }

    /// Store `titles` as the new order of `folder`
    pub async fn reorder(
        &mut self,
        api: &dyn ContentApi,
        folder: &str,
        titles: &[String],
    ) -> Result<()> {
        let orders: Vec<ItemOrder> = titles
            .iter()
            .enumerate()
            .filter_map(|(order, title)| {
                self.listing_entry(folder, title)
                    .and_then(|item| item.id.clone())
                    .map(|id| ItemOrder { id, order })
            })
            .collect();
        api.reorder(folder, &orders).await?;
        self.load(api).await
    }
}
