//! Workspace tabs
//!
//! Owns the ordered set of open content tabs and the active selection.
//! Tabs are de-duplicated by a content identifier derived from the tab's
//! folder and file title; there is at most one tab per identifier, except
//! for the skeleton tabs of in-flight jobs.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{FileContent, UploadedFile};
use crate::util::truncate_title;
use crate::{Result, StudyError, MAX_TAB_TITLE_CHARS, UPLOADED_FOLDER};

pub mod jobs;
pub mod uploads;

pub use jobs::{
    apply_job_event, JobEvent, JobOutcome, JobResolution, JobRunner, QuizGenerationParams,
};
pub use uploads::{PendingFile, UploadQueue};

/// Opaque tab handle, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(Uuid);

impl TabId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// View a tab opens into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabRoute {
    #[default]
    Summary,
    Quiz,
}

/// De-duplication key for a piece of content
pub fn content_identifier(folder: &str, title: &str) -> String {
    format!("{}/{}", folder, title)
}

/// One open content view
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    id: TabId,
    /// Display title (may be truncated)
    pub title: String,
    pub route: TabRoute,
    folder: String,
    pub file: FileContent,
}

impl Tab {
    fn new(folder: &str, title: String, file: FileContent) -> Self {
        Self {
            id: TabId::new(),
            title,
            route: TabRoute::Summary,
            folder: folder.to_string(),
            file,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    /// Derived from the folder and the file title on every call
    pub fn content_identifier(&self) -> String {
        content_identifier(&self.folder, &self.file.title)
    }
}

/// Fields replaced by [`TabManager::update_tab_content`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabUpdate {
    pub title: Option<String>,
    pub summary: Option<String>,
}

impl TabUpdate {
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            summary: Some(summary.into()),
        }
    }
}

/// Open tabs in display order plus the active and highlighted selections
#[derive(Debug, Default)]
pub struct TabManager {
    tabs: Vec<Tab>,
    active_tab_id: Option<TabId>,
    selected_activity_id: Option<String>,
}

impl TabManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tabs in display order
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn active_tab_id(&self) -> Option<TabId> {
        self.active_tab_id
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active_tab_id.and_then(|id| self.tab(id))
    }

    /// Position of the active tab in display order
    pub fn active_index(&self) -> Option<usize> {
        let active = self.active_tab_id?;
        self.position(active)
    }

    pub fn selected_activity_id(&self) -> Option<&str> {
        self.selected_activity_id.as_deref()
    }

    /// Set the sidebar highlight key; independent of tab membership
    pub fn set_selected_activity(&mut self, key: Option<String>) {
        self.selected_activity_id = key;
    }

    pub fn find_by_identifier(&self, identifier: &str) -> Option<&Tab> {
        self.tabs
            .iter()
            .find(|t| t.content_identifier() == identifier)
    }

    fn position(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    /// Open `file` under `folder`, or activate the tab already showing it.
    ///
    /// An existing tab is left untouched apart from becoming active.
    pub fn open_file_tab(&mut self, folder: &str, file: FileContent) -> TabId {
        let identifier = content_identifier(folder, &file.title);
        if let Some(existing) = self.find_by_identifier(&identifier) {
            let id = existing.id;
            debug!(%id, identifier = %identifier, "activating existing tab");
            self.active_tab_id = Some(id);
            return id;
        }

        let title = if file.title.is_empty() {
            "file".to_string()
        } else {
            file.title.clone()
        };
        let tab = Tab::new(folder, title, file);
        let id = tab.id;
        info!(%id, identifier = %identifier, "opened tab");
        self.tabs.push(tab);
        self.active_tab_id = Some(id);
        id
    }

    /// Append and activate a placeholder tab for a background job.
    ///
    /// Never reuses an open tab, so every job owns the tab it resolves.
    pub fn open_skeleton_tab(&mut self, folder: &str, file: FileContent) -> TabId {
        let tab = Tab::new(folder, file.title.clone(), file);
        let id = tab.id;
        debug!(%id, identifier = %tab.content_identifier(), "opened skeleton tab");
        self.tabs.push(tab);
        self.active_tab_id = Some(id);
        id
    }

    /// Open tabs for freshly uploaded files, in input order, without
    /// changing the active tab.
    ///
    /// Files whose identifier is already open, or repeated earlier in the
    /// same batch, are skipped. Returns the ids of the tabs created.
    pub fn open_many_file_tabs(&mut self, files: &[UploadedFile]) -> Vec<TabId> {
        let mut ids = Vec::new();

        for uploaded in files {
            let identifier = content_identifier(UPLOADED_FOLDER, &uploaded.name);
            if self.find_by_identifier(&identifier).is_some() {
                debug!(identifier = %identifier, "skipping already open upload");
                continue;
            }

            let mut file = uploaded.to_file_content();
            if file.summary.is_none() {
                file.summary = Some(format!(
                    "The summary of '{}' will be shown here.",
                    uploaded.name
                ));
            }
            let tab = Tab::new(
                UPLOADED_FOLDER,
                truncate_title(&uploaded.name, MAX_TAB_TITLE_CHARS),
                file,
            );
            ids.push(tab.id);
            self.tabs.push(tab);
        }

        if !ids.is_empty() {
            info!(count = ids.len(), "opened uploaded tabs");
        }
        ids
    }

    /// Point the active selection at `id`, or clear it with `None`
    pub fn set_active_tab(&mut self, id: Option<TabId>) -> Result<()> {
        if let Some(id) = id {
            if self.position(id).is_none() {
                return Err(StudyError::TabNotFound(id));
            }
        }
        self.active_tab_id = id;
        Ok(())
    }

    /// Remove a tab and return it.
    ///
    /// Closing the active tab activates its predecessor, else the first
    /// remaining tab, else nothing. Emptying the collection also clears the
    /// activity highlight.
    pub fn close_tab(&mut self, id: TabId) -> Result<Tab> {
        let index = self.position(id).ok_or(StudyError::TabNotFound(id))?;
        let removed = self.tabs.remove(index);

        if self.active_tab_id == Some(id) {
            let replacement = index
                .checked_sub(1)
                .and_then(|i| self.tabs.get(i))
                .or_else(|| self.tabs.first())
                .map(|t| t.id);
            self.active_tab_id = replacement;
        }

        if self.tabs.is_empty() {
            self.active_tab_id = None;
            self.selected_activity_id = None;
        }

        info!(%id, remaining = self.tabs.len(), "closed tab");
        Ok(removed)
    }

    /// Replace the title and/or summary of a tab in place.
    ///
    /// The content identifier follows the new title. Renaming onto an
    /// identifier held by another tab is refused.
    pub fn update_tab_content(&mut self, id: TabId, update: TabUpdate) -> Result<()> {
        let index = self.position(id).ok_or(StudyError::TabNotFound(id))?;

        if let Some(title) = update.title.as_deref() {
            let identifier = content_identifier(&self.tabs[index].folder, title);
            if let Some(other) = self.find_by_identifier(&identifier) {
                if other.id != id {
                    return Err(StudyError::DuplicateTab(identifier));
                }
            }
        }

        let tab = &mut self.tabs[index];
        if let Some(title) = update.title {
            tab.title = title.clone();
            tab.file.title = title;
        }
        if let Some(summary) = update.summary {
            tab.file.summary = Some(summary);
        }
        debug!(%id, identifier = %tab.content_identifier(), "updated tab content");
        Ok(())
    }

    /// Change the view a tab opens into
    pub fn set_route(&mut self, id: TabId, route: TabRoute) -> Result<()> {
        let index = self.position(id).ok_or(StudyError::TabNotFound(id))?;
        self.tabs[index].route = route;
        Ok(())
    }

    /// Activate the tab after the active one, wrapping around
    pub fn activate_next(&mut self) {
        if self.tabs.is_empty() {
            return;
        }
        let next = match self.active_index() {
            Some(i) => (i + 1) % self.tabs.len(),
            None => 0,
        };
        self.active_tab_id = Some(self.tabs[next].id);
    }

    /// Activate the tab before the active one, wrapping around
    pub fn activate_previous(&mut self) {
        if self.tabs.is_empty() {
            return;
        }
        let prev = match self.active_index() {
            Some(0) | None => self.tabs.len() - 1,
            Some(i) => i - 1,
        };
        self.active_tab_id = Some(self.tabs[prev].id);
    }

    /// Close every tab
    pub fn clear(&mut self) {
        self.tabs.clear();
        self.active_tab_id = None;
        self.selected_activity_id = None;
    }
}
