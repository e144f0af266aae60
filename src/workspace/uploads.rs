//! Pending uploads
//!
//! Files queued on the dashboard before they are sent for summarization.
//! Every check runs before the queue is touched, so a rejected batch leaves
//! no partial effect.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::UploadLimits;
use crate::util::format_bytes;
use crate::{Result, StudyError};

/// A local file waiting to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime_type: Option<String>,
}

impl PendingFile {
    /// Describe a file without touching the filesystem
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            mime_type: guess_mime_type(&name),
            name,
            size,
        }
    }

    /// Read name and size from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(StudyError::Validation(format!(
                "Not a regular file: {}",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                StudyError::Validation(format!("Path has no file name: {}", path.display()))
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            mime_type: guess_mime_type(&name),
            name,
            size: metadata.len(),
        })
    }

    /// Lower-cased extension without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    fn dedup_key(&self) -> (String, u64) {
        (self.name.clone(), self.size)
    }
}

/// Best-effort MIME type from the file extension
pub fn guess_mime_type(name: &str) -> Option<String> {
    mime_guess::from_path(name)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// Files queued for the next upload
#[derive(Debug, Clone)]
pub struct UploadQueue {
    files: Vec<PendingFile>,
    limits: UploadLimits,
}

impl UploadQueue {
    pub fn new(limits: UploadLimits) -> Self {
        Self {
            files: Vec::new(),
            limits,
        }
    }

    pub fn files(&self) -> &[PendingFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Add files not already queued (same name and size).
    ///
    /// Returns how many were added. The whole batch is rejected if any file
    /// is too large or has a disallowed extension, or if the queue would
    /// grow past the file limit.
    pub fn merge(&mut self, incoming: Vec<PendingFile>) -> Result<usize> {
        for file in &incoming {
            self.check_file(file)?;
        }

        let mut seen: HashSet<(String, u64)> =
            self.files.iter().map(PendingFile::dedup_key).collect();
        let to_add: Vec<PendingFile> = incoming
            .into_iter()
            .filter(|f| seen.insert(f.dedup_key()))
            .collect();

        if to_add.is_empty() {
            return Ok(0);
        }

        if self.files.len() + to_add.len() > self.limits.max_files {
            return Err(StudyError::Validation(format!(
                "You can upload at most {} files.",
                self.limits.max_files
            )));
        }

        let added = to_add.len();
        self.files.extend(to_add);
        Ok(added)
    }

    fn check_file(&self, file: &PendingFile) -> Result<()> {
        if file.size > self.limits.max_file_size {
            return Err(StudyError::Validation(format!(
                "'{}' is {}, larger than the {} limit.",
                file.name,
                format_bytes(file.size),
                format_bytes(self.limits.max_file_size)
            )));
        }
        let allowed = file
            .extension()
            .map(|ext| self.limits.allows_extension(&ext))
            .unwrap_or(false);
        if !allowed {
            return Err(StudyError::Validation(format!(
                "'{}' is not a supported file type.",
                file.name
            )));
        }
        Ok(())
    }

    /// Drop a queued file by name
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.name != name);
        self.files.len() != before
    }

    /// Drain the queue for sending
    pub fn take(&mut self) -> Vec<PendingFile> {
        std::mem::take(&mut self.files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> UploadQueue {
        UploadQueue::new(UploadLimits::default())
    }

    #[test]
    fn test_merge_dedups_by_name_and_size() {
        let mut q = queue();
        assert_eq!(q.merge(vec![PendingFile::new("a.pdf", 10)]).unwrap(), 1);
        assert_eq!(
            q.merge(vec![PendingFile::new("a.pdf", 10), PendingFile::new("a.pdf", 11)])
                .unwrap(),
            1
        );
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn test_merge_over_limit_is_rejected_whole() {
        let mut q = queue();
        q.merge(vec![
            PendingFile::new("1.pdf", 1),
            PendingFile::new("2.pdf", 1),
            PendingFile::new("3.pdf", 1),
            PendingFile::new("4.pdf", 1),
        ])
        .unwrap();

        let err = q
            .merge(vec![PendingFile::new("5.pdf", 1), PendingFile::new("6.pdf", 1)])
            .unwrap_err();
        assert!(matches!(err, StudyError::Validation(_)));
        assert_eq!(q.len(), 4);

        assert_eq!(q.merge(vec![PendingFile::new("5.pdf", 1)]).unwrap(), 1);
    }

    #[test]
    fn test_merge_rejects_bad_extension_and_size() {
        let mut q = queue();
        assert!(q.merge(vec![PendingFile::new("virus.exe", 1)]).is_err());
        assert!(q
            .merge(vec![
                PendingFile::new("ok.pdf", 1),
                PendingFile::new("huge.mp4", 2 * 1024 * 1024 * 1024),
            ])
            .is_err());
        assert!(q.is_empty());
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let mut q = queue();
        assert_eq!(q.merge(vec![PendingFile::new("SLIDES.PDF", 1)]).unwrap(), 1);
        assert_eq!(q.files()[0].mime_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn test_mime_type_from_registry() {
        assert_eq!(guess_mime_type("talk.webm").as_deref(), Some("video/webm"));
        assert_eq!(guess_mime_type("Week3.PDF").as_deref(), Some("application/pdf"));
        assert_eq!(guess_mime_type("README"), None);
    }

    #[test]
    fn test_remove_and_take() {
        let mut q = queue();
        q.merge(vec![PendingFile::new("a.txt", 1), PendingFile::new("b.txt", 1)])
            .unwrap();
        assert!(q.remove("a.txt"));
        assert!(!q.remove("a.txt"));
        let taken = q.take();
        assert_eq!(taken.len(), 1);
        assert!(q.is_empty());
    }

    #[test]
    fn test_from_path_reads_metadata() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let file = PendingFile::from_path(&path).unwrap();
        assert_eq!(file.name, "notes.txt");
        assert_eq!(file.size, 5);
        assert_eq!(file.mime_type.as_deref(), Some("text/plain"));

        assert!(PendingFile::from_path(dir.path()).is_err());
    }
}
