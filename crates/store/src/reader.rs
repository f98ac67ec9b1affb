//! Markdown vault reader.

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::{Error, Result};
use sableye_core::{Note, NoteMetadata, NoteReader};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Reads `*.md` files from an Obsidian-style vault directory.
#[derive(Debug, Clone)]
pub struct VaultReader {
    root: PathBuf,
}

impl VaultReader {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::VaultNotFound(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every non-empty markdown note, in path order.
    ///
    /// Files that cannot be read are logged and skipped.
    pub fn scan_all(&self) -> Vec<Note> {
        let files: Vec<PathBuf> = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable vault entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && is_markdown(entry.path()))
            .map(|entry| entry.into_path())
            .collect();

        tracing::debug!(count = files.len(), "found markdown files");

        let notes: Vec<Note> = files
            .iter()
            .filter_map(|path| match self.read_note(path) {
                Ok(note) => note,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "error reading note");
                    None
                }
            })
            .collect();

        tracing::info!(count = notes.len(), "loaded notes");
        notes
    }

    /// Notes modified within the last `days` days.
    ///
    /// A window reaching past the earliest representable date covers the
    /// whole vault.
    pub fn scan_recent(&self, days: u32) -> Vec<Note> {
        let Some(cutoff) = chrono::TimeDelta::try_days(i64::from(days))
            .and_then(|window| Local::now().checked_sub_signed(window))
            .map(|start| start.naive_local())
        else {
            tracing::debug!(days, "recency window exceeds the calendar, reading all notes");
            return self.scan_all();
        };

        let notes: Vec<Note> = self
            .scan_all()
            .into_iter()
            .filter(|note| {
                chrono::NaiveDateTime::parse_from_str(&note.metadata.modified_time, TIMESTAMP_FORMAT)
                    .is_ok_and(|modified| modified > cutoff)
            })
            .collect();

        tracing::info!(count = notes.len(), days, "notes in recency window");
        notes
    }

    /// `Ok(None)` for empty files.
    fn read_note(&self, path: &Path) -> std::io::Result<Option<Note>> {
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let meta = fs::metadata(path)?;
        let modified = meta.modified()?;
        let created = meta.created().unwrap_or(modified);

        let metadata = NoteMetadata {
            source: path.strip_prefix(&self.root).unwrap_or(path).display().to_string(),
            file_name: path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            modified_time: format_timestamp(modified),
            created_time: format_timestamp(created),
        };
        Ok(Some(Note::new(content, metadata)))
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "md")
}

fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time).format(TIMESTAMP_FORMAT).to_string()
}

#[async_trait::async_trait]
impl NoteReader for VaultReader {
    async fn read_recent_notes(&self, days: u32) -> sableye_core::Result<Vec<Note>> {
        let reader = self.clone();
        tokio::task::spawn_blocking(move || reader.scan_recent(days))
            .await
            .map_err(|e| Error::Task(e.to_string()).into())
    }

    async fn read_all_notes(&self) -> sableye_core::Result<Vec<Note>> {
        let reader = self.clone();
        tokio::task::spawn_blocking(move || reader.scan_all())
            .await
            .map_err(|e| Error::Task(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn vault() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2024-01-01.md"), "Went for a run.").unwrap();
        fs::create_dir_all(dir.path().join("journal")).unwrap();
        fs::write(dir.path().join("journal").join("goals.md"), "Goal: read 12 books").unwrap();
        fs::write(dir.path().join("empty.md"), "   \n").unwrap();
        fs::write(dir.path().join("image.png"), "not markdown").unwrap();
        dir
    }

    fn age(path: &Path, days: u64) {
        let file = File::options().write(true).open(path).unwrap();
        let when = SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60);
        file.set_modified(when).unwrap();
    }

    #[test]
    fn test_missing_vault() {
        let err = VaultReader::new("/nonexistent/vault").unwrap_err();
        assert!(matches!(err, Error::VaultNotFound(_)));
    }

    #[test]
    fn test_scan_all_skips_empty_and_non_markdown() {
        let dir = vault();
        let reader = VaultReader::new(dir.path()).unwrap();
        let notes = reader.scan_all();

        assert_eq!(notes.len(), 2);
        let sources: Vec<&str> = notes.iter().map(|n| n.metadata.source.as_str()).collect();
        assert_eq!(sources, vec!["2024-01-01.md", "journal/goals.md"]);
        assert_eq!(notes[1].metadata.file_name, "goals.md");
        assert_eq!(notes[1].content, "Goal: read 12 books");
    }

    #[test]
    fn test_metadata_timestamps() {
        let dir = vault();
        let notes = VaultReader::new(dir.path()).unwrap().scan_all();
        let modified = &notes[0].metadata.modified_time;

        assert_eq!(modified.len(), 19);
        assert!(chrono::NaiveDateTime::parse_from_str(modified, TIMESTAMP_FORMAT).is_ok());
        assert!(!notes[0].metadata.created_time.is_empty());
    }

    #[test]
    fn test_scan_recent_filters_by_modification() {
        let dir = vault();
        age(&dir.path().join("2024-01-01.md"), 40);

        let reader = VaultReader::new(dir.path()).unwrap();
        let recent = reader.scan_recent(30);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].metadata.file_name, "goals.md");

        assert_eq!(reader.scan_recent(60).len(), 2);
    }

    #[tokio::test]
    async fn test_huge_window_reads_whole_vault() {
        let dir = vault();
        age(&dir.path().join("2024-01-01.md"), 4000);
        let reader = VaultReader::new(dir.path()).unwrap();

        assert_eq!(reader.scan_recent(u32::MAX).len(), 2);
        assert_eq!(reader.read_recent_notes(u32::MAX).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_note_reader_impl() {
        let dir = vault();
        let reader = VaultReader::new(dir.path()).unwrap();

        assert_eq!(reader.read_all_notes().await.unwrap().len(), 2);
        assert_eq!(reader.read_recent_notes(7).await.unwrap().len(), 2);
    }
}
