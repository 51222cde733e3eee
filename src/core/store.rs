//! Filesystem persistence for rendered output and manually added notes.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::OutputConfig;
use crate::error::{CodedocError, Result};
use super::render::RenderedDoc;

/// Where a rendered document and its notes were written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedPaths {
    pub doc: PathBuf,
    pub notes: PathBuf,
}

/// Writes rendered markdown under the documentation directory and notes
/// under the notes directory.
pub struct OutputStore {
    docs_dir: PathBuf,
    notes_dir: PathBuf,
}

impl OutputStore {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            docs_dir: config.docs_dir.clone(),
            notes_dir: config.notes_dir.clone(),
        }
    }

    /// Persist both outputs as `documentation_{stem}.md` and `notes_{stem}.txt`
    pub async fn persist(&self, rendered: &RenderedDoc, stem: &str) -> Result<SavedPaths> {
        tokio::fs::create_dir_all(&self.docs_dir).await?;
        tokio::fs::create_dir_all(&self.notes_dir).await?;

        let doc = self.docs_dir.join(format!("documentation_{}.md", stem));
        let notes = self.notes_dir.join(format!("notes_{}.txt", stem));

        tokio::fs::write(&doc, &rendered.markdown).await?;
        tokio::fs::write(&notes, &rendered.notes).await?;

        debug!("Wrote {} and {}", doc.display(), notes.display());
        Ok(SavedPaths { doc, notes })
    }
}

/// Most recent generated notes file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestNotes {
    pub file_name: String,
    pub content: String,
}

/// Manual notes file plus read access to generated notes
pub struct NotesStore {
    notes_dir: PathBuf,
    manual_file: PathBuf,
}

impl NotesStore {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            notes_dir: config.notes_dir.clone(),
            manual_file: config.manual_notes_file.clone(),
        }
    }

    /// Append one line to the manual notes file, creating it when needed
    pub async fn add_note(&self, note: &str) -> Result<()> {
        if let Some(parent) = self.manual_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.manual_file)
            .await?;
        file.write_all(format!("{}\n", note).as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Trimmed manual notes, or `None` when there are none
    pub async fn read_manual(&self) -> Result<Option<String>> {
        if !self.manual_file.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.manual_file).await?;
        let trimmed = content.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    /// Newest `notes_*.txt` file by modification time. Names lead with a
    /// language or basename, so they only break ties.
    pub fn latest_notes_file(&self) -> Result<Option<PathBuf>> {
        if !self.notes_dir.is_dir() {
            return Ok(None);
        }

        let mut latest: Option<(SystemTime, PathBuf)> = None;
        for entry in WalkDir::new(&self.notes_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| CodedocError::FileSystem(e.to_string()))?;
            if !entry.file_type().is_file() || !is_generated_notes(entry.path()) {
                continue;
            }

            let modified = entry
                .metadata()
                .map_err(|e| CodedocError::FileSystem(e.to_string()))?
                .modified()?;
            let newer = match &latest {
                None => true,
                Some((time, path)) => {
                    (modified, Some(entry.file_name())) > (*time, path.file_name())
                }
            };
            if newer {
                latest = Some((modified, entry.path().to_path_buf()));
            }
        }

        Ok(latest.map(|(_, path)| path))
    }

    pub async fn latest_notes(&self) -> Result<Option<LatestNotes>> {
        let Some(path) = self.latest_notes_file()? else {
            return Ok(None);
        };

        let content = tokio::fs::read_to_string(&path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Some(LatestNotes {
            file_name,
            content: content.trim().to_string(),
        }))
    }

    /// Last line of the newest generated notes file
    pub async fn latest_line(&self) -> Result<Option<String>> {
        Ok(self.latest_notes().await?.and_then(|notes| {
            notes.content.lines().last().map(|line| line.trim().to_string())
        }))
    }
}

fn is_generated_notes(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.starts_with("notes_") && name.ends_with(".txt"))
}
