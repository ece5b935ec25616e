//! Search history store
//!
//! Recent questions, newest first, persisted as a JSON array in
//! `$XDG_DATA_HOME/docquery/history.json`.
//!
//! The store never fails its caller: a missing or corrupt file loads as an
//! empty history, and write failures are logged and otherwise ignored.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::types::HistoryEntry;

/// Bounded, deduplicated list of recent questions.
#[derive(Debug)]
pub struct SearchHistory {
    entries: Vec<HistoryEntry>,
    cap: usize,
    /// Backing file; `None` keeps the history in memory only
    path: Option<PathBuf>,
}

impl SearchHistory {
    /// History that is never written to disk
    pub fn in_memory(cap: usize) -> Self {
        Self {
            entries: Vec::new(),
            cap: cap.max(1),
            path: None,
        }
    }

    /// Load history from `path`.
    ///
    /// Absent or unreadable files yield an empty history. Entries beyond
    /// `cap` are dropped.
    pub fn load(path: impl Into<PathBuf>, cap: usize) -> Self {
        let path = path.into();
        let mut history = Self {
            entries: read_entries(&path),
            cap: cap.max(1),
            path: Some(path),
        };
        history.entries.truncate(history.cap);
        history
    }

    /// Remember a question.
    ///
    /// Whitespace-only questions are ignored. An existing entry with the same
    /// text is removed and a fresh one is placed at the front. Returns whether
    /// the history changed.
    pub fn record(&mut self, question: &str) -> bool {
        let question = question.trim();
        if question.is_empty() {
            return false;
        }

        self.entries.retain(|e| e.question != question);
        self.entries.insert(
            0,
            HistoryEntry {
                id: uuid::Uuid::new_v4().to_string(),
                question: question.to_string(),
                timestamp: Utc::now().timestamp_millis(),
            },
        );
        self.entries.truncate(self.cap);
        self.persist();
        true
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Entries, newest first
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Write the current entries to the backing file, if any.
    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };

        if let Err(e) = write_entries(path, &self.entries) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to save search history");
        }
    }
}

fn read_entries(path: &Path) -> Vec<HistoryEntry> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No search history yet");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read search history");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<HistoryEntry>>(&content) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Discarding corrupt search history");
            Vec::new()
        }
    }
}

fn write_entries(path: &Path, entries: &[HistoryEntry]) -> crate::error::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string(entries)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
