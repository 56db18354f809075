use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::PipelineError;

/// When a given item was delivered. One record per item id, never updated
/// or removed by normal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupRecord {
    pub processed_at: DateTime<Utc>,
}

/// Durable record of every item ever delivered; the sole source of truth
/// for "already delivered".
///
/// The whole map is loaded at run start and written back after each
/// successful delivery, so a crash mid-batch never re-delivers completed
/// items on the next run.
#[derive(Debug)]
pub struct ProcessedLog {
    path: PathBuf,
    entries: HashMap<String, DedupRecord>,
}

impl ProcessedLog {
    /// Load the log from `path`. A missing file is a first run and yields
    /// an empty log; a present-but-unreadable file is fatal, because
    /// treating it as empty would silently drop the dedup history.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Ok(Self {
                path: path.to_path_buf(),
                entries: HashMap::new(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| PipelineError::CorruptState {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let entries: HashMap<String, DedupRecord> =
            serde_json::from_str(&content).map_err(|e| PipelineError::CorruptState {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Record a delivered item and immediately persist the full map.
    ///
    /// The write goes to a temp file in the same directory and is renamed
    /// over the old log, so a crash mid-write leaves the previous good
    /// file in place.
    pub fn record(&mut self, key: String, processed_at: DateTime<Utc>) -> Result<(), PipelineError> {
        self.entries.insert(key, DedupRecord { processed_at });
        self.persist()
    }

    fn persist(&self) -> Result<(), PipelineError> {
        let state_err = |reason: String| PipelineError::State {
            path: self.path.clone(),
            reason,
        };

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| state_err(e.to_string()))?;

        let json =
            serde_json::to_string_pretty(&self.entries).map_err(|e| state_err(e.to_string()))?;

        let mut tmp = NamedTempFile::new_in(&parent).map_err(|e| state_err(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| state_err(e.to_string()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| state_err(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| state_err(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_empty_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let log = ProcessedLog::load(&dir.path().join("processed.json")).unwrap();
        assert_eq!(log.len(), 0);
        assert!(!log.contains("1"));
    }

    #[test]
    fn corrupt_file_is_fatal_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed.json");
        fs::write(&path, "{not json").unwrap();

        match ProcessedLog::load(&path) {
            Err(PipelineError::CorruptState { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected CorruptState, got {other:?}"),
        }
    }

    #[test]
    fn record_survives_a_fresh_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed.json");

        let mut log = ProcessedLog::load(&path).unwrap();
        log.record("42".to_string(), Utc::now()).unwrap();

        // Simulates the process dying right after record() returned.
        let reloaded = ProcessedLog::load(&path).unwrap();
        assert!(reloaded.contains("42"));
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn persisted_file_is_valid_json_after_each_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed.json");

        let mut log = ProcessedLog::load(&path).unwrap();
        log.record("1".to_string(), Utc::now()).unwrap();
        log.record("2".to_string(), Utc::now()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: HashMap<String, DedupRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn record_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("processed.json");

        let mut log = ProcessedLog::load(&path).unwrap();
        log.record("7".to_string(), Utc::now()).unwrap();
        assert!(ProcessedLog::load(&path).unwrap().contains("7"));
    }
}
