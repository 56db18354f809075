use serde::{Deserialize, Serialize};
use std::fmt;

/// One candidate article as returned by the bookmarking service.
///
/// Identity is `id`; nothing else outlives the run except the id as a key
/// in the processed log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(rename = "_id")]
    pub id: i64,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub created: String,
}

impl Bookmark {
    /// Key under which this bookmark is recorded in the processed log.
    pub fn dedup_key(&self) -> String {
        self.id.to_string()
    }
}

/// Readable markup extracted from one article page. Lives only for the
/// duration of that item's processing.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub html: String,
}

/// A rendered PDF in the run's scratch directory, plus the logical name it
/// is delivered under. The name is derived from the title alone, so
/// re-rendering the same item always targets the same remote document.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: std::path::PathBuf,
    pub name: String,
}

/// Stage at which processing of a single item failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Extraction,
    Render,
    Delivery,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Extraction => write!(f, "extraction"),
            FailureKind::Render => write!(f, "render"),
            FailureKind::Delivery => write!(f, "delivery"),
        }
    }
}

/// A single item that failed mid-batch, kept for the end-of-run report.
#[derive(Debug, Clone)]
pub struct ItemFailure {
    pub item: Bookmark,
    pub kind: FailureKind,
    pub message: String,
}

/// Tallies for one end-to-end run. Informational only; never persisted.
#[derive(Debug, Default)]
pub struct RunResult {
    pub attempted: usize,
    pub delivered: usize,
    pub skipped: usize,
    pub failed: Vec<ItemFailure>,
}
