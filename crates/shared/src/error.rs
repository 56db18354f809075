use std::path::PathBuf;
use thiserror::Error;

/// Run-level failures. Any of these aborts the current run and is handed
/// to the outer retry envelope; per-item failures never take this form.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The pre-flight reachability gate gave up before the network came up.
    #[error("network unreachable after waiting {waited_secs}s")]
    NetworkUnavailable { waited_secs: u64 },

    /// The bookmarking service could not be reached or refused the request.
    #[error("bookmark source unavailable: {0}")]
    SourceUnavailable(String),

    /// The processed log exists but cannot be read or parsed. Deliberately
    /// fatal: treating it as empty would re-deliver the entire backlog.
    #[error("processed log at {path} is unreadable: {reason}")]
    CorruptState { path: PathBuf, reason: String },

    /// The processed log could not be written back after a delivery.
    #[error("failed to persist processed log at {path}: {reason}")]
    State { path: PathBuf, reason: String },

    /// The per-run scratch directory could not be created.
    #[error("failed to create run workspace: {0}")]
    Workspace(#[from] std::io::Error),
}
