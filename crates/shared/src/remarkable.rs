use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

use crate::models::Artifact;
use crate::pipeline::Deliverer;

/// Uploads artifacts to the reMarkable cloud via the external `rmapi`
/// binary.
pub struct RmapiClient {
    binary_path: PathBuf,
}

impl RmapiClient {
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Locate `rmapi` in PATH, failing fast before any network work.
    pub fn from_path() -> Result<Self> {
        which::which("rmapi").map(Self::new).map_err(|_| {
            anyhow!(
                "rmapi not found in PATH. Install via: brew install ddvk/tap/rmapi \
                 or download from https://github.com/ddvk/rmapi/releases"
            )
        })
    }
}

#[async_trait]
impl Deliverer for RmapiClient {
    async fn deliver(&self, artifact: &Artifact, folder: &str) -> Result<()> {
        // Best-effort; `put` fails with its own error if the folder is
        // genuinely unusable.
        let _ = Command::new(&self.binary_path)
            .arg("mkdir")
            .arg(folder)
            .output()
            .await;

        // --force replaces an existing document of the same name instead
        // of creating a duplicate, which is what keeps re-delivery safe.
        let output = Command::new(&self.binary_path)
            .arg("put")
            .arg("--force")
            .arg(&artifact.path)
            .arg(folder)
            .output()
            .await
            .context("Failed to execute rmapi")?;

        if !output.status.success() {
            anyhow::bail!(
                "rmapi upload failed: {} {}",
                String::from_utf8_lossy(&output.stdout).trim(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(())
    }
}
