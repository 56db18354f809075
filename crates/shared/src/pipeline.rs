use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::PipelineError;
use crate::models::{Artifact, Bookmark, ExtractedDocument, FailureKind, ItemFailure, RunResult};
use crate::network;
use crate::processed::ProcessedLog;

/// Fetches a bounded batch of not-yet-read items from the bookmarking
/// service.
#[async_trait]
pub trait ArticleSource {
    async fn list_unread(&self, limit: usize) -> Result<Vec<Bookmark>, PipelineError>;
}

/// Turns one article URL into normalized readable markup.
#[async_trait]
pub trait Extractor {
    async fn extract(&self, link: &str) -> anyhow::Result<ExtractedDocument>;
}

/// Turns readable markup into a paginated artifact in `out_dir`.
#[async_trait]
pub trait Renderer {
    async fn render(
        &self,
        item: &Bookmark,
        doc: &ExtractedDocument,
        out_dir: &Path,
    ) -> anyhow::Result<Artifact>;
}

/// Uploads an artifact, replacing any prior artifact of the same logical
/// name rather than duplicating it.
#[async_trait]
pub trait Deliverer {
    async fn deliver(&self, artifact: &Artifact, folder: &str) -> anyhow::Result<()>;
}

/// Knobs for one pipeline instance, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub batch_size: usize,
    pub folder: String,
    pub processed_log: PathBuf,
    pub probe_host: String,
    pub network_poll: Duration,
    pub network_wait_max: Duration,
    pub retry_cooldown: Duration,
}

/// Drives one run: reachability gate, fetch, per-item
/// skip/extract/render/deliver, and the processed-log bookkeeping. Also
/// owns the coarse outer retry envelope.
pub struct Pipeline<S, E, R, D> {
    settings: Settings,
    source: S,
    extractor: E,
    renderer: R,
    deliverer: D,
}

impl<S, E, R, D> Pipeline<S, E, R, D>
where
    S: ArticleSource,
    E: Extractor,
    R: Renderer,
    D: Deliverer,
{
    pub fn new(settings: Settings, source: S, extractor: E, renderer: R, deliverer: D) -> Self {
        Self {
            settings,
            source,
            extractor,
            renderer,
            deliverer,
        }
    }

    /// One top-level invocation: run once and, if anything at all escapes
    /// the run, wait out the cooldown and run exactly once more. The
    /// envelope never inspects the failure kind — any failure may be a
    /// transient outage (a laptop waking from sleep, a flaky resolver).
    /// The retried run re-checks reachability itself before doing work.
    pub async fn run_with_retry(&self) -> Result<RunResult, PipelineError> {
        match self.run_once().await {
            Ok(result) => Ok(result),
            Err(first) => {
                eprintln!("Run failed: {first}");
                println!(
                    "Waiting {}s before the second and final attempt...",
                    self.settings.retry_cooldown.as_secs()
                );
                sleep(self.settings.retry_cooldown).await;
                self.run_once().await
            }
        }
    }

    /// One end-to-end run over one batch. Item-level failures are tallied
    /// and never abort the batch; everything else aborts the run.
    pub async fn run_once(&self) -> Result<RunResult, PipelineError> {
        network::wait_for_network(
            &self.settings.probe_host,
            self.settings.network_poll,
            self.settings.network_wait_max,
        )
        .await?;

        let mut processed = ProcessedLog::load(&self.settings.processed_log)?;

        let items = self.source.list_unread(self.settings.batch_size).await?;

        let mut result = RunResult {
            attempted: items.len(),
            ..Default::default()
        };
        if items.is_empty() {
            return Ok(result);
        }

        // Scratch space for rendered PDFs; removed when the run ends,
        // delivered or not.
        let workdir = tempfile::tempdir()?;

        for item in items {
            if processed.contains(&item.dedup_key()) {
                result.skipped += 1;
                continue;
            }

            println!("Processing: {}", item.title);
            match self.process_item(&item, workdir.path()).await {
                Ok(()) => {
                    // Recorded before moving on, so a crash here at worst
                    // loses the tally, never the dedup fact.
                    processed.record(item.dedup_key(), Utc::now())?;
                    println!("  ✓ Delivered: {}", item.title);
                    result.delivered += 1;
                }
                Err((kind, err)) => {
                    eprintln!("  ✗ {kind} failed for \"{}\": {err:#}", item.title);
                    result.failed.push(ItemFailure {
                        item,
                        kind,
                        message: format!("{err:#}"),
                    });
                }
            }
        }

        Ok(result)
    }

    async fn process_item(
        &self,
        item: &Bookmark,
        workdir: &Path,
    ) -> Result<(), (FailureKind, anyhow::Error)> {
        let doc = self
            .extractor
            .extract(&item.link)
            .await
            .map_err(|e| (FailureKind::Extraction, e))?;

        let artifact = self
            .renderer
            .render(item, &doc, workdir)
            .await
            .map_err(|e| (FailureKind::Render, e))?;

        self.deliverer
            .deliver(&artifact, &self.settings.folder)
            .await
            .map_err(|e| (FailureKind::Delivery, e))?;

        Ok(())
    }
}
