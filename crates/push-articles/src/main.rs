use anyhow::Result;
use clap::Parser;
use shared::{Config, ContentExtractor, Pipeline, RaindropClient, RmapiClient, WeasyPrintRenderer};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "push-articles")]
#[command(about = "Push unread Raindrop.io articles to a reMarkable tablet as PDFs")]
struct Args {
    /// Maximum number of unread bookmarks to fetch this run
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// reMarkable folder to deliver into
    #[arg(short, long)]
    folder: Option<String>,

    /// Path of the processed log (the dedup store)
    #[arg(long)]
    processed_log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(batch_size) = args.batch_size {
        anyhow::ensure!(batch_size >= 1, "--batch-size must be at least 1");
        config.batch_size = batch_size.min(shared::raindrop::MAX_PAGE_SIZE);
    }
    if let Some(folder) = args.folder {
        config.remarkable_folder = folder;
    }
    if let Some(path) = args.processed_log {
        config.processed_log = path;
    }

    // Every collaborator is constructed up front so a missing binary or a
    // bad CA bundle fails before any network activity.
    let source = RaindropClient::new(
        config.raindrop_api_token.clone(),
        config.raindrop_collection.clone(),
        config.ca_bundle.as_deref(),
    )?;
    let extractor = ContentExtractor::new(config.ca_bundle.as_deref())?;
    let renderer = WeasyPrintRenderer::from_path()?;
    let deliverer = RmapiClient::from_path()?;

    let pipeline = Pipeline::new(config.settings(), source, extractor, renderer, deliverer);

    println!("📚 Checking for unread articles...");
    let result = pipeline.run_with_retry().await?;

    println!(
        "\n✅ Done. {} fetched, {} delivered, {} already on the device, {} failed.",
        result.attempted,
        result.delivered,
        result.skipped,
        result.failed.len()
    );
    for failure in &result.failed {
        println!(
            "  ✗ \"{}\" ({} failed; will retry next run)",
            failure.item.title, failure.kind
        );
        println!("    URL: {}", failure.item.link);
    }

    Ok(())
}
