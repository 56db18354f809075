// Public modules
pub mod config;
pub mod error;
pub mod extractor;
pub mod models;
pub mod network;
pub mod pipeline;
pub mod processed;
pub mod raindrop;
pub mod remarkable;
pub mod renderer;

// Re-export commonly used types
pub use config::Config;
pub use error::PipelineError;
pub use extractor::ContentExtractor;
pub use models::{Artifact, Bookmark, ExtractedDocument, FailureKind, ItemFailure, RunResult};
pub use pipeline::{ArticleSource, Deliverer, Extractor, Pipeline, Renderer, Settings};
pub use processed::{DedupRecord, ProcessedLog};
pub use raindrop::RaindropClient;
pub use remarkable::RmapiClient;
pub use renderer::WeasyPrintRenderer;
