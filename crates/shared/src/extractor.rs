use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::path::Path;
use url::Url;

use crate::models::ExtractedDocument;
use crate::network;
use crate::pipeline::Extractor;

/// Pages whose readable text falls below this are treated as extraction
/// refusals (interstitials, link farms, empty shells).
const MIN_READABLE_CHARS: usize = 100;

/// Tried in order; the first candidate with enough readable prose wins.
const CANDIDATE_SELECTORS: [&str; 4] = ["article", "main", "[role=\"main\"]", "body"];

pub struct ContentExtractor {
    client: Client,
}

impl ContentExtractor {
    pub fn new(ca_bundle: Option<&Path>) -> Result<Self> {
        let client = network::http_client(
            "Mozilla/5.0 (compatible; PushArticles/1.0)",
            ca_bundle,
        )?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Extractor for ContentExtractor {
    /// Fetch one article page and reduce it to its readable fragment.
    /// Failure here is an expected outcome for a subset of real-world
    /// sites (paywalls, bot walls, dead links) and never aborts the batch.
    async fn extract(&self, link: &str) -> Result<ExtractedDocument> {
        let url = Url::parse(link).with_context(|| format!("invalid article URL: {link}"))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send HTTP request")?;

        let status = response.status();
        if status == 401 || status == 403 || status == 404 {
            anyhow::bail!("content refused or missing (HTTP {status})");
        }
        if !status.is_success() {
            anyhow::bail!("HTTP error: {status}");
        }

        let html = response
            .text()
            .await
            .context("Failed to read response body")?;

        let fragment = readable_fragment(&html)?;
        Ok(ExtractedDocument { html: fragment })
    }
}

/// Pick the densest readable container out of the page. Prefers semantic
/// article containers and falls back to the whole body; rejects the page
/// outright when even that holds too little prose.
fn readable_fragment(html: &str) -> Result<String> {
    let document = Html::parse_document(html);

    for raw in CANDIDATE_SELECTORS {
        let selector = Selector::parse(raw).map_err(|e| anyhow!("invalid selector {raw}: {e}"))?;

        let best = document
            .select(&selector)
            .max_by_key(|el| el.text().map(str::len).sum::<usize>());

        if let Some(element) = best {
            let fragment = element.inner_html();
            let text = html2text::from_read(fragment.as_bytes(), 100);
            if text.trim().len() >= MIN_READABLE_CHARS {
                return Ok(fragment);
            }
        }
    }

    Err(anyhow!("page has too little readable text"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROSE: &str = "The quick brown fox jumps over the lazy dog, again and again, \
        until the paragraph is comfortably longer than the minimum readable length.";

    #[test]
    fn prefers_the_article_container() {
        let html = format!(
            "<html><body><nav>Home About Contact</nav>\
             <article><h1>Title</h1><p>{PROSE}</p></article>\
             <footer>Copyright</footer></body></html>"
        );

        let fragment = readable_fragment(&html).unwrap();
        assert!(fragment.contains(PROSE));
        assert!(!fragment.contains("Copyright"));
    }

    #[test]
    fn falls_back_to_body_when_no_semantic_container_exists() {
        let html = format!("<html><body><div><p>{PROSE}</p></div></body></html>");
        let fragment = readable_fragment(&html).unwrap();
        assert!(fragment.contains(PROSE));
    }

    #[test]
    fn rejects_pages_with_too_little_prose() {
        let html = "<html><body><article><p>404</p></article></body></html>";
        assert!(readable_fragment(html).is_err());
    }

    #[test]
    fn picks_the_densest_of_several_candidates() {
        let html = format!(
            "<html><body><article><p>short teaser</p></article>\
             <article><p>{PROSE}</p></article></body></html>"
        );
        let fragment = readable_fragment(&html).unwrap();
        assert!(fragment.contains(PROSE));
        assert!(!fragment.contains("short teaser"));
    }
}
