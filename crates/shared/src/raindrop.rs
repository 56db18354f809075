use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;

use crate::error::PipelineError;
use crate::models::Bookmark;
use crate::network;
use crate::pipeline::ArticleSource;

/// Raindrop caps `perpage`; asking for more silently returns this many.
pub const MAX_PAGE_SIZE: usize = 50;

const API_BASE: &str = "https://api.raindrop.io/rest/v1";

#[derive(Debug, Deserialize)]
struct RaindropResponse {
    items: Vec<Bookmark>,
}

pub struct RaindropClient {
    client: Client,
    api_token: String,
    collection: String,
}

impl RaindropClient {
    pub fn new(
        api_token: String,
        collection: String,
        ca_bundle: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let client = network::http_client("push-articles/0.1", ca_bundle)?;
        Ok(Self {
            client,
            api_token,
            collection,
        })
    }

    pub fn clamp_page_size(limit: usize) -> usize {
        limit.clamp(1, MAX_PAGE_SIZE)
    }
}

#[async_trait]
impl ArticleSource for RaindropClient {
    /// Fetch one page of the configured collection, newest first. Anything
    /// that goes wrong here (transport, auth, decode) aborts the whole run.
    async fn list_unread(&self, limit: usize) -> Result<Vec<Bookmark>, PipelineError> {
        let perpage = Self::clamp_page_size(limit);
        let url = format!(
            "{API_BASE}/raindrops/{}?perpage={}&page=0&sort=-created",
            self.collection, perpage
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .send()
            .await
            .map_err(|e| PipelineError::SourceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(PipelineError::SourceUnavailable(format!(
                "{status} - {error_text}"
            )));
        }

        let parsed: RaindropResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::SourceUnavailable(format!("invalid response: {e}")))?;

        let mut items = parsed.items;
        items.truncate(limit);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_the_raindrop_wire_shape() {
        let json = r#"{
            "items": [
                {"_id": 101, "title": "A Story", "link": "https://example.com/a", "created": "2026-08-01T10:00:00Z", "tags": ["tech"]},
                {"_id": 102, "title": "Another", "link": "https://example.com/b"}
            ],
            "count": 2
        }"#;

        let parsed: RaindropResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].id, 101);
        assert_eq!(parsed.items[0].dedup_key(), "101");
        assert_eq!(parsed.items[1].created, "");
    }

    #[test]
    fn page_size_is_clamped_to_the_source_maximum() {
        assert_eq!(RaindropClient::clamp_page_size(25), 25);
        assert_eq!(RaindropClient::clamp_page_size(500), MAX_PAGE_SIZE);
        assert_eq!(RaindropClient::clamp_page_size(0), 1);
    }
}
