use super::{ClueSource, SourceError, SourceResult};
use crate::clue::RawClue;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://jservice.io";

/// jservice.io API client.
pub struct JServiceClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl JServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> SourceResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SourceError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))
    }
}

impl Default for JServiceClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl ClueSource for JServiceClient {
    async fn fetch_category_clues(&self, category_id: u32) -> SourceResult<Vec<RawClue>> {
        self.get_json(&format!("/api/clues?category={category_id}"))
            .await
    }

    async fn fetch_random_clue(&self) -> SourceResult<RawClue> {
        // The random endpoint returns a one-element array
        let clues: Vec<RawClue> = self.get_json("/api/random").await?;
        clues
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::Parse("empty random clue response".to_string()))
    }
}
