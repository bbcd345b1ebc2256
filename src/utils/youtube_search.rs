use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com";
const EMBED_PREFIX: &str = "https://www.youtube.com/embed/";

#[derive(Error, Debug)]
pub enum VideoLookupError {
    #[error("YouTube API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("YouTube API request failed: {status} {reason}")]
    Api { status: u16, reason: String },
}

/// Looks up one illustrative video for a search phrase.
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// `Ok(None)` means the search worked but found nothing.
    async fn find_embed_url(&self, query: &str) -> Result<Option<String>, VideoLookupError>;
}

// YouTube Data API search response structures
#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

pub fn embed_url(video_id: &str) -> String {
    format!("{}{}", EMBED_PREFIX, video_id)
}

pub struct YouTubeSearchClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl YouTubeSearchClient {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/youtube/v3/search", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl VideoSearch for YouTubeSearchClient {
    async fn find_embed_url(&self, query: &str) -> Result<Option<String>, VideoLookupError> {
        debug!("Performing YouTube search for query: {}", query);

        let params = [
            ("part", "snippet"),
            ("q", query),
            ("key", self.api_key.as_str()),
            ("type", "video"),
            ("maxResults", "1"),
        ];

        let response = self.client.get(&self.endpoint).query(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let reason = status.canonical_reason().unwrap_or("Unknown error").to_string();
            error!("YouTube API request failed with status {}", status);
            return Err(VideoLookupError::Api {
                status: status.as_u16(),
                reason,
            });
        }

        let body: SearchListResponse = response.json().await?;
        let video = body
            .items
            .into_iter()
            .find_map(|item| item.id.video_id)
            .map(|id| embed_url(&id));

        debug!(found = video.is_some(), "YouTube search completed");
        Ok(video)
    }
}
