use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::utils::content_guard::safe_truncate_utf8;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-001";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generative model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Generative model API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Generative model blocked the prompt: {0}")]
    Blocked(String),

    #[error("Generative model returned no text")]
    EmptyResponse,
}

/// Anything that turns a prompt into generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                model
            ),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        debug!(prompt_chars = prompt.chars().count(), "Sending prompt to Gemini");

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&raw)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| safe_truncate_utf8(&raw, 300, "..."));
            error!("Gemini API error: Status {}", status);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;

        if let Some(reason) = parsed
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(GenerationError::Blocked(reason));
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        debug!(response_chars = text.chars().count(), "Received Gemini response");
        Ok(text)
    }
}
