use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid file URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to fetch file: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to fetch file. Status: {0}")]
    Status(u16),

    #[error("Failed to read file body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("File exceeds the allowed size limit ({size} > {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },
}

/// Raw document bytes plus what we know about their format.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    /// Lower-cased extension of the URL path, without the dot. Empty when absent.
    pub extension: String,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, file_url: &str) -> Result<FetchedDocument, FetchError>;
}

/// Fetches documents over HTTP(S), following redirects.
pub struct HttpDocumentSource {
    client: Client,
    max_bytes: u64,
}

impl HttpDocumentSource {
    pub fn new(timeout: Duration, max_bytes: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, max_bytes })
    }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn fetch(&self, file_url: &str) -> Result<FetchedDocument, FetchError> {
        let url = Url::parse(file_url)?;
        info!(target: "document_fetch", url = %url, "Starting HTTP fetch");

        let response = self.client.get(url.as_str()).send().await.map_err(|e| {
            warn!(target: "document_fetch", url = %url, "HTTP transport error: {}", e);
            FetchError::Transport(e)
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!(target: "document_fetch", url = %url, status = status, "HTTP non-success status");
            return Err(FetchError::Status(status));
        }

        if let Some(declared) = response.content_length() {
            if declared > self.max_bytes {
                warn!(target: "document_fetch", url = %url, size = declared, limit = self.max_bytes, "Declared size over limit; refusing");
                return Err(FetchError::TooLarge {
                    size: declared,
                    limit: self.max_bytes,
                });
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(|s| s.to_string());

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                warn!(target: "document_fetch", url = %url, "Body read failed: {}", e);
                FetchError::Body(e)
            })?;
            let size = (body.len() + chunk.len()) as u64;
            if size > self.max_bytes {
                warn!(target: "document_fetch", url = %url, read = size, limit = self.max_bytes, "Body over limit; aborting download");
                return Err(FetchError::TooLarge {
                    size,
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }
        let size = body.len() as u64;

        let extension = path_extension(&url);
        info!(target: "document_fetch", url = %url, size = size, ext = %extension, ct = ?content_type, "HTTP fetch completed");

        Ok(FetchedDocument {
            bytes: body,
            extension,
            content_type,
        })
    }
}

/// Lower-cased extension of the URL path; query and fragment are ignored.
pub fn path_extension(url: &Url) -> String {
    Path::new(url.path())
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}
