use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

use super::error::AnalyzeError;
use crate::utils::fetch::FetchedDocument;
use crate::utils::office::{extract_docx_text, extract_pptx_text};
use crate::utils::pdf::{extract_text_from_pdf_mem, has_pdf_signature};
use crate::utils::scratch_file::ScratchFile;

const PPTX_SCRATCH_PREFIX: &str = "temp_pptx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Pptx,
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "pptx" => Some(Self::Pptx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

/// Extraction failed inside a format-specific parser.
#[derive(Error, Debug)]
#[error("Failed to extract {kind} text: {cause}")]
pub struct ExtractionError {
    pub kind: DocumentFormat,
    #[source]
    pub cause: Box<dyn std::error::Error + Send + Sync>,
}

impl ExtractionError {
    fn new(kind: DocumentFormat, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self {
            kind,
            cause: cause.into(),
        }
    }
}

/// Plain text pulled out of a fetched document.
///
/// For PPTX the scratch copy lives as long as this value does.
#[derive(Debug)]
pub struct ExtractedDocument {
    pub text: String,
    pub format: DocumentFormat,
    scratch: Option<ScratchFile>,
}

impl ExtractedDocument {
    pub fn scratch_path(&self) -> Option<&std::path::Path> {
        self.scratch.as_ref().map(|s| s.path())
    }
}

pub struct DocumentExtractor {
    scratch_dir: PathBuf,
}

impl DocumentExtractor {
    pub fn new(scratch_dir: PathBuf) -> Self {
        Self { scratch_dir }
    }

    /// Dispatches on the document's extension. Unsupported extensions fail
    /// before any parsing is attempted.
    pub async fn extract(&self, document: FetchedDocument) -> Result<ExtractedDocument, AnalyzeError> {
        let format = DocumentFormat::from_extension(&document.extension)
            .ok_or_else(|| AnalyzeError::UnsupportedFormat(document.extension.clone()))?;

        info!(
            target: "document_extract",
            format = %format,
            size = document.bytes.len(),
            ct = ?document.content_type,
            "Starting text extraction"
        );
        let started = Instant::now();

        let extracted = match format {
            DocumentFormat::Pdf => {
                if !has_pdf_signature(&document.bytes) {
                    warn!(target: "document_extract", "PDF signature missing; attempting extraction anyway");
                }
                let text = run_blocking(format, move || {
                    extract_text_from_pdf_mem(&document.bytes).map_err(Into::into)
                })
                .await?;
                ExtractedDocument {
                    text,
                    format,
                    scratch: None,
                }
            }
            DocumentFormat::Docx => {
                let text = run_blocking(format, move || {
                    extract_docx_text(&document.bytes).map_err(Into::into)
                })
                .await?;
                ExtractedDocument {
                    text,
                    format,
                    scratch: None,
                }
            }
            DocumentFormat::Pptx => {
                let scratch = ScratchFile::create(
                    &self.scratch_dir,
                    PPTX_SCRATCH_PREFIX,
                    format.extension(),
                    &document.bytes,
                )
                .await
                .map_err(AnalyzeError::Scratch)?;
                let path = scratch.path().to_path_buf();
                let text =
                    run_blocking(format, move || extract_pptx_text(&path).map_err(Into::into)).await?;
                ExtractedDocument {
                    text,
                    format,
                    scratch: Some(scratch),
                }
            }
        };

        if extracted.text.trim().is_empty() {
            warn!(target: "document_extract", format = %format, "Extraction produced no text");
        }
        info!(
            target: "document_extract",
            format = %format,
            chars = extracted.text.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extraction succeeded"
        );
        Ok(extracted)
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

async fn run_blocking<F>(kind: DocumentFormat, job: F) -> Result<String, ExtractionError>
where
    F: FnOnce() -> Result<String, BoxError> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(cause)) => {
            warn!(target: "document_extract", format = %kind, "Extraction failed: {}", cause);
            Err(ExtractionError::new(kind, cause))
        }
        Err(join_error) => Err(ExtractionError::new(kind, join_error)),
    }
}
