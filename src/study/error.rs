use thiserror::Error;

use super::assemble::AssembleError;
use super::extractor::ExtractionError;
use crate::utils::fetch::FetchError;
use crate::utils::gemini::GenerationError;
use crate::utils::youtube_search::VideoLookupError;

/// Every way a study-guide request can fail.
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("Missing fileUrl in request body.")]
    MissingFileUrl,

    #[error("Unsupported file type: '{0}'")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to write scratch file: {0}")]
    Scratch(#[source] std::io::Error),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    VideoLookup(#[from] VideoLookupError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}
