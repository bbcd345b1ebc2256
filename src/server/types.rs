use serde::{Deserialize, Serialize};

pub const MISSING_FILE_URL_MESSAGE: &str = "Missing fileUrl in request body.";
pub const UNSUPPORTED_FILE_MESSAGE: &str =
    "Unsupported file type. Only PDF, DOCX, and PPTX are allowed.";
pub const PPTX_PARSE_MESSAGE: &str = "Failed to parse PPTX file.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Could not process file.";

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(rename = "fileUrl")]
    pub file_url: Option<String>,
}

impl AnalyzeRequest {
    /// The requested URL, treating an empty or blank value as absent.
    pub fn file_url(&self) -> Option<&str> {
        self.file_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
