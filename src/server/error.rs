use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use super::types::{
    ErrorBody, GENERIC_FAILURE_MESSAGE, MISSING_FILE_URL_MESSAGE, PPTX_PARSE_MESSAGE,
    UNSUPPORTED_FILE_MESSAGE,
};
use crate::study::error::AnalyzeError;
use crate::study::extractor::DocumentFormat;

/// Error response wrapper; `expose_details` controls whether the underlying
/// message reaches the client on generic failures.
pub struct ApiErrorResponse {
    pub error: AnalyzeError,
    pub expose_details: bool,
}

impl ApiErrorResponse {
    pub fn new(error: AnalyzeError, expose_details: bool) -> Self {
        Self {
            error,
            expose_details,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let (status, body) = match &self.error {
            AnalyzeError::MissingFileUrl => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: MISSING_FILE_URL_MESSAGE,
                    details: None,
                },
            ),
            AnalyzeError::UnsupportedFormat(ext) => {
                warn!(ext = %ext, "Rejected unsupported file type");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        error: UNSUPPORTED_FILE_MESSAGE,
                        details: None,
                    },
                )
            }
            AnalyzeError::Extraction(e) if e.kind == DocumentFormat::Pptx => {
                error!("PPTX extraction failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: PPTX_PARSE_MESSAGE,
                        details: None,
                    },
                )
            }
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: GENERIC_FAILURE_MESSAGE,
                        details: self.expose_details.then(|| other.to_string()),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
