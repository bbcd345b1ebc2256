// Minimal PDF utilities used by the document extractor.
// Always keep this module small and dependency-light.

use anyhow::Context;

/// Extracts text from a PDF stored fully in memory.
/// This is a thin wrapper over the `pdf-extract` crate API.
pub fn extract_text_from_pdf_mem(bytes: &[u8]) -> anyhow::Result<String> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .context("failed to extract text from PDF bytes using pdf-extract")?;
    Ok(text)
}

/// Returns true if the head bytes carry the `%PDF-` signature.
pub fn has_pdf_signature(head: &[u8]) -> bool {
    head.starts_with(b"%PDF-")
}
