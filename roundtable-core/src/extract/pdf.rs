use crate::error::{RoundtableError, RoundtableResult};

/// Pulls the text layer out of an uploaded PDF.
///
/// Scanned documents without a text layer come back empty; callers decide
/// what an empty result means.
pub fn extract_pdf(bytes: &[u8]) -> RoundtableResult<String> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|err| RoundtableError::PdfExtractFailed(err.to_string()))?;
    Ok(text.trim().to_string())
}
