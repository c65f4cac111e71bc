//! Text extraction from uploaded PDFs.

/// Characters of CV text sent to the model.
pub const MAX_PROMPT_CHARS: usize = 8000;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("could not parse PDF: {0}")]
    Parse(String),

    #[error("PDF parser crashed")]
    Panicked,
}

/// Extract the text of every page. Blocking; run it off the async workers.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    // The parser panics on some malformed inputs.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| ExtractError::Panicked)?
        .map_err(|e| ExtractError::Parse(e.to_string()))
}

/// Cut to [`MAX_PROMPT_CHARS`] characters, marking the cut with "...".
pub fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_PROMPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
