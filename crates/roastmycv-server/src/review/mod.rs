//! CV review pipeline: PDF text → prompt → model → critique.

pub mod critique;
pub mod llm;
pub mod pdf;
pub mod prompt;

pub use critique::Critique;
pub use llm::{LlmError, OpenRouterClient};

use crate::metrics::CRITIQUE_FALLBACKS;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no text in PDF")]
    NoText,

    #[error(transparent)]
    Extract(#[from] pdf::ExtractError),

    #[error("extraction task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// A generated review. `placeholder` is set when the model's output was unusable.
#[derive(Debug, Clone)]
pub struct Generated {
    pub critique: Critique,
    pub placeholder: bool,
}

/// Extract text off the async workers, fail on blank documents.
pub async fn extract(bytes: Vec<u8>) -> Result<String, PipelineError> {
    let text = tokio::task::spawn_blocking(move || pdf::extract_text(&bytes)).await??;
    if text.trim().is_empty() {
        return Err(PipelineError::NoText);
    }
    Ok(text)
}

/// Ask the model for a critique of `cv_text`.
pub async fn critique(llm: &OpenRouterClient, cv_text: &str) -> Result<Generated, PipelineError> {
    let prompt = prompt::review_prompt(&pdf::truncate(cv_text));
    let output = llm.complete(&prompt).await?;

    Ok(match Critique::parse(&output) {
        Some(critique) => Generated {
            critique,
            placeholder: false,
        },
        None => {
            tracing::warn!(chars = output.len(), "model output is not a critique, using placeholder");
            CRITIQUE_FALLBACKS.inc();
            Generated {
                critique: Critique::placeholder(),
                placeholder: true,
            }
        }
    })
}
