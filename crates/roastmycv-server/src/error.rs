use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use x402::PaymentRequiredBody;

use crate::review::{LlmError, PipelineError};

#[derive(Debug)]
pub enum ApiError {
    /// Bad upload or query
    BadRequest(String),
    /// Unpaid, or the proof was rejected
    PaymentRequired(Box<PaymentRequiredBody>),
    /// Review not found
    NotFound(String),
    /// Server misconfiguration visible to the caller (e.g. missing AI key)
    Misconfigured(String),
    /// AI provider unreachable or refused
    Upstream(String),
    /// Review processing failed
    Processing(String),
    /// Database error
    Database(rusqlite::Error),
    /// Internal error
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            ApiError::PaymentRequired(body) => match &body.error {
                Some(reason) => write!(f, "payment required: {}", reason),
                None => write!(f, "payment required"),
            },
            ApiError::NotFound(what) => write!(f, "not found: {}", what),
            ApiError::Misconfigured(msg) => write!(f, "misconfigured: {}", msg),
            ApiError::Upstream(msg) => write!(f, "upstream error: {}", msg),
            ApiError::Processing(msg) => write!(f, "processing error: {}", msg),
            ApiError::Database(e) => write!(f, "database error: {}", e),
            ApiError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        ApiError::Database(e)
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::NoText => {
                ApiError::BadRequest("Could not extract text from PDF".to_string())
            }
            PipelineError::Extract(e) => ApiError::Processing(e.to_string()),
            PipelineError::Join(e) => ApiError::Processing(e.to_string()),
            PipelineError::Llm(LlmError::NotConfigured) => {
                ApiError::Misconfigured("API key not configured".to_string())
            }
            PipelineError::Llm(e) => ApiError::Upstream(e.to_string()),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::BadRequest(msg) => {
                HttpResponse::BadRequest().json(serde_json::json!({ "error": msg }))
            }
            ApiError::PaymentRequired(body) => crate::middleware::payment_required_response(body),
            ApiError::NotFound(what) => {
                HttpResponse::NotFound().json(serde_json::json!({ "error": what }))
            }
            ApiError::Misconfigured(msg) => {
                tracing::error!("Misconfigured: {}", msg);
                HttpResponse::InternalServerError().json(serde_json::json!({ "error": msg }))
            }
            ApiError::Upstream(msg) => {
                tracing::error!("AI provider error: {}", msg);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "AI analysis failed" }))
            }
            ApiError::Processing(msg) => {
                tracing::error!("Processing error: {}", msg);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Failed to process CV",
                    "details": msg
                }))
            }
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "An internal error occurred" }))
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                HttpResponse::InternalServerError()
                    .json(serde_json::json!({ "error": "An internal error occurred" }))
            }
        }
    }
}
