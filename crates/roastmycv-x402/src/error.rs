use thiserror::Error;

/// Errors returned by x402 operations.
#[derive(Debug, Error)]
pub enum X402Error {
    #[error("invalid requirement: {0}")]
    InvalidRequirement(String),

    #[error("invalid payment: {0}")]
    InvalidPayment(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("config error: {0}")]
    ConfigError(String),

    #[error("http error: {0}")]
    HttpError(String),

    #[error("ledger error: {0}")]
    LedgerError(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
