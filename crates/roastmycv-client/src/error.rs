use thiserror::Error;
use x402::{PaymentRequirement, X402Error};

/// Errors surfaced by the review client, wallet and local history.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered 402. `message` is the server's stated reason, or
    /// the requirement description when it gave none.
    #[error("payment required: {message}")]
    PaymentRequired {
        requirement: Box<PaymentRequirement>,
        message: String,
    },

    #[error("{message} (status {status})")]
    Rejected { status: u16, message: String },

    #[error("No addresses returned from wallet")]
    NoAddresses,

    #[error("No STX address found in wallet")]
    NoStxAddress,

    #[error("wallet error: {0}")]
    Wallet(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid server response: {0}")]
    InvalidResponse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Protocol(#[from] X402Error),
}

impl ClientError {
    /// Server-side reason for a rejected request, if this is one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::PaymentRequired { message, .. } | ClientError::Rejected { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }
}
