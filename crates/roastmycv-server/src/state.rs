use std::sync::Arc;

use x402::{
    DirectTransferPolicy, EncodedRequirement, FacilitatorClient, PaymentDefaults, PaymentGate,
    RequirementBuilder, SqliteLedger, StacksApiConfirmer, X402Error,
};

use crate::config::ServerConfig;
use crate::db::ReviewStore;
use crate::error::ApiError;
use crate::review::OpenRouterClient;

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid payment requirement: {0}")]
    Requirement(#[from] X402Error),

    #[error("replay ledger: {0}")]
    Ledger(#[from] rusqlite::Error),

    #[error("review store: {0}")]
    Store(#[from] ApiError),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub gate: Arc<PaymentGate<FacilitatorClient>>,
    /// The review price, encoded once at start-up
    pub requirement: Arc<EncodedRequirement>,
    pub store: Arc<ReviewStore>,
    pub llm: OpenRouterClient,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, StateError> {
        let defaults = PaymentDefaults {
            pay_to: config.server_address.clone(),
            network: config.network,
            facilitator_url: config.facilitator_url.clone(),
        };
        let requirement =
            EncodedRequirement::new(RequirementBuilder::new(&defaults, config.review_price).build()?)?;

        let ledger = SqliteLedger::open(&config.db_path)?;
        let mut gate = PaymentGate::new(FacilitatorClient::new(config.hmac_secret.clone()))
            .with_ledger(Arc::new(ledger));
        if config.direct_transfer_policy == DirectTransferPolicy::Confirm {
            gate = gate.with_confirmer(StacksApiConfirmer::new(config.stacks_api_url.clone()));
        }

        let store = ReviewStore::new(&config.db_path)?;
        let llm = OpenRouterClient::new(
            config.openrouter_api_key.clone(),
            config.openrouter_base_url.clone(),
            config.ai_model.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            gate: Arc::new(gate),
            requirement: Arc::new(requirement),
            store: Arc::new(store),
            llm,
        })
    }
}
