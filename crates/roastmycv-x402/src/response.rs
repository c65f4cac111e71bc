use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::X402Error;
use crate::network::Network;
use crate::payment::PaymentRequirement;

/// Outcome of asking the facilitator about a signature. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl VerificationResult {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_id: None,
            payer_address: None,
            network: None,
            failure_reason: Some(reason.into()),
        }
    }
}

/// Body of `POST {facilitatorUrl}/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorVerifyRequest {
    pub payment: String,
    #[serde(with = "crate::payment::amount_string")]
    pub amount: u64,
    pub pay_to: String,
    pub network: Network,
}

/// Body the facilitator answers `/verify` with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilitatorVerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub payer: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default, alias = "errorReason", alias = "error")]
    pub message: Option<String>,
}

impl From<FacilitatorVerifyResponse> for VerificationResult {
    fn from(r: FacilitatorVerifyResponse) -> Self {
        Self {
            success: r.success,
            transaction_id: r.transaction,
            payer_address: r.payer,
            // CAIP-2 style or unknown identifiers fall back to the requirement's network.
            network: r.network.and_then(|n| n.parse().ok()),
            failure_reason: r.message,
        }
    }
}

/// Error body the facilitator sends with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacilitatorErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// JSON body of a 402 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredBody {
    pub payment_required: PaymentRequirement,
    pub payment_required_header: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary returned to the client in the `payment-response` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementSummary {
    pub success: bool,
    pub transaction: String,
    pub payer: String,
    pub network: Network,
}

impl SettlementSummary {
    pub fn encode(&self) -> Result<String, X402Error> {
        let json = serde_json::to_vec(self)?;
        Ok(base64::engine::general_purpose::STANDARD.encode(json))
    }

    pub fn decode(encoded: &str) -> Result<Self, X402Error> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| X402Error::InvalidPayment(format!("invalid base64: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| X402Error::InvalidPayment(format!("invalid JSON: {e}")))
    }
}
