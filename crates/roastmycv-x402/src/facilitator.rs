//! HTTP client for a remote facilitator's `/verify` endpoint.
//!
//! Every failure mode (transport, status, body shape) is folded into a
//! [`VerificationResult`]; nothing escapes this boundary as an error.

use std::future::Future;

use crate::constants::{FACILITATOR_AUTH_HEADER, VERIFICATION_ERROR, VERIFICATION_FAILED};
use crate::network::Network;
use crate::payment::PaymentRequirement;
use crate::proof::SignatureProof;
use crate::response::{
    FacilitatorErrorBody, FacilitatorVerifyRequest, FacilitatorVerifyResponse, VerificationResult,
};

/// Something that can judge a signature proof against a requirement.
pub trait PaymentVerifier: Send + Sync {
    fn verify(
        &self,
        proof: &SignatureProof,
        requirement: &PaymentRequirement,
    ) -> impl Future<Output = VerificationResult> + Send;
}

/// Calls `{facilitatorUrl}/verify` over HTTP.
#[derive(Clone)]
pub struct FacilitatorClient {
    http: reqwest::Client,
    hmac_secret: Option<Vec<u8>>,
}

impl std::fmt::Debug for FacilitatorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacilitatorClient")
            .field(
                "hmac_secret",
                &self.hmac_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl FacilitatorClient {
    pub fn new(hmac_secret: Option<Vec<u8>>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();
        Self::with_http_client(http, hmac_secret)
    }

    pub fn with_http_client(http: reqwest::Client, hmac_secret: Option<Vec<u8>>) -> Self {
        Self { http, hmac_secret }
    }

    /// Ask the facilitator whether `proof` pays `amount` microSTX to `pay_to`.
    pub async fn verify_signature(
        &self,
        proof: &SignatureProof,
        amount: u64,
        pay_to: &str,
        network: Network,
        facilitator_url: &str,
    ) -> VerificationResult {
        let url = format!("{}/verify", facilitator_url.trim_end_matches('/'));
        let body = FacilitatorVerifyRequest {
            payment: proof.signature.clone(),
            amount,
            pay_to: pay_to.to_string(),
            network,
        };
        let body_bytes = match serde_json::to_vec(&body) {
            Ok(b) => b,
            Err(e) => return VerificationResult::failure(error_reason(&e)),
        };

        let mut request = self
            .http
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(secret) = &self.hmac_secret {
            let sig = crate::auth::sign_body(secret, &body_bytes);
            request = request.header(FACILITATOR_AUTH_HEADER, sig);
        }

        let resp = match request.body(body_bytes).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "facilitator request failed");
                return VerificationResult::failure(error_reason(&e));
            }
        };

        let status = resp.status();
        let text = match resp.text().await {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read facilitator response");
                return VerificationResult::failure(error_reason(&e));
            }
        };

        if !status.is_success() {
            let message = serde_json::from_str::<FacilitatorErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| VERIFICATION_FAILED.to_string());
            tracing::warn!(status = %status, reason = %message, "facilitator rejected payment");
            return VerificationResult::failure(message);
        }

        match serde_json::from_str::<FacilitatorVerifyResponse>(&text) {
            Ok(parsed) => {
                let mut result = VerificationResult::from(parsed);
                if !result.success && result.failure_reason.is_none() {
                    result.failure_reason = Some(VERIFICATION_FAILED.to_string());
                }
                result
            }
            Err(e) => {
                tracing::warn!(error = %e, "malformed facilitator response");
                VerificationResult::failure(error_reason(&e))
            }
        }
    }
}

impl PaymentVerifier for FacilitatorClient {
    async fn verify(
        &self,
        proof: &SignatureProof,
        requirement: &PaymentRequirement,
    ) -> VerificationResult {
        self.verify_signature(
            proof,
            requirement.amount,
            &requirement.pay_to,
            requirement.network,
            &requirement.facilitator_url,
        )
        .await
    }
}

fn error_reason(e: &dyn std::fmt::Display) -> String {
    let msg = e.to_string();
    if msg.trim().is_empty() {
        VERIFICATION_ERROR.to_string()
    } else {
        msg
    }
}
