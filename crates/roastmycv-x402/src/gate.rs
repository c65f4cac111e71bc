//! The payment gate: inspects a request's proof headers and decides
//! between "payment required" and "payment accepted".
//!
//! Decision order:
//!
//! 1. no signature and no transaction id → require payment, no reason
//! 2. transaction id and payer address → accept (never calls the facilitator)
//! 3. signature → ask the verifier once; accept or require payment with its reason
//! 4. anything else → require payment, no reason
//!
//! The direct-transfer and signature channels are independent; a direct
//! proof always short-circuits signature verification.

use std::sync::Arc;

use crate::confirmation::StacksApiConfirmer;
use crate::facilitator::PaymentVerifier;
use crate::ledger::ProofLedger;
use crate::network::Network;
use crate::payment::{EncodedRequirement, PaymentRequirement};
use crate::proof::{DirectTransferProof, ProofHeaders, SignatureProof};
use crate::response::{PaymentRequiredBody, SettlementSummary};

/// Failure reason when a direct-transfer id has already paid for something.
pub const REPLAYED_TRANSACTION: &str = "transaction already used";

/// Failure reason when the facilitator says yes but omits the transaction or payer.
pub const INCOMPLETE_VERIFICATION: &str = "facilitator response missing transaction or payer";

/// Which channel a payment arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentChannel {
    Signature,
    DirectTransfer,
}

impl PaymentChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentChannel::Signature => "signature",
            PaymentChannel::DirectTransfer => "direct",
        }
    }
}

/// Transaction metadata for an accepted payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedPayment {
    pub transaction_id: String,
    pub payer_address: String,
    pub network: Network,
    pub channel: PaymentChannel,
}

impl AcceptedPayment {
    pub fn summary(&self) -> SettlementSummary {
        SettlementSummary {
            success: true,
            transaction: self.transaction_id.clone(),
            payer: self.payer_address.clone(),
            network: self.network,
        }
    }
}

/// Result of [`PaymentGate::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    RequirePayment {
        requirement: PaymentRequirement,
        encoded_requirement: String,
        reason: Option<String>,
    },
    Accepted(AcceptedPayment),
}

impl GateDecision {
    fn require(requirement: &EncodedRequirement, reason: Option<String>) -> Self {
        GateDecision::RequirePayment {
            requirement: requirement.requirement().clone(),
            encoded_requirement: requirement.encoded().to_string(),
            reason,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accepted(_))
    }

    /// The 402 body for a `RequirePayment` decision.
    pub fn payment_required_body(&self) -> Option<PaymentRequiredBody> {
        match self {
            GateDecision::RequirePayment {
                requirement,
                encoded_requirement,
                reason,
            } => Some(PaymentRequiredBody {
                payment_required: requirement.clone(),
                payment_required_header: encoded_requirement.clone(),
                error: reason.clone(),
            }),
            GateDecision::Accepted(_) => None,
        }
    }
}

/// Decides whether a request has paid.
///
/// The verifier is injected so tests can count or stub facilitator calls.
/// The replay ledger and the transfer confirmer are optional.
pub struct PaymentGate<V> {
    verifier: V,
    ledger: Option<Arc<dyn ProofLedger>>,
    confirmer: Option<StacksApiConfirmer>,
}

impl<V: PaymentVerifier> PaymentGate<V> {
    pub fn new(verifier: V) -> Self {
        Self {
            verifier,
            ledger: None,
            confirmer: None,
        }
    }

    /// Reject a direct-transfer id the second time it is presented.
    pub fn with_ledger(mut self, ledger: Arc<dyn ProofLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Look direct transfers up on chain before accepting them.
    pub fn with_confirmer(mut self, confirmer: StacksApiConfirmer) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    pub async fn evaluate(
        &self,
        headers: &ProofHeaders,
        requirement: &EncodedRequirement,
    ) -> GateDecision {
        if headers.is_empty() {
            return GateDecision::require(requirement, None);
        }

        if let Some(direct) = headers.direct_transfer() {
            return self.accept_direct(direct, requirement).await;
        }

        if let Some(signature) = headers.signature() {
            return self.accept_signature(signature, requirement).await;
        }

        tracing::debug!("transaction id without payer address, treating as unpaid");
        GateDecision::require(requirement, None)
    }

    /// Return a direct-transfer claim after the paid action failed downstream.
    pub fn release(&self, payment: &AcceptedPayment) {
        if payment.channel != PaymentChannel::DirectTransfer {
            return;
        }
        if let Some(ledger) = &self.ledger {
            ledger.release(&payment.transaction_id);
            tracing::info!(txid = %payment.transaction_id, "released transaction claim");
        }
    }

    async fn accept_direct(
        &self,
        proof: DirectTransferProof,
        requirement: &EncodedRequirement,
    ) -> GateDecision {
        if let Some(confirmer) = &self.confirmer {
            if let Err(reason) = confirmer.confirm(&proof, requirement.requirement()).await {
                tracing::warn!(
                    txid = %proof.transaction_id,
                    payer = %proof.payer_address,
                    reason = %reason,
                    "direct transfer not confirmed"
                );
                return GateDecision::require(requirement, Some(reason));
            }
        }

        if let Some(ledger) = &self.ledger {
            if !ledger.try_claim(&proof.transaction_id) {
                tracing::warn!(
                    txid = %proof.transaction_id,
                    payer = %proof.payer_address,
                    "replayed direct-transfer proof"
                );
                return GateDecision::require(requirement, Some(REPLAYED_TRANSACTION.to_string()));
            }
        }

        tracing::info!(
            txid = %proof.transaction_id,
            payer = %proof.payer_address,
            "direct transfer accepted"
        );
        GateDecision::Accepted(AcceptedPayment {
            transaction_id: proof.transaction_id,
            payer_address: proof.payer_address,
            network: requirement.requirement().network,
            channel: PaymentChannel::DirectTransfer,
        })
    }

    async fn accept_signature(
        &self,
        proof: SignatureProof,
        requirement: &EncodedRequirement,
    ) -> GateDecision {
        let result = self.verifier.verify(&proof, requirement.requirement()).await;

        if !result.success {
            let reason = result
                .failure_reason
                .unwrap_or_else(|| crate::constants::VERIFICATION_FAILED.to_string());
            tracing::warn!(reason = %reason, "signature payment rejected");
            return GateDecision::require(requirement, Some(reason));
        }

        match (result.transaction_id, result.payer_address) {
            (Some(transaction_id), Some(payer_address)) => {
                tracing::info!(txid = %transaction_id, payer = %payer_address, "signature payment verified");
                GateDecision::Accepted(AcceptedPayment {
                    transaction_id,
                    payer_address,
                    network: result.network.unwrap_or(requirement.requirement().network),
                    channel: PaymentChannel::Signature,
                })
            }
            _ => {
                tracing::warn!("facilitator verified payment without transaction or payer");
                GateDecision::require(requirement, Some(INCOMPLETE_VERIFICATION.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::{PaymentDefaults, RequirementBuilder};
    use crate::response::VerificationResult;

    struct Approve;

    impl PaymentVerifier for Approve {
        async fn verify(&self, proof: &SignatureProof, _: &PaymentRequirement) -> VerificationResult {
            VerificationResult {
                success: true,
                transaction_id: Some(format!("tx-{}", proof.signature)),
                payer_address: Some("SP_FACILITATED".to_string()),
                network: None,
                failure_reason: None,
            }
        }
    }

    fn requirement() -> EncodedRequirement {
        let defaults = PaymentDefaults {
            pay_to: "ST_SERVER".to_string(),
            ..PaymentDefaults::default()
        };
        EncodedRequirement::new(RequirementBuilder::new(&defaults, 1000).build().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_txid_without_payer_requires_payment() {
        let gate = PaymentGate::new(Approve);
        let headers = ProofHeaders {
            transaction_id: Some("0xabc".to_string()),
            ..Default::default()
        };
        match gate.evaluate(&headers, &requirement()).await {
            GateDecision::RequirePayment { reason, .. } => assert!(reason.is_none()),
            other => panic!("expected RequirePayment, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_signature_network_falls_back_to_requirement() {
        let gate = PaymentGate::new(Approve);
        let headers = ProofHeaders {
            payment_signature: Some("s1".to_string()),
            ..Default::default()
        };
        match gate.evaluate(&headers, &requirement()).await {
            GateDecision::Accepted(p) => {
                assert_eq!(p.transaction_id, "tx-s1");
                assert_eq!(p.network, Network::Testnet);
                assert_eq!(p.channel, PaymentChannel::Signature);
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
    }

    #[test]
    fn test_payment_required_body_carries_reason() {
        let req = requirement();
        let decision = GateDecision::require(&req, Some("expired".to_string()));
        let body = decision.payment_required_body().unwrap();
        assert_eq!(body.payment_required_header, req.encoded());
        assert_eq!(body.error.as_deref(), Some("expired"));
    }
}
