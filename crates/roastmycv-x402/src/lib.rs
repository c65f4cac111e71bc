//! HTTP 402 payment gating for STX on Stacks.
//!
//! A gated endpoint answers unpaid requests with a [`PaymentRequirement`]
//! (JSON body plus a base64 `payment-required` header). The client pays and
//! retries with one of two proofs:
//!
//! - **Signature**: a `payment-signature` header, checked by a remote
//!   facilitator ([`FacilitatorClient`])
//! - **Direct transfer**: `x-payment-txid` + `x-payer-address` for a transfer
//!   the client broadcast itself, optionally confirmed on chain
//!   ([`StacksApiConfirmer`]) and claimed in a replay ledger ([`ProofLedger`])
//!
//! [`PaymentGate`] turns the headers into a [`GateDecision`].
//!
//! ```no_run
//! use x402::{EncodedRequirement, FacilitatorClient, PaymentDefaults, PaymentGate,
//!            ProofHeaders, RequirementBuilder};
//!
//! # async fn run() -> Result<(), x402::X402Error> {
//! let defaults = PaymentDefaults { pay_to: "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM".into(),
//!                                  ..Default::default() };
//! let requirement = EncodedRequirement::new(
//!     RequirementBuilder::new(&defaults, x402::stx_to_micro_stx("0.1")?).build()?,
//! )?;
//! let gate = PaymentGate::new(FacilitatorClient::new(None));
//! let decision = gate.evaluate(&ProofHeaders::default(), &requirement).await;
//! assert!(!decision.is_accepted());
//! # Ok(()) }
//! ```

pub mod auth;
pub mod confirmation;
pub mod constants;
pub mod error;
pub mod facilitator;
pub mod gate;
pub mod ledger;
pub mod network;
pub mod payment;
pub mod proof;
pub mod response;
pub mod units;

pub use confirmation::{DirectTransferPolicy, StacksApiConfirmer};
pub use constants::*;
pub use error::X402Error;
pub use facilitator::{FacilitatorClient, PaymentVerifier};
pub use gate::{AcceptedPayment, GateDecision, PaymentChannel, PaymentGate};
pub use ledger::{InMemoryLedger, ProofLedger, SqliteLedger};
pub use network::Network;
pub use payment::{EncodedRequirement, PaymentDefaults, PaymentRequirement, RequirementBuilder};
pub use proof::{DirectTransferProof, PaymentProof, ProofHeaders, SignatureProof};
pub use response::{PaymentRequiredBody, SettlementSummary, VerificationResult};
pub use units::{micro_stx_to_stx, stx_to_micro_stx};
