//! Payment proofs a client can attach to a gated request.

use serde::{Deserialize, Serialize};

use crate::constants::{PAYER_ADDRESS_HEADER, PAYMENT_SIGNATURE_HEADER, PAYMENT_TXID_HEADER};

/// Opaque signature the facilitator knows how to check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureProof {
    pub signature: String,
}

/// A transfer the client broadcast from its own wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectTransferProof {
    pub transaction_id: String,
    pub payer_address: String,
}

/// Either payment channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentProof {
    Signature(SignatureProof),
    DirectTransfer(DirectTransferProof),
}

/// Raw proof headers as they arrived. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProofHeaders {
    pub payment_signature: Option<String>,
    pub transaction_id: Option<String>,
    pub payer_address: Option<String>,
}

impl ProofHeaders {
    /// Build from any header lookup (actix, reqwest, a test map...).
    pub fn from_lookup<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };
        Self {
            payment_signature: get(PAYMENT_SIGNATURE_HEADER),
            transaction_id: get(PAYMENT_TXID_HEADER),
            payer_address: get(PAYER_ADDRESS_HEADER),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.payment_signature.is_none() && self.transaction_id.is_none()
    }

    /// The direct-transfer proof, if both halves are present.
    pub fn direct_transfer(&self) -> Option<DirectTransferProof> {
        match (&self.transaction_id, &self.payer_address) {
            (Some(txid), Some(payer)) => Some(DirectTransferProof {
                transaction_id: txid.clone(),
                payer_address: payer.clone(),
            }),
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<SignatureProof> {
        self.payment_signature.as_ref().map(|s| SignatureProof {
            signature: s.clone(),
        })
    }

    /// The proof the gate would act on. Direct transfer wins over a signature.
    pub fn proof(&self) -> Option<PaymentProof> {
        self.direct_transfer()
            .map(PaymentProof::DirectTransfer)
            .or_else(|| self.signature().map(PaymentProof::Signature))
    }
}
