//! Read-only confirmation of direct STX transfers against a Stacks node API.
//!
//! Used only when the gate runs with [`DirectTransferPolicy::Confirm`]. A
//! single lookup is made per proof; there is no polling.

use serde::Deserialize;
use std::str::FromStr;

use crate::error::X402Error;
use crate::payment::PaymentRequirement;
use crate::proof::DirectTransferProof;

/// How the gate treats a client-asserted transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectTransferPolicy {
    /// Accept the txid and payer as stated.
    #[default]
    Trust,
    /// Look the transaction up and check sender, recipient, amount and status.
    Confirm,
}

impl FromStr for DirectTransferPolicy {
    type Err = X402Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust" => Ok(Self::Trust),
            "confirm" => Ok(Self::Confirm),
            other => Err(X402Error::ConfigError(format!(
                "unknown direct transfer policy '{other}' (expected trust or confirm)"
            ))),
        }
    }
}

/// Subset of `GET /extended/v1/tx/{txid}` we rely on.
#[derive(Debug, Clone, Deserialize)]
pub struct StacksTransaction {
    pub tx_id: String,
    pub tx_status: String,
    pub tx_type: String,
    pub sender_address: String,
    #[serde(default)]
    pub token_transfer: Option<TokenTransfer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenTransfer {
    pub recipient_address: String,
    pub amount: String,
}

/// Check a looked-up transaction against the proof and the requirement.
///
/// Pending (mempool) transfers are accepted; anything aborted or dropped is not.
pub fn check_transfer(
    tx: &StacksTransaction,
    proof: &DirectTransferProof,
    requirement: &PaymentRequirement,
) -> Result<(), String> {
    if tx.tx_type != "token_transfer" {
        return Err(format!("transaction is a {}, not an STX transfer", tx.tx_type));
    }

    match tx.tx_status.as_str() {
        "success" | "pending" => {}
        other => return Err(format!("transaction not confirmed: {other}")),
    }

    if tx.sender_address != proof.payer_address {
        return Err("transaction sender does not match payer address".to_string());
    }

    let transfer = tx
        .token_transfer
        .as_ref()
        .ok_or_else(|| "transaction has no transfer details".to_string())?;

    if transfer.recipient_address != requirement.pay_to {
        return Err("transaction recipient does not match payTo".to_string());
    }

    let amount: u64 = transfer
        .amount
        .parse()
        .map_err(|_| format!("unreadable transfer amount '{}'", transfer.amount))?;
    if amount < requirement.amount {
        return Err(format!(
            "transfer of {amount} microSTX is below the required {}",
            requirement.amount
        ));
    }

    Ok(())
}

/// Looks transactions up on a Stacks node API (Hiro-compatible).
#[derive(Debug, Clone)]
pub struct StacksApiConfirmer {
    http: reqwest::Client,
    base_url: String,
}

impl StacksApiConfirmer {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn lookup(&self, txid: &str) -> Result<StacksTransaction, String> {
        let txid = txid.trim();
        let txid = if txid.starts_with("0x") {
            txid.to_string()
        } else {
            format!("0x{txid}")
        };
        let url = format!(
            "{}/extended/v1/tx/{}",
            self.base_url.trim_end_matches('/'),
            txid
        );

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("transaction lookup failed: {e}"))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err("transaction not found".to_string());
        }
        if !resp.status().is_success() {
            return Err(format!("transaction lookup returned {}", resp.status()));
        }

        resp.json::<StacksTransaction>()
            .await
            .map_err(|e| format!("transaction lookup parse failed: {e}"))
    }

    /// Look the transfer up and check it pays the requirement.
    pub async fn confirm(
        &self,
        proof: &DirectTransferProof,
        requirement: &PaymentRequirement,
    ) -> Result<(), String> {
        let tx = self.lookup(&proof.transaction_id).await?;
        check_transfer(&tx, proof, requirement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;

    fn requirement() -> PaymentRequirement {
        PaymentRequirement {
            amount: 100_000,
            pay_to: "ST_SERVER".to_string(),
            network: Network::Testnet,
            facilitator_url: "https://f.example".to_string(),
            asset: "STX".to_string(),
            description: "CV Review Service".to_string(),
            max_timeout_seconds: 300,
        }
    }

    fn proof() -> DirectTransferProof {
        DirectTransferProof {
            transaction_id: "0xabc".to_string(),
            payer_address: "ST_PAYER".to_string(),
        }
    }

    fn tx(status: &str, recipient: &str, amount: &str) -> StacksTransaction {
        StacksTransaction {
            tx_id: "0xabc".to_string(),
            tx_status: status.to_string(),
            tx_type: "token_transfer".to_string(),
            sender_address: "ST_PAYER".to_string(),
            token_transfer: Some(TokenTransfer {
                recipient_address: recipient.to_string(),
                amount: amount.to_string(),
            }),
        }
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(
            "confirm".parse::<DirectTransferPolicy>().unwrap(),
            DirectTransferPolicy::Confirm
        );
        assert_eq!(
            "TRUST".parse::<DirectTransferPolicy>().unwrap(),
            DirectTransferPolicy::Trust
        );
        assert!("poll".parse::<DirectTransferPolicy>().is_err());
    }

    #[test]
    fn test_pending_and_success_accepted() {
        assert!(check_transfer(&tx("pending", "ST_SERVER", "100000"), &proof(), &requirement()).is_ok());
        assert!(check_transfer(&tx("success", "ST_SERVER", "250000"), &proof(), &requirement()).is_ok());
    }

    #[test]
    fn test_aborted_rejected() {
        let err = check_transfer(
            &tx("abort_by_post_condition", "ST_SERVER", "100000"),
            &proof(),
            &requirement(),
        )
        .unwrap_err();
        assert!(err.contains("not confirmed"));
    }

    #[test]
    fn test_wrong_recipient_rejected() {
        let err = check_transfer(&tx("success", "ST_OTHER", "100000"), &proof(), &requirement())
            .unwrap_err();
        assert!(err.contains("recipient"));
    }

    #[test]
    fn test_underpayment_rejected() {
        let err = check_transfer(&tx("success", "ST_SERVER", "99999"), &proof(), &requirement())
            .unwrap_err();
        assert!(err.contains("below"));
    }

    #[test]
    fn test_wrong_sender_rejected() {
        let mut t = tx("success", "ST_SERVER", "100000");
        t.sender_address = "ST_SOMEONE_ELSE".to_string();
        assert!(check_transfer(&t, &proof(), &requirement()).is_err());
    }

    #[test]
    fn test_contract_call_rejected() {
        let mut t = tx("success", "ST_SERVER", "100000");
        t.tx_type = "contract_call".to_string();
        assert!(check_transfer(&t, &proof(), &requirement()).is_err());
    }
}
