//! Wallet seam for the client payment flow.
//!
//! The orchestrator only needs two things from a wallet: an address to pay
//! from and a broadcast STX transfer. [`PromptWallet`] covers the CLI case by
//! asking the user to make the transfer themselves.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;
use x402::{micro_stx_to_stx, Network};

use crate::error::ClientError;

/// A wallet able to list its addresses and broadcast an STX transfer.
pub trait Wallet: Send + Sync {
    /// Connect and return the wallet's addresses.
    fn addresses(&self) -> impl Future<Output = Result<Vec<String>, ClientError>> + Send;

    /// Transfer `amount` microSTX to `recipient`, returning the transaction id.
    fn transfer_stx(
        &self,
        amount: u64,
        recipient: &str,
        network: Network,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// First address that looks like a Stacks address (`SP` or `ST` prefix).
pub fn select_stx_address(addresses: &[String]) -> Result<String, ClientError> {
    if addresses.is_empty() {
        return Err(ClientError::NoAddresses);
    }
    addresses
        .iter()
        .find(|a| a.starts_with("SP") || a.starts_with("ST"))
        .cloned()
        .ok_or(ClientError::NoStxAddress)
}

/// Interactive wallet: prints transfer instructions and reads the broadcast
/// transaction id back from its input.
pub struct PromptWallet<R> {
    address: Option<String>,
    input: Mutex<R>,
}

impl PromptWallet<BufReader<Stdin>> {
    pub fn stdin(address: Option<String>) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), address)
    }
}

impl<R> PromptWallet<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(input: R, address: Option<String>) -> Self {
        Self {
            address: address.filter(|a| !a.trim().is_empty()),
            input: Mutex::new(input),
        }
    }

    async fn read_answer(&self, prompt: &str) -> Result<String, ClientError> {
        println!("{prompt}");
        let mut line = String::new();
        let mut input = self.input.lock().await;
        input.read_line(&mut line).await?;
        Ok(line.trim().to_string())
    }
}

impl<R> Wallet for PromptWallet<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn addresses(&self) -> Result<Vec<String>, ClientError> {
        if let Some(ref address) = self.address {
            return Ok(vec![address.clone()]);
        }
        let answer = self.read_answer("Enter the STX address you will pay from:").await?;
        if answer.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![answer])
    }

    async fn transfer_stx(
        &self,
        amount: u64,
        recipient: &str,
        network: Network,
    ) -> Result<String, ClientError> {
        println!(
            "Send {} STX ({} microSTX) to {} on {}.",
            micro_stx_to_stx(amount),
            amount,
            recipient,
            network
        );
        let txid = self
            .read_answer("Paste the broadcast transaction id (empty to cancel):")
            .await?;
        if txid.is_empty() {
            return Err(ClientError::Wallet("transfer cancelled".to_string()));
        }
        Ok(txid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_first_stx_address() {
        let addrs = owned(&[
            "bc1qxyz",
            "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM",
            "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
        ]);
        assert_eq!(
            select_stx_address(&addrs).unwrap(),
            "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM"
        );
    }

    #[test]
    fn test_select_rejects_empty_and_foreign() {
        assert!(matches!(
            select_stx_address(&[]),
            Err(ClientError::NoAddresses)
        ));
        let err = select_stx_address(&owned(&["bc1qxyz", "0xdeadbeef"])).unwrap_err();
        assert!(matches!(err, ClientError::NoStxAddress));
        assert_eq!(err.to_string(), "No STX address found in wallet");
    }

    #[tokio::test]
    async fn test_prompt_wallet_uses_configured_address() {
        let wallet = PromptWallet::new(&b""[..], Some("SP000".to_string()));
        assert_eq!(wallet.addresses().await.unwrap(), vec!["SP000".to_string()]);
    }

    #[tokio::test]
    async fn test_prompt_wallet_reads_address_then_txid() {
        let wallet = PromptWallet::new(&b"ST123\n  0xabc  \n"[..], None);
        assert_eq!(wallet.addresses().await.unwrap(), vec!["ST123".to_string()]);
        let txid = wallet
            .transfer_stx(100_000, "ST999", Network::Testnet)
            .await
            .unwrap();
        assert_eq!(txid, "0xabc");
    }

    #[tokio::test]
    async fn test_prompt_wallet_empty_txid_cancels() {
        let wallet = PromptWallet::new(&b"\n"[..], Some("ST123".to_string()));
        let err = wallet
            .transfer_stx(100_000, "ST999", Network::Testnet)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Wallet(_)));
    }
}
