//! Client for the pay-per-review CV service.
//!
//! The server gates `POST /api/review-cv` behind an STX payment. This crate
//! runs the client half of that exchange: upload, receive the 402
//! requirement, pay through a [`Wallet`], resubmit with the transaction id,
//! and keep a local copy of the finished review.
//!
//! # Quick Example
//!
//! ```no_run
//! use roastmycv_client::{CvFile, LocalHistory, PromptWallet, ReviewClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), roastmycv_client::ClientError> {
//! let client = ReviewClient::new("http://localhost:3000")?;
//! let wallet = PromptWallet::stdin(Some("ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM".into()));
//! let history = LocalHistory::new("./.roastmycv");
//!
//! let cv = CvFile::from_path("cv.pdf").await?;
//! let stored = client.review(&wallet, &cv, &history).await?;
//! println!("saved review {}", stored.id);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod history;
pub mod http_client;
pub mod wallet;

pub use error::ClientError;
pub use history::{LocalHistory, PaymentReceipt, StoredReview, Verdict};
pub use http_client::{CvFile, ReviewClient, ReviewResponse};
pub use wallet::{select_stx_address, PromptWallet, Wallet};

pub use x402::{DirectTransferProof, Network, PaymentRequirement, SettlementSummary};
