use std::path::Path;

use reqwest::StatusCode;
use serde::Deserialize;
use x402::{
    DirectTransferProof, PaymentRequiredBody, PaymentRequirement, SettlementSummary,
    PAYER_ADDRESS_HEADER, PAYMENT_REQUIRED_HEADER, PAYMENT_RESPONSE_HEADER, PAYMENT_TXID_HEADER,
};

use crate::error::ClientError;
use crate::history::{LocalHistory, PaymentReceipt, StoredReview};
use crate::wallet::{select_stx_address, Wallet};

const REVIEW_PATH: &str = "/api/review-cv";
const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A CV ready to upload.
#[derive(Debug, Clone)]
pub struct CvFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl CvFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("cv.pdf")
            .to_string();
        Ok(Self { filename, bytes })
    }

    fn form(&self) -> Result<reqwest::multipart::Form, ClientError> {
        let part = reqwest::multipart::Part::bytes(self.bytes.clone())
            .file_name(self.filename.clone())
            .mime_str(PDF_CONTENT_TYPE)?;
        Ok(reqwest::multipart::Form::new().part("file", part))
    }
}

/// Successful review response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub success: bool,
    pub review_id: String,
    pub filename: String,
    pub review: serde_json::Value,
    #[serde(default)]
    pub payment: Option<serde_json::Value>,
    /// Decoded `payment-response` header, when the server sent one.
    #[serde(skip)]
    pub settlement: Option<SettlementSummary>,
}

/// HTTP client for the review service.
///
/// [`upload`](Self::upload) sends the CV without proof, which a gated server
/// answers with [`ClientError::PaymentRequired`].
/// [`pay_and_upload`](Self::pay_and_upload) resends it with a direct-transfer
/// proof. [`review`](Self::review) drives the whole exchange through a
/// [`Wallet`] and saves the result to [`LocalHistory`].
#[derive(Clone)]
pub struct ReviewClient {
    http: reqwest::Client,
    base_url: String,
}

impl ReviewClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(180))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self::with_http_client(base_url, http))
    }

    /// Create a client with a custom reqwest::Client.
    pub fn with_http_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Upload without payment.
    pub async fn upload(&self, file: &CvFile) -> Result<ReviewResponse, ClientError> {
        self.submit(file, None, "Request failed").await
    }

    /// Upload with a broadcast transfer as proof.
    pub async fn pay_and_upload(
        &self,
        file: &CvFile,
        proof: &DirectTransferProof,
    ) -> Result<ReviewResponse, ClientError> {
        self.submit(file, Some(proof), "Request failed after payment")
            .await
    }

    /// Upload, pay when asked, resubmit with proof, then save locally.
    pub async fn review<W: Wallet>(
        &self,
        wallet: &W,
        file: &CvFile,
        history: &LocalHistory,
    ) -> Result<StoredReview, ClientError> {
        let requirement = match self.upload(file).await {
            Ok(response) => {
                tracing::info!(review_id = %response.review_id, "review served without payment");
                return persist(history, response, None);
            }
            Err(ClientError::PaymentRequired { requirement, .. }) => requirement,
            Err(e) => return Err(e),
        };

        let payer = select_stx_address(&wallet.addresses().await?)?;
        tracing::info!(
            payer = %payer,
            amount = requirement.amount,
            pay_to = %requirement.pay_to,
            network = %requirement.network,
            "paying for review"
        );

        let tx_id = wallet
            .transfer_stx(requirement.amount, &requirement.pay_to, requirement.network)
            .await?;

        let proof = DirectTransferProof {
            transaction_id: tx_id.clone(),
            payer_address: payer,
        };
        let response = self.pay_and_upload(file, &proof).await?;
        tracing::info!(review_id = %response.review_id, txid = %tx_id, "paid review received");

        let receipt = PaymentReceipt {
            tx_id,
            amount: requirement.amount,
            recipient: requirement.pay_to.clone(),
        };
        persist(history, response, Some(receipt))
    }

    async fn submit(
        &self,
        file: &CvFile,
        proof: Option<&DirectTransferProof>,
        fallback_error: &str,
    ) -> Result<ReviewResponse, ClientError> {
        let url = format!("{}{}", self.base_url, REVIEW_PATH);
        let mut req = self.http.post(&url).multipart(file.form()?);
        if let Some(proof) = proof {
            req = req
                .header(PAYMENT_TXID_HEADER, &proof.transaction_id)
                .header(PAYER_ADDRESS_HEADER, &proof.payer_address);
        }

        let resp = req.send().await?;
        let status = resp.status();

        if status == StatusCode::PAYMENT_REQUIRED {
            return Err(payment_required(resp).await);
        }

        if !status.is_success() {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            let message = body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or(fallback_error)
                .to_string();
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let settlement = resp
            .headers()
            .get(PAYMENT_RESPONSE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| SettlementSummary::decode(s).ok());

        let mut body: ReviewResponse = resp
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(format!("review body: {e}")))?;
        body.settlement = settlement;
        Ok(body)
    }
}

/// Turn a 402 into a structured error. The JSON body is preferred; the
/// `payment-required` header is the fallback.
async fn payment_required(resp: reqwest::Response) -> ClientError {
    let header_requirement = resp
        .headers()
        .get(PAYMENT_REQUIRED_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| PaymentRequirement::decode(s).ok());

    let (requirement, reason) = match resp.json::<PaymentRequiredBody>().await {
        Ok(body) => (body.payment_required, body.error),
        Err(e) => match header_requirement {
            Some(requirement) => (requirement, None),
            None => {
                return ClientError::InvalidResponse(format!("402 without a requirement: {e}"))
            }
        },
    };

    let message = reason.unwrap_or_else(|| requirement.description.clone());
    ClientError::PaymentRequired {
        requirement: Box::new(requirement),
        message,
    }
}

fn persist(
    history: &LocalHistory,
    response: ReviewResponse,
    payment: Option<PaymentReceipt>,
) -> Result<StoredReview, ClientError> {
    let stored = StoredReview {
        id: response.review_id,
        filename: response.filename,
        review: response.review,
        payment,
        created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    };
    history.save(&stored)?;
    Ok(stored)
}
