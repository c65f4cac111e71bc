//! Client payment flow against a mock review server.

use std::sync::{Arc, Mutex};

use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::json;
use x402::{
    EncodedRequirement, Network, PaymentDefaults, RequirementBuilder, SettlementSummary,
    PAYER_ADDRESS_HEADER, PAYMENT_REQUIRED_HEADER, PAYMENT_RESPONSE_HEADER, PAYMENT_TXID_HEADER,
};

use roastmycv_client::{ClientError, CvFile, LocalHistory, ReviewClient, Wallet};

const PAY_TO: &str = "ST2CY5V39NHDPWSXMW9QDT3HC3GD6Q6XX4CFRK9AG";
const PAYER: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";

#[derive(Clone, Copy)]
enum Mode {
    /// 402 without proof, 200 with one.
    Gate,
    /// 402 with a reason even when proof is attached.
    RejectProof,
    /// 500 once proof is attached.
    FailAfterPayment { with_message: bool },
}

struct MockServer {
    mode: Mode,
    requirement: EncodedRequirement,
    seen: Mutex<Vec<(Option<String>, Option<String>)>>,
    bodies: Mutex<Vec<Vec<u8>>>,
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn review_cv(
    req: HttpRequest,
    body: web::Bytes,
    mock: web::Data<MockServer>,
) -> HttpResponse {
    let txid = header(&req, PAYMENT_TXID_HEADER);
    let payer = header(&req, PAYER_ADDRESS_HEADER);
    mock.seen.lock().unwrap().push((txid.clone(), payer.clone()));
    mock.bodies.lock().unwrap().push(body.to_vec());

    let payment_required = |reason: Option<&str>| {
        let mut body = json!({
            "paymentRequired": mock.requirement.requirement(),
            "paymentRequiredHeader": mock.requirement.encoded(),
        });
        if let Some(reason) = reason {
            body["error"] = json!(reason);
        }
        HttpResponse::build(StatusCode::PAYMENT_REQUIRED)
            .insert_header((PAYMENT_REQUIRED_HEADER, mock.requirement.encoded()))
            .json(body)
    };

    let (Some(txid), Some(payer)) = (txid, payer) else {
        return payment_required(None);
    };

    match mock.mode {
        Mode::RejectProof => payment_required(Some("transaction already used")),
        Mode::FailAfterPayment { with_message: true } => HttpResponse::InternalServerError()
            .json(json!({ "error": "AI analysis failed" })),
        Mode::FailAfterPayment { with_message: false } => {
            HttpResponse::InternalServerError().finish()
        }
        Mode::Gate => {
            let settlement = SettlementSummary {
                success: true,
                transaction: txid.clone(),
                payer: payer.clone(),
                network: Network::Testnet,
            };
            HttpResponse::Ok()
                .insert_header((PAYMENT_RESPONSE_HEADER, settlement.encode().unwrap()))
                .json(json!({
                    "success": true,
                    "reviewId": "0b6f2d3e-4a1c-4e8e-9d7a-2f5c1b9e8a70",
                    "filename": "cv.pdf",
                    "review": {
                        "hardTruth": "Reads like a job description.",
                        "sectionCritique": {
                            "professionalSummary": "Vague.",
                            "experienceAchievements": "No numbers.",
                            "skillsTechStack": "Too long."
                        },
                        "deleteList": ["References available on request"],
                        "powerRewrite": "Cut p95 latency 40% across 12 services.",
                        "finalVerdict": {
                            "clarity": 6,
                            "impact": 4,
                            "hireability": 5,
                            "criticalChange": "Quantify every bullet."
                        }
                    },
                    "payment": {
                        "transactionId": txid,
                        "payerAddress": payer,
                        "network": "testnet",
                        "amount": "100000",
                        "payTo": PAY_TO
                    }
                }))
        }
    }
}

async fn spawn(mode: Mode) -> (String, web::Data<MockServer>) {
    let defaults = PaymentDefaults {
        pay_to: PAY_TO.to_string(),
        network: Network::Testnet,
        ..PaymentDefaults::default()
    };
    let requirement = RequirementBuilder::new(&defaults, 100_000).build().unwrap();
    let mock = web::Data::new(MockServer {
        mode,
        requirement: EncodedRequirement::new(requirement).unwrap(),
        seen: Mutex::new(Vec::new()),
        bodies: Mutex::new(Vec::new()),
    });

    let data = mock.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .route("/api/review-cv", web::post().to(review_cv))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_rt::spawn(server.run());
    (format!("http://{addr}"), mock)
}

/// Wallet with fixed addresses that records each transfer it is asked for.
struct FixedWallet {
    addresses: Vec<String>,
    txid: String,
    transfers: Arc<Mutex<Vec<(u64, String, Network)>>>,
}

impl FixedWallet {
    fn new(addresses: &[&str]) -> Self {
        Self {
            addresses: addresses.iter().map(|a| a.to_string()).collect(),
            txid: "0xabc".to_string(),
            transfers: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Wallet for FixedWallet {
    async fn addresses(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.addresses.clone())
    }

    async fn transfer_stx(
        &self,
        amount: u64,
        recipient: &str,
        network: Network,
    ) -> Result<String, ClientError> {
        self.transfers
            .lock()
            .unwrap()
            .push((amount, recipient.to_string(), network));
        Ok(self.txid.clone())
    }
}

fn cv() -> CvFile {
    CvFile::new("cv.pdf", b"%PDF-1.4 Experienced engineer".to_vec())
}

#[actix_rt::test]
async fn upload_without_proof_surfaces_payment_required() {
    let (url, mock) = spawn(Mode::Gate).await;
    let client = ReviewClient::new(url).unwrap();

    let err = client.upload(&cv()).await.unwrap_err();
    match err {
        ClientError::PaymentRequired {
            requirement,
            message,
        } => {
            assert_eq!(requirement.amount, 100_000);
            assert_eq!(requirement.pay_to, PAY_TO);
            assert_eq!(requirement.asset, "STX");
            assert_eq!(message, requirement.description);
        }
        other => panic!("expected PaymentRequired, got {other:?}"),
    }

    assert_eq!(
        mock.seen.lock().unwrap().as_slice(),
        &[(None::<String>, None::<String>)]
    );
    let body = String::from_utf8_lossy(&mock.bodies.lock().unwrap()[0]).to_string();
    assert!(body.contains("name=\"file\""));
    assert!(body.contains("filename=\"cv.pdf\""));
    assert!(body.contains("application/pdf"));
}

#[actix_rt::test]
async fn review_pays_resubmits_and_persists() {
    let (url, mock) = spawn(Mode::Gate).await;
    let client = ReviewClient::new(url).unwrap();
    let wallet = FixedWallet::new(&["bc1qnotstacks", PAYER]);
    let dir = tempfile::tempdir().unwrap();
    let history = LocalHistory::new(dir.path());

    let stored = client.review(&wallet, &cv(), &history).await.unwrap();

    assert_eq!(
        wallet.transfers.lock().unwrap().as_slice(),
        &[(100_000, PAY_TO.to_string(), Network::Testnet)]
    );
    assert_eq!(
        mock.seen.lock().unwrap().as_slice(),
        &[
            (None, None),
            (Some("0xabc".to_string()), Some(PAYER.to_string())),
        ]
    );

    assert_eq!(stored.id, "0b6f2d3e-4a1c-4e8e-9d7a-2f5c1b9e8a70");
    let receipt = stored.payment.as_ref().unwrap();
    assert_eq!(receipt.tx_id, "0xabc");
    assert_eq!(receipt.amount, 100_000);
    assert_eq!(receipt.recipient, PAY_TO);
    assert_eq!(stored.average_score(), Some(5.0));

    let path = dir
        .path()
        .join("cv-review-0b6f2d3e-4a1c-4e8e-9d7a-2f5c1b9e8a70.json");
    assert!(path.exists());
    assert_eq!(history.get(&stored.id).unwrap(), Some(stored));
}

#[actix_rt::test]
async fn pay_and_upload_decodes_settlement() {
    let (url, _mock) = spawn(Mode::Gate).await;
    let client = ReviewClient::new(url).unwrap();
    let proof = x402::DirectTransferProof {
        transaction_id: "0xfeed".to_string(),
        payer_address: PAYER.to_string(),
    };

    let response = client.pay_and_upload(&cv(), &proof).await.unwrap();
    assert!(response.success);
    let settlement = response.settlement.unwrap();
    assert_eq!(settlement.transaction, "0xfeed");
    assert_eq!(settlement.payer, PAYER);
}

#[actix_rt::test]
async fn rejected_proof_surfaces_server_reason() {
    let (url, _mock) = spawn(Mode::RejectProof).await;
    let client = ReviewClient::new(url).unwrap();
    let wallet = FixedWallet::new(&[PAYER]);
    let dir = tempfile::tempdir().unwrap();
    let history = LocalHistory::new(dir.path());

    let err = client.review(&wallet, &cv(), &history).await.unwrap_err();
    assert!(matches!(err, ClientError::PaymentRequired { .. }));
    assert_eq!(err.server_message(), Some("transaction already used"));
    assert!(history.list().unwrap().is_empty());
}

#[actix_rt::test]
async fn failure_after_payment_uses_error_field_or_fallback() {
    let (url, _mock) = spawn(Mode::FailAfterPayment { with_message: true }).await;
    let client = ReviewClient::new(url).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let history = LocalHistory::new(dir.path());

    let err = client
        .review(&FixedWallet::new(&[PAYER]), &cv(), &history)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rejected { status: 500, .. }));
    assert_eq!(err.server_message(), Some("AI analysis failed"));

    let (url, _mock) = spawn(Mode::FailAfterPayment { with_message: false }).await;
    let client = ReviewClient::new(url).unwrap();
    let err = client
        .review(&FixedWallet::new(&[PAYER]), &cv(), &history)
        .await
        .unwrap_err();
    assert_eq!(err.server_message(), Some("Request failed after payment"));
    assert!(history.list().unwrap().is_empty());
}

#[actix_rt::test]
async fn wallet_without_stx_address_never_pays() {
    let (url, mock) = spawn(Mode::Gate).await;
    let client = ReviewClient::new(url).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let history = LocalHistory::new(dir.path());

    let empty = FixedWallet::new(&[]);
    let err = client.review(&empty, &cv(), &history).await.unwrap_err();
    assert_eq!(err.to_string(), "No addresses returned from wallet");

    let foreign = FixedWallet::new(&["bc1qnotstacks"]);
    let err = client.review(&foreign, &cv(), &history).await.unwrap_err();
    assert_eq!(err.to_string(), "No STX address found in wallet");

    assert!(foreign.transfers.lock().unwrap().is_empty());
    assert!(mock
        .seen
        .lock()
        .unwrap()
        .iter()
        .all(|(txid, _)| txid.is_none()));
}
