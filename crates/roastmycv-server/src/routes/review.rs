use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::StreamExt;
use serde::Serialize;

use x402::{AcceptedPayment, GateDecision, PaymentProof, PaymentRequiredBody, ProofHeaders};

use crate::db::{PaymentMetadata, ReviewRecord};
use crate::error::ApiError;
use crate::metrics::{record_payment, REVIEWS_GENERATED};
use crate::middleware::{payment_response_header, proof_headers};
use crate::review::{self, Critique};
use crate::state::AppState;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// The uploaded CV.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub success: bool,
    pub review_id: String,
    pub filename: String,
    pub review: Critique,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentMetadata>,
}

/// POST /api/review-cv - paid CV review.
///
/// The upload is validated and its text extracted before the payment gate,
/// so a CV that cannot be reviewed is rejected before anyone pays for it.
pub async fn review_cv(
    req: HttpRequest,
    payload: Multipart,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let upload = read_upload(payload, state.config.max_upload_bytes).await?;
    let cv_text = review::extract(upload.bytes).await?;
    tracing::debug!(chars = cv_text.chars().count(), "extracted CV text");

    let headers = proof_headers(&req);
    let payment = match state.gate.evaluate(&headers, &state.requirement).await {
        GateDecision::Accepted(payment) => {
            record_payment(payment.channel.as_str(), "accepted");
            payment
        }
        GateDecision::RequirePayment {
            requirement,
            encoded_requirement,
            reason,
        } => {
            let outcome = if reason.is_some() { "rejected" } else { "required" };
            record_payment(attempted_channel(&headers), outcome);
            return Err(ApiError::PaymentRequired(Box::new(PaymentRequiredBody {
                payment_required: requirement,
                payment_required_header: encoded_requirement,
                error: reason,
            })));
        }
    };

    match serve(&state, upload.filename, &cv_text, &payment).await {
        Ok(resp) => Ok(resp),
        Err(e) => {
            tracing::warn!(
                txid = %payment.transaction_id,
                error = %e,
                "paid review failed"
            );
            state.gate.release(&payment);
            Err(e)
        }
    }
}

/// Run the review and persist it. Only called after payment was accepted.
async fn serve(
    state: &AppState,
    filename: String,
    cv_text: &str,
    payment: &AcceptedPayment,
) -> Result<HttpResponse, ApiError> {
    let generated = review::critique(&state.llm, cv_text).await?;

    let requirement = state.requirement.requirement();
    let metadata = PaymentMetadata {
        transaction_id: payment.transaction_id.clone(),
        payer_address: payment.payer_address.clone(),
        network: payment.network.to_string(),
        amount: requirement.amount.to_string(),
        pay_to: requirement.pay_to.clone(),
    };
    let record = ReviewRecord {
        id: uuid::Uuid::new_v4().to_string(),
        filename,
        review: generated.critique,
        payment: Some(metadata),
        created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    };
    state.store.insert(&record)?;
    REVIEWS_GENERATED.inc();

    tracing::info!(
        review_id = %record.id,
        payer = %payment.payer_address,
        channel = payment.channel.as_str(),
        placeholder = generated.placeholder,
        "review generated"
    );

    let mut resp = HttpResponse::Ok();
    if let Some(header) = payment_response_header(payment) {
        resp.insert_header(header);
    }
    Ok(resp.json(ReviewResponse {
        success: true,
        review_id: record.id,
        filename: record.filename,
        review: record.review,
        payment: record.payment,
    }))
}

/// Pull the `file` field out of the multipart body, enforcing type and size.
async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<Upload, ApiError> {
    let invalid = |e: actix_multipart::MultipartError| {
        ApiError::BadRequest(format!("Invalid multipart payload: {e}"))
    };

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(invalid)?;

        if field.name() != Some("file") {
            while let Some(chunk) = field.next().await {
                chunk.map_err(invalid)?;
            }
            continue;
        }

        let is_pdf = field
            .content_type()
            .map(|m| m.essence_str() == PDF_CONTENT_TYPE)
            .unwrap_or(false);
        if !is_pdf {
            return Err(ApiError::BadRequest(
                "Only PDF files are accepted".to_string(),
            ));
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .filter(|f| !f.is_empty())
            .unwrap_or("cv.pdf")
            .to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(invalid)?;
            if bytes.len() + chunk.len() > max_bytes {
                return Err(ApiError::BadRequest(format!(
                    "File too large (limit {max_bytes} bytes)"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok(Upload { filename, bytes });
    }

    Err(ApiError::BadRequest("No file provided".to_string()))
}

fn attempted_channel(headers: &ProofHeaders) -> &'static str {
    match headers.proof() {
        Some(PaymentProof::DirectTransfer(_)) => "direct",
        Some(PaymentProof::Signature(_)) => "signature",
        None => "none",
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/review-cv", web::post().to(review_cv));
}
