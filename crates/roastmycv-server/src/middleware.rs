//! x402 glue between actix requests/responses and the payment gate.

use actix_web::{HttpRequest, HttpResponse};
use x402::{
    AcceptedPayment, PaymentRequiredBody, ProofHeaders, PAYMENT_REQUIRED_HEADER,
    PAYMENT_RESPONSE_HEADER,
};

/// Read the proof headers off a request.
pub fn proof_headers(req: &HttpRequest) -> ProofHeaders {
    ProofHeaders::from_lookup(|name| req.headers().get(name).and_then(|v| v.to_str().ok()))
}

/// Build a 402 Payment Required HTTP response: JSON body plus the
/// `payment-required` header carrying the same requirement, base64-encoded.
pub fn payment_required_response(body: &PaymentRequiredBody) -> HttpResponse {
    HttpResponse::PaymentRequired()
        .insert_header((PAYMENT_REQUIRED_HEADER, body.payment_required_header.clone()))
        .json(body)
}

/// Header pair for a successful paid response, if the summary encodes.
pub fn payment_response_header(payment: &AcceptedPayment) -> Option<(&'static str, String)> {
    match payment.summary().encode() {
        Ok(encoded) => Some((PAYMENT_RESPONSE_HEADER, encoded)),
        Err(e) => {
            tracing::warn!(error = %e, "failed to encode payment-response header");
            None
        }
    }
}
