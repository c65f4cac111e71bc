//! CORS configuration for the review server.

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};
use x402::{PAYER_ADDRESS_HEADER, PAYMENT_REQUIRED_HEADER, PAYMENT_RESPONSE_HEADER,
           PAYMENT_SIGNATURE_HEADER, PAYMENT_TXID_HEADER};

/// Build the CORS middleware from allowed origins (`*` allows any).
///
/// Browsers must be able to send the proof headers and read the
/// `payment-required` / `payment-response` headers back.
pub fn build_cors(allowed_origins: &[String]) -> Cors {
    let allowed = allowed_origins.to_vec();
    Cors::default()
        .allowed_origin_fn(move |origin, _req_head| {
            let origin_str = origin.to_str().unwrap_or("");
            allowed.iter().any(|a| a == "*" || a == origin_str)
        })
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            HeaderName::from_static(PAYMENT_SIGNATURE_HEADER),
            HeaderName::from_static(PAYMENT_TXID_HEADER),
            HeaderName::from_static(PAYER_ADDRESS_HEADER),
        ])
        .expose_headers(vec![
            HeaderName::from_static(PAYMENT_REQUIRED_HEADER),
            HeaderName::from_static(PAYMENT_RESPONSE_HEADER),
        ])
        .max_age(3600)
}
