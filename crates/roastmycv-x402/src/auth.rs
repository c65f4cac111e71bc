//! Shared-secret helpers: signing facilitator requests and checking bearer tokens.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

fn mac(secret: &[u8], body: &[u8]) -> HmacSha256 {
    // HMAC takes keys of any length; this only fails for fixed-size MACs.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(m) => m,
        Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
    };
    mac.update(body);
    mac
}

/// Hex HMAC-SHA256 of a request body, sent as `X-Facilitator-Auth`.
pub fn sign_body(secret: &[u8], body: &[u8]) -> String {
    let bytes = mac(secret, body).finalize().into_bytes();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Check an `X-Facilitator-Auth` value. Malformed hex never matches.
pub fn verify_body(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let expected = decode_hex(signature.trim()).unwrap_or_else(|| vec![0u8; 32]);
    mac(secret, body).verify_slice(&expected).is_ok()
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// Compare secrets without leaking length or content through timing.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    Sha256::digest(a).ct_eq(&Sha256::digest(b)).into()
}

/// Does an `Authorization` header carry `Bearer <expected>`?
pub fn bearer_matches(authorization: Option<&str>, expected: &str) -> bool {
    let Some(value) = authorization else {
        return false;
    };
    let token = value.strip_prefix("Bearer ").unwrap_or("");
    constant_time_eq(token.as_bytes(), expected.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_body_verifies() {
        let body = br#"{"payment":"sig","amount":"1000"}"#;
        let sig = sign_body(b"shared", body);
        assert_eq!(sig.len(), 64);
        assert!(verify_body(b"shared", body, &sig));
    }

    #[test]
    fn test_wrong_secret_or_body_fails() {
        let sig = sign_body(b"shared", b"a");
        assert!(!verify_body(b"other", b"a", &sig));
        assert!(!verify_body(b"shared", b"b", &sig));
        assert!(!verify_body(b"shared", b"a", "zz-not-hex"));
    }

    #[test]
    fn test_bearer_matches() {
        assert!(bearer_matches(Some("Bearer s3cret"), "s3cret"));
        assert!(!bearer_matches(Some("Bearer nope"), "s3cret"));
        assert!(!bearer_matches(Some("s3cret"), "s3cret"));
        assert!(!bearer_matches(None, "s3cret"));
    }

    #[test]
    fn test_constant_time_eq_lengths() {
        assert!(constant_time_eq(b"", b""));
        assert!(!constant_time_eq(b"short", b"much longer"));
    }
}
