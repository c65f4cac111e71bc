/// Default facilitator for Stacks x402 payments.
pub const DEFAULT_FACILITATOR_URL: &str = "https://facilitator.stacksx402.com";

/// Asset symbol advertised in payment requirements.
pub const DEFAULT_ASSET: &str = "STX";

/// Description advertised when the caller does not supply one.
pub const DEFAULT_DESCRIPTION: &str = "CV Review Service";

/// Advertised payment window. Informational only; the gate does not enforce it.
pub const DEFAULT_MAX_TIMEOUT_SECONDS: u64 = 300;

/// STX has 6 decimal places (1 STX = 1,000,000 microSTX).
pub const STX_DECIMALS: u32 = 6;

/// Header carrying a facilitator-verifiable payment signature.
pub const PAYMENT_SIGNATURE_HEADER: &str = "payment-signature";

/// Header carrying the id of a transfer the client broadcast itself.
pub const PAYMENT_TXID_HEADER: &str = "x-payment-txid";

/// Header carrying the sender of a direct transfer.
pub const PAYER_ADDRESS_HEADER: &str = "x-payer-address";

/// Header carrying the base64-encoded requirement on a 402 response.
pub const PAYMENT_REQUIRED_HEADER: &str = "payment-required";

/// Header carrying the base64-encoded settlement summary on success.
pub const PAYMENT_RESPONSE_HEADER: &str = "payment-response";

/// Header carrying the HMAC of a facilitator request body.
pub const FACILITATOR_AUTH_HEADER: &str = "X-Facilitator-Auth";

/// Failure reason when the facilitator rejects without a message.
pub const VERIFICATION_FAILED: &str = "Payment verification failed";

/// Failure reason when the facilitator could not be consulted.
pub const VERIFICATION_ERROR: &str = "Payment verification error";

/// Public Stacks node API (Hiro) for mainnet.
pub const STACKS_API_MAINNET: &str = "https://api.hiro.so";

/// Public Stacks node API (Hiro) for testnet.
pub const STACKS_API_TESTNET: &str = "https://api.testnet.hiro.so";
