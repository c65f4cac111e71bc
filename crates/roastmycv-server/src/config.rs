use std::env;
use url::Url;

use x402::{DirectTransferPolicy, Network, DEFAULT_FACILITATOR_URL};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DB_PATH: &str = "./roastmycv.db";
const DEFAULT_RATE_LIMIT_RPM: u32 = 60;
const DEFAULT_REVIEW_PRICE_STX: &str = "0.1";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_AI_MODEL: &str = "openai/gpt-4o-mini";

#[derive(Clone)]
pub struct ServerConfig {
    /// Payout address advertised as `payTo`
    pub server_address: String,
    pub network: Network,
    /// Facilitator base URL for signature verification
    pub facilitator_url: String,
    /// HMAC shared secret for facilitator requests (None = unsigned)
    pub hmac_secret: Option<Vec<u8>>,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub ai_model: String,
    /// Human-readable price, e.g. "0.1"
    pub review_price_stx: String,
    /// Price in microSTX (computed from review_price_stx)
    pub review_price: u64,
    pub port: u16,
    /// SQLite path for the review store and the replay ledger
    pub db_path: String,
    pub allowed_origins: Vec<String>,
    pub rate_limit_rpm: u32,
    pub max_upload_bytes: usize,
    pub direct_transfer_policy: DirectTransferPolicy,
    /// Stacks node API used when the policy is `confirm`
    pub stacks_api_url: String,
    /// Bearer token required for /metrics (None = public)
    pub metrics_token: Option<String>,
    /// Directory to serve SPA static files from (None = don't serve SPA)
    pub spa_dir: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("server_address", &self.server_address)
            .field("network", &self.network)
            .field("facilitator_url", &self.facilitator_url)
            .field(
                "hmac_secret",
                &self.hmac_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "openrouter_api_key",
                &self.openrouter_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("openrouter_base_url", &self.openrouter_base_url)
            .field("ai_model", &self.ai_model)
            .field("review_price_stx", &self.review_price_stx)
            .field("review_price", &self.review_price)
            .field("port", &self.port)
            .field("db_path", &self.db_path)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("direct_transfer_policy", &self.direct_transfer_policy)
            .field("stacks_api_url", &self.stacks_api_url)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("spa_dir", &self.spa_dir)
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let network = match get("NETWORK") {
            Some(raw) => raw
                .parse::<Network>()
                .map_err(|e| ConfigError::Invalid("NETWORK", e.to_string()))?,
            None => Network::default(),
        };

        // Required: payout address
        let server_address =
            get("SERVER_ADDRESS").ok_or(ConfigError::MissingRequired("SERVER_ADDRESS"))?;
        if !network
            .address_prefixes()
            .iter()
            .any(|p| server_address.starts_with(p))
        {
            tracing::warn!(
                address = %server_address,
                network = %network,
                "SERVER_ADDRESS does not look like a {network} address"
            );
        }

        let facilitator_url =
            get("FACILITATOR_URL").unwrap_or_else(|| DEFAULT_FACILITATOR_URL.to_string());
        Url::parse(&facilitator_url).map_err(|_| ConfigError::InvalidUrl(facilitator_url.clone()))?;

        let hmac_secret = get("FACILITATOR_SHARED_SECRET").map(String::into_bytes);
        if let Some(ref secret) = hmac_secret {
            if secret.len() < 32 {
                tracing::warn!(
                    "FACILITATOR_SHARED_SECRET is short ({} bytes); use at least 32",
                    secret.len()
                );
            }
        }

        let openrouter_api_key = get("OPENROUTER_API_KEY");
        let openrouter_base_url = get("OPENROUTER_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENROUTER_BASE_URL.to_string());
        Url::parse(&openrouter_base_url)
            .map_err(|_| ConfigError::InvalidUrl(openrouter_base_url.clone()))?;
        let ai_model = get("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string());

        let review_price_stx =
            get("REVIEW_PRICE_STX").unwrap_or_else(|| DEFAULT_REVIEW_PRICE_STX.to_string());
        let review_price = x402::stx_to_micro_stx(&review_price_stx)
            .map_err(|e| ConfigError::InvalidPrice(format!("{review_price_stx}: {e}")))?;
        if review_price == 0 {
            return Err(ConfigError::InvalidPrice(format!(
                "{review_price_stx}: price must be positive"
            )));
        }

        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;
        let db_path = get("DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let allowed_origins: Vec<String> = get("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        let rate_limit_rpm = parse_or("RATE_LIMIT_RPM", get("RATE_LIMIT_RPM"), DEFAULT_RATE_LIMIT_RPM)?;
        let max_upload_bytes = parse_or(
            "MAX_UPLOAD_BYTES",
            get("MAX_UPLOAD_BYTES"),
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;

        let direct_transfer_policy = match get("DIRECT_TRANSFER_POLICY") {
            Some(raw) => raw
                .parse::<DirectTransferPolicy>()
                .map_err(|e| ConfigError::Invalid("DIRECT_TRANSFER_POLICY", e.to_string()))?,
            None => DirectTransferPolicy::default(),
        };

        let stacks_api_url = get("STACKS_API_URL")
            .unwrap_or_else(|| network.default_stacks_api().to_string());
        Url::parse(&stacks_api_url).map_err(|_| ConfigError::InvalidUrl(stacks_api_url.clone()))?;

        let metrics_token = get("METRICS_TOKEN");
        let spa_dir = get("SPA_DIR");

        Ok(Self {
            server_address,
            network,
            facilitator_url,
            hmac_secret,
            openrouter_api_key,
            openrouter_base_url,
            ai_model,
            review_price_stx,
            review_price,
            port,
            db_path,
            allowed_origins,
            rate_limit_rpm,
            max_upload_bytes,
            direct_transfer_policy,
            stacks_api_url,
            metrics_token,
            spa_dir,
        })
    }

    /// Log settings that are legal but worth an operator's attention.
    pub fn warn_risky_settings(&self) {
        if self.direct_transfer_policy == DirectTransferPolicy::Trust {
            tracing::warn!(
                "DIRECT_TRANSFER_POLICY=trust: client-asserted transaction ids are accepted \
                 without an on-chain check"
            );
        }
        if self.hmac_secret.is_none() {
            tracing::warn!("FACILITATOR_SHARED_SECRET not set; facilitator requests are unsigned");
        }
        if self.openrouter_api_key.is_none() {
            tracing::warn!("OPENROUTER_API_KEY not set; paid reviews will fail with 500");
        }
        if self.metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set; /metrics endpoint is publicly accessible");
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid(key, v)),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid price: {0}")]
    InvalidPrice(String),
}
