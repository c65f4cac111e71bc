use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_ASSET, DEFAULT_DESCRIPTION, DEFAULT_FACILITATOR_URL, DEFAULT_MAX_TIMEOUT_SECONDS,
};
use crate::error::X402Error;
use crate::network::Network;

/// What a client must pay to unlock a gated action.
///
/// Serialized as camelCase JSON with `amount` as a decimal string, then
/// base64-encoded for the `payment-required` header. Field order is fixed
/// by the struct, so identical values always encode to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirement {
    /// Amount in microSTX.
    #[serde(with = "amount_string")]
    pub amount: u64,
    pub pay_to: String,
    pub network: Network,
    pub facilitator_url: String,
    #[serde(default = "default_asset")]
    pub asset: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_max_timeout")]
    pub max_timeout_seconds: u64,
}

fn default_asset() -> String {
    DEFAULT_ASSET.to_string()
}

fn default_description() -> String {
    DEFAULT_DESCRIPTION.to_string()
}

fn default_max_timeout() -> u64 {
    DEFAULT_MAX_TIMEOUT_SECONDS
}

impl PaymentRequirement {
    /// Base64(JSON) transport encoding.
    pub fn encode(&self) -> Result<String, X402Error> {
        let json = serde_json::to_vec(self)?;
        Ok(base64::engine::general_purpose::STANDARD.encode(json))
    }

    /// Decode a `payment-required` header value.
    pub fn decode(encoded: &str) -> Result<Self, X402Error> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| X402Error::InvalidRequirement(format!("invalid base64: {e}")))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| X402Error::InvalidRequirement(format!("invalid JSON: {e}")))
    }
}

/// A requirement together with its transport encoding, computed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRequirement {
    requirement: PaymentRequirement,
    encoded: String,
}

impl EncodedRequirement {
    pub fn new(requirement: PaymentRequirement) -> Result<Self, X402Error> {
        let encoded = requirement.encode()?;
        Ok(Self {
            requirement,
            encoded,
        })
    }

    pub fn requirement(&self) -> &PaymentRequirement {
        &self.requirement
    }

    pub fn encoded(&self) -> &str {
        &self.encoded
    }
}

/// Server-wide defaults a requirement falls back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDefaults {
    pub pay_to: String,
    pub network: Network,
    pub facilitator_url: String,
}

impl Default for PaymentDefaults {
    fn default() -> Self {
        Self {
            pay_to: String::new(),
            network: Network::default(),
            facilitator_url: DEFAULT_FACILITATOR_URL.to_string(),
        }
    }
}

/// Builder resolving a [`PaymentRequirement`] against [`PaymentDefaults`].
///
/// Pure: no I/O and no clock, so the same inputs always build the same value.
#[derive(Debug, Clone)]
pub struct RequirementBuilder<'a> {
    defaults: &'a PaymentDefaults,
    amount: u64,
    pay_to: Option<String>,
    network: Option<Network>,
    facilitator_url: Option<String>,
    asset: Option<String>,
    description: Option<String>,
    max_timeout_seconds: Option<u64>,
}

impl<'a> RequirementBuilder<'a> {
    pub fn new(defaults: &'a PaymentDefaults, amount: u64) -> Self {
        Self {
            defaults,
            amount,
            pay_to: None,
            network: None,
            facilitator_url: None,
            asset: None,
            description: None,
            max_timeout_seconds: None,
        }
    }

    pub fn pay_to(mut self, pay_to: impl Into<String>) -> Self {
        self.pay_to = Some(pay_to.into());
        self
    }

    pub fn network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    pub fn facilitator_url(mut self, url: impl Into<String>) -> Self {
        self.facilitator_url = Some(url.into());
        self
    }

    pub fn asset(mut self, asset: impl Into<String>) -> Self {
        self.asset = Some(asset.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn max_timeout_seconds(mut self, seconds: u64) -> Self {
        self.max_timeout_seconds = Some(seconds);
        self
    }

    pub fn build(self) -> Result<PaymentRequirement, X402Error> {
        if self.amount == 0 {
            return Err(X402Error::InvalidRequirement(
                "amount must be positive".to_string(),
            ));
        }

        let pay_to = self
            .pay_to
            .unwrap_or_else(|| self.defaults.pay_to.clone())
            .trim()
            .to_string();
        if pay_to.is_empty() {
            return Err(X402Error::InvalidRequirement(
                "payTo address must not be empty".to_string(),
            ));
        }

        Ok(PaymentRequirement {
            amount: self.amount,
            pay_to,
            network: self.network.unwrap_or(self.defaults.network),
            facilitator_url: self
                .facilitator_url
                .unwrap_or_else(|| self.defaults.facilitator_url.clone()),
            asset: self.asset.unwrap_or_else(default_asset),
            description: self.description.unwrap_or_else(default_description),
            max_timeout_seconds: self
                .max_timeout_seconds
                .unwrap_or(DEFAULT_MAX_TIMEOUT_SECONDS),
        })
    }
}

/// `u64` amounts travel as decimal strings; numbers are accepted on input.
pub(crate) mod amount_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|e| de::Error::custom(format!("invalid amount '{s}': {e}"))),
        }
    }
}
