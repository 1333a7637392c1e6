pub mod vault;

pub use vault::VaultDetail;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Identity of a vault. Addresses are only unique within a chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VaultKey {
    pub address: String,
    pub chain_id: u64,
}

impl VaultKey {
    pub fn new(address: impl Into<String>, chain_id: u64) -> Self {
        Self {
            address: address.into(),
            chain_id,
        }
    }
}

impl fmt::Display for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address, self.chain_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultSummary {
    pub address: String,
    pub chain_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default, deserialize_with = "deserialize_expiry")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub liquidity: Decimal,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub volume_24h: Decimal,
    #[serde(default)]
    pub implied_apy: Option<f64>,
    #[serde(default)]
    pub underlying_apy: Option<f64>,
    #[serde(default)]
    pub lp_apy: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub pt_price: Decimal,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub yt_price: Decimal,
}

impl VaultSummary {
    pub fn key(&self) -> VaultKey {
        VaultKey::new(self.address.clone(), self.chain_id)
    }
}

/// Body of `GET /api/vaults`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultsEnvelope {
    pub success: bool,
    #[serde(default)]
    pub vaults: Option<Vec<VaultSummary>>,
    #[serde(default)]
    pub total: Option<usize>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `GET /api/vaults/{address}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultDetailEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<VaultDetail>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body the proxy sends alongside a non-2xx status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FailureBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FailureBody {
    pub fn message(self) -> Option<String> {
        self.detail
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
    }
}

/// Lenient RFC 3339 parsing: an empty or malformed expiry is "unknown", not a load failure.
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => parse_expiry(&s),
        _ => None,
    })
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(vault::value_to_decimal).unwrap_or(Decimal::ZERO))
}

#[cfg(test)]
pub fn sample_vault(address: &str, chain_id: u64, liquidity: Decimal) -> VaultSummary {
    VaultSummary {
        address: address.to_string(),
        chain_id,
        name: address.to_string(),
        symbol: String::new(),
        expiry: None,
        liquidity,
        volume_24h: Decimal::ZERO,
        implied_apy: None,
        underlying_apy: None,
        lp_apy: None,
        pt_price: Decimal::ZERO,
        yt_price: Decimal::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn summary_parses_proxy_payload() {
        let raw = r#"{
            "address": "0xabc",
            "name": "PT-stETH",
            "symbol": "PENDLE-LPT",
            "expiry": "2025-12-25T00:00:00.000Z",
            "chain_id": 1,
            "volume_24h": 1250.5,
            "liquidity": 1500,
            "implied_apy": 0.05,
            "underlying_apy": 0.031,
            "lp_apy": 0,
            "pt_price": 0.97,
            "yt_price": 0.03
        }"#;
        let vault: VaultSummary = serde_json::from_str(raw).unwrap();

        assert_eq!(vault.key(), VaultKey::new("0xabc", 1));
        assert_eq!(vault.liquidity, dec!(1500));
        assert_eq!(vault.volume_24h, dec!(1250.5));
        assert_eq!(vault.implied_apy, Some(0.05));
        assert_eq!(vault.lp_apy, Some(0.0));
        assert_eq!(vault.expiry.map(|e| e.timestamp()), Some(1_766_620_800));
    }

    #[test]
    fn summary_tolerates_missing_and_blank_fields() {
        let raw = r#"{"address": "0xdef", "chain_id": 42161, "expiry": "", "liquidity": null}"#;
        let vault: VaultSummary = serde_json::from_str(raw).unwrap();

        assert_eq!(vault.expiry, None);
        assert_eq!(vault.liquidity, Decimal::ZERO);
        assert_eq!(vault.implied_apy, None);
        assert!(vault.name.is_empty());
    }

    #[test]
    fn same_address_on_two_chains_is_two_keys() {
        let mainnet = VaultKey::new("0xabc", 1);
        let arbitrum = VaultKey::new("0xabc", 42161);
        assert_ne!(mainnet, arbitrum);
        assert_eq!(arbitrum.to_string(), "0xabc@42161");
    }

    #[test]
    fn failure_body_prefers_detail() {
        let body: FailureBody =
            serde_json::from_str(r#"{"detail": "Failed to fetch vault details: 404"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("Failed to fetch vault details: 404"));

        let blank: FailureBody = serde_json::from_str(r#"{"error": "  "}"#).unwrap();
        assert_eq!(blank.message(), None);
    }
}
