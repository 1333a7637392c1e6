use chrono::{DateTime, Utc};
use log::warn;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::parse_expiry;

/// Field names the detail view understands. Anything else is passthrough.
const KNOWN_FIELDS: &[&str] = &[
    "address",
    "chain_id",
    "chainId",
    "name",
    "symbol",
    "expiry",
    "liquidity",
    "implied_apy",
    "impliedApy",
    "underlying_apy",
    "underlyingApy",
    "lp_apy",
    "lpApy",
    "volume_24h",
    "volume24h",
    "pt_price",
    "ptPrice",
    "yt_price",
    "ytPrice",
];

/// Per-vault detail payload, kept verbatim.
///
/// The provider does not publish a schema for this payload, so the raw object is
/// stored as-is and the fields the explorer knows about are read through accessors
/// that accept both snake_case and camelCase spellings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VaultDetail {
    fields: Map<String, Value>,
}

impl VaultDetail {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    pub fn symbol(&self) -> Option<&str> {
        self.fields.get("symbol").and_then(Value::as_str)
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.fields
            .get("expiry")
            .and_then(Value::as_str)
            .and_then(parse_expiry)
    }

    pub fn liquidity(&self) -> Option<Decimal> {
        self.decimal(&["liquidity"])
    }

    pub fn volume_24h(&self) -> Option<Decimal> {
        self.decimal(&["volume_24h", "volume24h", "tradingVolume"])
    }

    pub fn pt_price(&self) -> Option<Decimal> {
        self.decimal(&["pt_price", "ptPrice"])
    }

    pub fn yt_price(&self) -> Option<Decimal> {
        self.decimal(&["yt_price", "ytPrice"])
    }

    pub fn implied_apy(&self) -> Option<f64> {
        self.rate(&["implied_apy", "impliedApy"])
    }

    pub fn underlying_apy(&self) -> Option<f64> {
        self.rate(&["underlying_apy", "underlyingApy"])
    }

    pub fn lp_apy(&self) -> Option<f64> {
        self.rate(&["lp_apy", "lpApy", "aggregatedApy"])
    }

    /// Provider-specific fields, sorted by key. Known fields that arrive as objects or
    /// arrays are listed too, since the accessors only read one scalar out of them.
    pub fn extra(&self) -> Vec<(&str, &Value)> {
        let mut extra: Vec<_> = self
            .fields
            .iter()
            .filter(|(key, value)| {
                !KNOWN_FIELDS.contains(&key.as_str()) || value.is_object() || value.is_array()
            })
            .map(|(key, value)| (key.as_str(), value))
            .collect();
        extra.sort_by(|a, b| a.0.cmp(b.0));
        extra
    }

    fn decimal(&self, names: &[&str]) -> Option<Decimal> {
        names
            .iter()
            .filter_map(|name| self.fields.get(*name))
            .find_map(value_to_decimal)
    }

    fn rate(&self, names: &[&str]) -> Option<f64> {
        names
            .iter()
            .filter_map(|name| self.fields.get(*name))
            .find_map(value_to_rate)
    }
}

/// Reads a monetary amount from a JSON number, a numeric string, or a `{"usd": ..}` object.
pub fn value_to_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let amount = n
                .as_i64()
                .map(Decimal::from)
                .or_else(|| n.as_f64().and_then(Decimal::from_f64));
            if amount.is_none() {
                warn!("⚠️ Amount {} is outside the supported range", n);
            }
            amount
        }
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .ok()
                .or_else(|| Decimal::from_scientific(s).ok())
        }
        Value::Object(map) => map.get("usd").and_then(value_to_decimal),
        _ => None,
    }
}

fn value_to_rate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
