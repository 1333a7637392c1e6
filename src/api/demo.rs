use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use log::{debug, info};
use rand::Rng;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::api::error::FetchError;
use crate::api::provider::{DataProvider, DataSourceStatus};
use crate::model::*;

/// Address whose detail fetch always fails, to exercise the inline error state.
pub const BROKEN_VAULT_ADDRESS: &str = "0x000000000000000000000000000000000000dead";

/// Offline provider with synthetic vaults and randomised latency.
pub struct DemoProvider {
    chain_id: u64,
    max_latency_ms: u64,
}

impl DemoProvider {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            max_latency_ms: 900,
        }
    }

    #[cfg(test)]
    pub fn instant(chain_id: u64) -> Self {
        Self {
            chain_id,
            max_latency_ms: 0,
        }
    }

    async fn simulate_latency(&self) {
        if self.max_latency_ms == 0 {
            return;
        }
        let delay = rand::thread_rng().gen_range(100..=self.max_latency_ms.max(100));
        debug!("🧪 Simulating {}ms of latency", delay);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    fn vaults(&self) -> Vec<VaultSummary> {
        let now = Utc::now();
        #[rustfmt::skip]
        let rows: [(&str, &str, &str, i64, i64, f64, f64, f64); 10] = [
            ("0x34280882267ffa6383b363e278b027be083bbe3b",
                "PT-stETH", "stETH", 72, 512_000_000, 0.036, 0.029, 0.041),
            ("0xd8f12bcde578c653014f27379a6114f67f0e445f",
                "PT-ezETH", "ezETH", 40, 148_500_000, 0.112, 0.034, 0.087),
            ("0xcdd26eb5eb2ce0f203a84553853667ae69ca29ce",
                "PT-sUSDe", "sUSDe", 118, 96_300_000, 0.181, 0.092, 0.154),
            ("0x4339ffe2b7592dc783ed13cce310531ab366deac",
                "PT-weETH", "weETH", 12, 61_700_000, 0.047, 0.031, 0.0),
            ("0xf32e58f92e60f4b0a37a69b95d642a471365eae8",
                "PT-rsETH", "rsETH", 200, 23_450_000, 0.094, 0.028, 0.072),
            ("0x7d372819240d14fb477f17b964f95f33beb4c704",
                "PT-USD0++", "USD0++", 95, 8_900_000, 0.143, 0.0, 0.118),
            ("0x2dfaf9a5e4f293bceede49f2dba29aacdd88e0c4",
                "PT-rswETH", "rswETH", 30, 1_250_000, 0.062, 0.027, 0.051),
            (BROKEN_VAULT_ADDRESS,
                "PT-DEAD", "DEAD", 5, 640_000, 0.0, 0.0, 0.0),
            ("0x19588f29f9402bb508007feadd415c875ee3f19f",
                "PT-aUSDC", "aUSDC", 160, 310_000, 0.054, 0.048, 0.033),
            ("0x8e1c2be682b0d3d8f8ee32024455a34cc724cf08",
                "PT-crvUSD", "crvUSD", 2, 42_000, 0.0, 0.0, 0.0),
        ];

        rows.iter()
            .map(|(address, name, symbol, days, liquidity, implied, underlying, lp)| {
                let liquidity = Decimal::from(*liquidity);
                VaultSummary {
                    address: address.to_string(),
                    chain_id: self.chain_id,
                    name: name.to_string(),
                    symbol: format!("PENDLE-{}", symbol),
                    expiry: Some(now + ChronoDuration::days(*days)),
                    liquidity,
                    volume_24h: liquidity / Decimal::from(40),
                    implied_apy: Some(*implied),
                    underlying_apy: Some(*underlying),
                    lp_apy: Some(*lp),
                    pt_price: Decimal::new(9_600, 4),
                    yt_price: Decimal::new(400, 4),
                }
            })
            .collect()
    }

    fn detail_for(&self, vault: &VaultSummary) -> VaultDetail {
        let mut fields = match serde_json::to_value(vault) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        fields.insert("assetPriceUsd".to_string(), json!(3120.44));
        fields.insert("totalPt".to_string(), json!(vault.liquidity.to_string()));
        fields.insert(
            "rewardTokens".to_string(),
            json!([{"symbol": "PENDLE", "apy": 0.012}]),
        );
        fields.insert("timestamp".to_string(), json!(Utc::now().to_rfc3339()));
        VaultDetail::from_fields(fields)
    }
}

#[async_trait]
impl DataProvider for DemoProvider {
    async fn load_vaults(&self) -> Result<Vec<VaultSummary>, FetchError> {
        info!("🧪 Generating demo vault listing");
        self.simulate_latency().await;
        Ok(self.vaults())
    }

    async fn load_vault_detail(&self, key: &VaultKey) -> Result<VaultDetail, FetchError> {
        info!("🧪 Generating demo detail for {}", key);
        self.simulate_latency().await;

        if key.address == BROKEN_VAULT_ADDRESS {
            return Err(FetchError::Provider(Some(
                "Failed to fetch vault details: market has been delisted".to_string(),
            )));
        }

        self.vaults()
            .iter()
            .find(|v| v.key() == *key)
            .map(|v| self.detail_for(v))
            .ok_or_else(|| FetchError::Provider(Some(format!("Unknown vault {}", key))))
    }

    async fn get_status(&self) -> DataSourceStatus {
        DataSourceStatus::Connected
    }

    fn describe(&self) -> String {
        format!("demo data (chain {})", self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn detail_round_trips_summary_fields() {
        let provider = DemoProvider::instant(1);
        let vaults = provider.load_vaults().await.unwrap();
        let first = &vaults[0];

        let detail = provider.load_vault_detail(&first.key()).await.unwrap();

        assert_eq!(detail.name(), Some(first.name.as_str()));
        assert_eq!(detail.liquidity(), Some(first.liquidity));
        assert!(detail.extra().iter().any(|(k, _)| *k == "rewardTokens"));
    }

    #[tokio::test]
    async fn broken_vault_fails_with_provider_message() {
        let provider = DemoProvider::instant(1);
        let err = provider
            .load_vault_detail(&VaultKey::new(BROKEN_VAULT_ADDRESS, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Provider(Some(_))));
    }

    #[tokio::test]
    async fn other_chain_is_unknown() {
        let provider = DemoProvider::instant(1);
        let vaults = provider.load_vaults().await.unwrap();
        let foreign = VaultKey::new(vaults[0].address.clone(), 10);
        assert!(provider.load_vault_detail(&foreign).await.is_err());
    }
}
