use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::error::FetchError;
use crate::model::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataSourceStatus {
    Connected,
    Disconnected,
    Error(String),
}

/// Read-only source of vault data. Both calls are idempotent and never retried here.
#[async_trait]
pub trait DataProvider {
    async fn load_vaults(&self) -> Result<Vec<VaultSummary>, FetchError>;
    async fn load_vault_detail(&self, key: &VaultKey) -> Result<VaultDetail, FetchError>;
    async fn get_status(&self) -> DataSourceStatus;

    /// Human-readable origin, shown on the loading screen.
    fn describe(&self) -> String;
}
