use log::{debug, info};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::api::provider::DataProvider;
use crate::model::VaultKey;
use crate::store::VaultStore;

/// Drives the data pipeline: fetches run as background tasks and every write to the
/// shared [`VaultStore`] goes through its lock, so late responses are checked against
/// the state at the moment they resolve.
pub struct Explorer<P> {
    provider: Arc<P>,
    store: Arc<RwLock<VaultStore>>,
}

impl<P: DataProvider + Send + Sync + 'static> Explorer<P> {
    pub fn new(provider: P, fallback_max_liquidity: Decimal) -> Self {
        Self {
            provider: Arc::new(provider),
            store: Arc::new(RwLock::new(VaultStore::new(fallback_max_liquidity))),
        }
    }

    pub fn store(&self) -> Arc<RwLock<VaultStore>> {
        self.store.clone()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Starts a full listing fetch. Also the manual recovery path after a failure.
    pub async fn reload(&self) -> JoinHandle<()> {
        let request = self.store.write().await.begin_load();
        info!("🔄 Loading vault listing from {}", self.provider.describe());

        let provider = self.provider.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            let result = provider.load_vaults().await;
            store.write().await.finish_load(request, result);
        })
    }

    /// Selects a vault and fetches its detail in the background.
    pub async fn select(&self, key: VaultKey) -> JoinHandle<()> {
        let request = self.store.write().await.select(key);

        let provider = self.provider.clone();
        let store = self.store.clone();
        tokio::spawn(async move {
            let result = provider.load_vault_detail(&request.key).await;
            let key = request.key.clone();
            if !store.write().await.apply_detail(request, result) {
                debug!("Detail for {} arrived after the selection changed", key);
            }
        })
    }

    pub async fn deselect(&self) {
        self.store.write().await.deselect();
    }

    pub async fn set_threshold(&self, value: Decimal) {
        self.store.write().await.set_threshold(value);
    }
}
