use log::{debug, info, warn};
use rust_decimal::Decimal;

use crate::api::error::{FetchError, GENERIC_DETAIL_MESSAGE, GENERIC_VAULTS_MESSAGE};
use crate::filter::{compute_visible, recompute_max_liquidity_or};
use crate::model::*;

/// Lifecycle of the vault listing: `Idle -> Loading -> {Loaded, Failed}`.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionState {
    Idle,
    Loading,
    Loaded(Vec<VaultSummary>),
    Failed(String),
}

/// Lifecycle of the detail payload for the selected vault.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Loaded(VaultDetail),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub key: VaultKey,
    pub detail: DetailState,
    ticket: u64,
}

/// Handle for one listing fetch. Only the newest handle may complete the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    ticket: u64,
}

/// Handle for one detail fetch, tied to the selection that started it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub key: VaultKey,
    ticket: u64,
}

/// View state of the explorer. Every mutation goes through the methods below.
#[derive(Debug)]
pub struct VaultStore {
    collection: CollectionState,
    threshold: Decimal,
    max_liquidity: Decimal,
    fallback_max_liquidity: Decimal,
    selection: Option<Selection>,
    pending_load: Option<u64>,
    next_ticket: u64,
}

impl VaultStore {
    pub fn new(fallback_max_liquidity: Decimal) -> Self {
        Self {
            collection: CollectionState::Idle,
            threshold: Decimal::ZERO,
            max_liquidity: fallback_max_liquidity,
            fallback_max_liquidity,
            selection: None,
            pending_load: None,
            next_ticket: 0,
        }
    }

    pub fn collection(&self) -> &CollectionState {
        &self.collection
    }

    /// The loaded vaults, or an empty slice outside the `Loaded` state.
    pub fn vaults(&self) -> &[VaultSummary] {
        match &self.collection {
            CollectionState::Loaded(vaults) => vaults.as_slice(),
            _ => &[],
        }
    }

    pub fn threshold(&self) -> Decimal {
        self.threshold
    }

    pub fn max_liquidity(&self) -> Decimal {
        self.max_liquidity
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn find(&self, key: &VaultKey) -> Option<&VaultSummary> {
        self.vaults().iter().find(|vault| vault.key() == *key)
    }

    pub fn visible(&self) -> Vec<VaultSummary> {
        compute_visible(self.vaults(), self.threshold)
    }

    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Starts a (re)load. Any open selection is superseded.
    pub fn begin_load(&mut self) -> LoadRequest {
        let ticket = self.issue_ticket();
        self.pending_load = Some(ticket);
        self.collection = CollectionState::Loading;
        if let Some(selection) = self.selection.take() {
            debug!("Dropping selection {} for reload", selection.key);
        }
        LoadRequest { ticket }
    }

    /// Applies a listing result. Returns `false` when a newer load has started since.
    pub fn finish_load(
        &mut self,
        request: LoadRequest,
        result: Result<Vec<VaultSummary>, FetchError>,
    ) -> bool {
        if self.pending_load != Some(request.ticket) {
            debug!("Discarding superseded listing response #{}", request.ticket);
            return false;
        }
        self.pending_load = None;

        match result {
            Ok(vaults) => {
                self.max_liquidity =
                    recompute_max_liquidity_or(&vaults, self.fallback_max_liquidity);
                if self.threshold > self.max_liquidity {
                    self.threshold = self.max_liquidity;
                }
                info!(
                    "✅ Listing loaded: {} vaults, max liquidity ${}",
                    vaults.len(),
                    self.max_liquidity.round_dp(2)
                );
                self.collection = CollectionState::Loaded(vaults);
            }
            Err(e) => {
                warn!("⚠️ Listing load failed: {}", e);
                self.collection = CollectionState::Failed(e.user_message(GENERIC_VAULTS_MESSAGE));
            }
        }
        true
    }

    /// Accepts the control's value as given; the control is bounded by construction.
    pub fn set_threshold(&mut self, value: Decimal) {
        self.threshold = value;
    }

    /// Makes `key` the inspected vault and returns the handle its detail fetch must carry.
    pub fn select(&mut self, key: VaultKey) -> DetailRequest {
        let ticket = self.issue_ticket();
        debug!("Selecting {} (request #{})", key, ticket);
        self.selection = Some(Selection {
            key: key.clone(),
            detail: DetailState::Loading,
            ticket,
        });
        DetailRequest { key, ticket }
    }

    pub fn deselect(&mut self) {
        if let Some(selection) = self.selection.take() {
            debug!("Deselected {}", selection.key);
        }
    }

    /// Applies a detail result only if it belongs to the current selection.
    /// Returns `false` when the response was stale and silently dropped.
    pub fn apply_detail(
        &mut self,
        request: DetailRequest,
        result: Result<VaultDetail, FetchError>,
    ) -> bool {
        let selection = match self.selection.as_mut() {
            Some(selection)
                if selection.key == request.key && selection.ticket == request.ticket =>
            {
                selection
            }
            _ => {
                debug!(
                    "Discarding stale detail response for {} (#{})",
                    request.key, request.ticket
                );
                return false;
            }
        };

        selection.detail = match result {
            Ok(detail) => DetailState::Loaded(detail),
            Err(e) => {
                warn!("⚠️ Detail load for {} failed: {}", request.key, e);
                DetailState::Failed(e.user_message(GENERIC_DETAIL_MESSAGE))
            }
        };
        true
    }
}
