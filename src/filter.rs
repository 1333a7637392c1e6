use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::model::VaultSummary;

/// Slider ceiling when nothing is loaded; a zero ceiling would make the control unusable.
pub const FALLBACK_MAX_LIQUIDITY: Decimal = dec!(1000000);

/// Vaults whose liquidity is at or above `threshold`, in their original order.
pub fn compute_visible(vaults: &[VaultSummary], threshold: Decimal) -> Vec<VaultSummary> {
    vaults
        .iter()
        .filter(|vault| vault.liquidity >= threshold)
        .cloned()
        .collect()
}

#[cfg(test)]
pub fn recompute_max_liquidity(vaults: &[VaultSummary]) -> Decimal {
    recompute_max_liquidity_or(vaults, FALLBACK_MAX_LIQUIDITY)
}

/// Largest liquidity in `vaults`, or `fallback` when there are none.
pub fn recompute_max_liquidity_or(vaults: &[VaultSummary], fallback: Decimal) -> Decimal {
    vaults
        .iter()
        .map(|vault| vault.liquidity)
        .max()
        .unwrap_or(fallback)
}
