use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde_json::Value;

pub const NOT_APPLICABLE: &str = "N/A";

/// Compact USD amount: `$512.00M`, `$1.25K`, `$980.00`.
pub fn format_usd(amount: Decimal) -> String {
    let value = amount.to_f64().unwrap_or(0.0);
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("${:.2}B", value / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("${:.2}M", value / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("${:.2}K", value / 1_000.0)
    } else {
        format!("${:.2}", value)
    }
}

/// Yield fraction as a percentage. Zero means the provider has no figure.
pub fn format_apy(rate: Option<f64>) -> String {
    match rate {
        Some(rate) if rate != 0.0 && rate.is_finite() => format!("{:.2}%", rate * 100.0),
        _ => NOT_APPLICABLE.to_string(),
    }
}

pub fn format_usd_or_na(amount: Option<Decimal>) -> String {
    match amount {
        Some(amount) if !amount.is_zero() => format_usd(amount),
        _ => NOT_APPLICABLE.to_string(),
    }
}

pub fn format_price(price: Option<Decimal>) -> String {
    match price {
        Some(price) if !price.is_zero() => price.round_dp(4).normalize().to_string(),
        _ => NOT_APPLICABLE.to_string(),
    }
}

/// Maturity date with days remaining relative to `now`.
pub fn format_expiry(expiry: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match expiry {
        Some(expiry) if expiry <= now => format!("{} (matured)", expiry.format("%Y-%m-%d")),
        Some(expiry) => format!(
            "{} ({}d)",
            expiry.format("%Y-%m-%d"),
            (expiry - now).num_days()
        ),
        None => "unknown".to_string(),
    }
}

/// Passthrough value as text: strings bare, everything else as compact JSON.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn usd_scales() {
        assert_eq!(format_usd(dec!(512000000)), "$512.00M");
        assert_eq!(format_usd(dec!(1250)), "$1.25K");
        assert_eq!(format_usd(dec!(2400000000)), "$2.40B");
        assert_eq!(format_usd(dec!(42)), "$42.00");
    }

    #[test]
    fn zero_rates_and_prices_are_not_applicable() {
        assert_eq!(format_apy(Some(0.0)), "N/A");
        assert_eq!(format_apy(None), "N/A");
        assert_eq!(format_apy(Some(0.05)), "5.00%");
        assert_eq!(format_price(Some(Decimal::ZERO)), "N/A");
        assert_eq!(format_price(Some(dec!(0.94123))), "0.9412");
        assert_eq!(format_usd_or_na(Some(Decimal::ZERO)), "N/A");
    }

    #[test]
    fn expiry_shows_days_left() {
        let now = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 12, 25, 0, 0, 0).unwrap();
        assert_eq!(format_expiry(Some(later), now), "2025-12-25 (85d)");
        assert_eq!(format_expiry(Some(now), later), "2025-10-01 (matured)");
        assert_eq!(format_expiry(None, now), "unknown");
    }

    #[test]
    fn passthrough_values_render_verbatim() {
        assert_eq!(format_value(&json!("abc")), "abc");
        assert_eq!(format_value(&json!({"a": [1, 2]})), r#"{"a":[1,2]}"#);
        assert_eq!(format_value(&json!(3.5)), "3.5");
    }
}
