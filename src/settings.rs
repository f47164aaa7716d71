// =============================================================================
// Dashboard Settings — commission rates and fees with explicit load / save
// =============================================================================
//
// Process-wide settings that the dashboard reads when it turns revenue into
// owner payouts. They live in a `KeyValueStore` under a single key; nothing
// is read or written implicitly. All fields carry `#[serde(default)]` so a
// document written by an older build still loads.
// =============================================================================

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::KeyValueStore;

/// Store key the settings document lives under.
pub const SETTINGS_KEY: &str = "settings";

fn default_commission_rate_pct() -> f64 {
    20.0
}

fn default_currency() -> String {
    "JPY".to_string()
}

/// Commission and fee settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Management commission as a percentage of room revenue.
    #[serde(default = "default_commission_rate_pct")]
    pub commission_rate_pct: f64,

    /// Cleaning fee charged per booking.
    #[serde(default)]
    pub cleaning_fee: f64,

    /// Per-property commission overrides (property id -> percent).
    #[serde(default)]
    pub property_commission_rates: HashMap<String, f64>,

    /// Display currency code. Amounts themselves are currency-agnostic.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            commission_rate_pct: default_commission_rate_pct(),
            cleaning_fee: 0.0,
            property_commission_rates: HashMap::new(),
            currency: default_currency(),
        }
    }
}

impl Settings {
    /// Load settings from `store`. A store that has never seen the key yields
    /// defaults.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let Some(content) = store
            .get(SETTINGS_KEY)
            .context("failed to read settings from store")?
        else {
            info!("no stored settings, using defaults");
            return Ok(Self::default());
        };

        let settings: Self =
            serde_json::from_str(&content).context("failed to parse stored settings")?;

        info!(
            commission_rate_pct = settings.commission_rate_pct,
            cleaning_fee = settings.cleaning_fee,
            overrides = settings.property_commission_rates.len(),
            "settings loaded"
        );
        Ok(settings)
    }

    /// Persist settings to `store`.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).context("failed to serialise settings to JSON")?;
        store
            .put(SETTINGS_KEY, &content)
            .context("failed to write settings to store")?;
        info!("settings saved");
        Ok(())
    }

    /// Commission rate that applies to `property_id`.
    pub fn commission_rate_for(&self, property_id: &str) -> f64 {
        self.property_commission_rates
            .get(property_id)
            .copied()
            .unwrap_or(self.commission_rate_pct)
    }

    /// Check invariants an update must keep.
    pub fn validate(&self) -> Result<()> {
        check_rate("commissionRatePct", self.commission_rate_pct)?;
        for (property_id, rate) in &self.property_commission_rates {
            check_rate(&format!("propertyCommissionRates.{property_id}"), *rate)?;
        }
        if !self.cleaning_fee.is_finite() || self.cleaning_fee < 0.0 {
            anyhow::bail!("cleaningFee must be a non-negative amount, got {}", self.cleaning_fee);
        }
        if self.currency.trim().is_empty() {
            anyhow::bail!("currency must not be empty");
        }
        Ok(())
    }
}

fn check_rate(name: &str, rate: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&rate) {
        anyhow::bail!("{name} must be between 0 and 100, got {rate}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn default_settings_have_expected_values() {
        let s = Settings::default();
        assert!((s.commission_rate_pct - 20.0).abs() < f64::EPSILON);
        assert_eq!(s.cleaning_fee, 0.0);
        assert!(s.property_commission_rates.is_empty());
        assert_eq!(s.currency, "JPY");
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let s: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{ "cleaningFee": 4500 }"#).unwrap();
        assert!((s.cleaning_fee - 4500.0).abs() < f64::EPSILON);
        assert!((s.commission_rate_pct - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_from_empty_store_gives_defaults() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store).unwrap(), Settings::default());
    }

    #[test]
    fn save_then_load() {
        let store = MemoryStore::new();
        let mut s = Settings::default();
        s.commission_rate_pct = 18.5;
        s.property_commission_rates.insert("p-1".into(), 12.0);
        s.save(&store).unwrap();

        let loaded = Settings::load(&store).unwrap();
        assert_eq!(loaded, s);
    }

    #[test]
    fn corrupt_document_is_an_error() {
        let store = MemoryStore::new();
        store.put(SETTINGS_KEY, "not json").unwrap();
        assert!(Settings::load(&store).is_err());
    }

    #[test]
    fn property_override_wins() {
        let mut s = Settings::default();
        s.property_commission_rates.insert("p-1".into(), 12.0);
        assert_eq!(s.commission_rate_for("p-1"), 12.0);
        assert_eq!(s.commission_rate_for("p-2"), 20.0);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut s = Settings::default();
        assert!(s.validate().is_ok());

        s.commission_rate_pct = 120.0;
        assert!(s.validate().is_err());

        s.commission_rate_pct = 20.0;
        s.property_commission_rates.insert("p".into(), -1.0);
        assert!(s.validate().is_err());

        s.property_commission_rates.clear();
        s.cleaning_fee = -5.0;
        assert!(s.validate().is_err());
    }
}
