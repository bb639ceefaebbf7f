//! Market configuration.
//!
//! A market config carries the margin fractions and display precision for a
//! single index asset. Configs are supplied by the indexer and read-only here;
//! [`MarketConfig::validate`] checks the invariants every metric relies on.

use crate::decimal::calculator::{div_round_half_away, pow10};
use crate::decimal::{OraclePrice, PercentageValue, PositionSize, Price, Size, Unit};
use crate::types::{AssetId, MarketConfigId};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be within [0, 1], got {value}")]
    FractionOutOfRange { field: &'static str, value: String },

    #[error("maintenance margin fraction {maintenance} must be below initial {initial}")]
    MaintenanceNotBelowInitial { maintenance: String, initial: String },

    #[error("{field} is {decimals}, max is {max}")]
    TooManyDecimals {
        field: &'static str,
        decimals: u32,
        max: u32,
    },

    #[error("duplicate market config for asset {0}")]
    DuplicateAsset(AssetId),
}

/// Static per-asset risk parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub id: MarketConfigId,
    pub asset: AssetId,
    /// Fraction of notional required to open, e.g. 0.05 for 20x.
    pub initial_margin_fraction: PercentageValue,
    /// Fraction of notional required to stay open.
    pub maintenance_margin_fraction: PercentageValue,
    pub tick_size_decimals: u32,
    pub step_size_decimals: u32,
}

impl MarketConfig {
    /// BTC-PERP: 20x max, 3% maintenance.
    pub fn btc_perp() -> Self {
        Self {
            id: MarketConfigId::new_unchecked("btc-perp"),
            asset: AssetId::new_unchecked("0xbtc"),
            initial_margin_fraction: PercentageValue::from_decimal(dec!(0.05)),
            maintenance_margin_fraction: PercentageValue::from_decimal(dec!(0.03)),
            tick_size_decimals: 1,
            step_size_decimals: 4,
        }
    }

    /// ETH-PERP: 10x max, 5% maintenance.
    pub fn eth_perp() -> Self {
        Self {
            id: MarketConfigId::new_unchecked("eth-perp"),
            asset: AssetId::new_unchecked("0xeth"),
            initial_margin_fraction: PercentageValue::from_decimal(dec!(0.1)),
            maintenance_margin_fraction: PercentageValue::from_decimal(dec!(0.05)),
            tick_size_decimals: 2,
            step_size_decimals: 3,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let one = PercentageValue::from_integer(1);
        let fractions = [
            ("initial_margin_fraction", &self.initial_margin_fraction),
            ("maintenance_margin_fraction", &self.maintenance_margin_fraction),
        ];
        for (field, value) in fractions {
            if value.is_negative() || *value > one {
                return Err(ConfigError::FractionOutOfRange {
                    field,
                    value: value.to_string(),
                });
            }
        }

        if self.maintenance_margin_fraction >= self.initial_margin_fraction {
            return Err(ConfigError::MaintenanceNotBelowInitial {
                maintenance: self.maintenance_margin_fraction.to_string(),
                initial: self.initial_margin_fraction.to_string(),
            });
        }

        let decimals = [
            ("tick_size_decimals", self.tick_size_decimals, Price::DECIMALS),
            ("step_size_decimals", self.step_size_decimals, Size::DECIMALS),
        ];
        for (field, decimals, max) in decimals {
            if decimals > max {
                return Err(ConfigError::TooManyDecimals {
                    field,
                    decimals,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Rounds a price to the market tick, half away from zero.
    pub fn quantize_price(&self, price: &OraclePrice) -> OraclePrice {
        OraclePrice::from_raw(quantize(price.raw(), Price::DECIMALS, self.tick_size_decimals))
    }

    /// Rounds a size to the market step, half away from zero.
    pub fn quantize_size(&self, size: &PositionSize) -> PositionSize {
        PositionSize::from_raw(quantize(size.raw(), Size::DECIMALS, self.step_size_decimals))
    }
}

// keep `keep` of the `decimals` fractional digits, zero the rest
fn quantize(raw: &num_bigint::BigInt, decimals: u32, keep: u32) -> num_bigint::BigInt {
    if keep >= decimals {
        return raw.clone();
    }
    let step = pow10(decimals - keep);
    div_round_half_away(raw, &step) * step
}

/// In-memory market configs, looked up by id or by asset.
#[derive(Debug, Clone, Default)]
pub struct MarketConfigSet {
    by_id: HashMap<MarketConfigId, MarketConfig>,
    asset_index: HashMap<AssetId, MarketConfigId>,
}

impl MarketConfigSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a validated config. One config per asset; an existing id is
    /// replaced, including its asset mapping.
    pub fn insert(&mut self, config: MarketConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if let Some(existing) = self.asset_index.get(&config.asset) {
            if existing != &config.id {
                return Err(ConfigError::DuplicateAsset(config.asset.clone()));
            }
        }
        self.replace(config);
        Ok(())
    }

    // drops whatever the id and the asset pointed at before
    fn replace(&mut self, config: MarketConfig) {
        if let Some(old) = self.by_id.remove(&config.id) {
            self.asset_index.remove(&old.asset);
        }
        if let Some(old_id) = self.asset_index.remove(&config.asset) {
            self.by_id.remove(&old_id);
        }
        self.asset_index.insert(config.asset.clone(), config.id.clone());
        self.by_id.insert(config.id.clone(), config);
    }

    pub fn by_id(&self, id: &MarketConfigId) -> Option<&MarketConfig> {
        self.by_id.get(id)
    }

    pub fn by_asset(&self, asset: &AssetId) -> Option<&MarketConfig> {
        self.asset_index.get(asset).and_then(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarketConfig> {
        self.by_id.values()
    }
}

impl FromIterator<MarketConfig> for MarketConfigSet {
    /// Collects configs without validation. A later entry evicts any earlier
    /// one with the same id or the same asset.
    fn from_iter<I: IntoIterator<Item = MarketConfig>>(iter: I) -> Self {
        let mut set = Self::new();
        for config in iter {
            set.replace(config);
        }
        set
    }
}
