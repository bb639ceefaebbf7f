// 9.0: input collaborators. the indexer, market registry and oracle live
// outside this crate; these traits are the shape the metrics consume.
// 9.1 in-memory implementations for tests and offline tooling.

use crate::decimal::OraclePrice;
use crate::market::{MarketConfig, MarketConfigSet};
use crate::position::Position;
use crate::types::{Address, AssetId};
use std::collections::HashMap;

/// Batch oracle lookup result. Assets without a price are simply absent.
pub type OraclePrices = HashMap<AssetId, OraclePrice>;

pub trait PositionSource {
    /// Revisions for `account` on `asset`; only `latest` ones when `latest_only`.
    fn positions(&self, account: &Address, asset: &AssetId, latest_only: bool) -> Vec<Position>;
}

pub trait MarketConfigSource {
    fn market_config(&self, asset: &AssetId) -> Option<MarketConfig>;
}

pub trait OraclePriceSource {
    fn price(&self, asset: &AssetId) -> Option<OraclePrice>;

    fn prices(&self, assets: &[AssetId]) -> OraclePrices {
        assets
            .iter()
            .filter_map(|asset| self.price(asset).map(|price| (asset.clone(), price)))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPositions {
    positions: Vec<Position>,
}

impl InMemoryPositions {
    pub fn new(positions: Vec<Position>) -> Self {
        Self { positions }
    }

    pub fn push(&mut self, position: Position) {
        self.positions.push(position);
    }
}

impl PositionSource for InMemoryPositions {
    fn positions(&self, account: &Address, asset: &AssetId, latest_only: bool) -> Vec<Position> {
        self.positions
            .iter()
            .filter(|p| &p.position_key.account == account && &p.position_key.index_asset_id == asset)
            .filter(|p| !latest_only || p.latest)
            .cloned()
            .collect()
    }
}

impl MarketConfigSource for MarketConfigSet {
    fn market_config(&self, asset: &AssetId) -> Option<MarketConfig> {
        self.by_asset(asset).cloned()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryOracle {
    prices: OraclePrices,
}

impl InMemoryOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&mut self, asset: AssetId, price: OraclePrice) {
        self.prices.insert(asset, price);
    }
}

impl OraclePriceSource for InMemoryOracle {
    fn price(&self, asset: &AssetId) -> Option<OraclePrice> {
        self.prices.get(asset).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::PositionSize;
    use crate::position::PositionKey;
    use crate::types::{PositionRevisionId, Timestamp};

    fn asset(id: &str) -> AssetId {
        AssetId::new(id).unwrap()
    }

    #[test]
    fn positions_filter_by_account_asset_and_latest() {
        let me = Address::new("0x1").unwrap();
        let other = Address::new("0x2").unwrap();
        let revision = |id: &str, account: &Address, a: &str, latest: bool| {
            Position::new(
                PositionRevisionId::new(id).unwrap(),
                PositionKey::new(account.clone(), asset(a), true),
                Timestamp::default(),
            )
            .with_size(PositionSize::from_integer(1))
            .with_latest(latest)
        };
        let source = InMemoryPositions::new(vec![
            revision("1", &me, "0xeth", false),
            revision("2", &me, "0xeth", true),
            revision("3", &me, "0xbtc", true),
            revision("4", &other, "0xeth", true),
        ]);

        assert_eq!(source.positions(&me, &asset("0xeth"), false).len(), 2);
        let latest = source.positions(&me, &asset("0xeth"), true);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].revision_id.as_str(), "2");
    }

    #[test]
    fn market_config_by_asset() {
        let mut set = MarketConfigSet::new();
        set.insert(MarketConfig::eth_perp()).unwrap();
        assert!(set.market_config(&asset("0xeth")).is_some());
        assert!(set.market_config(&asset("0xbtc")).is_none());
    }

    #[test]
    fn batch_prices_omit_missing_assets() {
        let mut oracle = InMemoryOracle::new();
        oracle.set_price(asset("0xeth"), OraclePrice::from_integer(3000));

        let prices = oracle.prices(&[asset("0xeth"), asset("0xbtc")]);
        assert_eq!(prices.len(), 1);
        assert_eq!(prices[&asset("0xeth")], OraclePrice::from_integer(3000));
        assert!(oracle.price(&asset("0xbtc")).is_none());
    }
}
