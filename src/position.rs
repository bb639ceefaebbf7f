// 4.0: position revisions. one Position is one row of a position's history;
// a logical position is every revision sharing a PositionKey.
// 4.1 accessors: side, status, latest revision, entry price.
// 4.2 grouping and the connected account's open positions.

use crate::decimal::{
    CollateralAmount, DecimalCalculator, FundingRate, OraclePrice, PnlDelta, PositionSize,
    Price, RealizedPnl,
};
use crate::types::{Address, AssetId, PositionRevisionId, Timestamp};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashMap;

/// Identity of a logical position. Structural equality and hash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionKey {
    pub account: Address,
    pub index_asset_id: AssetId,
    pub is_long: bool,
}

impl PositionKey {
    pub fn new(account: Address, index_asset_id: AssetId, is_long: bool) -> Self {
        Self {
            account,
            index_asset_id,
            is_long,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionChange {
    Increase,
    Decrease,
    Close,
    Liquidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Closed,
}

/// One revision of a position. The sign of `size` carries no meaning; the
/// side comes from the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub revision_id: PositionRevisionId,
    pub position_key: PositionKey,
    pub collateral_amount: CollateralAmount,
    pub size: PositionSize,
    pub timestamp: Timestamp,
    pub latest: bool,
    pub change: PositionChange,
    pub collateral_transferred: CollateralAmount,
    pub position_fee: CollateralAmount,
    pub funding_rate: FundingRate,
    pub pnl_delta: PnlDelta,
    pub realized_funding_rate: FundingRate,
    pub realized_pnl: RealizedPnl,
}

impl Position {
    /// A latest `Increase` revision with every amount zero.
    pub fn new(revision_id: PositionRevisionId, position_key: PositionKey, timestamp: Timestamp) -> Self {
        Self {
            revision_id,
            position_key,
            collateral_amount: CollateralAmount::zero(),
            size: PositionSize::zero(),
            timestamp,
            latest: true,
            change: PositionChange::Increase,
            collateral_transferred: CollateralAmount::zero(),
            position_fee: CollateralAmount::zero(),
            funding_rate: FundingRate::zero(),
            pnl_delta: PnlDelta::zero(),
            realized_funding_rate: FundingRate::zero(),
            realized_pnl: RealizedPnl::zero(),
        }
    }

    pub fn with_size(mut self, size: PositionSize) -> Self {
        self.size = size;
        self
    }

    /// Sets both the running collateral and the amount moved by this revision.
    pub fn with_collateral(mut self, amount: CollateralAmount, transferred: CollateralAmount) -> Self {
        self.collateral_amount = amount;
        self.collateral_transferred = transferred;
        self
    }

    pub fn with_change(mut self, change: PositionChange) -> Self {
        self.change = change;
        self
    }

    pub fn with_latest(mut self, latest: bool) -> Self {
        self.latest = latest;
        self
    }

    pub fn with_fee(mut self, fee: CollateralAmount) -> Self {
        self.position_fee = fee;
        self
    }

    pub fn with_realized_pnl(mut self, pnl: RealizedPnl) -> Self {
        self.realized_pnl = pnl;
        self
    }

    pub fn side(&self) -> PositionSide {
        if self.position_key.is_long {
            PositionSide::Long
        } else {
            PositionSide::Short
        }
    }

    // 4.1: a non-latest revision is history and always reads as closed
    pub fn status(&self) -> PositionStatus {
        match self.change {
            PositionChange::Close | PositionChange::Liquidate => PositionStatus::Closed,
            _ if self.size.is_zero() => PositionStatus::Closed,
            _ if self.latest => PositionStatus::Open,
            _ => PositionStatus::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status() == PositionStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status() == PositionStatus::Closed
    }
}

fn revisions<P: Borrow<Position>>(positions: &[P]) -> impl Iterator<Item = &Position> {
    positions.iter().map(|p| <P as Borrow<Position>>::borrow(p))
}

pub fn filter_open<P: Borrow<Position>>(positions: &[P]) -> Vec<&Position> {
    revisions(positions).filter(|p| p.is_open()).collect()
}

pub fn filter_closed<P: Borrow<Position>>(positions: &[P]) -> Vec<&Position> {
    revisions(positions).filter(|p| p.is_closed()).collect()
}

/// First revision flagged `latest`. Producers guarantee at most one.
pub fn latest_of<P: Borrow<Position>>(history: &[P]) -> Option<&Position> {
    revisions(history).find(|p| p.latest)
}

/// Collateral-weighted entry price over the `Increase` revisions:
/// `sum(collateral_transferred) / sum(|size|)`, divided once.
pub fn entry_price<P: Borrow<Position>>(history: &[P]) -> OraclePrice {
    let increases = revisions(history)
        .filter(|p| p.change == PositionChange::Increase);

    let (collateral, size) = increases.fold(
        (CollateralAmount::zero(), PositionSize::zero()),
        |(collateral, size), p| (collateral + &p.collateral_transferred, size + p.size.abs()),
    );
    if size.is_zero() {
        tracing::trace!("entry price: no increase volume");
        return OraclePrice::zero();
    }

    DecimalCalculator::first(&collateral)
        .divide_by(&size)
        .calculate::<Price>()
        .unwrap_or_default()
}

pub fn total_realized_pnl<P: Borrow<Position>>(history: &[P]) -> RealizedPnl {
    revisions(history).map(|p| &p.realized_pnl).sum()
}

pub fn total_position_fees<P: Borrow<Position>>(history: &[P]) -> CollateralAmount {
    revisions(history).map(|p| &p.position_fee).sum()
}

// 4.2: histories keyed by structural PositionKey equality
pub fn group_by_key<P: Borrow<Position>>(positions: &[P]) -> HashMap<PositionKey, Vec<&Position>> {
    let mut groups: HashMap<PositionKey, Vec<&Position>> = HashMap::new();
    for p in revisions(positions) {
        groups.entry(p.position_key.clone()).or_default().push(p);
    }
    groups
}

/// Latest open revisions owned by `account`. Empty when no account is connected.
pub fn current_account_open_positions<'a, P: Borrow<Position>>(
    positions: &'a [P],
    account: Option<&Address>,
) -> Vec<&'a Position> {
    let Some(account) = account else {
        return Vec::new();
    };
    revisions(positions)
        .filter(|p| p.latest && p.is_open() && &p.position_key.account == account)
        .collect()
}
