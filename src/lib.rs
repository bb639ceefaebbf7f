// perps-risk-core: margin, risk and account metrics for perpetual futures.
// money math is fixed-point on arbitrary-precision integers; every formula
// rounds once, at the end. pure functions, no I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: Address, AssetId, revision/config ids, Timestamp
//   2.x  decimal/: units, DecimalValue, deferred-rounding calculator
//   3.x  margin.rs: initial/maintenance margin, max leverage
//   4.x  position.rs: revisions, side/status, entry price, grouping
//   5.x  metrics.rs: notional, unrealized pnl, leverage
//   6.x  risk.rs: health, liquidation price, RiskMetrics
//   7.x  market.rs: market config, validation, tick/step rounding
//   8.x  account.rs: equity, total notional, leverage, margin usage
//   9.x  sources.rs: position/config/oracle collaborator traits

pub mod account;
pub mod decimal;
pub mod margin;
pub mod market;
pub mod metrics;
pub mod position;
pub mod risk;
pub mod sources;
pub mod types;

// re exports for convenience
pub use account::*;
pub use decimal::*;
pub use margin::*;
pub use market::*;
pub use metrics::*;
pub use position::*;
pub use risk::*;
pub use sources::*;
pub use types::*;
