//! Scenario tests
//!
//! Worked examples with atomic-unit fixtures, from raw calculator chains up
//! to a full account view assembled from the in-memory sources.

use num_bigint::BigInt;
use perps_risk_core::*;
use rust_decimal_macros::dec;

fn atomic(digits: &str) -> BigInt {
    digits.parse().unwrap()
}

fn e(n: i64, exp: u32) -> BigInt {
    BigInt::from(n) * BigInt::from(10).pow(exp)
}

/// Calculator chains as they appear in real formulas.
mod calculator_tests {
    use super::*;

    #[test]
    fn notional_size_times_price() {
        let btc = PositionSize::from_raw(e(15, 17));
        let price = OraclePrice::from_raw(e(45_000, 18));
        let notional = DecimalCalculator::first(&btc).multiply_by(&price).calculate::<Usd>();
        assert_eq!(notional.raw(), &e(67_500, 15));
    }

    #[test]
    fn weighted_average_price() {
        let total_cost = UsdValue::from_raw(e(40_000, 15)) + UsdValue::from_raw(e(90_000, 15));
        let total_size = PositionSize::from_raw(e(1, 18)) + PositionSize::from_raw(e(2, 18));
        let avg = DecimalCalculator::first(&total_cost)
            .divide_by(&total_size)
            .calculate::<Price>()
            .unwrap();
        assert_eq!(avg.raw(), &atomic("43333333333333333333333"));
    }

    #[test]
    fn collateral_minus_debt_over_size() {
        let collateral = UsdValue::from_raw(e(50_000, 15));
        let debt = UsdValue::from_raw(e(30_000, 15));
        let size = PositionSize::from_raw(e(1, 18));
        let liq = DecimalCalculator::first(&collateral)
            .subtract_by(&debt)
            .divide_by(&size)
            .calculate::<Price>()
            .unwrap();
        assert_eq!(liq.raw(), &e(20_000, 18));
    }

    #[test]
    fn difference_of_products_over_sum() {
        let size = |n: i64| PositionSize::from_raw(e(n, 18));
        // (10 * 8 - 2 * 5) / (3 + 2)
        let result = DecimalCalculator::first(&size(10))
            .multiply_by(&size(8))
            .subtract_term(DecimalCalculator::first(&size(2)).multiply_by(&size(5)))
            .in_denominator(|d| d.value(&size(3)).add(&size(2)))
            .calculate::<Size>()
            .unwrap();
        assert_eq!(result.raw(), &e(14, 18));
    }

    #[test]
    fn then_separates_groups() {
        // (40 + 12) * 1, then into price units
        let a = OraclePrice::from_integer(40);
        let b = OraclePrice::from_integer(12);
        let result = DecimalCalculator::value(&a)
            .add(&b)
            .then()
            .multiply_by(&PercentageMultiplier::from_integer(1))
            .calculate::<Price>();
        assert_eq!(result.raw(), &e(52, 18));
    }

    #[test]
    fn large_scaling_both_ways() {
        let up = DecimalCalculator::first(&CollateralAmount::from_raw(e(100, 19)))
            .calculate::<Price>();
        assert_eq!(up.raw(), &e(100, 28));

        let down = DecimalCalculator::first(&OraclePrice::from_raw(e(100, 9)))
            .calculate::<Collateral>();
        assert_eq!(down.raw(), &BigInt::from(100));
    }

    #[test]
    fn zero_denominator_is_an_error() {
        let err = DecimalCalculator::first(&UsdValue::from_integer(1))
            .divide_by(&UsdValue::zero())
            .calculate::<Ratio>()
            .unwrap_err();
        assert_eq!(err, CalculatorError::DivisionByZero { denominator_scale: 15 });
    }
}

/// Position metrics against raw indexer fixtures.
mod position_tests {
    use super::*;

    fn revision(id: &str, is_long: bool, size: BigInt, collateral: BigInt) -> Position {
        let key = PositionKey::new(
            Address::new("0x123").unwrap(),
            AssetId::new("0xasset").unwrap(),
            is_long,
        );
        let collateral = CollateralAmount::from_raw(collateral);
        Position::new(PositionRevisionId::new(id).unwrap(), key, Timestamp::default())
            .with_change(PositionChange::Increase)
            .with_size(PositionSize::from_raw(size))
            .with_collateral(collateral.clone(), collateral)
    }

    #[test]
    fn notional_fixture() {
        let history = vec![revision("1", true, e(1, 18), BigInt::from(0))];
        let n = notional(&history, &OraclePrice::from_raw(e(50, 18)));
        assert_eq!(n.raw(), &e(50, 15));

        let short = vec![revision("1", false, e(-1, 18), BigInt::from(0))];
        assert_eq!(notional(&short, &OraclePrice::from_raw(e(50, 18))).raw(), &e(50, 15));
    }

    #[test]
    fn pnl_fixture_reads_latest_only() {
        let history = vec![
            revision("1", true, e(1, 18), e(45, 9)).with_latest(false),
            revision("2", true, e(1, 18), e(45, 9)),
        ];
        let pnl = unrealized_pnl(&history, &OraclePrice::from_raw(e(50, 18)));
        assert_eq!(pnl.raw(), &e(5, 15));
    }

    #[test]
    fn long_and_short_mirror_after_price_drop() {
        // entered at 50, oracle now 45
        let long = vec![revision("1", true, e(1, 18), e(50, 9))];
        let short = vec![revision("1", false, e(-1, 18), e(50, 9))];
        let price = OraclePrice::from_raw(e(45, 18));

        let long_pnl = unrealized_pnl(&long, &price);
        let short_pnl = unrealized_pnl(&short, &price);
        assert!(long_pnl.is_negative());
        assert!(short_pnl.is_positive());
        assert_eq!(long_pnl, -short_pnl);
    }

    #[test]
    fn entry_price_over_increases() {
        let history = vec![
            revision("1", true, e(1, 18), e(40_000, 9)),
            revision("2", true, e(2, 18), e(90_000, 9)),
            revision("3", true, e(1, 18), e(1, 9)).with_change(PositionChange::Decrease),
        ];
        assert_eq!(entry_price(&history).raw(), &atomic("43333333333333333333333"));
    }

    #[test]
    fn liquidation_sits_between_zero_and_price_for_long() {
        let history = vec![revision("1", true, e(1, 18), e(45, 9))];
        let cfg = MarketConfig::btc_perp();
        let liq = liquidation_price(&history, &UsdValue::from_integer(100), &cfg, &UsdValue::zero());
        assert!(liq.is_positive());
        assert!(liq < OraclePrice::from_integer(100));
    }
}

/// An account view assembled the way an application layer would.
mod account_flow_tests {
    use super::*;

    #[test]
    fn account_view_from_sources() {
        let me = Address::new("0xfeed").unwrap();
        let eth = AssetId::new("0xeth").unwrap();
        let btc = AssetId::new("0xbtc").unwrap();

        let mut configs = MarketConfigSet::new();
        configs.insert(MarketConfig::eth_perp()).unwrap();
        configs.insert(MarketConfig::btc_perp()).unwrap();

        let long_eth = Position::new(
            PositionRevisionId::new("eth-1").unwrap(),
            PositionKey::new(me.clone(), eth.clone(), true),
            Timestamp::from_millis(1),
        )
        .with_size(PositionSize::from_integer(2))
        .with_collateral(CollateralAmount::from_integer(5_800), CollateralAmount::from_integer(5_800));
        let short_btc = Position::new(
            PositionRevisionId::new("btc-1").unwrap(),
            PositionKey::new(me.clone(), btc.clone(), false),
            Timestamp::from_millis(2),
        )
        .with_size(PositionSize::from_decimal(dec!(0.1)))
        .with_collateral(CollateralAmount::from_integer(6_100), CollateralAmount::from_integer(6_100));
        let source = InMemoryPositions::new(vec![long_eth, short_btc]);

        let mut oracle = InMemoryOracle::new();
        oracle.set_price(eth.clone(), OraclePrice::from_integer(3_000));
        oracle.set_price(btc.clone(), OraclePrice::from_integer(60_000));

        let mut positions = source.positions(&me, &eth, true);
        positions.extend(source.positions(&me, &btc, true));
        let prices = oracle.prices(&[eth.clone(), btc.clone()]);

        // eth: 6000 - 5800 = +200, btc: 6100 - 6000 = +100
        let equity = account_equity(&positions, &UsdValue::from_integer(1_000), &prices);
        assert_eq!(equity, UsdValue::from_integer(1_300));

        let total = account_total_notional(&positions, &prices);
        assert_eq!(total, UsdValue::from_integer(12_000));

        // used margin is the sum of initial margins: 600 (10%) + 300 (5%)
        let used: UsdValue = positions
            .iter()
            .map(|p| {
                let cfg = configs.market_config(&p.position_key.index_asset_id).unwrap();
                let price = &prices[&p.position_key.index_asset_id];
                initial_margin(&notional(std::slice::from_ref(p), price), &cfg)
            })
            .sum();
        assert_eq!(used, UsdValue::from_integer(900));

        let metrics = account_metrics(&positions, &UsdValue::from_integer(1_000), &prices, &used);
        assert_eq!(metrics.equity, equity);
        assert_eq!(metrics.total_notional, total);
        // 12000 / 1300 = 9.230769230769230769...
        assert_eq!(metrics.account_leverage.to_string(), "9.230769230769230769");
        // 900 * 100 / 1300 = 69.230769230769230769...
        assert_eq!(metrics.margin_usage.to_string(), "69.230769230769230769");

        let eth_history = source.positions(&me, &eth, false);
        let eth_cfg = configs.market_config(&eth).unwrap();
        let risk = risk_metrics(&notional(&eth_history, &prices[&eth]), &equity, &eth_cfg);
        assert_eq!(risk.max_leverage, RatioOutput::from_integer(10));
        assert_eq!(risk.maintenance_margin, UsdValue::from_integer(300));
        assert_eq!(risk.position_health, PercentageValue::from_integer(100));

        assert_eq!(current_account_open_positions(&positions, Some(&me)).len(), 2);
    }

    #[test]
    fn missing_price_leaves_group_out() {
        let me = Address::new("0xfeed").unwrap();
        let sol = AssetId::new("0xsol").unwrap();
        let position = Position::new(
            PositionRevisionId::new("sol-1").unwrap(),
            PositionKey::new(me, sol.clone(), true),
            Timestamp::default(),
        )
        .with_size(PositionSize::from_integer(10));

        let oracle = InMemoryOracle::new();
        let prices = oracle.prices(&[sol]);
        assert!(prices.is_empty());

        let metrics = account_metrics(&[position], &UsdValue::from_integer(50), &prices, &UsdValue::zero());
        assert_eq!(metrics.equity, UsdValue::from_integer(50));
        assert!(metrics.total_notional.is_zero());
        assert!(metrics.account_leverage.is_zero());
        assert!(metrics.margin_usage.is_zero());
    }
}
