use chrono::NaiveDate;
use optstrat_core::request::analyze_request;
use optstrat_core::strategy::metrics::breakevens;
use optstrat_core::{
    evaluate, evaluate_curve, Action, EvaluationConfig, MarketInput, MarketParameters,
    StrategyError, StrategyLeg,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::json;

// ===========================================================================
// Fixtures
// ===========================================================================

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn market_input(volatility: f64) -> MarketInput {
    // 30 days to target on a [50, 150] domain
    MarketInput {
        stock_price: 100.0,
        volatility,
        interest_rate: 0.0,
        dividend_yield: 0.0,
        start_date: date(2026, 3, 2),
        target_date: date(2026, 4, 1),
        min_stock: 50.0,
        max_stock: 150.0,
        days_in_year: 365,
    }
}

fn market(volatility: f64) -> MarketParameters {
    MarketParameters::new(market_input(volatility)).unwrap()
}

fn long_call() -> Vec<StrategyLeg> {
    vec![StrategyLeg::call(105.0, 2.0, 1, Action::Buy)]
}

// ===========================================================================
// Empty and offsetting strategies
// ===========================================================================

#[test]
fn test_empty_strategy_is_flat() {
    let out = evaluate(&market(0.2), &[], &EvaluationConfig::default()).unwrap();
    let m = &out.result;

    assert_eq!(m.strategy_cost, 0.0);
    assert_eq!(m.probability_of_profit, Some(0.0));
    assert!(m.profit_ranges.is_empty());
    assert_eq!(m.maximum_return_in_domain, Some(0.0));
    assert_eq!(m.minimum_return_in_domain, Some(0.0));
    // No profitable or losing outcome to average over
    assert_eq!(m.expected_profit, None);
    assert_eq!(m.expected_loss, None);
    assert!(out.warnings.iter().any(|w| w.contains("no legs")));

    let curve = evaluate_curve(&market(0.2), &[], &EvaluationConfig::default()).unwrap();
    assert!(curve.values.iter().all(|v| *v == 0.0));
}

#[test]
fn test_offsetting_legs_cancel() {
    let legs = vec![
        StrategyLeg::put(95.0, 1.4, 3, Action::Buy),
        StrategyLeg::put(95.0, 1.4, 3, Action::Sell),
    ];
    let out = evaluate(&market(0.3), &legs, &EvaluationConfig::default()).unwrap();
    assert_eq!(out.result.strategy_cost, 0.0);
    assert_eq!(out.result.probability_of_profit, Some(0.0));

    let curve = evaluate_curve(&market(0.3), &legs, &EvaluationConfig::default()).unwrap();
    assert!(curve.values.iter().all(|v| v.abs() < 1e-12));
}

// ===========================================================================
// Long call
// ===========================================================================

#[test]
fn test_long_call_payoff_at_expiry() {
    let curve = evaluate_curve(&market(0.2), &long_call(), &EvaluationConfig::default()).unwrap();
    for (s, v) in curve.points() {
        let expected = (s - 105.0_f64).max(0.0) - 2.0;
        assert!((v - expected).abs() < 1e-9, "P/L at {} = {}", s, v);
    }

    let be = breakevens(&curve);
    assert_eq!(be.len(), 1);
    assert!((be[0] - 107.0).abs() < 1e-6, "breakeven = {}", be[0]);
}

#[test]
fn test_long_call_reference_example() {
    let out = evaluate(&market(0.2), &long_call(), &EvaluationConfig::default()).unwrap();
    let m = &out.result;

    let pop = m.probability_of_profit.unwrap();
    assert!(pop > 0.0 && pop < 1.0, "PoP = {}", pop);
    assert!(pop > 0.05 && pop < 0.2, "PoP = {}", pop);

    assert_eq!(m.strategy_cost, 2.0);
    assert!((m.minimum_return_in_domain.unwrap() + 2.0).abs() < 1e-9);
    let max = m.maximum_return_in_domain.unwrap();
    assert!(max > 40.0 && max < 46.0, "max = {}", max);

    assert_eq!(m.profit_ranges.len(), 1);
    assert!((m.profit_ranges[0].0 - 107.0).abs() < 1e-6);
    assert_eq!(m.profit_ranges[0].1, 150.0);
    // Profit region runs into the grid edge
    assert!(out.warnings.iter().any(|w| w.contains("lower bound")));

    assert!(m.expected_profit.unwrap() > 0.0);
    // Losses between the strike and breakeven are smaller than the premium
    let el = m.expected_loss.unwrap();
    assert!(el >= -2.0 && el < 0.0, "expected loss = {}", el);
}

#[test]
fn test_probability_of_profit_rises_with_volatility() {
    let pops: Vec<f64> = [0.1, 0.2, 0.3, 0.4, 0.6]
        .iter()
        .map(|&v| {
            evaluate(&market(v), &long_call(), &EvaluationConfig::default())
                .unwrap()
                .result
                .probability_of_profit
                .unwrap()
        })
        .collect();
    for w in pops.windows(2) {
        assert!(w[1] >= w[0], "PoP not monotone: {:?}", pops);
    }
}

#[test]
fn test_zero_volatility_is_deterministic() {
    // The stock ends at spot for sure: an out-of-the-money call always loses
    let out = evaluate(&market(0.0), &long_call(), &EvaluationConfig::default()).unwrap();
    assert_eq!(out.result.probability_of_profit, Some(0.0));
    assert_eq!(out.result.expected_profit, None);
}

// ===========================================================================
// Domain coverage
// ===========================================================================

#[test]
fn test_narrow_domain_warns_about_truncation() {
    // sigma * sqrt(t) ~ 0.057 against a +/-5% domain leaves far more than 1% outside
    let mut input = market_input(0.2);
    input.min_stock = 95.0;
    input.max_stock = 105.0;
    let market = MarketParameters::new(input).unwrap();
    let out = evaluate(&market, &long_call(), &EvaluationConfig::default()).unwrap();

    assert!(
        out.warnings.iter().any(|w| w.contains("captures")),
        "warnings = {:?}",
        out.warnings
    );
    // Weights are renormalized, so probabilities stay defined
    let pop = out.result.probability_of_profit.unwrap();
    assert!((0.0..=1.0).contains(&pop));
    assert!((out.assumptions["grid_step"].as_f64().unwrap() - 0.005).abs() < 1e-9);
}

#[test]
fn test_point_mass_outside_domain_leaves_probabilities_undefined() {
    // No volatility and a 1000% rate: the forward lands near 227, past the 150 edge
    let mut input = market_input(0.0);
    input.interest_rate = 10.0;
    let market = MarketParameters::new(input).unwrap();
    let out = evaluate(&market, &long_call(), &EvaluationConfig::default()).unwrap();
    let m = &out.result;

    assert_eq!(m.probability_of_profit, None);
    assert_eq!(m.expected_profit, None);
    assert_eq!(m.expected_loss, None);
    assert!(out
        .warnings
        .iter()
        .any(|w| w.contains("outside the price grid")));
    // Deterministic curve metrics do not depend on the distribution
    assert_eq!(m.strategy_cost, 2.0);
    assert!(m.maximum_return_in_domain.is_some());
}

// ===========================================================================
// Short straddle, targets and limits
// ===========================================================================

#[test]
fn test_short_straddle_capped_at_credit() {
    let legs = vec![
        StrategyLeg::call(100.0, 3.0, 1, Action::Sell),
        StrategyLeg::put(100.0, 2.5, 1, Action::Sell),
    ];
    let config = EvaluationConfig {
        grid_points: 1001,
        profit_target: Some(2.0),
        loss_limit: Some(-10.0),
    };
    let out = evaluate(&market(0.25), &legs, &config).unwrap();
    let m = &out.result;

    assert_eq!(m.strategy_cost, -5.5);
    // Peak sits exactly on the strike
    assert!((m.maximum_return_in_domain.unwrap() - 5.5).abs() < 1e-9);

    let pop = m.probability_of_profit.unwrap();
    let target = m.probability_of_profit_target.unwrap();
    let limit = m.probability_of_loss_limit.unwrap();
    assert!(target <= pop);
    assert!(limit > 0.0 && limit < 1.0);
    assert!(pop + limit <= 1.0 + 1e-12);

    assert_eq!(m.profit_target_ranges.len(), 1);
    let (lo, hi) = m.profit_target_ranges[0];
    assert!((lo - 96.5).abs() < 1e-6 && (hi - 103.5).abs() < 1e-6);
    assert_eq!(m.loss_limit_ranges.len(), 2);
}

#[test]
fn test_leg_analytics_reported() {
    let legs = vec![
        StrategyLeg::stock(100, Action::Buy),
        StrategyLeg::call(105.0, 2.0, 100, Action::Sell),
    ];
    let out = evaluate(&market(0.2), &legs, &EvaluationConfig::default()).unwrap();
    let a = &out.result.leg_analytics;
    assert_eq!(a.len(), 2);
    assert_eq!(a[0].greeks.delta, 1.0);
    assert_eq!(a[0].itm_probability, None);
    assert_eq!(a[1].multiplier, -100.0);
    assert!(a[1].greeks.delta > 0.0 && a[1].greeks.delta < 0.5);
    assert!(a[1].model_price.unwrap() > 0.0);
}

// ===========================================================================
// Validation
// ===========================================================================

#[test]
fn test_negative_stock_price_rejected() {
    let mut input = market_input(0.2);
    input.stock_price = -5.0;
    let err = MarketParameters::new(input).unwrap_err();
    assert_eq!(err.field(), Some("stock_price"));
}

#[test]
fn test_target_before_start_rejected() {
    let mut input = market_input(0.2);
    input.target_date = date(2026, 2, 1);
    let err = MarketParameters::new(input).unwrap_err();
    assert_eq!(err.field(), Some("target_date"));
}

#[test]
fn test_invalid_config_rejected() {
    let config = EvaluationConfig {
        grid_points: 1,
        ..EvaluationConfig::default()
    };
    let err = evaluate(&market(0.2), &long_call(), &config).unwrap_err();
    assert_eq!(err.field(), Some("grid_points"));

    let config = EvaluationConfig {
        loss_limit: Some(5.0),
        ..EvaluationConfig::default()
    };
    let err = evaluate(&market(0.2), &long_call(), &config).unwrap_err();
    assert_eq!(err.field(), Some("loss_limit"));
}

#[test]
fn test_invalid_leg_rejected() {
    let legs = vec![StrategyLeg::call(-1.0, 2.0, 1, Action::Buy)];
    let err = evaluate(&market(0.2), &legs, &EvaluationConfig::default()).unwrap_err();
    assert_eq!(err.field(), Some("strategy[0].strike"));
}

// ===========================================================================
// Request boundary
// ===========================================================================

#[test]
fn test_analyze_request_report() {
    let req = json!({
        "stock_ticker": "acme",
        "stock_price": "100",
        "volatility": 0.2,
        "interest_rate": 0,
        "start_date": "2026-03-02",
        "target_date": "2026-04-01",
        "strategy": [
            {"type": "call", "strike": "105", "premium": 2, "n": 1, "action": "Buy"}
        ]
    });
    let out = analyze_request(&req).unwrap();
    let report = &out.result;

    assert!(report.success);
    assert_eq!(report.title, "ACME Options Strategy Analysis");
    assert_eq!(report.metrics.max_loss, Some(dec!(-2.00)));
    assert_eq!(report.metrics.strategy_cost, Some(dec!(2.00)));
    assert_eq!(report.metrics.profit_ranges, vec![[dec!(107.00), dec!(150.00)]]);
    let pop = report.metrics.probability_of_profit.unwrap();
    assert!(pop > dec!(0) && pop < dec!(100));
}

#[test]
fn test_analyze_request_unknown_leg_type() {
    let req = json!({
        "stock_price": 100,
        "volatility": 0.2,
        "start_date": "2026-03-02",
        "target_date": "2026-04-01",
        "strategy": [{"type": "future", "n": 1, "action": "buy"}]
    });
    match analyze_request(&req) {
        Err(StrategyError::UnsupportedLegType { index, tag }) => {
            assert_eq!(index, 0);
            assert_eq!(tag, "future");
        }
        other => panic!("expected UnsupportedLegType, got {:?}", other.map(|o| o.result)),
    }
}

#[test]
fn test_zero_metric_is_not_null() {
    let req = json!({
        "stock_price": 100,
        "volatility": 0.2,
        "start_date": "2026-03-02",
        "target_date": "2026-04-01",
        "strategy": []
    });
    let out = analyze_request(&req).unwrap();
    let json = serde_json::to_value(&out.result.metrics).unwrap();
    assert_eq!(json["probability_of_profit"], json!("0"));
    assert_eq!(json["expected_profit"], serde_json::Value::Null);
    assert_eq!(out.result.title, "Profit/Loss Diagram");
}
