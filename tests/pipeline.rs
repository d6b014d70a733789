//! End-to-end tests: candles in, regime summary out.

use std::sync::Arc;

use regime_engine::labelers::{LabelerKind, LabelerWindows};
use regime_engine::market_data::{load_candles, Candle};
use regime_engine::{BarHorizon, EngineConfig, Regime, RegimeEngine};

fn config(window: usize) -> EngineConfig {
    EngineConfig {
        labeler_windows: LabelerWindows::uniform(window),
        rolling_window: 50,
        ..EngineConfig::default()
    }
}

/// Prices that bounce between two levels every bar.
fn zigzag(len: usize) -> Vec<f64> {
    (0..len).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect()
}

/// Prices whose log returns are positive and vary slowly.
fn smooth_uptrend(len: usize) -> Vec<f64> {
    let mut price = 100.0_f64;
    (0..len)
        .map(|t| {
            price *= (0.01 + 0.005 * (t as f64 / 10.0).sin()).exp();
            price
        })
        .collect()
}

fn to_candles(prices: &[f64]) -> Vec<Candle> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| Candle::flat(i as i64 * 60_000, p))
        .collect()
}

#[test]
fn oscillating_market_is_mean_reverting() {
    let engine = RegimeEngine::new(config(20));
    let summary = engine.analyze("ZIGZAG", &to_candles(&zigzag(200)));

    assert_eq!(summary.latest, Some(Regime::MeanReverting));
    assert_eq!(summary.execution_regime(), Regime::MeanReverting);
    assert!((summary.latest_agreement() - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(
        summary.labels[&LabelerKind::Drift].last(),
        Some(Regime::Random)
    );
    assert!(summary.diagnostics.acf1 < -0.9);
}

#[test]
fn persistent_uptrend_is_trending_and_absorbing() {
    let engine = RegimeEngine::new(config(20));
    let summary = engine.analyze_closes("TREND", &smooth_uptrend(300));

    assert_eq!(summary.latest, Some(Regime::Trending));
    assert!(matches!(
        summary.execution_regime(),
        Regime::Trending | Regime::VolatileTrending
    ));
    assert_eq!(summary.latest_agreement(), 1.0);
    // The last 250 consensus bars never leave the trend.
    assert_eq!(
        summary.expected_durations[&Regime::Trending],
        BarHorizon::Infinite
    );
    let next = summary.next_bar.as_ref().map(|d| d.get(Regime::Trending));
    assert_eq!(next, Some(1.0));
}

#[test]
fn warmup_bars_are_random_in_consensus() {
    let engine = RegimeEngine::new(config(30));
    let summary = engine.analyze_closes("WARMUP", &smooth_uptrend(120));
    for t in 0..30 {
        assert_eq!(summary.consensus.get(t), Some(Regime::Random), "bar {t}");
    }
    assert!(summary.volatility_shift.flips >= 1);
}

#[test]
fn candle_file_feeds_the_engine() {
    let path = std::env::temp_dir().join(format!("regime_pipeline_{}.json", std::process::id()));
    let candles = to_candles(&zigzag(120));
    std::fs::write(&path, serde_json::to_string(&candles).unwrap()).unwrap();

    let loaded = load_candles(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded, candles);

    let engine = RegimeEngine::new(config(20));
    let summary = engine.analyze("FILE", &loaded);
    assert_eq!(summary.bars, 120);
    assert_eq!(engine.latest("FILE").map(|s| s.bars), Some(120));
}

#[test]
fn custom_alphabet_shapes_the_matrix() {
    let cfg: EngineConfig = serde_json::from_str(
        r#"{ "alphabet": ["trending", "random"], "labeler_windows": { "acf": 20, "vr_like": 20, "drift": 20 } }"#,
    )
    .unwrap();
    cfg.validate().unwrap();

    let engine = RegimeEngine::new(cfg);
    let summary = engine.analyze_closes("ZIGZAG", &zigzag(150));

    assert_eq!(summary.transitions.states(), &[Regime::Trending, Regime::Random]);
    assert_eq!(summary.expected_durations.len(), 2);
    // Consensus ends mean_reverting, which the alphabet does not contain.
    assert_eq!(summary.consensus.last(), Some(Regime::MeanReverting));
    assert_eq!(summary.latest, Some(Regime::Random));
    assert_eq!(summary.execution_regime(), Regime::Random);
    // Only the random warmup run is counted, so random stays random.
    let next = summary.next_bar.as_ref().unwrap();
    assert_eq!(next.get(Regime::Random), 1.0);
    assert_eq!(next.get(Regime::MeanReverting), 0.0);
}

#[test]
fn symbols_can_be_analysed_concurrently() {
    let engine = Arc::new(RegimeEngine::new(config(20)));
    let inputs = [
        ("AAA", zigzag(150)),
        ("BBB", smooth_uptrend(150)),
        ("CCC", zigzag(90)),
    ];

    std::thread::scope(|scope| {
        for (symbol, prices) in &inputs {
            let engine = engine.clone();
            scope.spawn(move || engine.analyze_closes(symbol, prices));
        }
    });

    assert_eq!(engine.symbols(), vec!["AAA", "BBB", "CCC"]);
    for (symbol, prices) in &inputs {
        let cached = engine.latest(symbol).unwrap();
        let fresh = RegimeEngine::new(config(20)).analyze_closes(symbol, prices);
        assert_eq!(cached.consensus, fresh.consensus);
        assert_eq!(cached.transitions, fresh.transitions);
    }
}
