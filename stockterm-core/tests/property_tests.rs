//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. Price floor and history cap hold after any sequence of ticks and shocks
//! 2. Buys never drive cash negative and update holdings exactly
//! 3. Selling undoes buying at an unchanged price
//! 4. Diversification percentages sum to the invested share of total value
//! 5. RSI saturates on monotonic sequences
//! 6. Indicators are deterministic

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use stockterm_core::domain::{Impact, Player, Qualitative, Stock, HISTORY_CAP, MIN_PRICE};
use stockterm_core::indicators::{analyze, rsi};
use stockterm_core::ledger::TradeRejection;
use stockterm_core::news::ImpactModel;
use stockterm_core::price_model::RandomWalk;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (0.01..5000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_volatility() -> impl Strategy<Value = f64> {
    0.0..0.5_f64
}

fn arb_impact() -> impl Strategy<Value = Impact> {
    prop_oneof![
        (-1.0..1.0_f64).prop_map(Impact::numeric),
        Just(Impact::Qualitative(Qualitative::Positive)),
        Just(Impact::Qualitative(Qualitative::Negative)),
        Just(Impact::Qualitative(Qualitative::Neutral)),
    ]
}

// ── 1. Price floor and history cap ───────────────────────────────────

proptest! {
    #[test]
    fn ticks_respect_floor_and_cap(
        price in arb_price(),
        vol in arb_volatility(),
        seed in any::<u64>(),
        ticks in 1usize..200,
    ) {
        let walk = RandomWalk::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut stock = Stock::new("TEST", "Test Corp.", price, vol);
        for _ in 0..ticks {
            walk.tick(&mut stock, &mut rng);
            prop_assert!(stock.price() >= MIN_PRICE);
            prop_assert!(stock.history().len() <= HISTORY_CAP);
            prop_assert!(!stock.history().is_empty());
            prop_assert_eq!(*stock.history().last().unwrap(), stock.price());
        }
    }

    #[test]
    fn news_shocks_respect_floor_and_cap(
        price in arb_price(),
        impacts in prop::collection::vec(arb_impact(), 1..120),
        seed in any::<u64>(),
    ) {
        let model = ImpactModel::default();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut stock = Stock::new("TEST", "Test Corp.", price, 0.02);
        for impact in &impacts {
            model.apply(&mut stock, impact, &mut rng);
            prop_assert!(stock.price() >= MIN_PRICE);
            prop_assert!(stock.history().len() <= HISTORY_CAP);
        }
    }
}

// ── 2/3. Buy and sell accounting ─────────────────────────────────────

proptest! {
    #[test]
    fn buy_never_overdraws(
        cash in 0.0..50_000.0_f64,
        price in arb_price(),
        qty in 1u64..500,
    ) {
        let stock = Stock::new("TEST", "Test Corp.", price, 0.02);
        let mut player = Player::new("p", cash);
        let cost = stock.price() * qty as f64;
        match player.buy(&stock, qty) {
            Ok(tx) => {
                prop_assert!(cash >= cost);
                prop_assert!(player.cash >= 0.0);
                prop_assert_eq!(player.cash, cash - cost);
                prop_assert_eq!(player.quantity_of("TEST"), qty);
                prop_assert_eq!(tx.total, cost);
            }
            Err(TradeRejection::InsufficientFunds { .. }) => {
                prop_assert!(cash < cost);
                prop_assert_eq!(player.cash, cash);
                prop_assert_eq!(player.quantity_of("TEST"), 0);
            }
            Err(other) => prop_assert!(false, "unexpected rejection: {other}"),
        }
    }

    #[test]
    fn sell_inverts_buy(
        price in 1.0..1000.0_f64,
        qty in 1u64..100,
        existing in 0u64..50,
    ) {
        let stock = Stock::new("TEST", "Test Corp.", price, 0.02);
        let mut player = Player::new("p", 1_000_000.0);
        if existing > 0 {
            player.holdings.insert("TEST".into(), existing);
        }
        let cash_before = player.cash;
        player.buy(&stock, qty).unwrap();
        player.sell(&stock, qty).unwrap();
        prop_assert!((player.cash - cash_before).abs() < 1e-6);
        prop_assert_eq!(player.quantity_of("TEST"), existing);
        prop_assert_eq!(player.holdings.contains_key("TEST"), existing > 0);
    }
}

// ── 4. Diversification ───────────────────────────────────────────────

proptest! {
    #[test]
    fn diversification_sums_to_invested_share(
        lots in prop::collection::vec((arb_price(), 1u64..100), 1..10),
        cash in 0.0f64..50_000.0,
    ) {
        let stocks: Vec<Stock> = lots
            .iter()
            .enumerate()
            .map(|(i, (p, _))| Stock::new(format!("S{i}"), format!("Stock {i}"), *p, 0.02))
            .collect();
        let mut player = Player::new("p", cash);
        for (i, (_, qty)) in lots.iter().enumerate() {
            player.holdings.insert(format!("S{i}"), *qty);
        }
        let breakdown = player.diversification(&stocks);
        prop_assert_eq!(breakdown.len(), lots.len());
        let expected = player.portfolio_value(&stocks) / player.total_value(&stocks) * 100.0;
        let sum: f64 = breakdown.iter().map(|h| h.percentage).sum();
        prop_assert!((sum - expected).abs() < 1e-6, "sum = {}, expected = {}", sum, expected);
        prop_assert!(sum <= 100.0 + 1e-6);
        for pair in breakdown.windows(2) {
            prop_assert!(pair[0].percentage >= pair[1].percentage);
        }
    }
}

// ── 5/6. Indicators ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_saturates_on_monotonic_sequences(
        start in 10.0..1000.0_f64,
        step in 0.01..5.0_f64,
        len in 16usize..50,
    ) {
        let up: Vec<f64> = (0..len).map(|i| start + step * i as f64).collect();
        let down: Vec<f64> = (0..len).map(|i| start + step * (len - i) as f64).collect();
        prop_assert_eq!(rsi(&up, 14), Some(100.0));
        let low = rsi(&down, 14).unwrap();
        prop_assert!(low < 1e-9, "rsi = {}", low);
    }

    #[test]
    fn analysis_is_deterministic(
        prices in prop::collection::vec(arb_price(), 1..60),
    ) {
        let mut stock = Stock::new("TEST", "Test Corp.", prices[0], 0.02);
        for p in &prices[1..] {
            stock.advance(*p);
        }
        prop_assert_eq!(analyze(&stock), analyze(&stock.clone()));
    }
}
