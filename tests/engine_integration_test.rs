//! Integration tests for the execution engine and paper trading flows.
//!
//! Covers signal-driven entries and exits, risk-based exits and their
//! interaction with same-tick strategy evaluation, fault isolation,
//! advisory gating, and full buy/recover/sell cycles.

use std::collections::HashMap;

use cointrader::domain::engine::{
    AdvisorDecision, AdvisorVerdict, ExecutionEngine, SignalAdvisor, TradingConfig,
};
use cointrader::domain::error::CoinTraderError;
use cointrader::domain::market::{MarketView, Tick};
use cointrader::domain::paper::{PaperTrader, ReplaySession};
use cointrader::domain::portfolio::{Portfolio, PortfolioManager};
use cointrader::domain::position::Position;
use cointrader::domain::risk::{RiskConfig, RiskManager};
use cointrader::domain::signal::{Signal, SignalType};
use cointrader::domain::trade::Side;
use cointrader::strategies::dip_buy::DipBuy;
use cointrader::strategies::Strategy;

/// Returns a canned signal per ticker, like a strategy with its mind made
/// up.
struct MockStrategy {
    signals: HashMap<String, Signal>,
}

impl MockStrategy {
    fn new(signals: HashMap<String, Signal>) -> Self {
        MockStrategy { signals }
    }

    fn quiet() -> Self {
        MockStrategy {
            signals: HashMap::new(),
        }
    }
}

impl Strategy for MockStrategy {
    fn name(&self) -> &str {
        "mock_strategy"
    }

    fn template(&self) -> &'static str {
        "mock"
    }

    fn evaluate(
        &self,
        ticker: &str,
        _market: &MarketView,
    ) -> Result<Option<Signal>, CoinTraderError> {
        Ok(self.signals.get(ticker).cloned())
    }
}

struct FailingStrategy;

impl Strategy for FailingStrategy {
    fn name(&self) -> &str {
        "failing_strategy"
    }

    fn template(&self) -> &'static str {
        "failing"
    }

    fn evaluate(
        &self,
        _ticker: &str,
        _market: &MarketView,
    ) -> Result<Option<Signal>, CoinTraderError> {
        Err(CoinTraderError::StrategyEvaluation {
            name: "failing_strategy".into(),
            reason: "synthetic fault".into(),
        })
    }
}

struct SkipAdvisor;

impl SignalAdvisor for SkipAdvisor {
    fn review(&self, _signal: &Signal, _market: &MarketView) -> AdvisorDecision {
        AdvisorDecision::new(AdvisorVerdict::Skip, 0.9, "overextended market".into()).unwrap()
    }
}

struct ExecuteAdvisor;

impl SignalAdvisor for ExecuteAdvisor {
    fn review(&self, _signal: &Signal, _market: &MarketView) -> AdvisorDecision {
        AdvisorDecision::new(AdvisorVerdict::Execute, 0.7, "looks fine".into()).unwrap()
    }
}

fn buy_signal(ticker: &str) -> Signal {
    Signal::new("mock_strategy", ticker, SignalType::Buy, 0.8, "Test buy".into()).unwrap()
}

fn engine_with(
    balance: f64,
    strategies: Vec<Box<dyn Strategy>>,
) -> ExecutionEngine {
    let portfolio = PortfolioManager::new(Portfolio::new(balance), 0.05);
    let risk = RiskManager::new(RiskConfig::default(), 1_000_000.0);
    ExecutionEngine::new(100_000.0, portfolio, risk, strategies)
}

fn engine_with_position(balance: f64, position: Position) -> ExecutionEngine {
    let mut portfolio = Portfolio::new(balance);
    portfolio.positions.insert(position.ticker.clone(), position);
    let portfolio = PortfolioManager::new(portfolio, 0.05);
    let risk = RiskManager::new(RiskConfig::default(), 1_000_000.0);
    ExecutionEngine::new(100_000.0, portfolio, risk, vec![Box::new(MockStrategy::quiet())])
}

#[test]
fn buy_on_signal() {
    let mut signals = HashMap::new();
    signals.insert("KRW-BTC".to_string(), buy_signal("KRW-BTC"));
    let mut engine = engine_with(1_000_000.0, vec![Box::new(MockStrategy::new(signals))]);

    let trades = engine.process_tick(&Tick::new("KRW-BTC", 50_000_000.0));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].ticker, "KRW-BTC");
    assert_eq!(trades[0].side, Side::Buy);
    assert!(engine.portfolio().quote_balance < 1_000_000.0);
    assert_eq!(engine.trade_log().len(), 1);
}

#[test]
fn stop_loss_trigger() {
    let position = Position::open("test", "KRW-BTC", 50_000_000.0, 0.002);
    let mut engine = engine_with_position(900_000.0, position);

    // Price drops 6%: past the -5% stop.
    let trades = engine.process_tick(&Tick::new("KRW-BTC", 47_000_000.0));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].side, Side::Sell);
    assert!(trades[0].reason.contains("Stop-loss"));
    assert!(trades[0].profit.unwrap() < 0.0);
    assert_eq!(engine.portfolio().open_position_count(), 0);
}

#[test]
fn take_profit_trigger() {
    let position = Position::open("test", "KRW-BTC", 50_000_000.0, 0.002);
    let mut engine = engine_with_position(900_000.0, position);

    // Price up 11%: past the +10% target.
    let trades = engine.process_tick(&Tick::new("KRW-BTC", 55_500_000.0));
    assert_eq!(trades.len(), 1);
    assert!(trades[0].reason.contains("Take-profit"));
    assert!(trades[0].profit.unwrap() > 0.0);
}

#[test]
fn trailing_stop_trigger_uses_running_high() {
    let mut position = Position::open("test", "KRW-BTC", 50_000_000.0, 0.002);
    position.highest_price = 54_000_000.0;
    let mut engine = engine_with_position(900_000.0, position);

    // 4% below the 54M high but only +3.6% from entry: neither stop-loss
    // nor take-profit applies, the trailing stop does.
    let trades = engine.process_tick(&Tick::new("KRW-BTC", 51_840_000.0));
    assert_eq!(trades.len(), 1);
    assert!(trades[0].reason.contains("Trailing stop"));
}

#[test]
fn tick_updates_high_before_exit_checks() {
    let position = Position::open("test", "KRW-BTC", 50_000_000.0, 0.002);
    let mut engine = engine_with_position(900_000.0, position);

    // Rally, then a pullback below trailing threshold measured from the
    // new high.
    assert!(engine.process_tick(&Tick::new("KRW-BTC", 54_000_000.0)).is_empty());
    let trades = engine.process_tick(&Tick::new("KRW-BTC", 52_000_000.0));
    assert_eq!(trades.len(), 1);
    assert!(trades[0].reason.contains("Trailing stop"));
}

#[test]
fn invalid_ticks_do_nothing() {
    let mut signals = HashMap::new();
    signals.insert("KRW-BTC".to_string(), buy_signal("KRW-BTC"));
    let mut engine = engine_with(1_000_000.0, vec![Box::new(MockStrategy::new(signals))]);

    assert!(engine.process_tick(&Tick::new("", 50_000_000.0)).is_empty());
    assert!(engine.process_tick(&Tick::new("KRW-BTC", 0.0)).is_empty());
    assert!(engine.process_tick(&Tick::new("KRW-BTC", -5.0)).is_empty());
    assert!((engine.portfolio().quote_balance - 1_000_000.0).abs() < f64::EPSILON);
    assert!(engine.trade_log().is_empty());
}

#[test]
fn risk_exit_suppresses_strategy_entries_same_tick() {
    // Documented behavior: once a risk exit fires, strategies are not
    // evaluated for that ticker on that tick, even though the exit leaves
    // the slot closed and a buy would otherwise pass risk checks.
    let mut signals = HashMap::new();
    signals.insert("KRW-BTC".to_string(), buy_signal("KRW-BTC"));

    let mut portfolio = Portfolio::new(900_000.0);
    portfolio.positions.insert(
        "KRW-BTC".to_string(),
        Position::open("test", "KRW-BTC", 50_000_000.0, 0.002),
    );
    let portfolio = PortfolioManager::new(portfolio, 0.05);
    let risk = RiskManager::new(RiskConfig::default(), 1_000_000.0);
    let mut engine = ExecutionEngine::new(
        100_000.0,
        portfolio,
        risk,
        vec![Box::new(MockStrategy::new(signals))],
    );

    let trades = engine.process_tick(&Tick::new("KRW-BTC", 47_000_000.0));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].side, Side::Sell);
    assert!(trades[0].reason.contains("Stop-loss"));
    // No re-entry on the same tick.
    assert_eq!(engine.portfolio().open_position_count(), 0);

    // The very next tick may re-enter.
    let trades = engine.process_tick(&Tick::new("KRW-BTC", 47_000_000.0));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].side, Side::Buy);
}

#[test]
fn strategy_fault_is_isolated() {
    let mut signals = HashMap::new();
    signals.insert("KRW-BTC".to_string(), buy_signal("KRW-BTC"));
    let mut engine = engine_with(
        1_000_000.0,
        vec![
            Box::new(FailingStrategy),
            Box::new(MockStrategy::new(signals)),
        ],
    );

    // The failing strategy is logged and skipped; the next one trades.
    let trades = engine.process_tick(&Tick::new("KRW-BTC", 50_000_000.0));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].side, Side::Buy);
}

#[test]
fn advisor_skip_suppresses_execution() {
    let mut signals = HashMap::new();
    signals.insert("KRW-BTC".to_string(), buy_signal("KRW-BTC"));
    let portfolio = PortfolioManager::new(Portfolio::new(1_000_000.0), 0.05);
    let risk = RiskManager::new(RiskConfig::default(), 1_000_000.0);
    let mut engine = ExecutionEngine::new(
        100_000.0,
        portfolio,
        risk,
        vec![Box::new(MockStrategy::new(signals))],
    )
    .with_advisor(Box::new(SkipAdvisor));

    let trades = engine.process_tick(&Tick::new("KRW-BTC", 50_000_000.0));
    assert!(trades.is_empty());
    assert!((engine.portfolio().quote_balance - 1_000_000.0).abs() < f64::EPSILON);
}

#[test]
fn advisor_execute_lets_risk_gate_decide() {
    let mut signals = HashMap::new();
    signals.insert("KRW-BTC".to_string(), buy_signal("KRW-BTC"));
    let portfolio = PortfolioManager::new(Portfolio::new(1_000_000.0), 0.05);
    let risk = RiskManager::new(RiskConfig::default(), 1_000_000.0);
    let mut engine = ExecutionEngine::new(
        100_000.0,
        portfolio,
        risk,
        vec![Box::new(MockStrategy::new(signals))],
    )
    .with_advisor(Box::new(ExecuteAdvisor));

    let trades = engine.process_tick(&Tick::new("KRW-BTC", 50_000_000.0));
    assert_eq!(trades.len(), 1);
}

#[test]
fn duplicate_buy_signal_is_blocked_by_risk() {
    let mut signals = HashMap::new();
    signals.insert("KRW-BTC".to_string(), buy_signal("KRW-BTC"));
    let mut engine = engine_with(1_000_000.0, vec![Box::new(MockStrategy::new(signals))]);

    let first = engine.process_tick(&Tick::new("KRW-BTC", 50_000_000.0));
    assert_eq!(first.len(), 1);
    // Same signal next tick: already holding, risk blocks the duplicate.
    let second = engine.process_tick(&Tick::new("KRW-BTC", 50_000_000.0));
    assert!(second.is_empty());
    assert_eq!(engine.portfolio().open_position_count(), 1);
}

#[test]
fn full_dip_buy_cycle() {
    let strategy = DipBuy::new(-7.0, 2.0, 24);
    let trader = PaperTrader::new(
        &TradingConfig::default(),
        RiskConfig::default(),
        vec![Box::new(strategy)],
    );
    let mut session = ReplaySession::new(trader);

    // Phase 1: stable market, no trades.
    for _ in 0..20 {
        let trades = session.feed(&Tick::new("KRW-BTC", 50_000_000.0));
        assert!(trades.is_empty());
    }

    // Phase 2: -8% dip triggers a buy.
    let trades = session.feed(&Tick::new("KRW-BTC", 46_000_000.0));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].side, Side::Buy);
    let portfolio = session.trader().portfolio();
    assert!(portfolio.positions.contains_key("KRW-BTC"));
    assert!(portfolio.quote_balance < 1_000_000.0);

    // Phase 3: +3% recovery from entry triggers the sell.
    let trades = session.feed(&Tick::new("KRW-BTC", 47_380_000.0));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].side, Side::Sell);
    assert!(trades[0].profit.unwrap() > 0.0);

    let summary = session.trader().summary();
    assert_eq!(summary.total_trades, 1);
    assert_eq!(summary.winning_trades, 1);
    assert!((summary.win_rate - 1.0).abs() < f64::EPSILON);
}

#[test]
fn max_positions_blocks_sixth_entry() {
    let strategy = DipBuy::new(-7.0, 2.0, 24);
    let trader = PaperTrader::new(
        &TradingConfig::default(),
        RiskConfig::default(),
        vec![Box::new(strategy)],
    );
    let mut session = ReplaySession::new(trader);

    let tickers = ["KRW-BTC", "KRW-ETH", "KRW-XRP", "KRW-SOL", "KRW-DOGE"];
    for ticker in tickers {
        // Build a flat history, then dip ~9%.
        for _ in 0..20 {
            session.feed(&Tick::new(ticker, 1_100_000.0));
        }
        let trades = session.feed(&Tick::new(ticker, 1_000_000.0));
        assert_eq!(trades.len(), 1, "should buy {ticker}");
    }
    assert_eq!(session.trader().portfolio().open_position_count(), 5);

    // A sixth dip is blocked by the position limit.
    for _ in 0..20 {
        session.feed(&Tick::new("KRW-ADA", 1_100.0));
    }
    let trades = session.feed(&Tick::new("KRW-ADA", 1_000.0));
    assert!(trades.is_empty());
    assert_eq!(session.trader().portfolio().open_position_count(), 5);
}

#[test]
fn stop_loss_realizes_loss_into_daily_pnl_gate() {
    // A crash right after entry stops out; enough stopped-out losses hit
    // the daily loss limit and block further entries.
    let risk = RiskConfig {
        stop_loss_pct: -5.0,
        max_daily_loss_pct: -0.5,
        ..RiskConfig::default()
    };
    let strategy = DipBuy::new(-7.0, 2.0, 24);
    let trader = PaperTrader::new(&TradingConfig::default(), risk, vec![Box::new(strategy)]);
    let mut session = ReplaySession::new(trader);

    for _ in 0..20 {
        session.feed(&Tick::new("KRW-BTC", 50_000_000.0));
    }
    let trades = session.feed(&Tick::new("KRW-BTC", 46_000_000.0));
    assert_eq!(trades.len(), 1);

    // -7% from entry: stop-loss fires and realizes a ~7% loss on the
    // 100k stake, past the -0.5% daily limit on the 1M account.
    let trades = session.feed(&Tick::new("KRW-BTC", 42_780_000.0));
    assert_eq!(trades.len(), 1);
    assert!(trades[0].reason.contains("Stop-loss"));

    // The next dip on another ticker is blocked by the daily loss brake.
    for _ in 0..20 {
        session.feed(&Tick::new("KRW-ETH", 4_000_000.0));
    }
    let trades = session.feed(&Tick::new("KRW-ETH", 3_600_000.0));
    assert!(trades.is_empty());
}

#[test]
fn sell_signal_from_strategy_closes_position() {
    // Seed an engine holding a position, then deliver a SELL signal.
    let mut signals = HashMap::new();
    signals.insert(
        "KRW-BTC".to_string(),
        Signal::new("mock_strategy", "KRW-BTC", SignalType::Sell, 0.9, "Exit".into()).unwrap(),
    );

    let mut portfolio = Portfolio::new(900_000.0);
    portfolio.positions.insert(
        "KRW-BTC".to_string(),
        Position::open("mock_strategy", "KRW-BTC", 50_000_000.0, 0.002),
    );
    let portfolio = PortfolioManager::new(portfolio, 0.05);
    let risk = RiskManager::new(RiskConfig::default(), 1_000_000.0);
    let mut engine = ExecutionEngine::new(
        100_000.0,
        portfolio,
        risk,
        vec![Box::new(MockStrategy::new(signals))],
    );

    // +4%: inside the risk-exit bands, so the strategy signal drives it.
    let trades = engine.process_tick(&Tick::new("KRW-BTC", 52_000_000.0));
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].side, Side::Sell);
    assert_eq!(trades[0].reason, "Exit");
    assert!(trades[0].profit.unwrap() > 0.0);
    assert_eq!(engine.portfolio().open_position_count(), 0);
}

#[test]
fn sell_signal_without_position_is_rejected() {
    let mut signals = HashMap::new();
    signals.insert(
        "KRW-BTC".to_string(),
        Signal::new("mock_strategy", "KRW-BTC", SignalType::Sell, 0.9, "Exit".into()).unwrap(),
    );
    let mut engine = engine_with(1_000_000.0, vec![Box::new(MockStrategy::new(signals))]);

    let trades = engine.process_tick(&Tick::new("KRW-BTC", 50_000_000.0));
    assert!(trades.is_empty());
    assert_eq!(engine.portfolio().total_trades, 0);
}

#[test]
fn later_strategy_sees_earlier_entry_same_tick() {
    // Two strategies both want to buy the same ticker; the second must be
    // blocked because the first already opened the position this tick.
    let mut signals_a = HashMap::new();
    signals_a.insert("KRW-BTC".to_string(), buy_signal("KRW-BTC"));
    let mut signals_b = HashMap::new();
    signals_b.insert("KRW-BTC".to_string(), buy_signal("KRW-BTC"));

    let mut engine = engine_with(
        1_000_000.0,
        vec![
            Box::new(MockStrategy::new(signals_a)),
            Box::new(MockStrategy::new(signals_b)),
        ],
    );

    let trades = engine.process_tick(&Tick::new("KRW-BTC", 50_000_000.0));
    assert_eq!(trades.len(), 1);
    assert_eq!(engine.portfolio().open_position_count(), 1);
    assert!((engine.portfolio().quote_balance - 900_000.0).abs() < f64::EPSILON);
}
