//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_tick_adapter::CsvTickAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{validate_risk_config, validate_trading_config};
use crate::domain::engine::TradingConfig;
use crate::domain::error::CoinTraderError;
use crate::domain::paper::{PaperTrader, ReplaySession, DEFAULT_HISTORY_LIMIT};
use crate::domain::risk::RiskConfig;
use crate::domain::trade::{Side, Trade};
use crate::ports::config_port::ConfigPort;
use crate::ports::tick_feed::TickFeed;

#[derive(Parser, Debug)]
#[command(name = "cointrader", about = "Tick-driven paper-trading engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a tick history through a paper-trading session
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Tick history CSV (ticker,price plus optional columns)
        #[arg(short, long)]
        ticks: PathBuf,
        /// Write executed trades as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate configuration and strategy sections
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            ticks,
            output,
        } => run_session(&config, &ticks, output.as_ref()),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = CoinTraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn build_trading_config(adapter: &dyn ConfigPort) -> TradingConfig {
    let defaults = TradingConfig::default();
    TradingConfig {
        initial_balance: adapter.get_double("trading", "initial_balance", defaults.initial_balance),
        buy_amount: adapter.get_double("trading", "buy_amount", defaults.buy_amount),
    }
}

pub fn build_risk_config(adapter: &dyn ConfigPort) -> RiskConfig {
    let defaults = RiskConfig::default();
    RiskConfig {
        stop_loss_pct: adapter.get_double("risk", "stop_loss_pct", defaults.stop_loss_pct),
        take_profit_pct: adapter.get_double("risk", "take_profit_pct", defaults.take_profit_pct),
        trailing_stop_pct: adapter.get_double(
            "risk",
            "trailing_stop_pct",
            defaults.trailing_stop_pct,
        ),
        max_daily_loss_pct: adapter.get_double(
            "risk",
            "max_daily_loss_pct",
            defaults.max_daily_loss_pct,
        ),
        max_drawdown_pct: adapter.get_double(
            "risk",
            "max_drawdown_pct",
            defaults.max_drawdown_pct,
        ),
        max_positions: adapter.get_int("risk", "max_positions", defaults.max_positions as i64)
            as usize,
        fee_rate: adapter.get_double("risk", "fee_rate", defaults.fee_rate),
    }
}

fn run_session(config_path: &PathBuf, ticks_path: &PathBuf, output: Option<&PathBuf>) -> ExitCode {
    // Stage 1: load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_trading_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_risk_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 2: build strategies
    let strategies = match crate::strategies::build_strategies(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if strategies.is_empty() {
        eprintln!("error: no strategies enabled");
        return ExitCode::from(2);
    }
    for strategy in &strategies {
        eprintln!("Strategy: {}", strategy.name());
    }

    // Stage 3: build the paper session
    let trading = build_trading_config(&adapter);
    let risk = build_risk_config(&adapter);
    let history_limit =
        adapter.get_int("session", "history_limit", DEFAULT_HISTORY_LIMIT as i64) as usize;
    let trader = PaperTrader::new(&trading, risk, strategies);
    let mut session = ReplaySession::new(trader).with_history_limit(history_limit);

    // Stage 4: load and replay ticks
    let feed = CsvTickAdapter::new(ticks_path.clone());
    let ticks = match feed.fetch_ticks() {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Replaying {} ticks from {}", ticks.len(), ticks_path.display());

    let mut trades: Vec<Trade> = Vec::new();
    for tick in &ticks {
        trades.extend(session.feed(tick));
    }

    // Stage 5: print summary
    let summary = session.trader().summary();
    eprintln!("\n=== Session Summary ===");
    eprintln!("Final Balance:    {:.2}", summary.quote_balance);
    eprintln!("Total Trades:     {}", summary.total_trades);
    eprintln!("Winning Trades:   {}", summary.winning_trades);
    eprintln!("Win Rate:         {:.1}%", summary.win_rate * 100.0);
    eprintln!("Total Profit:     {:.2}", summary.total_profit);
    eprintln!("Open Positions:   {}", summary.open_positions);

    if !trades.is_empty() {
        eprintln!("\n=== Trades ===");
        for trade in &trades {
            let side = match trade.side {
                Side::Buy => "BUY ",
                Side::Sell => "SELL",
            };
            match trade.profit {
                Some(profit) => eprintln!(
                    "  {side} {} {:.8} @ {:.0}  pnl {profit:+.2}  ({})",
                    trade.ticker, trade.quantity, trade.price, trade.reason
                ),
                None => eprintln!(
                    "  {side} {} {:.8} @ {:.0}  ({})",
                    trade.ticker, trade.quantity, trade.price, trade.reason
                ),
            }
        }
    }

    // Stage 6: optional trades CSV
    if let Some(path) = output {
        match write_trades_csv(path, &trades) {
            Ok(()) => eprintln!("\nTrades written to: {}", path.display()),
            Err(e) => {
                eprintln!("error: failed to write trades: {e}");
                return ExitCode::from(1);
            }
        }
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_trading_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_risk_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let strategies = match crate::strategies::build_strategies(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let trading = build_trading_config(&adapter);
    let risk = build_risk_config(&adapter);
    eprintln!("\nTrading:");
    eprintln!("  initial_balance: {}", trading.initial_balance);
    eprintln!("  buy_amount:      {}", trading.buy_amount);
    eprintln!("Risk:");
    eprintln!("  stop_loss_pct:      {}", risk.stop_loss_pct);
    eprintln!("  take_profit_pct:    {}", risk.take_profit_pct);
    eprintln!("  trailing_stop_pct:  {}", risk.trailing_stop_pct);
    eprintln!("  max_daily_loss_pct: {}", risk.max_daily_loss_pct);
    eprintln!("  max_drawdown_pct:   {}", risk.max_drawdown_pct);
    eprintln!("  max_positions:      {}", risk.max_positions);
    eprintln!("  fee_rate:           {}%", risk.fee_rate);

    eprintln!("\nEnabled strategies:");
    if strategies.is_empty() {
        eprintln!("  (none)");
    } else {
        for strategy in &strategies {
            eprintln!("  {}", strategy.name());
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn write_trades_csv(path: &PathBuf, trades: &[Trade]) -> Result<(), CoinTraderError> {
    let mut writer =
        csv::Writer::from_path(path).map_err(|e| std::io::Error::other(e.to_string()))?;

    writer
        .write_record([
            "id",
            "timestamp",
            "strategy",
            "ticker",
            "side",
            "price",
            "quantity",
            "total_quote",
            "fee",
            "profit",
            "profit_pct",
            "reason",
        ])
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    for trade in trades {
        let side = match trade.side {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        };
        writer
            .write_record([
                trade.id.to_string(),
                trade.timestamp.to_rfc3339(),
                trade.strategy_name.clone(),
                trade.ticker.clone(),
                side.to_string(),
                trade.price.to_string(),
                trade.quantity.to_string(),
                trade.total_quote.to_string(),
                trade.fee.to_string(),
                trade.profit.map(|p| p.to_string()).unwrap_or_default(),
                trade.profit_pct.map(|p| p.to_string()).unwrap_or_default(),
                trade.reason.clone(),
            ])
            .map_err(|e| std::io::Error::other(e.to_string()))?;
    }

    writer.flush()?;
    Ok(())
}
