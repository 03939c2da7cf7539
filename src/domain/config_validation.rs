//! Configuration validation.
//!
//! Validates trading and risk fields before a session starts, so a bad
//! config fails up front with a specific key rather than mid-replay.

use crate::domain::error::CoinTraderError;
use crate::ports::config_port::ConfigPort;

pub fn validate_trading_config(config: &dyn ConfigPort) -> Result<(), CoinTraderError> {
    validate_initial_balance(config)?;
    validate_buy_amount(config)?;
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), CoinTraderError> {
    validate_loss_side_pct(config, "stop_loss_pct", -5.0)?;
    validate_gain_side_pct(config, "take_profit_pct", 10.0)?;
    validate_gain_side_pct(config, "trailing_stop_pct", 3.0)?;
    validate_loss_side_pct(config, "max_daily_loss_pct", -3.0)?;
    validate_loss_side_pct(config, "max_drawdown_pct", -15.0)?;
    validate_max_positions(config)?;
    validate_fee_rate(config)?;
    Ok(())
}

fn validate_initial_balance(config: &dyn ConfigPort) -> Result<(), CoinTraderError> {
    let value = config.get_double("trading", "initial_balance", 1_000_000.0);
    if value <= 0.0 {
        return Err(CoinTraderError::ConfigInvalid {
            section: "trading".to_string(),
            key: "initial_balance".to_string(),
            reason: "initial_balance must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_buy_amount(config: &dyn ConfigPort) -> Result<(), CoinTraderError> {
    let buy_amount = config.get_double("trading", "buy_amount", 100_000.0);
    if buy_amount <= 0.0 {
        return Err(CoinTraderError::ConfigInvalid {
            section: "trading".to_string(),
            key: "buy_amount".to_string(),
            reason: "buy_amount must be positive".to_string(),
        });
    }
    let initial = config.get_double("trading", "initial_balance", 1_000_000.0);
    if buy_amount > initial {
        return Err(CoinTraderError::ConfigInvalid {
            section: "trading".to_string(),
            key: "buy_amount".to_string(),
            reason: "buy_amount cannot exceed initial_balance".to_string(),
        });
    }
    Ok(())
}

/// Loss-side thresholds are expressed as negative percentages.
fn validate_loss_side_pct(
    config: &dyn ConfigPort,
    key: &str,
    default: f64,
) -> Result<(), CoinTraderError> {
    let value = config.get_double("risk", key, default);
    if value >= 0.0 {
        return Err(CoinTraderError::ConfigInvalid {
            section: "risk".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be negative"),
        });
    }
    Ok(())
}

fn validate_gain_side_pct(
    config: &dyn ConfigPort,
    key: &str,
    default: f64,
) -> Result<(), CoinTraderError> {
    let value = config.get_double("risk", key, default);
    if value <= 0.0 {
        return Err(CoinTraderError::ConfigInvalid {
            section: "risk".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be positive"),
        });
    }
    Ok(())
}

fn validate_max_positions(config: &dyn ConfigPort) -> Result<(), CoinTraderError> {
    let value = config.get_int("risk", "max_positions", 5);
    if value < 1 {
        return Err(CoinTraderError::ConfigInvalid {
            section: "risk".to_string(),
            key: "max_positions".to_string(),
            reason: "max_positions must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_fee_rate(config: &dyn ConfigPort) -> Result<(), CoinTraderError> {
    let value = config.get_double("risk", "fee_rate", 0.05);
    if !(0.0..100.0).contains(&value) {
        return Err(CoinTraderError::ConfigInvalid {
            section: "risk".to_string(),
            key: "fee_rate".to_string(),
            reason: "fee_rate must be a percentage in [0, 100)".to_string(),
        });
    }
    Ok(())
}
