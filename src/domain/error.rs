//! Domain error types.

/// Top-level error type for cointrader.
///
/// Recoverable trade rejections (insufficient funds, risk limits, missing
/// positions) are not errors: they surface as [`RiskCheck`] reasons and
/// `Option<Trade>` returns so a blocked order never aborts a tick.
///
/// [`RiskCheck`]: crate::domain::risk::RiskCheck
#[derive(Debug, thiserror::Error)]
pub enum CoinTraderError {
    #[error("validation error: {reason}")]
    Validation { reason: String },

    #[error("strategy {name} evaluation failed: {reason}")]
    StrategyEvaluation { name: String, reason: String },

    #[error("unknown strategy template: {template}")]
    UnknownTemplate { template: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("tick data error: {reason}")]
    TickData { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&CoinTraderError> for std::process::ExitCode {
    fn from(err: &CoinTraderError) -> Self {
        let code: u8 = match err {
            CoinTraderError::Io(_) => 1,
            CoinTraderError::ConfigParse { .. }
            | CoinTraderError::ConfigInvalid { .. }
            | CoinTraderError::UnknownTemplate { .. } => 2,
            CoinTraderError::TickData { .. } => 3,
            CoinTraderError::Validation { .. }
            | CoinTraderError::StrategyEvaluation { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
