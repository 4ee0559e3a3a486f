use thiserror::Error;

/// Why a price history could not be produced for a ticker.
///
/// The request handler only shows the `Display` text of this error.
#[derive(Debug, Error)]
pub enum DataUnavailable {
    #[error("No data found for symbol '{symbol}': {reason}")]
    UnknownSymbol { symbol: String, reason: String },

    #[error("Market data provider unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("Market data provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Malformed market data response: {0}")]
    Malformed(String),

    #[error("No price history returned for '{symbol}'")]
    EmptySeries { symbol: String },
}
