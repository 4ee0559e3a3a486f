pub mod error;
pub mod price_series;
pub mod yahoo;

use futures_util::future::BoxFuture;

use crate::types::Ticker;

pub use error::DataUnavailable;
pub use price_series::{PriceBar, PriceSeries};
pub use yahoo::YahooClient;

/// Anything that can produce a trailing daily price history for a ticker.
///
/// The request handler only talks to this trait; production uses
/// [`YahooClient`], tests plug in an in-memory source.
pub trait PriceSource: Send + Sync {
    fn daily_history<'a>(
        &'a self,
        ticker: &'a Ticker,
    ) -> BoxFuture<'a, Result<PriceSeries, DataUnavailable>>;
}
