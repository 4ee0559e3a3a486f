// =============================================================================
// Yahoo Finance chart client: daily price history over HTTP
// =============================================================================
//
// Talks to the public v8 chart endpoint:
//
//   GET {base_url}/{SYMBOL}?range=2y&interval=1d
//
// The response is column-oriented (one timestamp array plus parallel OHLCV
// arrays with nulls for missing values) and is flattened into a validated
// `PriceSeries` here.
// =============================================================================

use std::time::Duration;

use anyhow::Context;
use chrono::DateTime;
use futures_util::future::{BoxFuture, FutureExt};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::market_data::{DataUnavailable, PriceBar, PriceSeries, PriceSource};
use crate::types::Ticker;

/// Trailing window requested from the provider.
pub const HISTORY_RANGE: &str = "2y";
/// Bar granularity requested from the provider.
pub const HISTORY_INTERVAL: &str = "1d";

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Default, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    base_url: Url,
    client: reqwest::Client,
}

impl YahooClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url`   — chart endpoint root; the symbol is appended as a path segment.
    /// * `user_agent` — sent on every request (the endpoint rejects empty agents).
    /// * `timeout`    — per-request timeout covering connect and body.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("invalid provider base url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("provider base url '{base_url}' cannot take a path");
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %base_url, timeout_secs = timeout.as_secs(), "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    /// Full request URL for `ticker`'s trailing daily history.
    fn history_url(&self, ticker: &Ticker) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(ticker.as_str());
        }
        url.query_pairs_mut()
            .append_pair("range", HISTORY_RANGE)
            .append_pair("interval", HISTORY_INTERVAL);
        url
    }

    /// GET the trailing two-year daily history for `ticker`.
    #[instrument(skip(self, ticker), fields(ticker = %ticker), name = "yahoo::fetch_daily_history")]
    pub async fn fetch_daily_history(&self, ticker: &Ticker) -> Result<PriceSeries, DataUnavailable> {
        if ticker.as_str().is_empty() {
            return Err(DataUnavailable::UnknownSymbol {
                symbol: String::new(),
                reason: "empty ticker symbol".to_string(),
            });
        }

        let url = self.history_url(ticker);
        debug!(url = %url, "requesting price history");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(DataUnavailable::Unreachable)?;

        let status = resp.status();
        let body = resp.text().await.map_err(DataUnavailable::Unreachable)?;

        let series = parse_chart_response(ticker.as_str(), status, &body)?;
        debug!(
            bars = series.len(),
            first = %series.first_date(),
            last = %series.last_date(),
            "price history fetched"
        );
        Ok(series)
    }
}

impl PriceSource for YahooClient {
    fn daily_history<'a>(
        &'a self,
        ticker: &'a Ticker,
    ) -> BoxFuture<'a, Result<PriceSeries, DataUnavailable>> {
        self.fetch_daily_history(ticker).boxed()
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Turn a raw chart response into a `PriceSeries`.
///
/// Rows with a null or non-finite close are skipped. Timestamps are shifted
/// by the exchange `gmtoffset` before taking the calendar date, and duplicate
/// days (a live intraday row next to the daily bar) keep the later row.
fn parse_chart_response(
    symbol: &str,
    status: StatusCode,
    body: &str,
) -> Result<PriceSeries, DataUnavailable> {
    let envelope: ChartEnvelope = match serde_json::from_str(body) {
        Ok(env) => env,
        Err(_) if status == StatusCode::NOT_FOUND => {
            return Err(DataUnavailable::UnknownSymbol {
                symbol: symbol.to_string(),
                reason: "symbol may be delisted".to_string(),
            });
        }
        Err(_) if !status.is_success() => {
            return Err(DataUnavailable::Provider {
                status: status.as_u16(),
                message: truncate(body, 200),
            });
        }
        Err(e) => return Err(DataUnavailable::Malformed(e.to_string())),
    };

    if let Some(err) = envelope.chart.error {
        if status == StatusCode::NOT_FOUND || err.code.eq_ignore_ascii_case("Not Found") {
            return Err(DataUnavailable::UnknownSymbol {
                symbol: symbol.to_string(),
                reason: err.description,
            });
        }
        return Err(DataUnavailable::Provider {
            status: status.as_u16(),
            message: format!("{}: {}", err.code, err.description),
        });
    }

    if !status.is_success() {
        return Err(DataUnavailable::Provider {
            status: status.as_u16(),
            message: truncate(body, 200),
        });
    }

    let empty = || DataUnavailable::EmptySeries {
        symbol: symbol.to_string(),
    };

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(empty)?;

    let timestamps = result.timestamp.unwrap_or_default();
    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let close = match quote.close.get(i).copied().flatten() {
            Some(c) if c.is_finite() => c,
            _ => continue,
        };
        let Some(date) = DateTime::from_timestamp(ts + offset, 0).map(|dt| dt.date_naive()) else {
            warn!(symbol, ts, "skipping row with out-of-range timestamp");
            continue;
        };

        bars.push(PriceBar {
            date,
            open: quote.open.get(i).copied().flatten(),
            high: quote.high.get(i).copied().flatten(),
            low: quote.low.get(i).copied().flatten(),
            close,
            volume: quote
                .volume
                .get(i)
                .copied()
                .flatten()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v as u64),
        });
    }

    if bars.is_empty() {
        return Err(empty());
    }

    PriceSeries::from_unordered(symbol, bars)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
