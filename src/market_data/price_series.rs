use chrono::NaiveDate;

use crate::market_data::DataUnavailable;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single daily bar as returned by the market-data provider.
///
/// Only `close` is required downstream; the other fields are kept when the
/// provider supplies them.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
}

impl PriceBar {
    /// Bar with only a closing price.
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

// ---------------------------------------------------------------------------
// PriceSeries -- validated, chronologically ordered daily history
// ---------------------------------------------------------------------------

/// Non-empty daily price history with strictly increasing dates.
///
/// The invariants are checked once at construction so the signal calculator
/// can treat the series as well-formed.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from bars already in chronological order.
    ///
    /// # Errors
    /// - `EmptySeries` when `bars` is empty.
    /// - `Malformed` when dates are not strictly increasing or a close is
    ///   negative / non-finite.
    pub fn new(symbol: &str, bars: Vec<PriceBar>) -> Result<Self, DataUnavailable> {
        if bars.is_empty() {
            return Err(DataUnavailable::EmptySeries {
                symbol: symbol.to_string(),
            });
        }

        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(DataUnavailable::Malformed(format!(
                    "dates out of order for {symbol}: {} followed by {}",
                    pair[0].date, pair[1].date
                )));
            }
        }

        if let Some(bad) = bars.iter().find(|b| !b.close.is_finite() || b.close < 0.0) {
            return Err(DataUnavailable::Malformed(format!(
                "invalid close {} for {symbol} on {}",
                bad.close, bad.date
            )));
        }

        Ok(Self { bars })
    }

    /// Build a series from unordered bars: sorts by date and collapses
    /// duplicate dates, keeping the last bar seen for each day.
    pub fn from_unordered(symbol: &str, mut bars: Vec<PriceBar>) -> Result<Self, DataUnavailable> {
        // Stable sort keeps provider order within a day, so "last" is the
        // most recent row the provider sent for that date.
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self::new(symbol, deduped)
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn empty_series_is_rejected() {
        let err = PriceSeries::new("AAPL", Vec::new()).unwrap_err();
        assert!(matches!(err, DataUnavailable::EmptySeries { .. }));
    }

    #[test]
    fn out_of_order_dates_are_rejected() {
        let bars = vec![PriceBar::close_only(day(2), 1.0), PriceBar::close_only(day(1), 2.0)];
        let err = PriceSeries::new("AAPL", bars).unwrap_err();
        assert!(matches!(err, DataUnavailable::Malformed(_)));
    }

    #[test]
    fn duplicate_dates_are_rejected_by_new() {
        let bars = vec![PriceBar::close_only(day(1), 1.0), PriceBar::close_only(day(1), 2.0)];
        assert!(PriceSeries::new("AAPL", bars).is_err());
    }

    #[test]
    fn negative_close_is_rejected() {
        let bars = vec![PriceBar::close_only(day(1), -1.0)];
        assert!(matches!(
            PriceSeries::new("AAPL", bars),
            Err(DataUnavailable::Malformed(_))
        ));
    }

    #[test]
    fn from_unordered_sorts_and_keeps_last_duplicate() {
        let bars = vec![
            PriceBar::close_only(day(3), 30.0),
            PriceBar::close_only(day(1), 10.0),
            PriceBar::close_only(day(3), 31.0),
            PriceBar::close_only(day(2), 20.0),
        ];
        let series = PriceSeries::from_unordered("AAPL", bars).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![10.0, 20.0, 31.0]);
        assert_eq!(series.first_date(), day(1));
        assert_eq!(series.last_date(), day(3));
    }
}
