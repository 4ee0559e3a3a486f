// =============================================================================
// EMA Crossover — 100/200 trend signal with buy/sell transition markers
// =============================================================================
//
// signal_t = 1 when EMA_100 > EMA_200 (strictly), else 0.
// buy_t    = signal_{t-1} == 0 && signal_t == 1
// sell_t   = signal_{t-1} == 1 && signal_t == 0
//
// The first row has no predecessor, so both markers are false there.
// =============================================================================

use chrono::NaiveDate;

use crate::indicators::ema::calculate_ema;
use crate::market_data::PriceSeries;

/// Span of the fast EMA.
pub const FAST_SPAN: usize = 100;
/// Span of the slow EMA.
pub const SLOW_SPAN: usize = 200;

/// One price bar extended with the derived crossover columns.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub close: f64,
    pub ema_100: f64,
    pub ema_200: f64,
    /// 1 when the fast EMA is above the slow EMA, else 0.
    pub signal: u8,
    pub buy_signal: bool,
    pub sell_signal: bool,
}

/// The augmented series produced by [`calculate_signals`].
///
/// Row `i` corresponds to bar `i` of the input `PriceSeries`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFrame {
    rows: Vec<SignalRow>,
}

impl SignalFrame {
    pub fn rows(&self) -> &[SignalRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Rows flagged as buy points (fast EMA crossing above slow).
    pub fn buy_points(&self) -> impl Iterator<Item = &SignalRow> {
        self.rows.iter().filter(|r| r.buy_signal)
    }

    /// Rows flagged as sell points (fast EMA crossing back below slow).
    pub fn sell_points(&self) -> impl Iterator<Item = &SignalRow> {
        self.rows.iter().filter(|r| r.sell_signal)
    }

    /// Most recent row. Always present since the input series is non-empty.
    pub fn latest(&self) -> Option<&SignalRow> {
        self.rows.last()
    }

    #[cfg(test)]
    pub(crate) fn without_markers(&self) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|r| SignalRow {
                buy_signal: false,
                sell_signal: false,
                ..r.clone()
            })
            .collect();
        Self { rows }
    }
}

/// Derive the EMA-100 / EMA-200 crossover frame for `series`.
///
/// The input is left untouched; a new frame is returned.
pub fn calculate_signals(series: &PriceSeries) -> SignalFrame {
    let closes = series.closes();
    let fast = calculate_ema(&closes, FAST_SPAN);
    let slow = calculate_ema(&closes, SLOW_SPAN);

    let mut rows = Vec::with_capacity(closes.len());
    let mut prev_signal: Option<u8> = None;

    for (i, bar) in series.bars().iter().enumerate() {
        let signal = u8::from(fast[i] > slow[i]);
        let (buy_signal, sell_signal) = match prev_signal {
            Some(prev) => (prev == 0 && signal == 1, prev == 1 && signal == 0),
            None => (false, false),
        };

        rows.push(SignalRow {
            date: bar.date,
            close: bar.close,
            ema_100: fast[i],
            ema_200: slow[i],
            signal,
            buy_signal,
            sell_signal,
        });
        prev_signal = Some(signal);
    }

    SignalFrame { rows }
}
