// =============================================================================
// Shared types used across the chart service
// =============================================================================

/// A normalized ticker symbol (trimmed, upper-cased).
///
/// No further validation is applied: an empty or unknown symbol is left for
/// the market-data provider to reject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker(String);

impl Ticker {
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
