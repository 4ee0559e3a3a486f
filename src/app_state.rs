// =============================================================================
// Application State — shared, read-only handles for request handlers
// =============================================================================
//
// Nothing here is mutated after startup: every request reads the config and
// calls the price source, then discards its own data.
// =============================================================================

use std::sync::Arc;

use crate::chart::ChartStyle;
use crate::market_data::PriceSource;
use crate::runtime_config::RuntimeConfig;

/// State shared across all handlers via `Arc<AppState>`.
pub struct AppState {
    pub runtime_config: RuntimeConfig,
    pub price_source: Arc<dyn PriceSource>,
}

impl AppState {
    pub fn new(runtime_config: RuntimeConfig, price_source: Arc<dyn PriceSource>) -> Self {
        Self {
            runtime_config,
            price_source,
        }
    }

    pub fn chart_style(&self) -> ChartStyle {
        self.runtime_config.chart_style()
    }
}
