// =============================================================================
// Runtime Configuration — server and provider settings
// =============================================================================
//
// Loaded once at startup from a JSON file. All fields carry
// `#[serde(default)]` so a partial (or empty) file is valid; a missing file
// is handled by the caller, which falls back to `RuntimeConfig::default()`.
//
// The history window and EMA spans are deliberately absent: they are fixed
// constants of the signal pipeline, not settings.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::chart::ChartStyle;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_provider_base_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".to_string()
}

fn default_user_agent() -> String {
    format!("Mozilla/5.0 (compatible; {}/{})", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_chart_width() -> u32 {
    1200
}

fn default_chart_height() -> u32 {
    600
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Root of the Yahoo-compatible chart endpoint; the ticker is appended.
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for a single provider request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_chart_width")]
    pub chart_width: u32,

    #[serde(default = "default_chart_height")]
    pub chart_height: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            provider_base_url: default_provider_base_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            chart_width: default_chart_width(),
            chart_height: default_chart_height(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// Returns an error if the file is missing or unparsable so the caller
    /// can fall back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            provider = %config.provider_base_url,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Apply `CHART_BIND_ADDR` / `CHART_PROVIDER_URL` overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(addr) = non_empty("CHART_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(url) = non_empty("CHART_PROVIDER_URL") {
            self.provider_base_url = url;
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn chart_style(&self) -> ChartStyle {
        ChartStyle {
            width: self.chart_width,
            height: self.chart_height,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.bind_addr, "0.0.0.0:5000");
        assert!(cfg.provider_base_url.starts_with("https://query1.finance.yahoo.com"));
        assert!(cfg.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.chart_style(), ChartStyle::default());
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: RuntimeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.bind_addr, default_bind_addr());
        assert_eq!(cfg.chart_width, 1200);
        assert_eq!(cfg.chart_height, 600);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "bind_addr": "127.0.0.1:8080", "chart_width": 800 }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.chart_width, 800);
        assert_eq!(cfg.chart_height, 600);
        assert_eq!(cfg.request_timeout_secs, 15);
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let cfg = RuntimeConfig {
            request_timeout_secs: 0,
            ..RuntimeConfig::default()
        };
        assert_eq!(cfg.request_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn overrides_replace_only_non_empty_values() {
        let mut cfg = RuntimeConfig::default();
        cfg.apply_overrides(|key| match key {
            "CHART_BIND_ADDR" => Some(" 127.0.0.1:9999 ".to_string()),
            "CHART_PROVIDER_URL" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(cfg.bind_addr, "127.0.0.1:9999");
        assert_eq!(cfg.provider_base_url, default_provider_base_url());
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(RuntimeConfig::load("/definitely/not/here/runtime_config.json").is_err());
    }
}
