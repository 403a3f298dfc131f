use analysis_orchestrator::{OrchestratorSettings, DEFAULT_CONCURRENCY};
use anyhow::{Context, Result};
use fundamental_analysis::ValuationPreset;
use polygon_client::{PolygonClient, PolygonFeatures};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Only needed by commands that fetch market data
    pub polygon_api_key: Option<String>,
    pub rate_limit_per_min: usize,
    /// Snapshot endpoint for the live price (not in the free tier)
    pub live_snapshot: bool,
    /// Benzinga consensus targets (separate subscription)
    pub analyst_targets: bool,
    pub history_days: i64,
    /// Unset: as many tickers as the rate limit serves at once
    pub concurrency: Option<usize>,
    /// Per HTTP request
    pub request_timeout_secs: u64,
    /// Whole snapshot fetch for one ticker. Unset: derived from the rate
    /// limit, the request mix and the concurrency.
    pub fetch_timeout_secs: Option<u64>,
    pub watchlist_path: PathBuf,
    pub preset: ValuationPreset,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = Self {
            polygon_api_key: var("POLYGON_API_KEY"),
            rate_limit_per_min: var("POLYGON_RATE_LIMIT")
                .unwrap_or_else(|| polygon_client::DEFAULT_RATE_LIMIT.to_string())
                .parse::<usize>()
                .context("POLYGON_RATE_LIMIT must be a positive integer")?,
            live_snapshot: var("POLYGON_LIVE_SNAPSHOT")
                .unwrap_or_else(|| "false".to_string())
                .parse::<bool>()
                .context("POLYGON_LIVE_SNAPSHOT must be true or false")?,
            analyst_targets: var("POLYGON_ANALYST_TARGETS")
                .unwrap_or_else(|| "false".to_string())
                .parse::<bool>()
                .context("POLYGON_ANALYST_TARGETS must be true or false")?,
            history_days: var("HISTORY_DAYS")
                .unwrap_or_else(|| "365".to_string())
                .parse::<i64>()
                .context("HISTORY_DAYS must be an integer")?,
            concurrency: var("ANALYSIS_CONCURRENCY")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("ANALYSIS_CONCURRENCY must be a positive integer")?,
            request_timeout_secs: var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|| "20".to_string())
                .parse::<u64>()
                .context("REQUEST_TIMEOUT_SECS must be a positive integer")?,
            fetch_timeout_secs: var("FETCH_TIMEOUT_SECS")
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("FETCH_TIMEOUT_SECS must be a positive integer")?,
            watchlist_path: var("VALUEWATCH_WATCHLIST")
                .map(PathBuf::from)
                .unwrap_or_else(default_watchlist_path),
            preset: match var("VALUATION_PRESET") {
                Some(p) => p.parse::<ValuationPreset>().context("VALUATION_PRESET")?,
                None => ValuationPreset::default(),
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_limit_per_min == 0 {
            anyhow::bail!("POLYGON_RATE_LIMIT must be at least 1");
        }
        if self.history_days < 30 {
            anyhow::bail!("HISTORY_DAYS must be at least 30, got {}", self.history_days);
        }
        if self.concurrency == Some(0) {
            anyhow::bail!("ANALYSIS_CONCURRENCY must be at least 1");
        }
        if self.request_timeout_secs == 0 || self.fetch_timeout_secs == Some(0) {
            anyhow::bail!("REQUEST_TIMEOUT_SECS and FETCH_TIMEOUT_SECS must be at least 1");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }

    pub fn polygon_features(&self) -> PolygonFeatures {
        PolygonFeatures {
            live_snapshot: self.live_snapshot,
            analyst_targets: self.analyst_targets,
        }
    }

    /// Batch settings sized to the client's request budget unless overridden
    pub fn orchestrator_settings(&self, client: &PolygonClient) -> OrchestratorSettings {
        let concurrency = self
            .concurrency
            .unwrap_or_else(|| client.suggested_concurrency().min(DEFAULT_CONCURRENCY));
        let fetch_timeout = self
            .fetch_timeout()
            .unwrap_or_else(|| client.fetch_budget(concurrency));

        OrchestratorSettings {
            concurrency,
            fetch_timeout,
            history_days: self.history_days,
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.polygon_api_key
            .as_deref()
            .context("POLYGON_API_KEY must be set to fetch market data")
    }
}

fn default_watchlist_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("valuewatch").join("watchlist.csv"))
        .unwrap_or_else(|| PathBuf::from("watchlist.csv"))
}
