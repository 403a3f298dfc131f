use analysis_core::{AnalysisError, Bar, Financials};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub mod fundamentals;
mod provider;

pub use fundamentals::{build_fundamentals, dividend_ratios, trailing_dividends_per_share};

const BASE_URL: &str = "https://api.polygon.io";

/// Free-tier Polygon allows 5 requests per minute
pub const DEFAULT_RATE_LIMIT: usize = 5;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Aggregates, financials, ticker details and dividends
const BASE_REQUESTS_PER_FETCH: usize = 4;

/// Endpoints outside the free tier. Disabled ones are never requested, so
/// they cost no rate-limit slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolygonFeatures {
    /// Last-trade price from the snapshot endpoint instead of the last close
    pub live_snapshot: bool,
    /// Benzinga consensus price target
    pub analyst_targets: bool,
}

impl PolygonFeatures {
    /// Requests one snapshot fetch sends
    pub fn requests_per_fetch(&self) -> usize {
        BASE_REQUESTS_PER_FETCH + usize::from(self.live_snapshot) + usize::from(self.analyst_targets)
    }
}

/// Fetches that can run side by side without queueing on the limiter
fn suggested_concurrency_for(requests_per_fetch: usize, max_requests: usize) -> usize {
    (max_requests / requests_per_fetch.max(1)).max(1)
}

/// Worst-case duration of one fetch when `concurrency` fetches share the
/// limiter: the windows needed to grant every in-flight request, one spare
/// window for unordered wakeups, then the last request itself.
fn fetch_budget_for(
    requests_per_fetch: usize,
    concurrency: usize,
    max_requests: usize,
    window: Duration,
    request_timeout: Duration,
) -> Duration {
    let demand = requests_per_fetch.max(1) * concurrency.max(1);
    let windows = demand.div_ceil(max_requests.max(1)) + 1;
    window * windows as u32 + request_timeout
}

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).saturating_duration_since(now)
                    + Duration::from_millis(50),
                None => Duration::from_millis(50),
            };
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for Polygon API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

#[derive(Clone)]
pub struct PolygonClient {
    api_key: String,
    base_url: String,
    client: Client,
    rate_limiter: RateLimiter,
    request_timeout: Duration,
    features: PolygonFeatures,
}

impl PolygonClient {
    pub fn new(api_key: String) -> Self {
        Self::with_settings(api_key, DEFAULT_RATE_LIMIT, DEFAULT_TIMEOUT)
    }

    /// Client with an explicit requests-per-minute budget and per-request timeout
    pub fn with_settings(api_key: String, rate_limit_per_min: usize, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            client,
            rate_limiter: RateLimiter::new(rate_limit_per_min, RATE_WINDOW),
            request_timeout: timeout,
            features: PolygonFeatures::default(),
        }
    }

    pub fn with_features(mut self, features: PolygonFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn features(&self) -> PolygonFeatures {
        self.features
    }

    /// Tickers to fetch concurrently under the rate limit (at least one)
    pub fn suggested_concurrency(&self) -> usize {
        suggested_concurrency_for(self.features.requests_per_fetch(), self.rate_limiter.max_requests)
    }

    /// Upper bound on one ticker's fetch, rate-limiter waits included
    pub fn fetch_budget(&self, concurrency: usize) -> Duration {
        fetch_budget_for(
            self.features.requests_per_fetch(),
            concurrency,
            self.rate_limiter.max_requests,
            self.rate_limiter.window,
            self.request_timeout,
        )
    }

    /// Point the client at another host (used against local fixtures)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send a request with rate limiting and automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder
            .build()
            .map_err(|e| AnalysisError::ProviderUnavailable(e.to_string()))?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| AnalysisError::ProviderUnavailable("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| AnalysisError::ProviderUnavailable(e.to_string()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            let wait_secs = 15u64;
            tracing::warn!("Polygon 429 rate limited, waiting {}s before retry {}/3", wait_secs, attempt + 1);
            tokio::time::sleep(Duration::from_secs(wait_secs)).await;
        }

        Err(AnalysisError::ProviderUnavailable(
            "Rate limited by Polygon after 3 retries".to_string(),
        ))
    }

    async fn error_for_status(symbol: &str, response: reqwest::Response) -> AnalysisError {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return AnalysisError::SymbolNotFound(symbol.to_string());
        }
        AnalysisError::ProviderUnavailable(format!(
            "HTTP {}: {}",
            status,
            response.text().await.unwrap_or_default()
        ))
    }

    /// Get aggregates (bars) for a symbol, oldest first
    pub async fn get_aggregates(
        &self,
        symbol: &str,
        multiplier: u32,
        timespan: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Bar>, AnalysisError> {
        let url = format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            self.base_url,
            symbol,
            multiplier,
            timespan,
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d")
        );

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("apiKey", self.api_key.as_str()),
                ("adjusted", "true"),
                ("sort", "asc"),
                ("limit", "50000"),
            ]))
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(symbol, response).await);
        }

        let agg_response: AggregateResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidData(e.to_string()))?;

        Ok(agg_response
            .results
            .into_iter()
            .filter_map(|r| {
                Some(Bar {
                    timestamp: DateTime::from_timestamp_millis(r.t)?,
                    close: r.c,
                    volume: r.v,
                })
            })
            .collect())
    }

    /// Get quarterly financials, most recent first.
    /// Returns an empty list when the plan does not include financials.
    pub async fn get_financials(&self, symbol: &str, limit: u32) -> Result<Vec<Financials>, AnalysisError> {
        let url = format!("{}/vX/reference/financials", self.base_url);
        let limit = limit.to_string();

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("ticker", symbol),
                ("timeframe", "quarterly"),
                ("order", "desc"),
                ("sort", "period_of_report_date"),
                ("apiKey", self.api_key.as_str()),
                ("limit", limit.as_str()),
            ]))
            .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            tracing::info!("Polygon financials not available (HTTP {}), skipping", status.as_u16());
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(Self::error_for_status(symbol, response).await);
        }

        let fin_response: FinancialsResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidData(e.to_string()))?;

        Ok(fin_response
            .results
            .into_iter()
            .map(|r| {
                let income = r.financials.income_statement;
                let balance = r.financials.balance_sheet;
                let cash_flow = r.financials.cash_flow_statement;

                Financials {
                    symbol: symbol.to_string(),
                    fiscal_period: r.fiscal_period,
                    fiscal_year: r.fiscal_year.parse().unwrap_or(0),
                    revenue: statement_value(&income, "revenues"),
                    net_income: statement_value(&income, "net_income_loss"),
                    eps: statement_value(&income, "diluted_earnings_per_share")
                        .or_else(|| statement_value(&income, "basic_earnings_per_share")),
                    total_liabilities: statement_value(&balance, "liabilities"),
                    shareholders_equity: statement_value(&balance, "equity"),
                    cash_flow_operating: statement_value(&cash_flow, "net_cash_flow_from_operating_activities"),
                    cash_flow_investing: statement_value(&cash_flow, "net_cash_flow_from_investing_activities"),
                }
            })
            .collect())
    }

    /// Get ticker details (name, shares outstanding)
    pub async fn get_ticker_details(&self, symbol: &str) -> Result<TickerDetails, AnalysisError> {
        let url = format!("{}/v3/reference/tickers/{}", self.base_url, symbol);

        let response = self
            .send_request(self.client.get(&url).query(&[("apiKey", self.api_key.as_str())]))
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(symbol, response).await);
        }

        let details_response: TickerDetailsResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidData(e.to_string()))?;

        Ok(details_response.results)
    }

    /// Get dividend history for a symbol, most recent first. An empty list
    /// means no dividends were declared; a plan without access is an error.
    pub async fn get_dividends(&self, symbol: &str, limit: u32) -> Result<Vec<DividendInfo>, AnalysisError> {
        let url = format!("{}/v3/reference/dividends", self.base_url);
        let limit = limit.to_string();

        let response = self
            .send_request(self.client.get(&url).query(&[
                ("ticker", symbol),
                ("apiKey", self.api_key.as_str()),
                ("limit", limit.as_str()),
                ("order", "desc"),
            ]))
            .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            return Err(AnalysisError::ProviderUnavailable(format!(
                "dividends not included in plan (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(Self::error_for_status(symbol, response).await);
        }

        let div_response: DividendResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidData(e.to_string()))?;

        Ok(div_response.results)
    }

    /// Get snapshot for a ticker (near-real-time last trade)
    pub async fn get_snapshot(&self, symbol: &str) -> Result<SnapshotTicker, AnalysisError> {
        let url = format!(
            "{}/v2/snapshot/locale/us/markets/stocks/tickers/{}",
            self.base_url, symbol
        );

        let response = self
            .send_request(self.client.get(&url).query(&[("apiKey", self.api_key.as_str())]))
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_for_status(symbol, response).await);
        }

        let snap_response: SnapshotResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidData(e.to_string()))?;

        Ok(snap_response.ticker)
    }

    /// Benzinga consensus price target.
    /// Returns Ok(None) on 403/401 (subscription not available).
    pub async fn get_consensus_target(&self, symbol: &str) -> Result<Option<f64>, AnalysisError> {
        let url = format!("{}/benzinga/v1/consensus-ratings/{}", self.base_url, symbol);

        let response = self
            .send_request(self.client.get(&url).query(&[("apiKey", self.api_key.as_str())]))
            .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            tracing::info!("Benzinga consensus ratings not available (HTTP {}), skipping", status.as_u16());
            return Ok(None);
        }

        if !status.is_success() {
            tracing::warn!("Benzinga consensus HTTP {}: ignoring", status.as_u16());
            return Ok(None);
        }

        let body: BenzingaConsensusResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidData(e.to_string()))?;

        Ok(body
            .results
            .into_iter()
            .next()
            .and_then(|r| r.consensus_price_target))
    }
}

fn statement_value(statement: &HashMap<String, serde_json::Value>, key: &str) -> Option<f64> {
    statement
        .get(key)
        .and_then(|v| v.get("value"))
        .and_then(|v| v.as_f64())
}

// Benzinga response structures
#[derive(Debug, Deserialize)]
struct BenzingaConsensusResponse {
    #[serde(default)]
    results: Vec<BenzingaConsensusResult>,
}

#[derive(Debug, Deserialize)]
struct BenzingaConsensusResult {
    #[serde(default)]
    consensus_price_target: Option<f64>,
}

// Response structures
#[derive(Debug, Deserialize)]
struct AggregateResponse {
    #[serde(default)]
    results: Vec<AggregateResult>,
}

#[derive(Debug, Deserialize)]
struct AggregateResult {
    t: i64, // timestamp
    c: f64, // close
    #[serde(default)]
    v: f64, // volume
}

#[derive(Debug, Deserialize)]
struct FinancialsResponse {
    #[serde(default)]
    results: Vec<FinancialResult>,
}

#[derive(Debug, Deserialize)]
struct FinancialResult {
    fiscal_period: String,
    fiscal_year: String,
    financials: FinancialStatements,
}

#[derive(Debug, Deserialize)]
struct FinancialStatements {
    #[serde(default)]
    income_statement: HashMap<String, serde_json::Value>,
    #[serde(default)]
    balance_sheet: HashMap<String, serde_json::Value>,
    #[serde(default)]
    cash_flow_statement: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TickerDetailsResponse {
    results: TickerDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerDetails {
    pub ticker: String,
    pub name: String,
    pub market_cap: Option<f64>,
    pub share_class_shares_outstanding: Option<f64>,
    pub weighted_shares_outstanding: Option<f64>,
}

impl TickerDetails {
    pub fn shares_outstanding(&self) -> Option<f64> {
        self.weighted_shares_outstanding
            .or(self.share_class_shares_outstanding)
            .filter(|s| *s > 0.0)
    }
}

// Dividend types
#[derive(Debug, Deserialize)]
struct DividendResponse {
    #[serde(default)]
    results: Vec<DividendInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividendInfo {
    pub cash_amount: Option<f64>,
    pub ex_dividend_date: Option<String>,
}

// Snapshot types
#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    ticker: SnapshotTicker,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotTicker {
    #[serde(rename = "lastTrade")]
    pub last_trade: Option<SnapshotLastTrade>,
}

impl SnapshotTicker {
    /// Last trade price, positive only
    pub fn last_price(&self) -> Option<f64> {
        self.last_trade
            .as_ref()
            .and_then(|lt| lt.p)
            .filter(|p| *p > 0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotLastTrade {
    pub p: Option<f64>,
}
