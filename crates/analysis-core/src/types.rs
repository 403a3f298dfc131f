use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Daily bar: close and traded volume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub volume: f64,
}

/// One reported fiscal period, as delivered by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Financials {
    pub symbol: String,
    pub fiscal_period: String,
    pub fiscal_year: i32,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub eps: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub shareholders_equity: Option<f64>,
    pub cash_flow_operating: Option<f64>,
    pub cash_flow_investing: Option<f64>,
}

/// Named fundamental metrics. Used for map-style access and for reporting
/// which fields a provider could not supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Eps,
    ForwardEps,
    BookValuePerShare,
    FreeCashFlow,
    SharesOutstanding,
    TrailingPe,
    ForwardPe,
    AnalystTargetPrice,
    EarningsGrowth,
    RevenueGrowth,
    DividendYield,
    ProfitMargin,
    ReturnOnEquity,
    DebtToEquity,
    MarketCap,
    PayoutRatio,
}

impl Metric {
    pub const ALL: [Metric; 16] = [
        Metric::Eps,
        Metric::ForwardEps,
        Metric::BookValuePerShare,
        Metric::FreeCashFlow,
        Metric::SharesOutstanding,
        Metric::TrailingPe,
        Metric::ForwardPe,
        Metric::AnalystTargetPrice,
        Metric::EarningsGrowth,
        Metric::RevenueGrowth,
        Metric::DividendYield,
        Metric::ProfitMargin,
        Metric::ReturnOnEquity,
        Metric::DebtToEquity,
        Metric::MarketCap,
        Metric::PayoutRatio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Eps => "eps",
            Metric::ForwardEps => "forward_eps",
            Metric::BookValuePerShare => "book_value_per_share",
            Metric::FreeCashFlow => "free_cash_flow",
            Metric::SharesOutstanding => "shares_outstanding",
            Metric::TrailingPe => "trailing_pe",
            Metric::ForwardPe => "forward_pe",
            Metric::AnalystTargetPrice => "analyst_target_price",
            Metric::EarningsGrowth => "earnings_growth",
            Metric::RevenueGrowth => "revenue_growth",
            Metric::DividendYield => "dividend_yield",
            Metric::ProfitMargin => "profit_margin",
            Metric::ReturnOnEquity => "return_on_equity",
            Metric::DebtToEquity => "debt_to_equity",
            Metric::MarketCap => "market_cap",
            Metric::PayoutRatio => "payout_ratio",
        }
    }
}

/// Fundamentals snapshot. Every field is optional: `None` means the provider
/// did not report it, never zero. Ratios and growth rates are fractions
/// (0.12 = 12%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub eps: Option<f64>,
    pub forward_eps: Option<f64>,
    pub book_value_per_share: Option<f64>,
    /// Total trailing free cash flow, not per share
    pub free_cash_flow: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub analyst_target_price: Option<f64>,
    pub earnings_growth: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub profit_margin: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub market_cap: Option<f64>,
    /// Trailing dividends per share over trailing EPS
    pub payout_ratio: Option<f64>,
}

impl Fundamentals {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        let value = match metric {
            Metric::Eps => self.eps,
            Metric::ForwardEps => self.forward_eps,
            Metric::BookValuePerShare => self.book_value_per_share,
            Metric::FreeCashFlow => self.free_cash_flow,
            Metric::SharesOutstanding => self.shares_outstanding,
            Metric::TrailingPe => self.trailing_pe,
            Metric::ForwardPe => self.forward_pe,
            Metric::AnalystTargetPrice => self.analyst_target_price,
            Metric::EarningsGrowth => self.earnings_growth,
            Metric::RevenueGrowth => self.revenue_growth,
            Metric::DividendYield => self.dividend_yield,
            Metric::ProfitMargin => self.profit_margin,
            Metric::ReturnOnEquity => self.return_on_equity,
            Metric::DebtToEquity => self.debt_to_equity,
            Metric::MarketCap => self.market_cap,
            Metric::PayoutRatio => self.payout_ratio,
        };
        // NaN from an upstream division is as good as missing
        value.filter(|v| v.is_finite())
    }

    /// Metrics the provider did not supply
    pub fn missing(&self) -> Vec<Metric> {
        Metric::ALL
            .iter()
            .copied()
            .filter(|m| self.get(*m).is_none())
            .collect()
    }
}

/// Everything the pipeline needs for one ticker in one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub name: Option<String>,
    pub current_price: f64,
    /// Daily closes, oldest first
    pub closes: Vec<f64>,
    /// Daily volumes aligned with `closes`
    pub volumes: Vec<f64>,
    pub fundamentals: Fundamentals,
}

/// Watched ticker with an optional user-chosen fair P/E
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub symbol: String,
    pub fair_pe: Option<f64>,
}

impl WatchlistEntry {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            fair_pe: None,
        }
    }

    pub fn with_fair_pe(mut self, fair_pe: f64) -> Self {
        self.fair_pe = Some(fair_pe);
        self
    }
}

/// Valuation models that can contribute a fair-value candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValuationModel {
    AssetBased,
    EarningsMultiple,
    CashFlowMultiple,
    DiscountedCashFlow,
    AnalystConsensus,
}

impl ValuationModel {
    pub const ALL: [ValuationModel; 5] = [
        ValuationModel::AssetBased,
        ValuationModel::EarningsMultiple,
        ValuationModel::CashFlowMultiple,
        ValuationModel::DiscountedCashFlow,
        ValuationModel::AnalystConsensus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValuationModel::AssetBased => "Graham",
            ValuationModel::EarningsMultiple => "P/E",
            ValuationModel::CashFlowMultiple => "P/FCF",
            ValuationModel::DiscountedCashFlow => "DCF",
            ValuationModel::AnalystConsensus => "Analyst",
        }
    }
}

/// Recommendation label, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalLabel {
    StrongBuy,
    Buy,
    Watch,
    Fair,
    Overvalued,
}

impl SignalLabel {
    /// 0 is the most attractive label
    pub fn rank(&self) -> u8 {
        match self {
            SignalLabel::StrongBuy => 0,
            SignalLabel::Buy => 1,
            SignalLabel::Watch => 2,
            SignalLabel::Fair => 3,
            SignalLabel::Overvalued => 4,
        }
    }

    /// Human-readable label for the signal
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalLabel::StrongBuy => "STRONG BUY",
            SignalLabel::Buy => "BUY",
            SignalLabel::Watch => "WATCH",
            SignalLabel::Fair => "FAIR",
            SignalLabel::Overvalued => "OVERVALUED",
        }
    }
}

impl std::fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much of the pipeline had real data behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataCompleteness {
    /// RSI defined and at least one valuation model contributed
    Complete,
    /// RSI indeterminate, but fair value came from at least one model
    Partial,
    /// No valuation model applied; fair value is the current price
    PriceOnly,
}

/// One table row: the outcome of analysing a single ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRow {
    pub symbol: String,
    pub name: Option<String>,
    pub current_price: f64,
    pub fair_value: f64,
    pub margin_of_safety_pct: f64,
    /// `None` when the price history is too short
    pub rsi: Option<f64>,
    pub current_drawdown_pct: f64,
    /// `None` when no period ever corrected beyond the noise threshold
    pub avg_correction_pct: Option<f64>,
    /// Deepest drawdown over the fetched history
    pub max_drawdown_pct: f64,
    pub quality_score: u8,
    pub models_used: Vec<ValuationModel>,
    pub completeness: DataCompleteness,
    pub status: SignalLabel,
}

/// Result of analysing one watchlist entry
#[derive(Debug, Clone)]
pub enum TickerOutcome {
    Computed(AnalysisRow),
    Skipped { symbol: String, reason: crate::AnalysisError },
}

impl TickerOutcome {
    pub fn symbol(&self) -> &str {
        match self {
            TickerOutcome::Computed(row) => &row.symbol,
            TickerOutcome::Skipped { symbol, .. } => symbol,
        }
    }
}
