//! Command-line interface for ValueWatch.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `analyze` | Analyse the watchlist and print the signal table |
//! | `add` | Add a ticker, optionally with a manual fair P/E |
//! | `remove` | Remove a ticker |
//! | `set-pe` | Set or clear a ticker's manual fair P/E |
//! | `list` | Print the watchlist |
//! | `scan` | Analyse a sector preset, best quality first |
//! | `screen` | Filter a universe with a growth, dividend or momentum strategy |
//! | `compare` | Side-by-side metrics for two tickers |

use analysis_orchestrator::{RowOrder, SectorPreset, Strategy, StrategyFilters};
use clap::{Args, Parser, Subcommand};
use fundamental_analysis::ValuationPreset;
use std::path::PathBuf;

/// Fair-value and timing dashboard for a personal watchlist
#[derive(Debug, Parser)]
#[command(name = "valuewatch", author, version, about = "Fair-value and timing dashboard for a personal watchlist")]
pub struct Cli {
    /// Watchlist CSV file (overrides VALUEWATCH_WATCHLIST).
    #[arg(long, global = true)]
    pub watchlist: Option<PathBuf>,

    /// Valuation preset: balanced, conservative or growth (overrides VALUATION_PRESET).
    #[arg(long, global = true)]
    pub preset: Option<ValuationPreset>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyse every ticker on the watchlist.
    ///
    ///   valuewatch analyze
    ///   valuewatch analyze --order margin --export signals.csv
    Analyze(AnalyzeArgs),

    /// Add a ticker to the watchlist.
    ///
    ///   valuewatch add SAP
    ///   valuewatch add KO --pe 22
    Add(AddArgs),

    /// Remove a ticker from the watchlist.
    Remove(SymbolArgs),

    /// Set a manual fair P/E; omit the value to clear it.
    SetPe(SetPeArgs),

    /// Print the watchlist.
    List,

    /// Analyse a sector preset (technology, automotive, financials, consumer).
    Scan(ScanArgs),

    /// Screen tickers with a growth, dividend or momentum strategy.
    ///
    ///   valuewatch screen dividend
    ///   valuewatch screen growth --sector technology --min-eps-growth 15
    ///   valuewatch screen momentum --from-watchlist --export momentum.csv
    Screen(ScreenArgs),

    /// Compare two tickers side by side.
    ///
    ///   valuewatch compare AAPL MSFT
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Row order: input, margin or quality.
    #[arg(long, default_value = "input")]
    pub order: RowOrder,

    /// Also write the table to this CSV file.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Print rows as JSON instead of a table.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Strong buys also require the drawdown to reach the average correction.
    #[arg(long, default_value_t = false)]
    pub strict: bool,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    pub symbol: String,

    /// Manual fair P/E used instead of the growth-derived multiple.
    #[arg(long)]
    pub pe: Option<f64>,
}

#[derive(Debug, Args)]
pub struct SymbolArgs {
    pub symbol: String,
}

#[derive(Debug, Args)]
pub struct SetPeArgs {
    pub symbol: String,
    pub pe: Option<f64>,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    pub sector: SectorPreset,

    /// Also write the result to this CSV file.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ScreenArgs {
    pub strategy: Strategy,

    /// Screen one sector preset instead of every preset.
    #[arg(long)]
    pub sector: Option<SectorPreset>,

    /// Screen the watchlist instead of the sector presets.
    #[arg(long, default_value_t = false, conflicts_with = "sector")]
    pub from_watchlist: bool,

    /// Minimum year-over-year EPS growth, in percent.
    #[arg(long)]
    pub min_eps_growth: Option<f64>,

    /// Maximum payout ratio, in percent.
    #[arg(long)]
    pub max_payout: Option<f64>,

    /// Minimum dividend yield, in percent.
    #[arg(long)]
    pub min_yield: Option<f64>,

    /// Maximum price to free cash flow.
    #[arg(long)]
    pub max_pfcf: Option<f64>,

    /// Also write the matches to this CSV file.
    #[arg(long)]
    pub export: Option<PathBuf>,
}

impl ScreenArgs {
    /// Strategy defaults with the command-line overrides applied
    pub fn filters(&self) -> StrategyFilters {
        let defaults = self.strategy.filters();
        let pct = |value: Option<f64>| value.map(|v| v / 100.0);
        StrategyFilters {
            min_eps_growth: pct(self.min_eps_growth).or(defaults.min_eps_growth),
            max_payout_ratio: pct(self.max_payout).or(defaults.max_payout_ratio),
            min_dividend_yield: pct(self.min_yield).or(defaults.min_dividend_yield),
            max_price_to_fcf: self.max_pfcf.or(defaults.max_price_to_fcf),
            ..defaults
        }
    }
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    pub left: String,
    pub right: String,
}
