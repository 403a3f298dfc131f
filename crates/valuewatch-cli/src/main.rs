//! valuewatch: fair-value and RSI/drawdown timing signals for a personal watchlist.
//!
//! Usage:
//!   valuewatch analyze --order margin --export signals.csv
//!   valuewatch add KO --pe 22
//!   valuewatch scan technology
//!   valuewatch screen dividend --min-yield 3
//!   valuewatch compare AAPL MSFT

mod cli;
mod config;
mod export;
mod output;

use analysis_core::{AnalysisError, WatchlistEntry};
use analysis_orchestrator::{AnalysisOrchestrator, BatchReport, SectorPreset};
use anyhow::{Context, Result};
use clap::Parser;
use fundamental_analysis::FairValueEstimator;
use polygon_client::PolygonClient;
use signal_classifier::{ClassifierThresholds, SignalClassifier};
use std::path::Path;
use std::sync::Arc;
use watchlist::{CsvWatchlistStore, Watchlist};

use crate::cli::{Cli, Command};
use crate::config::AppConfig;

const DEFAULT_LOG_FILTER: &str = "valuewatch=info,analysis_orchestrator=info,polygon_client=warn";

fn init_logging() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // stdout carries the table, logs go to stderr
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn build_orchestrator(config: &AppConfig, strict: bool) -> Result<AnalysisOrchestrator> {
    let api_key = config.require_api_key()?;
    let client = PolygonClient::with_settings(
        api_key.to_string(),
        config.rate_limit_per_min,
        config.request_timeout(),
    )
    .with_features(config.polygon_features());
    let settings = config.orchestrator_settings(&client);
    tracing::info!(
        "{} requests per ticker at {}/min: concurrency {}, fetch timeout {}s",
        client.features().requests_per_fetch(),
        config.rate_limit_per_min,
        settings.concurrency,
        settings.fetch_timeout.as_secs()
    );

    let thresholds = if strict {
        ClassifierThresholds::strict()
    } else {
        ClassifierThresholds::default()
    };

    Ok(AnalysisOrchestrator::new(
        Arc::new(client),
        FairValueEstimator::from_preset(config.preset),
        SignalClassifier::new(thresholds),
        settings,
    ))
}

fn print_report(report: &BatchReport, export: Option<&Path>) -> Result<()> {
    print!("{}", output::render_report(report));
    if let Some(path) = export {
        export::export_csv(path, &report.rows)?;
    }
    Ok(())
}

/// Apply an edit to the stored watchlist; an unreadable file is left as is
fn edit_watchlist<T>(
    store: &CsvWatchlistStore,
    edit: impl FnOnce(&mut Watchlist) -> Result<T, AnalysisError>,
) -> Result<T> {
    Watchlist::update(store, edit)
        .with_context(|| format!("watchlist at {} not updated", store.path().display()))
}

async fn run(command: Command, config: &AppConfig) -> Result<()> {
    let store = CsvWatchlistStore::new(&config.watchlist_path);

    match command {
        Command::Analyze(args) => {
            let list = Watchlist::load_or_default(&store);
            if list.is_empty() {
                println!("Watchlist is empty; add tickers with `valuewatch add SYMBOL`");
                return Ok(());
            }

            let orchestrator = build_orchestrator(config, args.strict)?;
            tracing::info!(
                "Preset {}, {} tickers from {}",
                config.preset.as_str(),
                list.len(),
                store.path().display()
            );
            let report = orchestrator.run_batch(list.entries(), args.order).await;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&report.rows)?);
                if let Some(path) = &args.export {
                    export::export_csv(path, &report.rows)?;
                }
            } else {
                print_report(&report, args.export.as_deref())?;
            }
        }
        Command::Add(args) => {
            let added = edit_watchlist(&store, |list| list.add(&args.symbol, args.pe))?;
            if added {
                println!("Added {}", args.symbol.trim().to_uppercase());
            } else {
                println!("{} is already on the watchlist", args.symbol.trim().to_uppercase());
            }
        }
        Command::Remove(args) => {
            if edit_watchlist(&store, |list| Ok(list.remove(&args.symbol)))? {
                println!("Removed {}", args.symbol.trim().to_uppercase());
            } else {
                println!("{} is not on the watchlist", args.symbol.trim().to_uppercase());
            }
        }
        Command::SetPe(args) => {
            edit_watchlist(&store, |list| list.set_fair_pe(&args.symbol, args.pe))?;
            match args.pe {
                Some(pe) => println!("Fair P/E for {} set to {:.1}", args.symbol.trim().to_uppercase(), pe),
                None => println!("Fair P/E for {} cleared", args.symbol.trim().to_uppercase()),
            }
        }
        Command::List => {
            let list = Watchlist::load_or_default(&store);
            print!("{}", output::render_watchlist(list.entries()));
        }
        Command::Scan(args) => {
            let orchestrator = build_orchestrator(config, false)?;
            let report = orchestrator.scan(args.sector).await;
            print_report(&report, args.export.as_deref())?;
        }
        Command::Screen(args) => {
            let symbols: Vec<String> = if args.from_watchlist {
                Watchlist::load_or_default(&store).symbols()
            } else {
                match args.sector {
                    Some(sector) => sector.symbols().iter().map(|s| s.to_string()).collect(),
                    None => SectorPreset::all_symbols().into_iter().map(String::from).collect(),
                }
            };

            let orchestrator = build_orchestrator(config, false)?;
            tracing::info!("{} screen over {} tickers", args.strategy.as_str(), symbols.len());
            let report = orchestrator.screen(&symbols, args.filters()).await;
            print!("{}", output::render_screen(&report));
            if let Some(path) = &args.export {
                export::export_screen_csv(path, &report.matches)?;
            }
        }
        Command::Compare(args) => {
            // Watchlisted tickers keep their manual fair P/E
            let list = Watchlist::load_or_default(&store);
            let entry = |symbol: &str| {
                list.get(symbol)
                    .cloned()
                    .unwrap_or_else(|| WatchlistEntry::new(symbol))
            };
            let (left, right) = (entry(&args.left), entry(&args.right));

            let orchestrator = build_orchestrator(config, false)?;
            let comparison = orchestrator
                .compare(&left, &right)
                .await
                .with_context(|| format!("cannot compare {} and {}", args.left, args.right))?;
            print!("{}", output::render_comparison(&comparison));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.watchlist {
        config.watchlist_path = path;
    }
    if let Some(preset) = cli.preset {
        config.preset = preset;
    }

    run(cli.command, &config).await
}
