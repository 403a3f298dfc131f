//! Folds quarterly statements into a trailing-twelve-month fundamentals record.
//!
//! Flow metrics (EPS, revenue, net income, cash flow) need four reported
//! quarters; with fewer the field stays absent rather than understated.
//! Balance-sheet items come from the latest quarter.

use analysis_core::{Financials, Fundamentals};
use chrono::{Duration, NaiveDate, Utc};

use crate::{DividendInfo, TickerDetails};

const TTM_QUARTERS: usize = 4;

/// Sum a field over the given quarters, `None` unless every quarter reports it
fn sum_ttm(quarters: &[Financials], accessor: fn(&Financials) -> Option<f64>) -> Option<f64> {
    if quarters.len() < TTM_QUARTERS {
        return None;
    }
    quarters[..TTM_QUARTERS]
        .iter()
        .map(accessor)
        .try_fold(0.0, |acc, v| v.map(|x| acc + x))
}

/// Year-over-year growth of a TTM flow, as a fraction
fn yoy_growth(quarters: &[Financials], accessor: fn(&Financials) -> Option<f64>) -> Option<f64> {
    if quarters.len() < 2 * TTM_QUARTERS {
        return None;
    }
    let current = sum_ttm(&quarters[..TTM_QUARTERS], accessor)?;
    let prior = sum_ttm(&quarters[TTM_QUARTERS..2 * TTM_QUARTERS], accessor)?;
    if prior > 0.0 {
        Some((current - prior) / prior)
    } else {
        None
    }
}

/// Build fundamentals from quarterly statements (most recent first), ticker
/// details and trailing dividends per share. `dividends_per_share` is `None`
/// when the provider could not report dividends at all.
pub fn build_fundamentals(
    quarters: &[Financials],
    details: Option<&TickerDetails>,
    current_price: f64,
    dividends_per_share: Option<f64>,
) -> Fundamentals {
    let shares = details.and_then(|d| d.shares_outstanding());

    let eps = sum_ttm(quarters, |f| f.eps);
    let revenue = sum_ttm(quarters, |f| f.revenue);
    let net_income = sum_ttm(quarters, |f| f.net_income);
    let ocf = sum_ttm(quarters, |f| f.cash_flow_operating);
    let cfi = sum_ttm(quarters, |f| f.cash_flow_investing);

    // Investing cash flow stands in for capex, acquisitions included
    let free_cash_flow = match (ocf, cfi) {
        (Some(ocf), Some(cfi)) => Some(ocf + cfi),
        _ => None,
    };

    let latest = quarters.first();
    let equity = latest.and_then(|q| q.shareholders_equity);
    let liabilities = latest.and_then(|q| q.total_liabilities);
    let positive_equity = equity.filter(|e| *e > 0.0);

    let book_value_per_share = match (equity, shares) {
        (Some(e), Some(s)) => Some(e / s),
        _ => None,
    };

    let trailing_pe = eps
        .filter(|e| *e > 0.0 && current_price > 0.0)
        .map(|e| current_price / e);

    let profit_margin = match (net_income, revenue) {
        (Some(ni), Some(rev)) if rev > 0.0 => Some(ni / rev),
        _ => None,
    };

    let return_on_equity = match (net_income, positive_equity) {
        (Some(ni), Some(e)) => Some(ni / e),
        _ => None,
    };

    let debt_to_equity = match (liabilities, positive_equity) {
        (Some(l), Some(e)) => Some(l / e),
        _ => None,
    };

    let market_cap = details
        .and_then(|d| d.market_cap)
        .filter(|m| *m > 0.0)
        .or_else(|| shares.filter(|_| current_price > 0.0).map(|s| s * current_price));

    let (dividend_yield, payout_ratio) = dividend_ratios(dividends_per_share, eps, current_price);

    Fundamentals {
        eps,
        forward_eps: None,
        book_value_per_share,
        free_cash_flow,
        shares_outstanding: shares,
        trailing_pe,
        forward_pe: None,
        analyst_target_price: None,
        earnings_growth: yoy_growth(quarters, |f| f.eps),
        revenue_growth: yoy_growth(quarters, |f| f.revenue),
        dividend_yield,
        profit_margin,
        return_on_equity,
        debt_to_equity,
        market_cap,
        payout_ratio,
    }
}

/// Cash dividends per share with an ex-date in the last year; 0 for a
/// company that declared none
pub fn trailing_dividends_per_share(dividends: &[DividendInfo]) -> f64 {
    let cutoff = (Utc::now() - Duration::days(365)).date_naive();

    dividends
        .iter()
        .filter(|d| {
            d.ex_dividend_date
                .as_deref()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .map_or(false, |date| date >= cutoff)
        })
        .filter_map(|d| d.cash_amount)
        .filter(|amount| amount.is_finite() && *amount > 0.0)
        .sum()
}

/// Dividend yield (over price) and payout ratio (over trailing EPS).
/// Payout is undefined for non-positive EPS.
pub fn dividend_ratios(
    dividends_per_share: Option<f64>,
    eps: Option<f64>,
    current_price: f64,
) -> (Option<f64>, Option<f64>) {
    let dividend_yield = dividends_per_share
        .filter(|_| current_price > 0.0)
        .map(|dps| dps / current_price);
    let payout_ratio = match (dividends_per_share, eps) {
        (Some(dps), Some(e)) if e > 0.0 => Some(dps / e),
        _ => None,
    };
    (dividend_yield, payout_ratio)
}
