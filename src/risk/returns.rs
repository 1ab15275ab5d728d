//! # Return Preprocessing
//!
//! $$
//! r_t = \frac{p_t - p_{t-1}}{p_{t-1}}
//! $$
//!
//! Close-to-return conversion and tail alignment across assets.

use nalgebra::DMatrix;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::market::PriceTable;

/// Convert close prices to simple percentage-change returns.
///
/// Pairs with a non-positive previous close are skipped; the first
/// observation has no prior and is dropped.
pub fn simple_returns_series(closes: &[f64]) -> Vec<f64> {
  let mut out = Vec::with_capacity(closes.len().saturating_sub(1));
  for i in 1..closes.len() {
    if closes[i - 1] > 0.0 {
      out.push((closes[i] - closes[i - 1]) / closes[i - 1]);
    }
  }
  out
}

/// Convert close prices to log-return series.
pub fn log_returns_series(closes: &[f64]) -> Vec<f64> {
  let mut out = Vec::with_capacity(closes.len().saturating_sub(1));
  for i in 1..closes.len() {
    if closes[i - 1] > 0.0 && closes[i] > 0.0 {
      out.push((closes[i] / closes[i - 1]).ln());
    }
  }
  out
}

/// Align multiple return series to their common tail length.
///
/// Keeps the most recent `T` observations of every series, where `T` is the
/// shortest series length; older observations are dropped.
pub fn align_return_series(all_returns: &[Vec<f64>]) -> Vec<Vec<f64>> {
  let min_len = all_returns.iter().map(|r| r.len()).min().unwrap_or(0);
  all_returns
    .iter()
    .map(|r| r[r.len().saturating_sub(min_len)..].to_vec())
    .collect()
}

/// Per-asset simple returns from a price table, tail-aligned.
///
/// Fails when any asset yields an empty return series (fewer than two
/// usable closes), since a degenerate column would poison every joint
/// statistic downstream.
pub fn aligned_simple_returns(table: &PriceTable) -> Result<Vec<Vec<f64>>> {
  if table.is_empty() {
    return Err(PortfolioError::DataFetch(
      "no price history to compute returns from".to_string(),
    ));
  }

  let mut all = Vec::with_capacity(table.len());
  for (idx, ticker) in table.tickers().iter().enumerate() {
    let series = simple_returns_series(table.closes(idx));
    if series.is_empty() {
      return Err(PortfolioError::DataFetch(format!(
        "empty return series for {ticker} after alignment"
      )));
    }
    all.push(series);
  }

  Ok(align_return_series(&all))
}

/// Stack aligned per-asset series into a `T x N` return matrix.
pub fn return_matrix(aligned: &[Vec<f64>]) -> DMatrix<f64> {
  let n = aligned.len();
  let t = aligned.first().map(|r| r.len()).unwrap_or(0);

  DMatrix::from_fn(t, n, |row, col| aligned[col][row])
}
