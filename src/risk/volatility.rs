//! # Asset Volatility
//!
//! $$
//! \sigma_i = \operatorname{std}\big(\ln(p_t / p_{t-1})\big)
//! $$
//!
//! Marginal per-asset volatility; no cross-asset alignment is needed.

use crate::market::PriceTable;
use crate::risk::returns::log_returns_series;

fn sample_std(xs: &[f64]) -> f64 {
  if xs.len() < 2 {
    return 0.0;
  }

  let mean = xs.iter().sum::<f64>() / xs.len() as f64;
  let mut acc = 0.0;
  for &x in xs {
    let d = x - mean;
    acc += d * d;
  }
  (acc / (xs.len() - 1) as f64).sqrt()
}

/// Per-asset sample standard deviation of log returns, in universe order.
pub fn volatility_vector(table: &PriceTable) -> Vec<f64> {
  (0..table.len())
    .map(|idx| sample_std(&log_returns_series(table.closes(idx))))
    .collect()
}
