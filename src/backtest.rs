//! # Backtest Metrics
//!
//! $$
//! p_t = \mathbf{w}\cdot r_t, \qquad
//! \text{Sharpe} = \frac{\bar p}{\operatorname{std}(p)}
//! $$
//!
//! Buy-and-hold evaluation of a fixed weight vector against a historical
//! return sample. No rebalancing, no transaction costs, no risk-free
//! subtraction; the evaluator never mutates portfolio state.

use tracing::info;

use crate::error::PortfolioError;
use crate::error::Result;

fn mean(xs: &[f64]) -> f64 {
  xs.iter().sum::<f64>() / xs.len() as f64
}

fn population_std(xs: &[f64]) -> f64 {
  if xs.is_empty() {
    return f64::NAN;
  }

  let m = mean(xs);
  let mut acc = 0.0;
  for &x in xs {
    let d = x - m;
    acc += d * d;
  }
  (acc / xs.len() as f64).sqrt()
}

/// Per-period portfolio returns `p_t = w . r_t` over an aligned sample.
pub fn portfolio_returns(weights: &[f64], aligned: &[Vec<f64>]) -> Vec<f64> {
  let t = aligned.first().map(|r| r.len()).unwrap_or(0);
  (0..t)
    .map(|step| {
      weights
        .iter()
        .enumerate()
        .map(|(i, &wi)| wi * aligned[i][step])
        .sum()
    })
    .collect()
}

/// Ordered backtest metrics for a fixed weight vector.
///
/// Sortino divides by the standard deviation of the strictly negative
/// periods and is NaN when no such period exists.
pub fn performance_metrics(
  weights: &[f64],
  aligned: &[Vec<f64>],
) -> Result<Vec<(&'static str, f64)>> {
  let returns = portfolio_returns(weights, aligned);
  if returns.is_empty() {
    return Err(PortfolioError::DataFetch(
      "empty return window for backtest".to_string(),
    ));
  }

  let average = mean(&returns);
  let std = population_std(&returns);

  let downside: Vec<f64> = returns.iter().copied().filter(|&p| p < 0.0).collect();
  let downside_std = if downside.is_empty() {
    f64::NAN
  } else {
    population_std(&downside)
  };

  let sharpe = average / std;
  let sortino = if downside_std > 0.0 {
    average / downside_std
  } else {
    f64::NAN
  };
  let volatility = std * 252.0_f64.sqrt();
  let highest = returns.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let lowest = returns.iter().cloned().fold(f64::INFINITY, f64::min);
  let total = returns.iter().map(|p| 1.0 + p).product::<f64>() - 1.0;
  let hits = returns.iter().filter(|&&p| p > 0.0).count() as f64 / returns.len() as f64;

  info!(periods = returns.len(), "backtest complete");

  Ok(vec![
    ("Sharpe", sharpe),
    ("Sortino", sortino),
    ("Volatility (Annual)", volatility),
    ("Highest Return (Daily)", highest),
    ("Lowest Return (Daily)", lowest),
    ("Average Return (Daily)", average),
    ("Total Return (Compounded)", total),
    ("Win Ratio", hits),
  ])
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;

  fn metric(metrics: &[(&'static str, f64)], name: &str) -> f64 {
    metrics.iter().find(|(n, _)| *n == name).unwrap().1
  }

  #[test]
  fn portfolio_returns_are_weight_dotted() {
    let aligned = vec![vec![0.02, -0.01], vec![0.04, 0.03]];
    let p = portfolio_returns(&[0.5, 0.5], &aligned);
    assert_relative_eq!(p[0], 0.03, epsilon = 1e-12);
    assert_relative_eq!(p[1], 0.01, epsilon = 1e-12);
  }

  #[test]
  fn all_positive_periods_give_nan_sortino_and_positive_sharpe() {
    let aligned = vec![vec![0.01, 0.02, 0.015, 0.005]];
    let metrics = performance_metrics(&[1.0], &aligned).unwrap();

    assert!(metric(&metrics, "Sortino").is_nan());
    assert!(metric(&metrics, "Sharpe") > 0.0);
    assert_relative_eq!(metric(&metrics, "Win Ratio"), 1.0);
  }

  #[test]
  fn total_return_compounds() {
    let aligned = vec![vec![0.10, -0.50]];
    let metrics = performance_metrics(&[1.0], &aligned).unwrap();
    assert_relative_eq!(
      metric(&metrics, "Total Return (Compounded)"),
      1.1 * 0.5 - 1.0,
      epsilon = 1e-12
    );
  }

  #[test]
  fn metric_order_is_stable() {
    let aligned = vec![vec![0.01, -0.02, 0.03]];
    let metrics = performance_metrics(&[1.0], &aligned).unwrap();
    let names: Vec<&str> = metrics.iter().map(|(n, _)| *n).collect();
    assert_eq!(
      names,
      vec![
        "Sharpe",
        "Sortino",
        "Volatility (Annual)",
        "Highest Return (Daily)",
        "Lowest Return (Daily)",
        "Average Return (Daily)",
        "Total Return (Compounded)",
        "Win Ratio"
      ]
    );
  }

  #[test]
  fn empty_window_is_a_data_error() {
    let err = performance_metrics(&[1.0], &[]);
    assert!(matches!(err, Err(PortfolioError::DataFetch(_))));
  }
}
