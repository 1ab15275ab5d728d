//! # Portfolio State
//!
//! $$
//! \mathcal{P} = (\text{tickers}, A, \mathbf{w}, \Sigma, \text{history})
//! $$
//!
//! Orchestrator owning the asset universe, invested amount, current weights
//! and the cached risk model. Weights change only through a whole-vector
//! replacement on a successful optimization; a failed solve leaves the
//! previous weights intact. Not safe for concurrent mutation; callers must
//! serialize `optimize` calls on one instance.

use std::collections::HashSet;

use nalgebra::DMatrix;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::backtest::performance_metrics;
use crate::error::PortfolioError;
use crate::error::Result;
use crate::market::MarketCapProvider;
use crate::market::PriceHistoryProvider;
use crate::market::PriceTable;
use crate::optimize::ObjectiveModel;
use crate::optimize::OptimizeRequest;
use crate::optimize::objectives::optimize_cvar;
use crate::optimize::objectives::optimize_kelly;
use crate::optimize::objectives::optimize_max_diversification;
use crate::optimize::objectives::optimize_mean_cvar;
use crate::optimize::objectives::optimize_mean_variance;
use crate::optimize::objectives::optimize_variance;
use crate::risk::aligned_simple_returns;
use crate::risk::shrinkage_covariance;
use crate::risk::volatility_vector;
use crate::views::blended_returns;

/// Days of price history fetched at construction.
pub const HISTORY_DAYS: u32 = 465;
/// Most recent closes used for covariance estimation.
pub const COVARIANCE_WINDOW: usize = 100;

/// Persisted portfolio identity. Covariance and price history are derived
/// cache and are recomputed, not restored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
  /// Asset universe, in index order.
  pub tickers: Vec<String>,
  /// Weight vector matching the universe order.
  pub weights: Vec<f64>,
  /// Invested amount.
  pub amount: f64,
}

/// One row of the current allocation.
#[derive(Clone, Debug)]
pub struct Allocation {
  /// Ticker symbol.
  pub ticker: String,
  /// Portfolio weight.
  pub weight: f64,
  /// Monetary amount allocated to the asset.
  pub amount: f64,
}

/// Session-scoped portfolio: universe, invested amount, weights and the
/// cached price/covariance data behind them.
#[derive(Clone, Debug)]
pub struct PortfolioState {
  tickers: Vec<String>,
  amount: f64,
  weights: Vec<f64>,
  history: PriceTable,
  risk_window: PriceTable,
  covariance: DMatrix<f64>,
}

fn validate_universe(tickers: &[String]) -> Result<()> {
  if tickers.is_empty() {
    return Err(PortfolioError::Config(
      "asset universe must contain at least one ticker".to_string(),
    ));
  }

  let mut seen = HashSet::new();
  for ticker in tickers {
    if !seen.insert(ticker.as_str()) {
      return Err(PortfolioError::Config(format!(
        "duplicate ticker {ticker} in universe"
      )));
    }
  }
  Ok(())
}

impl PortfolioState {
  /// Build a portfolio for `tickers` with `amount` invested: fetches price
  /// history, estimates the shrinkage covariance over the most recent
  /// window and starts from uniform weights.
  pub fn new(
    tickers: Vec<String>,
    amount: f64,
    prices: &dyn PriceHistoryProvider,
  ) -> Result<Self> {
    validate_universe(&tickers)?;
    if !(amount.is_finite() && amount > 0.0) {
      return Err(PortfolioError::Config(format!(
        "invested amount {amount} must be positive"
      )));
    }

    info!(assets = tickers.len(), days = HISTORY_DAYS, "fetching price history");
    let history = prices.fetch(&tickers, HISTORY_DAYS)?;
    if history.is_empty() {
      return Err(PortfolioError::DataFetch(
        "provider returned no price history".to_string(),
      ));
    }
    if history.len() != tickers.len() {
      return Err(PortfolioError::DataFetch(format!(
        "provider returned {} series for {} tickers",
        history.len(),
        tickers.len()
      )));
    }

    let risk_window = history.tail(COVARIANCE_WINDOW);
    let covariance = shrinkage_covariance(&risk_window)?;

    let n = tickers.len();
    Ok(Self {
      tickers,
      amount,
      weights: vec![1.0 / n as f64; n],
      history,
      risk_window,
      covariance,
    })
  }

  /// Rebuild a portfolio from its persisted identity: fresh fetch, fresh
  /// covariance, stored weights.
  pub fn restore(snapshot: PortfolioSnapshot, prices: &dyn PriceHistoryProvider) -> Result<Self> {
    let PortfolioSnapshot {
      tickers,
      weights,
      amount,
    } = snapshot;

    if weights.len() != tickers.len() {
      return Err(PortfolioError::Config(format!(
        "snapshot has {} weights for {} tickers",
        weights.len(),
        tickers.len()
      )));
    }

    let mut state = Self::new(tickers, amount, prices)?;
    state.weights = weights;
    Ok(state)
  }

  /// Persisted identity of this portfolio.
  pub fn snapshot(&self) -> PortfolioSnapshot {
    PortfolioSnapshot {
      tickers: self.tickers.clone(),
      weights: self.weights.clone(),
      amount: self.amount,
    }
  }

  /// Asset universe in index order.
  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  /// Invested amount.
  pub fn amount(&self) -> f64 {
    self.amount
  }

  /// Defensive copy of the current weight vector.
  pub fn weights(&self) -> Vec<f64> {
    self.weights.clone()
  }

  /// Defensive copy of the cached covariance matrix.
  pub fn covariance(&self) -> DMatrix<f64> {
    self.covariance.clone()
  }

  /// Current per-asset allocation rows.
  pub fn allocations(&self) -> Vec<Allocation> {
    self
      .tickers
      .iter()
      .zip(self.weights.iter())
      .map(|(ticker, &weight)| Allocation {
        ticker: ticker.clone(),
        weight,
        amount: weight * self.amount,
      })
      .collect()
  }

  fn historical_sample(&self) -> Result<Vec<Vec<f64>>> {
    aligned_simple_returns(&self.history)
  }

  /// Solve the requested objective and replace the weight vector.
  ///
  /// Expected returns for the mean-variance model are blended fresh from
  /// the current covariance, market capitalizations and the request's
  /// views on every call.
  pub fn optimize(
    &mut self,
    request: &OptimizeRequest,
    caps: &dyn MarketCapProvider,
  ) -> Result<()> {
    if !(request.horizon.is_finite() && request.horizon > 0.0) {
      return Err(PortfolioError::Config(format!(
        "horizon {} must be positive",
        request.horizon
      )));
    }

    info!(model = request.model.name(), "optimizing portfolio");
    let scaled_cov = &self.covariance * request.horizon;

    let next = match request.model {
      ObjectiveModel::Variance => optimize_variance(&scaled_cov)?,
      ObjectiveModel::MaxDiversification => {
        let vols: Vec<f64> = volatility_vector(&self.risk_window)
          .iter()
          .map(|v| v * request.horizon.sqrt())
          .collect();
        optimize_max_diversification(&scaled_cov, &vols)?
      }
      ObjectiveModel::MeanVariance => {
        let expected = blended_returns(
          &scaled_cov,
          &self.tickers,
          caps,
          request.views.as_ref(),
          request.bl_risk_aversion,
          request.tau,
        )?;
        optimize_mean_variance(&scaled_cov, request.risk_aversion, &expected)?
      }
      ObjectiveModel::CVaR => optimize_cvar(&self.historical_sample()?, request.confidence)?,
      ObjectiveModel::MeanCVaR => {
        optimize_mean_cvar(&self.historical_sample()?, request.confidence)?
      }
      ObjectiveModel::Kelly => {
        optimize_kelly(&self.historical_sample()?, request.kelly_fraction)?
      }
    };

    // Whole-vector replacement; never updated field-by-field.
    self.weights = next;
    Ok(())
  }

  /// Backtest the current weights over the history that precedes the
  /// covariance estimation window.
  pub fn performance(&self) -> Result<Vec<(&'static str, f64)>> {
    let aligned = self.historical_sample()?;
    let evaluation = out_of_sample_window(&aligned);
    performance_metrics(&self.weights, &evaluation)
  }
}

/// Drop the most recent covariance-window returns from the sample when it
/// is long enough, keeping the evaluation out of sample.
fn out_of_sample_window(aligned: &[Vec<f64>]) -> Vec<Vec<f64>> {
  let t = aligned.first().map(|r| r.len()).unwrap_or(0);
  let risk_returns = COVARIANCE_WINDOW - 1;

  if t > risk_returns {
    aligned
      .iter()
      .map(|r| r[..t - risk_returns].to_vec())
      .collect()
  } else {
    aligned.to_vec()
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;

  struct StaticProvider;

  impl PriceHistoryProvider for StaticProvider {
    fn fetch(&self, tickers: &[String], lookback_days: u32) -> Result<PriceTable> {
      let closes = (0..tickers.len())
        .map(|a| {
          (0..lookback_days as usize)
            .map(|t| {
              let drift = 1.0 + 0.0004 * (a as f64 + 1.0);
              let wobble = 0.02 * ((t as f64) * (0.31 + 0.07 * a as f64)).sin();
              100.0 * drift.powi(t as i32) * (1.0 + wobble)
            })
            .collect()
        })
        .collect();

      PriceTable::new(tickers.to_vec(), closes)
    }
  }

  struct StaticCaps;

  impl MarketCapProvider for StaticCaps {
    fn capitalization(&self, _ticker: &str) -> Option<f64> {
      Some(1.0e9)
    }
  }

  fn universe() -> Vec<String> {
    vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()]
  }

  fn build_state() -> PortfolioState {
    PortfolioState::new(universe(), 10_000.0, &StaticProvider).unwrap()
  }

  #[test]
  fn construction_starts_from_uniform_weights() {
    let state = build_state();
    for w in state.weights() {
      assert_relative_eq!(w, 1.0 / 3.0, epsilon = 1e-12);
    }
    assert_eq!(state.covariance().nrows(), 3);
  }

  #[test]
  fn failed_optimization_keeps_previous_weights() {
    let mut state = build_state();
    let mut request = OptimizeRequest::for_model(ObjectiveModel::Variance);
    state.optimize(&request, &StaticCaps).unwrap();
    let converged = state.weights();

    request.model = ObjectiveModel::CVaR;
    request.confidence = 1.2;
    let err = state.optimize(&request, &StaticCaps);

    assert!(matches!(err, Err(PortfolioError::Config(_))));
    assert_eq!(state.weights(), converged);
  }

  #[test]
  fn optimized_weights_are_on_the_simplex() {
    let mut state = build_state();
    for model in [
      ObjectiveModel::Variance,
      ObjectiveModel::MaxDiversification,
      ObjectiveModel::MeanVariance,
      ObjectiveModel::Kelly,
    ] {
      state
        .optimize(&OptimizeRequest::for_model(model), &StaticCaps)
        .unwrap();
      let sum: f64 = state.weights().iter().sum();
      assert!((sum - 1.0).abs() < 1e-6, "{model:?} weights sum to {sum}");
    }
  }

  #[test]
  fn snapshot_round_trip_preserves_identity() {
    let snapshot = PortfolioSnapshot {
      tickers: universe(),
      weights: vec![0.2, 0.3, 0.5],
      amount: 10_000.0,
    };

    let encoded = serde_json::to_string(&snapshot).unwrap();
    let decoded: PortfolioSnapshot = serde_json::from_str(&encoded).unwrap();
    let state = PortfolioState::restore(decoded, &StaticProvider).unwrap();

    assert_eq!(state.tickers(), universe().as_slice());
    assert_eq!(state.weights(), vec![0.2, 0.3, 0.5]);
    assert_relative_eq!(state.amount(), 10_000.0);
  }

  #[test]
  fn snapshot_weight_mismatch_is_rejected() {
    let snapshot = PortfolioSnapshot {
      tickers: universe(),
      weights: vec![0.5, 0.5],
      amount: 10_000.0,
    };
    let err = PortfolioState::restore(snapshot, &StaticProvider);
    assert!(matches!(err, Err(PortfolioError::Config(_))));
  }

  #[test]
  fn duplicate_tickers_are_rejected() {
    let err = PortfolioState::new(
      vec!["AAA".to_string(), "AAA".to_string()],
      10_000.0,
      &StaticProvider,
    );
    assert!(matches!(err, Err(PortfolioError::Config(_))));
  }

  #[test]
  fn performance_reports_the_full_metric_set() {
    let state = build_state();
    let metrics = state.performance().unwrap();
    assert_eq!(metrics.len(), 8);
    assert_eq!(metrics[0].0, "Sharpe");
  }

  #[test]
  fn allocations_split_the_invested_amount() {
    let state = build_state();
    let total: f64 = state.allocations().iter().map(|a| a.amount).sum();
    assert_relative_eq!(total, 10_000.0, epsilon = 1e-6);
  }
}
