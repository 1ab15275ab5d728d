//! # Objective Models
//!
//! $$
//! \min\ \mathbf{w}^\top\Sigma\mathbf{w}, \quad
//! \min\ v + \tfrac{1}{(1-\alpha)T}\textstyle\sum_t (-\mathbf{w}\cdot
//! r_t - v)^+, \quad
//! \max\ \tfrac{1}{T}\textstyle\sum_t \ln(1 + f\,\mathbf{w}\cdot r_t)
//! $$
//!
//! The six portfolio objectives. Each solve starts from the uniform
//! portfolio and either converges to simplex weights or fails with the
//! model's name; weights are never silently reset or normalized.

use argmin::core::CostFunction;
use nalgebra::DMatrix;
use nalgebra::DVector;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::optimize::simplex::run_solver;
use crate::optimize::simplex::softmax;

/// Portfolio returns below this floor are clamped before the Kelly log.
const KELLY_RETURN_FLOOR: f64 = -0.99;

fn checked_dimension(cov: &DMatrix<f64>) -> Result<usize> {
  let n = cov.nrows();
  if n == 0 || cov.ncols() != n {
    return Err(PortfolioError::Config(format!(
      "covariance matrix is {}x{}, expected square and non-empty",
      cov.nrows(),
      cov.ncols()
    )));
  }
  Ok(n)
}

fn sample_length(aligned: &[Vec<f64>]) -> Result<usize> {
  let t = aligned.first().map(|r| r.len()).unwrap_or(0);
  if aligned.is_empty() || t == 0 {
    return Err(PortfolioError::DataFetch(
      "empty return sample for sample-based objective".to_string(),
    ));
  }
  Ok(t)
}

fn period_return(weights: &[f64], aligned: &[Vec<f64>], step: usize) -> f64 {
  weights
    .iter()
    .enumerate()
    .map(|(i, &wi)| wi * aligned[i][step])
    .sum()
}

/// Rockafellar-Uryasev sample objective
/// `v + (1/((1-alpha)T)) sum_t max(-w.r_t - v, 0)`.
///
/// Minimizing over `v` at fixed weights yields the CVaR of the portfolio
/// return sample at confidence `confidence`.
pub fn cvar_objective(
  weights: &[f64],
  threshold: f64,
  aligned: &[Vec<f64>],
  confidence: f64,
) -> f64 {
  let t = aligned.first().map(|r| r.len()).unwrap_or(0);
  if t == 0 {
    return threshold;
  }

  let mut excess = 0.0;
  for step in 0..t {
    excess += (-period_return(weights, aligned, step) - threshold).max(0.0);
  }

  threshold + excess / ((1.0 - confidence) * t as f64)
}

/// Minimum-variance weights: `min w' Sigma w`.
pub fn optimize_variance(cov: &DMatrix<f64>) -> Result<Vec<f64>> {
  let n = checked_dimension(cov)?;

  struct VarianceCost {
    cov: DMatrix<f64>,
  }

  impl CostFunction for VarianceCost {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> std::result::Result<f64, argmin::core::Error> {
      let w = DVector::from_vec(softmax(x));
      let sigma_w = &self.cov * &w;
      Ok(w.dot(&sigma_w))
    }
  }

  let cost = VarianceCost { cov: cov.clone() };
  let best = run_solver(cost, vec![0.0; n], "variance")?;
  Ok(softmax(&best))
}

/// Maximum diversification: `max (w . sigma) / sqrt(w' Sigma w)`.
pub fn optimize_max_diversification(cov: &DMatrix<f64>, vols: &[f64]) -> Result<Vec<f64>> {
  let n = checked_dimension(cov)?;
  if vols.len() != n {
    return Err(PortfolioError::Config(format!(
      "volatility vector has {} entries, covariance is {n}x{n}",
      vols.len()
    )));
  }

  struct MdpCost {
    cov: DMatrix<f64>,
    vols: DVector<f64>,
  }

  impl CostFunction for MdpCost {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> std::result::Result<f64, argmin::core::Error> {
      let w = DVector::from_vec(softmax(x));
      let sigma_w = &self.cov * &w;
      let var = w.dot(&sigma_w);
      if var <= 1e-30 {
        return Ok(1e10);
      }
      Ok(-(w.dot(&self.vols) / var.sqrt()))
    }
  }

  let cost = MdpCost {
    cov: cov.clone(),
    vols: DVector::from_row_slice(vols),
  };
  let best = run_solver(cost, vec![0.0; n], "max-diversification")?;
  Ok(softmax(&best))
}

/// Mean-variance utility: `min (lambda/2) w' Sigma w - w . mu`.
pub fn optimize_mean_variance(
  cov: &DMatrix<f64>,
  risk_aversion: f64,
  expected: &DVector<f64>,
) -> Result<Vec<f64>> {
  let n = checked_dimension(cov)?;
  if expected.len() != n {
    return Err(PortfolioError::Config(format!(
      "expected-return vector has {} entries, covariance is {n}x{n}",
      expected.len()
    )));
  }

  struct MvoCost {
    cov: DMatrix<f64>,
    expected: DVector<f64>,
    risk_aversion: f64,
  }

  impl CostFunction for MvoCost {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> std::result::Result<f64, argmin::core::Error> {
      let w = DVector::from_vec(softmax(x));
      let sigma_w = &self.cov * &w;
      Ok(0.5 * self.risk_aversion * w.dot(&sigma_w) - w.dot(&self.expected))
    }
  }

  let cost = MvoCost {
    cov: cov.clone(),
    expected: expected.clone(),
    risk_aversion,
  };
  let best = run_solver(cost, vec![0.0; n], "mean-variance")?;
  Ok(softmax(&best))
}

fn check_confidence(confidence: f64) -> Result<()> {
  if !(confidence > 0.0 && confidence < 1.0) {
    return Err(PortfolioError::Config(format!(
      "confidence level {confidence} outside (0, 1)"
    )));
  }
  Ok(())
}

struct TailCost {
  aligned: Vec<Vec<f64>>,
  n: usize,
  confidence: f64,
  penalize_mean: bool,
}

impl CostFunction for TailCost {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, x: &Self::Param) -> std::result::Result<f64, argmin::core::Error> {
    let w = softmax(&x[..self.n]);
    let threshold = x[self.n];
    let cvar = cvar_objective(&w, threshold, &self.aligned, self.confidence);

    if !self.penalize_mean {
      return Ok(cvar);
    }

    let t = self.aligned[0].len();
    let mut mean = 0.0;
    for step in 0..t {
      mean += period_return(&w, &self.aligned, step);
    }
    Ok(cvar - mean / t as f64)
  }
}

fn solve_tail_model(
  aligned: &[Vec<f64>],
  confidence: f64,
  penalize_mean: bool,
  model: &'static str,
) -> Result<Vec<f64>> {
  check_confidence(confidence)?;
  sample_length(aligned)?;

  let n = aligned.len();
  let cost = TailCost {
    aligned: aligned.to_vec(),
    n,
    confidence,
    penalize_mean,
  };

  // Augmented variable (z, v): the VaR threshold v is unconstrained and
  // starts at 1.
  let mut x0 = vec![0.0; n];
  x0.push(1.0);

  let best = run_solver(cost, x0, model)?;
  Ok(softmax(&best[..n]))
}

/// CVaR-minimal weights over the historical return sample at the given
/// confidence level.
pub fn optimize_cvar(aligned: &[Vec<f64>], confidence: f64) -> Result<Vec<f64>> {
  solve_tail_model(aligned, confidence, false, "cvar")
}

/// Mean-CVaR weights: tail risk traded against mean historical return.
pub fn optimize_mean_cvar(aligned: &[Vec<f64>], confidence: f64) -> Result<Vec<f64>> {
  solve_tail_model(aligned, confidence, true, "mean-cvar")
}

/// Fractional-Kelly weights: `max (1/T) sum_t ln(1 + f (w . r_t))` with the
/// portfolio return floored at -0.99 to keep the log in its domain.
pub fn optimize_kelly(aligned: &[Vec<f64>], fraction: f64) -> Result<Vec<f64>> {
  if !(fraction > 0.0 && fraction <= 1.0) {
    return Err(PortfolioError::Config(format!(
      "kelly fraction {fraction} outside (0, 1]"
    )));
  }
  let t = sample_length(aligned)?;
  let n = aligned.len();

  struct KellyCost {
    aligned: Vec<Vec<f64>>,
    t: usize,
    fraction: f64,
  }

  impl CostFunction for KellyCost {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> std::result::Result<f64, argmin::core::Error> {
      let w = softmax(x);
      let mut growth = 0.0;
      for step in 0..self.t {
        let r = period_return(&w, &self.aligned, step).max(KELLY_RETURN_FLOOR);
        growth += (1.0 + self.fraction * r).ln();
      }
      Ok(-growth / self.t as f64)
    }
  }

  let cost = KellyCost {
    aligned: aligned.to_vec(),
    t,
    fraction,
  };
  let best = run_solver(cost, vec![0.0; n], "kelly")?;
  Ok(softmax(&best))
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use super::*;

  fn diag_cov() -> DMatrix<f64> {
    DMatrix::from_row_slice(2, 2, &[0.04, 0.0, 0.0, 0.01])
  }

  fn sample_returns() -> Vec<Vec<f64>> {
    vec![
      vec![0.010, -0.005, 0.008, -0.004, 0.006, -0.002],
      vec![0.050, -0.200, 0.060, -0.250, 0.040, -0.180],
    ]
  }

  fn assert_on_simplex(w: &[f64]) {
    let sum: f64 = w.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6, "weights sum to {sum}");
    assert!(w.iter().all(|&wi| (0.0..=1.0).contains(&wi)));
  }

  #[test]
  fn every_model_returns_simplex_weights() {
    let cov = diag_cov();
    let vols = [0.2, 0.1];
    let mu = DVector::from_row_slice(&[0.05, 0.08]);
    let sample = sample_returns();

    assert_on_simplex(&optimize_variance(&cov).unwrap());
    assert_on_simplex(&optimize_max_diversification(&cov, &vols).unwrap());
    assert_on_simplex(&optimize_mean_variance(&cov, 0.2, &mu).unwrap());
    assert_on_simplex(&optimize_cvar(&sample, 0.9).unwrap());
    assert_on_simplex(&optimize_mean_cvar(&sample, 0.9).unwrap());
    assert_on_simplex(&optimize_kelly(&sample, 0.5).unwrap());
  }

  #[test]
  fn repeated_solves_are_identical() {
    let first = optimize_variance(&diag_cov()).unwrap();
    let second = optimize_variance(&diag_cov()).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn variance_tilts_toward_the_low_variance_asset() {
    let w = optimize_variance(&diag_cov()).unwrap();
    assert!(w[1] > w[0], "got {w:?}");
    // Analytic optimum for a diagonal covariance: w_i proportional to
    // 1/sigma_i^2, here [0.2, 0.8].
    assert_relative_eq!(w[1], 0.8, epsilon = 1e-2);
  }

  #[test]
  fn max_diversification_tilts_toward_the_low_vol_asset() {
    let w = optimize_max_diversification(&diag_cov(), &[0.2, 0.1]).unwrap();
    assert!(w[1] > w[0], "got {w:?}");
  }

  #[test]
  fn mean_variance_follows_expected_returns_when_risk_aversion_is_low() {
    let mu = DVector::from_row_slice(&[0.01, 0.20]);
    let w = optimize_mean_variance(&diag_cov(), 0.2, &mu).unwrap();
    assert!(w[1] > 0.9, "got {w:?}");
  }

  #[test]
  fn cvar_objective_matches_hand_computed_fixture() {
    // Four periods, two losses, alpha = 0.5, single asset at threshold
    // v = 0.01: shortfalls are 0 and 0.02, so the objective is
    // 0.01 + 0.02 / (0.5 * 4) = 0.02.
    let aligned = vec![vec![0.02, -0.01, 0.03, -0.03]];
    let value = cvar_objective(&[1.0], 0.01, &aligned, 0.5);
    assert_relative_eq!(value, 0.02, epsilon = 1e-15);
  }

  #[test]
  fn cvar_avoids_the_loss_heavy_asset() {
    let w = optimize_cvar(&sample_returns(), 0.9).unwrap();
    assert!(w[0] > w[1], "got {w:?}");
  }

  #[test]
  fn kelly_prefers_the_positive_growth_asset() {
    let w = optimize_kelly(&sample_returns(), 1.0).unwrap();
    assert!(w[0] > w[1], "got {w:?}");
  }

  #[test]
  fn out_of_range_parameters_are_config_errors() {
    let sample = sample_returns();
    assert!(matches!(
      optimize_cvar(&sample, 1.2),
      Err(PortfolioError::Config(_))
    ));
    assert!(matches!(
      optimize_cvar(&sample, 0.0),
      Err(PortfolioError::Config(_))
    ));
    assert!(matches!(
      optimize_kelly(&sample, 1.5),
      Err(PortfolioError::Config(_))
    ));
    assert!(matches!(
      optimize_kelly(&sample, 0.0),
      Err(PortfolioError::Config(_))
    ));
  }

  #[test]
  fn empty_sample_is_a_data_error() {
    let aligned: Vec<Vec<f64>> = Vec::new();
    assert!(matches!(
      optimize_cvar(&aligned, 0.9),
      Err(PortfolioError::DataFetch(_))
    ));
  }
}
