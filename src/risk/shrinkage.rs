//! # Shrinkage Covariance
//!
//! $$
//! \hat\Sigma = \frac{b^2}{d^2}\,\mu I + \Big(1-\frac{b^2}{d^2}\Big) S
//! $$
//!
//! Ledoit-Wolf estimator blending the sample covariance toward a
//! scaled-identity target with a data-driven intensity. Stays
//! well-conditioned when observations are scarce relative to assets.

use nalgebra::DMatrix;
use tracing::info;

use crate::error::Result;
use crate::market::PriceTable;
use crate::risk::returns::aligned_simple_returns;
use crate::risk::returns::return_matrix;

/// Ledoit-Wolf shrinkage estimate from a `T x N` return matrix.
///
/// Columns are demeaned, the biased sample covariance `S = X'X / T` is
/// blended toward `mu I` with `mu = tr(S)/N`. The intensity is
/// `min(b^2/d^2, 1)` where `d^2 = |S - mu I|^2` and
/// `b^2 = (1/T^2) sum_t |x_t x_t' - S|^2`, both in Frobenius norm.
pub fn ledoit_wolf(returns: &DMatrix<f64>) -> DMatrix<f64> {
  let t = returns.nrows();
  let n = returns.ncols();
  if t == 0 || n == 0 {
    return DMatrix::zeros(n, n);
  }

  let mut x = returns.clone();
  for j in 0..n {
    let mean = x.column(j).sum() / t as f64;
    for i in 0..t {
      x[(i, j)] -= mean;
    }
  }

  let sample = (x.transpose() * &x) / t as f64;
  let mu = sample.trace() / n as f64;
  let target = DMatrix::identity(n, n) * mu;

  let d2 = (&sample - &target).norm_squared();
  if d2 <= f64::EPSILON {
    // Sample already coincides with the target.
    return sample;
  }

  let mut b2_sum = 0.0;
  for i in 0..t {
    let row = x.row(i).transpose();
    let outer = &row * row.transpose();
    b2_sum += (&outer - &sample).norm_squared();
  }

  let b2 = (b2_sum / (t as f64 * t as f64)).min(d2);
  let rho = b2 / d2;

  target * rho + sample * (1.0 - rho)
}

/// The covariance operation over raw prices: per-asset simple returns,
/// tail alignment, then shrinkage estimation.
pub fn shrinkage_covariance(table: &PriceTable) -> Result<DMatrix<f64>> {
  let aligned = aligned_simple_returns(table)?;
  let matrix = return_matrix(&aligned);

  info!(
    assets = matrix.ncols(),
    observations = matrix.nrows(),
    "estimating shrinkage covariance"
  );

  Ok(ledoit_wolf(&matrix))
}
