//! # View Blending (Black-Litterman)
//!
//! $$
//! \mu = \big[(\tau\Sigma)^{-1} + P^\top\Omega^{-1}P\big]^{-1}
//!       \big[(\tau\Sigma)^{-1}\pi + P^\top\Omega^{-1}Q\big]
//! $$
//!
//! Market-implied equilibrium returns and their Bayesian combination with
//! investor views.

use nalgebra::DMatrix;
use nalgebra::DVector;
use tracing::info;
use tracing::warn;

use crate::error::PortfolioError;
use crate::error::Result;
use crate::market::MarketCapProvider;

/// Default risk-aversion coefficient for the equilibrium prior.
pub const DEFAULT_RISK_AVERSION: f64 = 2.5;
/// Default prior-uncertainty scaling.
pub const DEFAULT_TAU: f64 = 0.025;

/// Investor views: `K` linear statements about expected returns.
///
/// `p` is the `K x N` coefficient matrix, `q` the length-`K` target
/// differentials and `omega_diag` the diagonal of the `K x K` uncertainty
/// matrix. Absence of views is `Option::<ViewSet>::None` at every API
/// boundary; an all-zero `ViewSet` is still a set of views and is rejected
/// by the uncertainty-matrix check rather than silently discarded.
#[derive(Clone, Debug)]
pub struct ViewSet {
  p: DMatrix<f64>,
  q: DVector<f64>,
  omega_diag: DVector<f64>,
}

impl ViewSet {
  /// Validate shapes and build a view set.
  pub fn new(p: DMatrix<f64>, q: DVector<f64>, omega_diag: DVector<f64>) -> Result<Self> {
    let k = p.nrows();
    if k == 0 {
      return Err(PortfolioError::Config(
        "view set must contain at least one view".to_string(),
      ));
    }
    if q.len() != k || omega_diag.len() != k {
      return Err(PortfolioError::Config(format!(
        "view shape mismatch: P has {k} rows, Q has {} entries, omega has {}",
        q.len(),
        omega_diag.len()
      )));
    }
    Ok(Self { p, q, omega_diag })
  }

  /// Number of views.
  pub fn len(&self) -> usize {
    self.p.nrows()
  }

  /// True when the set holds no views; unreachable through `new`.
  pub fn is_empty(&self) -> bool {
    self.p.nrows() == 0
  }
}

/// Capitalization-proportional market weights over the universe.
///
/// A missing or zero capitalization contributes zero weight and is logged,
/// never fatal; a universe with no capitalization at all has no equilibrium
/// and fails.
pub fn market_weights(
  tickers: &[String],
  caps: &dyn MarketCapProvider,
) -> Result<DVector<f64>> {
  let mut raw = Vec::with_capacity(tickers.len());
  for ticker in tickers {
    let cap = caps.capitalization(ticker).unwrap_or(0.0);
    if !(cap > 0.0) {
      warn!(%ticker, "missing market capitalization, using zero weight");
      raw.push(0.0);
    } else {
      raw.push(cap);
    }
  }

  let total: f64 = raw.iter().sum();
  if total <= 0.0 {
    return Err(PortfolioError::DataFetch(
      "no market capitalization available for any asset".to_string(),
    ));
  }

  Ok(DVector::from_iterator(
    raw.len(),
    raw.iter().map(|c| c / total),
  ))
}

/// Market-implied equilibrium returns `pi = lambda * Sigma * w_mkt`.
pub fn implied_returns(
  cov: &DMatrix<f64>,
  w_mkt: &DVector<f64>,
  risk_aversion: f64,
) -> DVector<f64> {
  cov * w_mkt * risk_aversion
}

/// Expected-return estimate: the equilibrium prior, or its posterior blend
/// with investor views when a [`ViewSet`] is supplied.
pub fn blended_returns(
  cov: &DMatrix<f64>,
  tickers: &[String],
  caps: &dyn MarketCapProvider,
  views: Option<&ViewSet>,
  risk_aversion: f64,
  tau: f64,
) -> Result<DVector<f64>> {
  let n = tickers.len();
  let w_mkt = market_weights(tickers, caps)?;
  let pi = implied_returns(cov, &w_mkt, risk_aversion);

  let Some(views) = views else {
    info!(assets = n, "no views supplied, using market-implied returns");
    return Ok(pi);
  };

  let k = views.len();
  if views.p.ncols() != n {
    return Err(PortfolioError::Config(format!(
      "view matrix covers {} assets, universe has {n}",
      views.p.ncols()
    )));
  }
  if k > n {
    return Err(PortfolioError::Config(format!(
      "{k} views exceed the {n}-asset universe"
    )));
  }
  if views.omega_diag.iter().any(|&w| !(w > 0.0)) {
    return Err(PortfolioError::Config(
      "non-invertible uncertainty matrix".to_string(),
    ));
  }

  let prior_precision = (cov * tau).try_inverse().ok_or_else(|| {
    PortfolioError::Config("scaled covariance matrix is singular".to_string())
  })?;

  let omega_inv = DMatrix::from_diagonal(&views.omega_diag.map(|w| 1.0 / w));
  let pt_omega_inv = views.p.transpose() * &omega_inv;

  let posterior_precision = &prior_precision + &pt_omega_inv * &views.p;
  let m1 = posterior_precision.try_inverse().ok_or_else(|| {
    PortfolioError::Config("posterior information matrix is singular".to_string())
  })?;
  let m2 = &prior_precision * &pi + &pt_omega_inv * &views.q;

  info!(assets = n, views = k, "blended posterior returns with views");
  Ok(m1 * m2)
}
