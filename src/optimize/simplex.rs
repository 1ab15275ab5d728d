//! # Simplex Search
//!
//! $$
//! w_i = \frac{e^{z_i}}{\sum_j e^{z_j}}, \qquad z \in \mathbb{R}^N
//! $$
//!
//! Simplex-constrained Nelder-Mead plumbing. The raw search variable is
//! mapped through a softmax, so every iterate satisfies `0 <= w_i <= 1` and
//! `sum w_i = 1` by construction; no post-hoc normalization is applied to
//! the solver output. The zero vector maps to the uniform portfolio, which
//! is the fixed starting point of every solve.

use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::solver::neldermead::NelderMead;

use crate::error::PortfolioError;
use crate::error::Result;

const MAX_ITERS: u64 = 5000;
const SD_TOLERANCE: f64 = 1e-8;

/// Map an unconstrained vector onto the probability simplex.
pub fn softmax(x: &[f64]) -> Vec<f64> {
  if x.is_empty() {
    return Vec::new();
  }

  let max_x = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
  let exps: Vec<f64> = x.iter().map(|&v| (v - max_x).exp()).collect();
  let sum: f64 = exps.iter().sum();

  if sum < 1e-15 {
    vec![1.0 / x.len() as f64; x.len()]
  } else {
    exps.iter().map(|&e| e / sum).collect()
  }
}

/// Run Nelder-Mead from `x0`, failing with the model's name when the solver
/// errors or terminates on a non-finite cost.
pub(crate) fn run_solver<C>(cost: C, x0: Vec<f64>, model: &'static str) -> Result<Vec<f64>>
where
  C: CostFunction<Param = Vec<f64>, Output = f64>,
{
  let mut simplex = Vec::with_capacity(x0.len() + 1);
  simplex.push(x0.clone());
  for i in 0..x0.len() {
    let mut point = x0.clone();
    point[i] += 1.0;
    simplex.push(point);
  }

  let solver = NelderMead::new(simplex)
    .with_sd_tolerance(SD_TOLERANCE)
    .map_err(|_| PortfolioError::Optimization { model })?;

  let res = Executor::new(cost, solver)
    .configure(|state| state.max_iters(MAX_ITERS))
    .run()
    .map_err(|_| PortfolioError::Optimization { model })?;

  if !res.state.best_cost.is_finite() {
    return Err(PortfolioError::Optimization { model });
  }

  res
    .state
    .best_param
    .ok_or(PortfolioError::Optimization { model })
}
