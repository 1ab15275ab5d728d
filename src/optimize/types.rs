//! # Optimizer Types
//!
//! $$
//! \mathcal{M}=\{\text{Var},\text{MDP},\text{MVO},\text{CVaR},
//! \text{Mean-CVaR},\text{Kelly}\}
//! $$
//!
//! The closed set of objective models and the per-call request parameters.

use crate::views::DEFAULT_RISK_AVERSION;
use crate::views::DEFAULT_TAU;
use crate::views::ViewSet;

/// Supported optimization objectives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectiveModel {
  /// Minimum portfolio variance `w' Sigma w`.
  Variance,
  /// Maximum diversification ratio `(w . sigma) / sqrt(w' Sigma w)`.
  MaxDiversification,
  /// Mean-variance utility with Black-Litterman expected returns.
  MeanVariance,
  /// Conditional Value-at-Risk of the historical return sample.
  CVaR,
  /// CVaR penalized by mean historical return.
  MeanCVaR,
  /// Fractional Kelly growth over the historical return sample.
  Kelly,
}

impl ObjectiveModel {
  /// Stable name used in logs and optimization errors.
  pub fn name(&self) -> &'static str {
    match self {
      Self::Variance => "variance",
      Self::MaxDiversification => "max-diversification",
      Self::MeanVariance => "mean-variance",
      Self::CVaR => "cvar",
      Self::MeanCVaR => "mean-cvar",
      Self::Kelly => "kelly",
    }
  }
}

/// Parameters for one optimization call.
///
/// Fields irrelevant to the selected model are ignored; views only affect
/// [`ObjectiveModel::MeanVariance`].
#[derive(Clone, Debug)]
pub struct OptimizeRequest {
  /// Objective to solve.
  pub model: ObjectiveModel,
  /// Mean-variance risk-aversion coefficient.
  pub risk_aversion: f64,
  /// Horizon scale: covariance is multiplied by this, volatility by its
  /// square root, before solving.
  pub horizon: f64,
  /// Optional investor views for the Black-Litterman blend.
  pub views: Option<ViewSet>,
  /// CVaR confidence level, in (0, 1).
  pub confidence: f64,
  /// Risk aversion of the equilibrium prior.
  pub bl_risk_aversion: f64,
  /// Prior-uncertainty scaling of the equilibrium covariance.
  pub tau: f64,
  /// Kelly exposure fraction, in (0, 1].
  pub kelly_fraction: f64,
}

impl Default for OptimizeRequest {
  fn default() -> Self {
    Self {
      model: ObjectiveModel::Variance,
      risk_aversion: 0.2,
      horizon: 1.0,
      views: None,
      confidence: 0.9,
      bl_risk_aversion: DEFAULT_RISK_AVERSION,
      tau: DEFAULT_TAU,
      kelly_fraction: 0.5,
    }
  }
}

impl OptimizeRequest {
  /// A request for the given model with default parameters.
  pub fn for_model(model: ObjectiveModel) -> Self {
    Self {
      model,
      ..Self::default()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn model_names_are_stable() {
    assert_eq!(ObjectiveModel::MeanCVaR.name(), "mean-cvar");
    assert_eq!(ObjectiveModel::Kelly.name(), "kelly");
  }

  #[test]
  fn default_request_matches_documented_defaults() {
    let req = OptimizeRequest::default();
    assert_eq!(req.model, ObjectiveModel::Variance);
    assert!(req.views.is_none());
    assert_eq!(req.confidence, 0.9);
    assert_eq!(req.tau, 0.025);
  }
}
