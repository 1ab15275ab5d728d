//! # Errors
//!
//! $$
//! \mathcal{E} = \{\text{DataFetch}, \text{Config}, \text{Optimization}\}
//! $$
//!
//! Closed error taxonomy for the portfolio engine.

use thiserror::Error;

/// Failure kinds surfaced by the engine.
///
/// All variants are terminal to the invoking call: an optimization that
/// fails leaves the previous portfolio weights untouched, and no model ever
/// falls back to another model on error.
#[derive(Debug, Error)]
pub enum PortfolioError {
  /// Price or market-capitalization data is missing, empty, or the provider
  /// failed outright.
  #[error("market data error: {0}")]
  DataFetch(String),

  /// A caller-supplied parameter is outside its valid domain.
  #[error("invalid configuration: {0}")]
  Config(String),

  /// The constrained solver did not converge for the named model.
  #[error("{model} optimization failed to converge")]
  Optimization { model: &'static str },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PortfolioError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn optimization_error_names_the_model() {
    let err = PortfolioError::Optimization { model: "cvar" };
    assert!(err.to_string().contains("cvar"));
  }

  #[test]
  fn config_error_carries_parameter_context() {
    let err = PortfolioError::Config("confidence level 1.2 outside (0, 1)".to_string());
    assert!(err.to_string().contains("1.2"));
  }
}
