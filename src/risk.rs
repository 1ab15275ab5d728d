//! # Risk Model
//!
//! $$
//! \hat\Sigma = \rho\,\mu I + (1-\rho)\,S
//! $$
//!
//! Return preprocessing, shrinkage covariance estimation and per-asset
//! volatility.

pub mod returns;
pub mod shrinkage;
pub mod volatility;

pub use returns::align_return_series;
pub use returns::aligned_simple_returns;
pub use returns::log_returns_series;
pub use returns::return_matrix;
pub use returns::simple_returns_series;
pub use shrinkage::ledoit_wolf;
pub use shrinkage::shrinkage_covariance;
pub use volatility::volatility_vector;
