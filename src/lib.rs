//! # portfolio-rs
//!
//! $$
//! \mathbf{w}^\* = \arg\min_{\mathbf{w}\in\Delta^{N-1}} f(\mathbf{w};
//! \Sigma, \mu, \{r_t\})
//! $$
//!
//! Portfolio construction from historical prices: Ledoit-Wolf shrinkage
//! covariance, Black-Litterman return blending, six simplex-constrained
//! optimization objectives and a buy-and-hold backtest evaluator. Market
//! data providers and persistence stores are trait-shaped collaborators;
//! the engine itself is synchronous and deterministic.

pub mod backtest;
pub mod error;
pub mod market;
pub mod optimize;
pub mod portfolio;
pub mod risk;
pub mod views;

pub use backtest::performance_metrics;
pub use backtest::portfolio_returns;
pub use error::PortfolioError;
pub use market::MarketCapProvider;
pub use market::PriceHistoryProvider;
pub use market::PriceTable;
pub use optimize::ObjectiveModel;
pub use optimize::OptimizeRequest;
pub use optimize::cvar_objective;
pub use optimize::optimize_cvar;
pub use optimize::optimize_kelly;
pub use optimize::optimize_max_diversification;
pub use optimize::optimize_mean_cvar;
pub use optimize::optimize_mean_variance;
pub use optimize::optimize_variance;
pub use portfolio::Allocation;
pub use portfolio::PortfolioSnapshot;
pub use portfolio::PortfolioState;
pub use risk::ledoit_wolf;
pub use risk::shrinkage_covariance;
pub use risk::volatility_vector;
pub use views::ViewSet;
pub use views::blended_returns;
pub use views::implied_returns;
pub use views::market_weights;
