//! # Optimizer Suite
//!
//! $$
//! \mathbf{w}^\* = \arg\min_{\mathbf{w}\in\Delta^{N-1}} f(\mathbf{w})
//! $$
//!
//! Six constrained objectives over simplex-constrained portfolio weights.

pub mod objectives;
pub mod simplex;
pub mod types;

pub use objectives::cvar_objective;
pub use objectives::optimize_cvar;
pub use objectives::optimize_kelly;
pub use objectives::optimize_max_diversification;
pub use objectives::optimize_mean_cvar;
pub use objectives::optimize_mean_variance;
pub use objectives::optimize_variance;
pub use simplex::softmax;
pub use types::ObjectiveModel;
pub use types::OptimizeRequest;
