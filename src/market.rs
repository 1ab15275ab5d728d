//! # Market Data Interfaces
//!
//! $$
//! \{p^{(i)}_1, \dots, p^{(i)}_{T_i}\}_{i=1..N}
//! $$
//!
//! Provider traits and the per-ticker closing-price table consumed by the
//! engine. Implementations (network clients, throttling) live outside the
//! crate; the engine only depends on these interfaces.

use crate::error::PortfolioError;
use crate::error::Result;

/// Chronological closing prices per ticker, in universe order.
#[derive(Clone, Debug)]
pub struct PriceTable {
  tickers: Vec<String>,
  closes: Vec<Vec<f64>>,
}

impl PriceTable {
  /// Build a table from parallel ticker/close vectors.
  pub fn new(tickers: Vec<String>, closes: Vec<Vec<f64>>) -> Result<Self> {
    if tickers.len() != closes.len() {
      return Err(PortfolioError::DataFetch(format!(
        "price table shape mismatch: {} tickers, {} series",
        tickers.len(),
        closes.len()
      )));
    }
    Ok(Self { tickers, closes })
  }

  /// Number of assets in the table.
  pub fn len(&self) -> usize {
    self.tickers.len()
  }

  /// True when the table holds no assets or only empty series.
  pub fn is_empty(&self) -> bool {
    self.tickers.is_empty() || self.closes.iter().all(|c| c.is_empty())
  }

  /// Tickers in universe order.
  pub fn tickers(&self) -> &[String] {
    &self.tickers
  }

  /// Closing prices for the asset at `idx`.
  pub fn closes(&self, idx: usize) -> &[f64] {
    &self.closes[idx]
  }

  /// A new table keeping only the most recent `window` closes per asset.
  pub fn tail(&self, window: usize) -> Self {
    let closes = self
      .closes
      .iter()
      .map(|c| c[c.len().saturating_sub(window)..].to_vec())
      .collect();
    Self {
      tickers: self.tickers.clone(),
      closes,
    }
  }
}

/// Source of historical closing prices.
///
/// May block; upstream throttling (roughly one request per second per
/// ticker) is the implementation's concern, not the engine's.
pub trait PriceHistoryProvider {
  /// Fetch up to `lookback_days` of daily closes for each ticker.
  fn fetch(&self, tickers: &[String], lookback_days: u32) -> Result<PriceTable>;
}

/// Source of market capitalization for equilibrium weighting.
pub trait MarketCapProvider {
  /// Capitalization for one ticker; `None` when unavailable.
  fn capitalization(&self, ticker: &str) -> Option<f64>;
}
