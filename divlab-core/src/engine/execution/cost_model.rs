//! Cost model: convex fees and flat slippage.
//!
//! The fee for one leg is `fee_rate * p * (1 - p) * capital`: largest at
//! p = 0.5, vanishing toward certainty. Slippage, when enabled, is a flat
//! `slippage_rate * capital` per leg. The bid/ask spread is already in the
//! execution prices and is never charged again here.

use crate::config::SimConfig;

/// Per-leg transaction costs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub fee_rate: f64,
    pub slippage_rate: f64,
}

impl CostModel {
    pub fn new(fee_rate: f64, slippage_rate: f64) -> Self {
        Self {
            fee_rate,
            slippage_rate,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.fee_rate, config.slippage_rate)
    }

    pub fn frictionless() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Fee for one leg executed at `price` with `capital` at risk.
    pub fn fee(&self, price: f64, capital: f64) -> f64 {
        self.fee_rate * price * (1.0 - price) * capital
    }

    /// Slippage for one leg.
    pub fn slippage(&self, capital: f64) -> f64 {
        self.slippage_rate * capital
    }
}
