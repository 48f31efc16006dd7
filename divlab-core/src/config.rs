//! Simulation configuration and eager validation.
//!
//! A `SimConfig` is immutable for the duration of a run. It is validated once
//! before any game is simulated; an invalid configuration is a caller bug and
//! aborts the whole batch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ConfigHash;

/// Errors from configuration validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("exit_threshold ({exit}) must not exceed entry_threshold ({entry})")]
    ExitAboveEntry { entry: f64, exit: f64 },
    #[error("capital must be positive, got {0}")]
    NonPositiveCapital(f64),
    #[error("{field} must lie in [0, 1), got {value}")]
    OutOfUnitRange { field: &'static str, value: f64 },
}

/// Parameters of the divergence strategy and its cost model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// |divergence| required to open a position.
    pub entry_threshold: f64,
    /// Exits fire when |divergence| crosses from at-or-above to below this.
    pub exit_threshold: f64,
    /// Minimum holding time before an exit may fire.
    pub min_hold_secs: u64,
    /// Capital at risk per trade.
    pub capital: f64,
    /// Coefficient of the convex `p * (1 - p)` fee.
    pub fee_rate: f64,
    /// Flat slippage per leg, as a fraction of capital.
    pub slippage_rate: f64,
    /// Rows earlier than `game_start + exclude_leading_secs` are not traded.
    pub exclude_leading_secs: u64,
    /// Rows later than `last_row - exclude_trailing_secs` are not traded.
    pub exclude_trailing_secs: u64,
    /// Full synthetic spread placed around an estimated mid.
    pub estimated_spread: f64,
    /// Adverse price adjustment applied to forced end-of-data closes.
    pub liquidity_penalty: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            entry_threshold: 0.05,
            exit_threshold: 0.01,
            min_hold_secs: 30,
            capital: 20.0,
            fee_rate: 0.07,
            slippage_rate: 0.0,
            exclude_leading_secs: 0,
            exclude_trailing_secs: 0,
            estimated_spread: 0.02,
            liquidity_penalty: 0.02,
        }
    }
}

impl SimConfig {
    /// Reject configurations that would make the simulation meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("entry_threshold", self.entry_threshold),
            ("exit_threshold", self.exit_threshold),
            ("capital", self.capital),
            ("fee_rate", self.fee_rate),
            ("slippage_rate", self.slippage_rate),
            ("estimated_spread", self.estimated_spread),
            ("liquidity_penalty", self.liquidity_penalty),
        ];
        for (field, value) in fields {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field, value });
            }
        }

        for (field, value) in [
            ("entry_threshold", self.entry_threshold),
            ("exit_threshold", self.exit_threshold),
            ("fee_rate", self.fee_rate),
            ("slippage_rate", self.slippage_rate),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        if self.exit_threshold > self.entry_threshold {
            return Err(ConfigError::ExitAboveEntry {
                entry: self.entry_threshold,
                exit: self.exit_threshold,
            });
        }
        if self.capital <= 0.0 {
            return Err(ConfigError::NonPositiveCapital(self.capital));
        }

        for (field, value) in [
            ("estimated_spread", self.estimated_spread),
            ("liquidity_penalty", self.liquidity_penalty),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }
        Ok(())
    }

    /// Content hash over the canonical JSON form.
    ///
    /// Field order is fixed by the struct definition, so equal configs hash equal.
    pub fn config_hash(&self) -> ConfigHash {
        // Plain numeric fields; serialization cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        ConfigHash::from_bytes(&json)
    }
}
