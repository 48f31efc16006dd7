//! Pricing & cost model: turns a signal on a row into a position, and a
//! position plus a closing row into a trade.

pub mod cost_model;
pub mod fill_price;

pub use cost_model::CostModel;
pub use fill_price::{entry_price, executable_quote, exit_price, ExecutableQuote};

use crate::config::SimConfig;
use crate::domain::{AlignedRow, Direction, Position, Trade};
use crate::sizers;

/// Prices entries and exits for one configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingModel {
    pub capital: f64,
    pub costs: CostModel,
    pub estimated_spread: f64,
    pub liquidity_penalty: f64,
}

impl PricingModel {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            capital: config.capital,
            costs: CostModel::from_config(config),
            estimated_spread: config.estimated_spread,
            liquidity_penalty: config.liquidity_penalty,
        }
    }

    /// Open a position at `row`. `None` when sizing is undefined at the
    /// execution price.
    pub fn open(&self, direction: Direction, row: &AlignedRow) -> Option<Position> {
        let quote = executable_quote(&row.quote, self.estimated_spread);
        let price = entry_price(direction, &quote);
        let contracts = sizers::size(direction, price, self.capital)?;
        Some(Position {
            direction,
            entry_time: row.canonical_time,
            entry_price: price,
            contracts,
            entry_divergence: row.divergence(),
            entry_fee: self.costs.fee(price, self.capital),
            entry_slippage: self.costs.slippage(self.capital),
            estimated_entry: quote.estimated,
        })
    }

    /// Close `position` at `row`. Forced closes take the liquidity penalty.
    pub fn close(&self, position: &Position, row: &AlignedRow, forced: bool) -> Trade {
        let quote = executable_quote(&row.quote, self.estimated_spread);
        let penalty = if forced { self.liquidity_penalty } else { 0.0 };
        let price = exit_price(position.direction, &quote, penalty);

        let gross_profit = gross_profit(
            position.direction,
            position.entry_price,
            price,
            position.contracts,
        );
        let fees = position.entry_fee + self.costs.fee(price, self.capital);
        let slippage = position.entry_slippage + self.costs.slippage(self.capital);

        Trade {
            direction: position.direction,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            entry_divergence: position.entry_divergence,
            exit_time: row.canonical_time,
            exit_price: price,
            exit_divergence: row.divergence(),
            contracts: position.contracts,
            gross_profit,
            fees,
            slippage,
            net_profit: gross_profit - fees - slippage,
            forced_close: forced,
            estimated_quote: position.estimated_entry || quote.estimated,
        }
    }
}

/// Signed profit before costs: `(exit - entry) * contracts`, mirrored for shorts.
pub fn gross_profit(direction: Direction, entry_price: f64, exit_price: f64, contracts: f64) -> f64 {
    match direction {
        Direction::Long => (exit_price - entry_price) * contracts,
        Direction::Short => (entry_price - exit_price) * contracts,
    }
}
