//! TradeLedger: the ordered trades of one game.

use super::trade::Trade;
use serde::{Deserialize, Serialize};

/// Append-only list of trades for a single game, in exit-time order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeLedger {
    pub game_id: String,
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            trades: Vec::new(),
        }
    }

    /// Append a trade. Exit times must be non-decreasing; the state machine
    /// only closes one position at a time, so a regression is a bug.
    pub fn push(&mut self, trade: Trade) {
        debug_assert!(
            self.trades
                .last()
                .map_or(true, |last| last.exit_time <= trade.entry_time),
            "trades must not overlap within a game"
        );
        self.trades.push(trade);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn forced_closes(&self) -> usize {
        self.trades.iter().filter(|t| t.forced_close).count()
    }

    pub fn net_profit(&self) -> f64 {
        self.trades.iter().map(|t| t.net_profit).sum()
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }
}

impl<'a> IntoIterator for &'a TradeLedger {
    type Item = &'a Trade;
    type IntoIter = std::slice::Iter<'a, Trade>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.iter()
    }
}
