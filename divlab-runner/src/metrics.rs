//! Metrics aggregator: pure reductions over trade ledgers.
//!
//! Every metric is computed from realized trades alone. Ratios that have no
//! meaningful value (no trades, no losses, zero dispersion) are `None` rather
//! than NaN, infinity, or a sentinel cap.
//!
//! Counts and sums live in [`TradeTotals`], which merges exactly across
//! partitions. Drawdown and the Sharpe-like ratio depend on the whole
//! sequence and are not additive.

use serde::{Deserialize, Serialize};

use divlab_core::domain::{Trade, TradeLedger};

/// Additive statistics: merging the totals of two disjoint trade sets equals
/// the totals of their union.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeTotals {
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub forced_closes: usize,
    pub gross_profit: f64,
    pub total_fees: f64,
    pub total_slippage: f64,
    pub net_profit: f64,
    /// Sum of positive net profits.
    pub gross_wins: f64,
    /// Absolute sum of negative net profits.
    pub gross_losses: f64,
}

impl TradeTotals {
    pub fn add(&mut self, trade: &Trade) {
        self.trade_count += 1;
        if trade.is_winner() {
            self.winning_trades += 1;
            self.gross_wins += trade.net_profit;
        } else if trade.is_loser() {
            self.losing_trades += 1;
            self.gross_losses += trade.net_profit.abs();
        }
        if trade.forced_close {
            self.forced_closes += 1;
        }
        self.gross_profit += trade.gross_profit;
        self.total_fees += trade.fees;
        self.total_slippage += trade.slippage;
        self.net_profit += trade.net_profit;
    }

    pub fn merge(&mut self, other: &TradeTotals) {
        self.trade_count += other.trade_count;
        self.winning_trades += other.winning_trades;
        self.losing_trades += other.losing_trades;
        self.forced_closes += other.forced_closes;
        self.gross_profit += other.gross_profit;
        self.total_fees += other.total_fees;
        self.total_slippage += other.total_slippage;
        self.net_profit += other.net_profit;
        self.gross_wins += other.gross_wins;
        self.gross_losses += other.gross_losses;
    }
}

/// Portfolio-level statistics over one or many ledgers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeMetrics {
    #[serde(flatten)]
    pub totals: TradeTotals,
    pub win_rate: Option<f64>,
    /// Mean net profit per trade.
    pub expectancy: Option<f64>,
    /// Gross wins over gross losses; undefined with no losing trade.
    pub profit_factor: Option<f64>,
    /// Largest peak-to-trough fall of cumulative net profit, as a
    /// non-negative amount. The curve starts at zero.
    pub max_drawdown: f64,
    /// Sample standard deviation of per-trade net profit.
    pub profit_std_dev: Option<f64>,
    /// Mean over standard deviation of per-trade net profit.
    pub sharpe: Option<f64>,
}

impl TradeMetrics {
    /// Compute all metrics from a trade list.
    pub fn compute(trades: &[Trade]) -> Self {
        let refs: Vec<&Trade> = trades.iter().collect();
        Self::from_refs(refs)
    }

    /// Compute metrics over the union of several ledgers.
    pub fn from_ledgers<'a, I>(ledgers: I) -> Self
    where
        I: IntoIterator<Item = &'a TradeLedger>,
    {
        let refs: Vec<&Trade> = ledgers.into_iter().flat_map(|l| l.trades()).collect();
        Self::from_refs(refs)
    }

    fn from_refs(mut trades: Vec<&Trade>) -> Self {
        // Stable: ties on exit time keep ledger order.
        trades.sort_by_key(|t| (t.exit_time, t.entry_time));

        let mut totals = TradeTotals::default();
        for trade in &trades {
            totals.add(trade);
        }
        let profits: Vec<f64> = trades.iter().map(|t| t.net_profit).collect();

        Self {
            win_rate: win_rate(&totals),
            expectancy: expectancy(&totals),
            profit_factor: profit_factor(&totals),
            max_drawdown: max_drawdown(&profits),
            profit_std_dev: std_dev(&profits),
            sharpe: sharpe_ratio(&profits),
            totals,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Fraction of trades with positive net profit.
pub fn win_rate(totals: &TradeTotals) -> Option<f64> {
    (totals.trade_count > 0).then(|| totals.winning_trades as f64 / totals.trade_count as f64)
}

/// Mean net profit per trade.
pub fn expectancy(totals: &TradeTotals) -> Option<f64> {
    (totals.trade_count > 0).then(|| totals.net_profit / totals.trade_count as f64)
}

/// Gross wins / gross losses. `None` when nothing was lost.
pub fn profit_factor(totals: &TradeTotals) -> Option<f64> {
    (totals.gross_losses > 0.0).then(|| totals.gross_wins / totals.gross_losses)
}

/// Maximum drawdown of the cumulative profit curve, in currency.
///
/// `profits` must already be in exit-time order.
pub fn max_drawdown(profits: &[f64]) -> f64 {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for p in profits {
        cumulative += p;
        peak = peak.max(cumulative);
        max_dd = max_dd.max(peak - cumulative);
    }
    max_dd
}

/// Sample standard deviation. `None` below two observations.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Mean / standard deviation of per-trade profit, not annualized.
///
/// `None` below two trades or with zero dispersion.
pub fn sharpe_ratio(profits: &[f64]) -> Option<f64> {
    let std = std_dev(profits)?;
    if std == 0.0 {
        return None;
    }
    Some(mean_f64(profits) / std)
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
