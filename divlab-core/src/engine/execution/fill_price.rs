//! Execution prices from a quote.
//!
//! Longs buy the ask and sell the bid; shorts sell the bid and buy back the
//! ask. An estimated mid has no book, so a synthetic spread is placed around
//! it. Forced end-of-data closes take an extra adverse liquidity penalty.

use crate::domain::{Direction, Quote};

/// The bid and ask actually tradable against a quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutableQuote {
    pub bid: f64,
    pub ask: f64,
    pub estimated: bool,
}

/// Resolve a quote into tradable prices, clamped to [0, 1].
pub fn executable_quote(quote: &Quote, estimated_spread: f64) -> ExecutableQuote {
    match *quote {
        Quote::TwoSided { bid, ask } => ExecutableQuote {
            bid,
            ask,
            estimated: false,
        },
        Quote::EstimatedMid { mid } => {
            let half = estimated_spread / 2.0;
            ExecutableQuote {
                bid: (mid - half).max(0.0),
                ask: (mid + half).min(1.0),
                estimated: true,
            }
        }
    }
}

/// Price paid (long) or received (short) to open.
pub fn entry_price(direction: Direction, quote: &ExecutableQuote) -> f64 {
    match direction {
        Direction::Long => quote.ask,
        Direction::Short => quote.bid,
    }
}

/// Price received (long) or paid (short) to close.
///
/// `penalty` is only non-zero for forced closes.
pub fn exit_price(direction: Direction, quote: &ExecutableQuote, penalty: f64) -> f64 {
    match direction {
        Direction::Long => (quote.bid - penalty).max(0.0),
        Direction::Short => (quote.ask + penalty).min(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_sided_quote_passes_through() {
        let q = executable_quote(&Quote::TwoSided { bid: 0.48, ask: 0.52 }, 0.10);
        assert_eq!(q.bid, 0.48);
        assert_eq!(q.ask, 0.52);
        assert!(!q.estimated);
    }

    #[test]
    fn estimated_mid_gets_synthetic_spread() {
        let q = executable_quote(&Quote::EstimatedMid { mid: 0.50 }, 0.04);
        assert!((q.bid - 0.48).abs() < 1e-12);
        assert!((q.ask - 0.52).abs() < 1e-12);
        assert!(q.estimated);
    }

    #[test]
    fn synthetic_spread_clamped_to_unit_interval() {
        let q = executable_quote(&Quote::EstimatedMid { mid: 0.99 }, 0.04);
        assert_eq!(q.ask, 1.0);
        let q = executable_quote(&Quote::EstimatedMid { mid: 0.01 }, 0.04);
        assert_eq!(q.bid, 0.0);
    }

    #[test]
    fn long_buys_ask_sells_bid() {
        let q = executable_quote(&Quote::TwoSided { bid: 0.40, ask: 0.42 }, 0.0);
        assert_eq!(entry_price(Direction::Long, &q), 0.42);
        assert_eq!(exit_price(Direction::Long, &q, 0.0), 0.40);
    }

    #[test]
    fn short_sells_bid_buys_ask() {
        let q = executable_quote(&Quote::TwoSided { bid: 0.40, ask: 0.42 }, 0.0);
        assert_eq!(entry_price(Direction::Short, &q), 0.40);
        assert_eq!(exit_price(Direction::Short, &q, 0.0), 0.42);
    }

    #[test]
    fn penalty_is_always_adverse() {
        let q = executable_quote(&Quote::TwoSided { bid: 0.40, ask: 0.42 }, 0.0);
        assert!((exit_price(Direction::Long, &q, 0.05) - 0.35).abs() < 1e-12);
        assert!((exit_price(Direction::Short, &q, 0.05) - 0.47).abs() < 1e-12);
        assert_eq!(exit_price(Direction::Long, &q, 0.9), 0.0);
    }
}
