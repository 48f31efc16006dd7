use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an open position on the binary outcome.
///
/// Long buys the outcome at the ask; short sells it at the bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// The single open position of a game. A flat game holds `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub direction: Direction,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub contracts: f64,
    pub entry_divergence: f64,
    pub entry_fee: f64,
    pub entry_slippage: f64,
    /// Entry was priced off a synthesized spread.
    pub estimated_entry: bool,
}

impl Position {
    /// Seconds held as of `now`, at millisecond resolution.
    pub fn held_secs(&self, now: DateTime<Utc>) -> f64 {
        (now - self.entry_time).num_milliseconds() as f64 / 1000.0
    }

    pub fn unrealized_profit(&self, mark: f64) -> f64 {
        self.direction.sign() * (mark - self.entry_price) * self.contracts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn position(direction: Direction) -> Position {
        Position {
            direction,
            entry_time: Utc.with_ymd_and_hms(2024, 3, 1, 19, 0, 0).unwrap(),
            entry_price: 0.40,
            contracts: 50.0,
            entry_divergence: 0.08,
            entry_fee: 0.0,
            entry_slippage: 0.0,
            estimated_entry: false,
        }
    }

    #[test]
    fn held_secs_uses_milliseconds() {
        let p = position(Direction::Long);
        let now = p.entry_time + Duration::milliseconds(30_500);
        assert_eq!(p.held_secs(now), 30.5);
    }

    #[test]
    fn unrealized_profit_is_mirrored_for_short() {
        let long = position(Direction::Long);
        let short = position(Direction::Short);
        assert!((long.unrealized_profit(0.50) - 5.0).abs() < 1e-9);
        assert!((short.unrealized_profit(0.50) + 5.0).abs() < 1e-9);
    }
}
