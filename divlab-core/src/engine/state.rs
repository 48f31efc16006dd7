//! Entry/exit state machine: per-row signal evaluation.
//!
//! A game is FLAT, LONG or SHORT. Evaluation is a pure function of the
//! current position, the previous row's divergence and the current row.
//!
//! - Enter long: flat, divergence above the entry threshold and strictly
//!   wider than on the previous row.
//! - Enter short: the mirror image below the negative threshold.
//! - Exit: held at least `min_hold_secs`, and |divergence| crossed from at or
//!   above the exit threshold on the previous row to below it now. Being
//!   inside the band is not enough; the crossing itself fires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::domain::{Direction, Position};

/// What one row asks the state machine to do. At most one fires per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Hold,
    Enter(Direction),
    Exit,
    /// Long and short entry conditions both held. Cannot happen for a
    /// non-negative entry threshold; never acted on.
    Conflict,
}

/// The thresholds the state machine reads from a `SimConfig`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub entry: f64,
    pub exit: f64,
    pub min_hold_secs: f64,
}

impl Thresholds {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            entry: config.entry_threshold,
            exit: config.exit_threshold,
            min_hold_secs: config.min_hold_secs as f64,
        }
    }
}

/// Evaluate one row.
///
/// `prev_divergence` is the divergence of the row immediately before this
/// one, whatever the state was then; `None` on the first row.
pub fn evaluate_signal(
    thresholds: &Thresholds,
    position: Option<&Position>,
    prev_divergence: Option<f64>,
    divergence: f64,
    now: DateTime<Utc>,
) -> Signal {
    let Some(prev) = prev_divergence else {
        return Signal::Hold;
    };

    match position {
        None => {
            let long = divergence > thresholds.entry && divergence > prev;
            let short = divergence < -thresholds.entry && divergence < prev;
            match (long, short) {
                (true, true) => Signal::Conflict,
                (true, false) => Signal::Enter(Direction::Long),
                (false, true) => Signal::Enter(Direction::Short),
                (false, false) => Signal::Hold,
            }
        }
        Some(position) => {
            let held = position.held_secs(now) >= thresholds.min_hold_secs;
            let crossed = prev.abs() >= thresholds.exit && divergence.abs() < thresholds.exit;
            if held && crossed {
                Signal::Exit
            } else {
                Signal::Hold
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 19, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn thresholds() -> Thresholds {
        Thresholds {
            entry: 0.05,
            exit: 0.01,
            min_hold_secs: 30.0,
        }
    }

    fn open(direction: Direction, at: i64) -> Position {
        Position {
            direction,
            entry_time: t(at),
            entry_price: 0.5,
            contracts: 40.0,
            entry_divergence: 0.09,
            entry_fee: 0.0,
            entry_slippage: 0.0,
            estimated_entry: false,
        }
    }

    #[test]
    fn first_row_never_enters() {
        assert_eq!(
            evaluate_signal(&thresholds(), None, None, 0.20, t(0)),
            Signal::Hold
        );
    }

    #[test]
    fn long_entry_requires_widening() {
        let th = thresholds();
        assert_eq!(
            evaluate_signal(&th, None, Some(0.01), 0.09, t(60)),
            Signal::Enter(Direction::Long)
        );
        // Above threshold but narrowing.
        assert_eq!(
            evaluate_signal(&th, None, Some(0.10), 0.09, t(60)),
            Signal::Hold
        );
        // Equal to previous is not strictly wider.
        assert_eq!(
            evaluate_signal(&th, None, Some(0.09), 0.09, t(60)),
            Signal::Hold
        );
    }

    #[test]
    fn short_entry_mirrors_long() {
        let th = thresholds();
        assert_eq!(
            evaluate_signal(&th, None, Some(-0.02), -0.07, t(60)),
            Signal::Enter(Direction::Short)
        );
        assert_eq!(
            evaluate_signal(&th, None, Some(-0.08), -0.07, t(60)),
            Signal::Hold
        );
    }

    #[test]
    fn threshold_itself_does_not_enter() {
        assert_eq!(
            evaluate_signal(&thresholds(), None, Some(0.0), 0.05, t(60)),
            Signal::Hold
        );
    }

    #[test]
    fn exit_fires_on_crossing_only() {
        let th = thresholds();
        let pos = open(Direction::Long, 0);
        assert_eq!(
            evaluate_signal(&th, Some(&pos), Some(0.02), 0.005, t(60)),
            Signal::Exit
        );
        // Already inside the band on the previous row.
        assert_eq!(
            evaluate_signal(&th, Some(&pos), Some(0.009), 0.005, t(60)),
            Signal::Hold
        );
    }

    #[test]
    fn exit_uses_absolute_divergence() {
        let pos = open(Direction::Short, 0);
        assert_eq!(
            evaluate_signal(&thresholds(), Some(&pos), Some(-0.03), -0.002, t(45)),
            Signal::Exit
        );
    }

    #[test]
    fn exit_waits_for_min_hold() {
        let th = thresholds();
        let pos = open(Direction::Long, 0);
        assert_eq!(
            evaluate_signal(&th, Some(&pos), Some(0.02), 0.0, t(29)),
            Signal::Hold
        );
        assert_eq!(
            evaluate_signal(&th, Some(&pos), Some(0.02), 0.0, t(30)),
            Signal::Exit
        );
    }

    #[test]
    fn open_position_ignores_entry_conditions() {
        let pos = open(Direction::Long, 0);
        assert_eq!(
            evaluate_signal(&thresholds(), Some(&pos), Some(-0.01), -0.2, t(90)),
            Signal::Hold
        );
    }

    #[test]
    fn thresholds_from_config() {
        let th = Thresholds::from_config(&SimConfig::default());
        assert_eq!(th.entry, 0.05);
        assert_eq!(th.exit, 0.01);
        assert_eq!(th.min_hold_secs, 30.0);
    }
}
