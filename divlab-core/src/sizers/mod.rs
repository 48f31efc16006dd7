//! Risk-neutral position sizing.
//!
//! A binary contract settles at 0 or 1, so the worst case per contract is the
//! entry price for a long and `1 - entry_price` for a short. Sizing divides
//! the capital at risk by that worst case, so both directions risk exactly the
//! same capital for the same configuration.

use crate::domain::Direction;

/// Maximum loss per contract if the outcome settles against the position.
pub fn max_loss_per_contract(direction: Direction, entry_price: f64) -> f64 {
    match direction {
        Direction::Long => entry_price,
        Direction::Short => 1.0 - entry_price,
    }
}

/// Contracts such that the worst-case loss equals `capital`.
///
/// Returns `None` when the worst case is zero or the result is not finite
/// (long at price 0, short at price 1): there is no meaningful size there.
pub fn size(direction: Direction, entry_price: f64, capital: f64) -> Option<f64> {
    let risk = max_loss_per_contract(direction, entry_price);
    if risk.is_nan() || risk <= 0.0 {
        return None;
    }
    let contracts = capital / risk;
    contracts.is_finite().then_some(contracts)
}
