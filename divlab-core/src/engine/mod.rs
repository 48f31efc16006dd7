//! Simulation engine: pricing, the entry/exit state machine, and the per-game fold.

pub mod event_loop;
pub mod execution;
pub mod state;

pub use event_loop::{simulate_game, SimError, SimStats, SimulationOutcome, Simulator};
pub use execution::{CostModel, PricingModel};
pub use state::{evaluate_signal, Signal, Thresholds};
