//! Domain types for divlab

pub mod ids;
pub mod ledger;
pub mod point;
pub mod position;
pub mod row;
pub mod trade;

pub use ids::{CacheKey, ConfigHash, InputHash};
pub use ledger::TradeLedger;
pub use point::{QuotePoint, Quote, RawPoint};
pub use position::{Direction, Position};
pub use row::AlignedRow;
pub use trade::Trade;
