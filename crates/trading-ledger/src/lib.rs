//! Position and session bookkeeping.
//!
//! [`PositionLedger`] owns the open set and closes positions through the
//! configured exit policy. [`SessionLedger`] books realized P&L, tracks the
//! equity curve and writes the session report.

mod positions;
mod report;
mod session;
mod statistics;
mod store;

pub use positions::PositionLedger;
pub use report::{SessionReport, TradeRow};
pub use session::{SessionConfig, SessionLedger};
pub use statistics::{compute_drawdown, SessionStats};
pub use store::{JsonlStore, MemoryStore, StoreEvent, StoredSession, StoredTrade};
