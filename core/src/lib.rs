//! Continuous-auction limit order matching engine core.
//!
//! Price-time priority matching across MARKET, LIMIT, IOC, and FOK order
//! types, with per-symbol books, a pure fee model, a generic trade/L2
//! event feed, and a best-effort audit journal. No I/O beyond journal
//! writes and subscriber callback invocation; no async runtime
//! dependency — adapters that need async (see `exchange-service`) call
//! in via `spawn_blocking`.

pub mod book;
pub mod engine;
pub mod error;
pub mod events;
pub mod fees;
pub mod journal;
pub mod price_levels;
pub mod types;

pub use book::{Book, Fill};
pub use engine::{Engine, EngineConfig};
pub use error::EngineError;
pub use events::EventFeed;
pub use fees::FeeModel;
pub use journal::{Journal, JournalEvent};
pub use price_levels::PriceLevels;
pub use types::{
    L2Update, Order, OrderId, OrderResponse, OrderResult, OrderType, PriceLevel, Side, TradeReport,
};
