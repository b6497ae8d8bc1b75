//! Core value types: order identity, fill progress, trades, and depth.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the book an order sits on / which side a taker aggressed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The opposite side, i.e. the side a taker of this side matches against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// The four order-type state machines the engine implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
    /// Immediate-Or-Cancel: fill what you can now, discard the rest.
    Ioc,
    /// Fill-Or-Kill: all quantity or nothing, checked and executed atomically.
    Fok,
}

impl OrderType {
    /// Whether this type requires a positive limit price (LIMIT, IOC, FOK).
    pub fn requires_price(self) -> bool {
        !matches!(self, OrderType::Market)
    }

    /// Whether a remainder should rest on the book after matching (LIMIT only).
    pub fn rests_remainder(self) -> bool {
        matches!(self, OrderType::Limit)
    }

    /// The journal wire encoding from spec.md §6: 0 MARKET, 1 LIMIT, 2 IOC, 3 FOK.
    pub fn type_int(self) -> u8 {
        match self {
            OrderType::Market => 0,
            OrderType::Limit => 1,
            OrderType::Ioc => 2,
            OrderType::Fok => 3,
        }
    }
}

/// Unique, caller-supplied order identity. Never generated by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An order: immutable identity plus mutable fill progress.
///
/// Once registered with the engine, every field except `filled_qty` and
/// `sequence` is immutable; `sequence` is assigned exactly once, at
/// registration, and `filled_qty` changes only under the owning book's
/// exclusive lock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    /// Price in integer ticks. Zero for MARKET; positive for LIMIT/IOC/FOK.
    pub price: i64,
    pub quantity: i64,
    pub filled_qty: i64,
    /// Adapter-supplied ingress timestamp (nanoseconds), kept for audit only.
    /// Not used for time priority — see `sequence`.
    pub timestamp: u128,
    /// Engine-assigned monotonic registration order. This, not `timestamp`,
    /// is what breaks ties within a price level (spec.md §9 Open Question).
    pub sequence: u64,
}

impl Order {
    /// Quantity still unfilled. Never negative in a well-formed order.
    pub fn remaining(&self) -> i64 {
        self.quantity - self.filled_qty
    }

    pub fn is_filled(&self) -> bool {
        self.remaining() <= 0
    }
}

/// An executed trade between a resting maker and an incoming taker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradeReport {
    pub symbol: String,
    /// Monotonically increasing, engine-wide unique, formatted `"T{n}"`.
    pub trade_id: String,
    /// Always the maker's resting price (price improvement for the aggressor).
    pub price: i64,
    pub quantity: i64,
    pub maker_fee: f64,
    pub taker_fee: f64,
    /// The taker's side.
    pub aggressor: Side,
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,
    pub timestamp: u128,
}

/// One side of an L2 snapshot: a price and the aggregate remaining quantity resting there.
pub type PriceLevel = (i64, i64);

/// Aggregated market depth, truncated to a requested number of levels per side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct L2Update {
    pub symbol: String,
    pub timestamp: u128,
    /// Descending by price.
    pub bids: Vec<PriceLevel>,
    /// Ascending by price.
    pub asks: Vec<PriceLevel>,
}

/// The outcome of a single `submit` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderResult {
    Accepted,
    RejectedInvalidParams,
    /// Reserved for a future cross-venue trade-through check; see
    /// `Book::would_trade_through` and SPEC_FULL.md §9 for why it is never
    /// triggered by this single-venue engine today.
    RejectedTradeThrough,
    RejectedFokUnfillable,
    PartiallyFilled,
    CompletelyFilled,
    /// An IOC/MARKET order that matched zero quantity. Distinct from
    /// `PartiallyFilled` so callers can tell "nothing happened" from "some
    /// quantity executed" (spec.md §9 Open Question: IOC with zero fills).
    Canceled,
}

/// The full response to a `submit` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub result: OrderResult,
    pub message: String,
    pub filled_quantity: i64,
    pub trades: Vec<TradeReport>,
}
