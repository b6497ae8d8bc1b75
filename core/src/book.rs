//! Per-symbol order book: two `PriceLevels` sides plus the shared matching
//! walk used by every order-type protocol in `engine.rs`.

use crate::price_levels::PriceLevels;
use crate::types::{L2Update, Order, OrderId, PriceLevel, Side};

/// One resting order consumed during a match step.
#[derive(Clone, Debug, PartialEq)]
pub struct Fill {
    pub maker_id: OrderId,
    pub price: i64,
    pub quantity: i64,
    /// Whether the maker's queue entry was fully consumed (vs. partially
    /// filled and pushed back to the front of its level).
    pub maker_completely_filled: bool,
    /// The maker's original `quantity`, carried through so callers can
    /// journal the maker's fill transition without a second registry lookup.
    pub maker_total_quantity: i64,
    /// The maker's cumulative `filled_qty` after this fill step.
    pub maker_filled_qty: i64,
    /// The maker's original adapter-supplied `timestamp`.
    pub maker_timestamp: u128,
}

/// Central limit order book with separate bid/ask sides.
///
/// Not thread-safe; callers wrap it in a `RwLock` (see `engine.rs`).
pub struct Book {
    pub bids: PriceLevels,
    pub asks: PriceLevels,
}

impl Book {
    pub fn new() -> Self {
        Self {
            bids: PriceLevels::new(Side::Buy),
            asks: PriceLevels::new(Side::Sell),
        }
    }

    /// Appends a resting order to its side at its price.
    ///
    /// Precondition: caller holds the exclusive lock and `order.remaining() > 0`.
    pub fn add(&mut self, order: Order) {
        debug_assert!(order.remaining() > 0, "cannot rest an order with no remaining quantity");
        match order.side {
            Side::Buy => self.bids.push(order),
            Side::Sell => self.asks.push(order),
        }
    }

    /// Removes a resting order by id from the given side.
    pub fn remove(&mut self, side: Side, id: &OrderId) -> bool {
        match side {
            Side::Buy => self.bids.remove(id),
            Side::Sell => self.asks.remove(id),
        }
    }

    /// Best bid and best ask; `0` for a side with nothing resting.
    pub fn bbo(&self) -> (i64, i64) {
        (self.bids.best_price().unwrap_or(0), self.asks.best_price().unwrap_or(0))
    }

    /// Up to `n` `(price, aggregate_remaining)` bid levels, best first.
    pub fn top_bids(&self, n: usize) -> Vec<PriceLevel> {
        self.bids.iter_levels_best_first().take(n).collect()
    }

    /// Up to `n` `(price, aggregate_remaining)` ask levels, best first.
    pub fn top_asks(&self, n: usize) -> Vec<PriceLevel> {
        self.asks.iter_levels_best_first().take(n).collect()
    }

    /// Assembles an `L2Update` truncated to `depth` levels per side.
    /// `depth` is assumed already clamped to `[1, 100]` by the caller.
    pub fn l2_snapshot(&self, symbol: &str, depth: usize, timestamp: u128) -> L2Update {
        L2Update {
            symbol: symbol.to_string(),
            timestamp,
            bids: self.top_bids(depth),
            asks: self.top_asks(depth),
        }
    }

    /// Whether a LIMIT order would trade through a better price available
    /// elsewhere.
    ///
    /// Always `false`: this is a single-venue engine with no external BBO
    /// feed to trade through. Kept as a seam (and `OrderResult` stays as
    /// `RejectedTradeThrough`) for a future cross-venue check; see
    /// SPEC_FULL.md's Open Question #1 for why the original rule — which
    /// rejected any BUY LIMIT priced above the best ask — was removed
    /// rather than kept: it forbade exactly the orders that should
    /// aggressively cross.
    pub fn would_trade_through(&self, _order: &Order) -> bool {
        false
    }

    /// Whether `taker` could be completely filled against the opposite
    /// side right now, without mutating any state. Used for the FOK
    /// precheck; caller must hold the book's exclusive lock across this
    /// call and the subsequent `match_against` to keep precheck+execute
    /// atomic.
    pub fn can_fill(&self, taker: &Order) -> bool {
        let opposite = match taker.side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };
        let mut remaining = taker.remaining();
        for (price, qty) in opposite.iter_levels_best_first() {
            if is_worse_than_limit(taker, price) {
                break;
            }
            remaining -= qty.min(remaining);
            if remaining <= 0 {
                break;
            }
        }
        remaining <= 0
    }

    /// Walks the opposite side from the best level inward, producing fills
    /// against `taker` until it is filled, the opposite side is exhausted,
    /// or (if `stop_on_worse_price`) the next level is worse than
    /// `taker.price`. Mutates `taker.filled_qty` and every matched maker's
    /// `filled_qty` in place; partially-filled makers are pushed back to
    /// the front of their level, preserving the time priority they
    /// already earned.
    pub fn match_against(&mut self, taker: &mut Order, stop_on_worse_price: bool) -> Vec<Fill> {
        let mut fills = Vec::new();
        let levels = match taker.side {
            Side::Buy => &mut self.asks,
            Side::Sell => &mut self.bids,
        };

        while taker.remaining() > 0 {
            let Some(best_px) = levels.best_price() else {
                break;
            };
            if stop_on_worse_price && is_worse_than_limit(taker, best_px) {
                break;
            }

            let mut maker = match levels.pop_best() {
                Some(o) => o,
                None => break,
            };

            let fill_qty = taker.remaining().min(maker.remaining());
            taker.filled_qty += fill_qty;
            maker.filled_qty += fill_qty;

            let maker_id = maker.id.clone();
            let maker_completely_filled = maker.is_filled();
            let maker_total_quantity = maker.quantity;
            let maker_filled_qty = maker.filled_qty;
            let maker_timestamp = maker.timestamp;
            if !maker_completely_filled {
                levels.push_front(maker);
            }

            fills.push(Fill {
                maker_id,
                price: best_px,
                quantity: fill_qty,
                maker_completely_filled,
                maker_total_quantity,
                maker_filled_qty,
                maker_timestamp,
            });
        }

        fills
    }
}

impl Default for Book {
    fn default() -> Self {
        Self::new()
    }
}

fn is_worse_than_limit(taker: &Order, level_price: i64) -> bool {
    match taker.side {
        Side::Buy => level_price > taker.price,
        Side::Sell => level_price < taker.price,
    }
}
