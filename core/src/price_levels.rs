//! Price-time priority queues for one side of a book.
//!
//! Structured around a `BTreeMap` from price to a `VecDeque` of resting
//! orders kept sorted by `sequence`, with a lazily-applied cancellation
//! set so cancelling an order is O(1) and the cost of skipping it is
//! paid only when it would otherwise have matched.
//!
//! Ordering by `sequence` rather than by raw queue-insertion order
//! matters because the engine releases the order-registry lock (where
//! `sequence` is stamped) before taking the book lock (where the order
//! is queued) — two concurrent `submit`s can reach `push` in the
//! opposite order from the one in which they registered. `push` restores
//! the correct order by inserting at the position `sequence` dictates
//! rather than always at the back.
//!
//! - Asks: lowest price is best (front of the map).
//! - Bids: highest price is best (back of the map).

use crate::types::{Order, OrderId, Side};
use std::collections::{BTreeMap, HashSet, VecDeque};

pub struct PriceLevels {
    side: Side,
    levels: BTreeMap<i64, VecDeque<Order>>,
    canceled: HashSet<OrderId>,
}

impl PriceLevels {
    /// Creates empty price levels for the given side.
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            canceled: HashSet::new(),
        }
    }

    /// Inserts an order into its price level at the position its
    /// `sequence` dictates, not necessarily at the back: a racing submit
    /// with an earlier `sequence` can reach this call after one with a
    /// later `sequence` already queued (see the module doc comment), and
    /// price-time priority must reflect registration order regardless.
    /// Creates the level if it doesn't exist yet.
    ///
    /// Precondition: `order.remaining() > 0`.
    pub fn push(&mut self, order: Order) {
        let level = self.levels.entry(order.price).or_default();
        let pos = level
            .iter()
            .rposition(|resting| resting.sequence <= order.sequence)
            .map(|i| i + 1)
            .unwrap_or(0);
        level.insert(pos, order);
    }

    /// Re-inserts a partially-filled maker at the *front* of its level's
    /// queue, preserving the time priority it already earned.
    pub fn push_front(&mut self, order: Order) {
        self.levels.entry(order.price).or_default().push_front(order);
    }

    /// Direct access to the underlying levels, for depth/state reporting.
    pub fn get_price_levels(&self) -> &BTreeMap<i64, VecDeque<Order>> {
        &self.levels
    }

    /// The best price for this side, or `None` if empty.
    ///
    /// Asks: lowest price (first key). Bids: highest price (last key).
    pub fn best_price(&self) -> Option<i64> {
        match self.side {
            Side::Sell => self.levels.first_key_value().map(|(px, _)| *px),
            Side::Buy => self.levels.last_key_value().map(|(px, _)| *px),
        }
    }

    /// Number of orders (including lazily-cancelled ones) queued at the best price.
    pub fn best_level_size(&self) -> usize {
        match self.best_price() {
            Some(px) => self.levels.get(&px).map(|q| q.len()).unwrap_or(0),
            None => 0,
        }
    }

    /// Removes and returns the best-priced, oldest live order.
    ///
    /// Skips and drops any lazily-cancelled orders at the front of a
    /// queue, cleaning up levels that become empty in the process.
    pub fn pop_best(&mut self) -> Option<Order> {
        loop {
            let px = self.best_price()?;
            let q = self.levels.get_mut(&px)?;

            while let Some(front) = q.front() {
                if self.canceled.remove(&front.id) {
                    q.pop_front();
                } else {
                    break;
                }
            }

            match q.pop_front() {
                Some(order) => {
                    if q.is_empty() {
                        self.levels.remove(&px);
                    }
                    return Some(order);
                }
                None => {
                    self.levels.remove(&px);
                }
            }
        }
    }

    /// Peeks at the best-priced, oldest live order without removing it.
    pub fn peek_best(&self) -> Option<&Order> {
        for (_, q) in self.iter_levels_raw() {
            if let Some(order) = q.iter().find(|o| !self.canceled.contains(&o.id)) {
                return Some(order);
            }
        }
        None
    }

    /// Marks an order for lazy removal. Returns `true` if it was live and
    /// not already cancelled.
    pub fn cancel(&mut self, id: OrderId) -> bool {
        if self.level_contains(&id) {
            self.canceled.insert(id)
        } else {
            false
        }
    }

    /// Eagerly removes an order from its queue, cleaning up an emptied
    /// level. O(level size); used off the matching hot path (e.g. an
    /// adapter that wants cancellation reflected immediately in depth).
    pub fn remove(&mut self, id: &OrderId) -> bool {
        self.canceled.remove(id);
        let mut emptied_price = None;
        let mut removed = false;
        for (px, q) in self.levels.iter_mut() {
            if let Some(pos) = q.iter().position(|o| &o.id == id) {
                q.remove(pos);
                removed = true;
                if q.is_empty() {
                    emptied_price = Some(*px);
                }
                break;
            }
        }
        if let Some(px) = emptied_price {
            self.levels.remove(&px);
        }
        removed
    }

    /// Total live (non-cancelled) remaining quantity resting on this side.
    pub fn total_len(&self) -> i64 {
        self.levels
            .values()
            .flat_map(|q| q.iter())
            .filter(|o| !self.canceled.contains(&o.id))
            .map(|o| o.remaining())
            .sum()
    }

    /// Aggregate live remaining quantity resting at a specific price.
    pub fn qty_at_price(&self, price: i64) -> i64 {
        self.levels
            .get(&price)
            .map(|q| {
                q.iter()
                    .filter(|o| !self.canceled.contains(&o.id))
                    .map(|o| o.remaining())
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Iterates `(price, aggregate_remaining_qty)` pairs in best-first order
    /// for this side. Levels whose live aggregate is zero are skipped
    /// (cancellation can transiently empty a level of live quantity before
    /// it's popped).
    pub fn iter_levels_best_first(&self) -> impl Iterator<Item = (i64, i64)> + '_ {
        self.iter_levels_raw()
            .map(|(px, q)| {
                let qty: i64 = q
                    .iter()
                    .filter(|o| !self.canceled.contains(&o.id))
                    .map(|o| o.remaining())
                    .sum();
                (px, qty)
            })
            .filter(|(_, qty)| *qty > 0)
    }

    fn iter_levels_raw(&self) -> Box<dyn Iterator<Item = (i64, &VecDeque<Order>)> + '_> {
        match self.side {
            Side::Sell => Box::new(self.levels.iter().map(|(px, q)| (*px, q))),
            Side::Buy => Box::new(self.levels.iter().rev().map(|(px, q)| (*px, q))),
        }
    }

    fn level_contains(&self, id: &OrderId) -> bool {
        self.levels.values().any(|q| q.iter().any(|o| &o.id == id))
    }
}
