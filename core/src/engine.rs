//! The matching engine: owns the order registry and the per-symbol book
//! registry, implements the MARKET/LIMIT/IOC/FOK protocols over the
//! shared matching core in `book.rs`, and publishes trade/L2 events.
//!
//! Lock order, strictly enforced: order registry → book registry → a
//! single book. No thread holds a later lock while acquiring an earlier
//! one; the event feed's internal mutex is only ever taken after all
//! three are released. Grounded on `exchange-service/src/exchange.rs`'s
//! `DashMap<String, RwLock<OrderBook>>`, with the async `tokio::sync::RwLock`
//! there replaced by `std::sync::RwLock` — the core performs no I/O of its
//! own, so there is nothing for an async lock to avoid blocking.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::book::Book;
use crate::error::EngineError;
use crate::events::EventFeed;
use crate::fees::FeeModel;
use crate::journal::{Journal, JournalEvent};
use crate::types::{
    L2Update, Order, OrderId, OrderResponse, OrderResult, OrderType, TradeReport,
};

const MIN_L2_DEPTH: usize = 1;
const MAX_L2_DEPTH: usize = 100;

/// Engine-wide tunables. Fee rates and the default L2 depth are the only
/// values a caller can override; everything else about the matching
/// protocol is fixed by the spec.
#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    pub fee_model: FeeModel,
    pub default_l2_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_model: FeeModel::default(),
            default_l2_depth: 10,
        }
    }
}

impl EngineConfig {
    pub fn with_fee_model(mut self, fee_model: FeeModel) -> Self {
        self.fee_model = fee_model;
        self
    }

    /// Sets the default L2 depth, clamped to `[1, 100]` per spec.md §4.10.
    pub fn with_default_l2_depth(mut self, depth: usize) -> Self {
        self.default_l2_depth = depth.clamp(MIN_L2_DEPTH, MAX_L2_DEPTH);
        self
    }

    /// Rejects configurations that can never be expressed as an
    /// `OrderResult` because they're wrong before an `Engine` exists at
    /// all — a negative or non-finite fee rate, for instance.
    pub fn validate(&self) -> Result<(), EngineError> {
        let rates = [self.fee_model.maker_rate, self.fee_model.taker_rate];
        if rates.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "fee rates must be finite and non-negative, got maker={} taker={}",
                self.fee_model.maker_rate, self.fee_model.taker_rate
            )));
        }
        Ok(())
    }
}

pub struct Engine {
    registry: RwLock<HashMap<OrderId, Order>>,
    books: DashMap<String, Arc<RwLock<Book>>>,
    sequence_counter: AtomicU64,
    trade_id_counter: AtomicU64,
    config: EngineConfig,
    journal: Journal,
    pub trade_feed: EventFeed<TradeReport>,
    pub l2_feed: EventFeed<L2Update>,
}

impl Engine {
    pub fn new(config: EngineConfig, journal: Journal) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            books: DashMap::new(),
            sequence_counter: AtomicU64::new(0),
            trade_id_counter: AtomicU64::new(0),
            config,
            journal,
            trade_feed: EventFeed::new(),
            l2_feed: EventFeed::new(),
        }
    }

    /// Like `new`, but rejects an `EngineConfig` that can never be
    /// expressed as an `OrderResult` (see `EngineConfig::validate`).
    /// Adapters that accept config from the outside world (CLI flags,
    /// env vars) should prefer this over `new`.
    pub fn try_new(config: EngineConfig, journal: Journal) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::new(config, journal))
    }

    /// An engine with default config and no audit journal. Convenient for
    /// tests and benchmarks.
    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default(), Journal::disabled())
    }

    /// Submits an order for matching.
    ///
    /// `order.filled_qty` and `order.sequence` are ignored and reset by the
    /// engine: callers construct an order with `filled_qty: 0` and any
    /// placeholder `sequence`, and the engine assigns the real registration
    /// sequence under the registry lock.
    pub fn submit(&self, mut order: Order) -> OrderResponse {
        if let Some(rejection) = self.validate(&order) {
            return rejection;
        }

        order.filled_qty = 0;
        order.sequence = self.sequence_counter.fetch_add(1, Ordering::SeqCst);

        {
            let mut registry = self.registry.write().expect("order registry poisoned");
            registry.insert(order.id.clone(), order.clone());
        }

        self.journal.log(JournalEvent::New, &order);
        tracing::trace!(order_id = %order.id, symbol = %order.symbol, "order registered");

        let book = self.book_for(&order.symbol);

        // Published while the book's write lock is still held (inside each
        // run_* below), so that two concurrent submits to the same book are
        // observed by subscribers in the order they committed, and a given
        // submit's trades are always published before its L2 update.
        let (result, trades) = match order.order_type {
            OrderType::Market => self.run_market(&book, &mut order),
            OrderType::Limit => self.run_limit(&book, &mut order),
            OrderType::Ioc => self.run_ioc(&book, &mut order),
            OrderType::Fok => self.run_fok(&book, &mut order),
        };

        for trade in &trades {
            self.apply_fill_to_registry(&trade.maker_order_id, trade.quantity);
        }
        self.update_registered_order(&order);

        OrderResponse {
            result,
            message: result_message(result),
            filled_quantity: order.filled_qty,
            trades,
        }
    }

    /// Cancels a resting order. Searches both sides since the caller may
    /// not know which side an id rests on, mirroring the teacher's
    /// `Exchange::cancel_order`.
    pub fn cancel_order(&self, symbol: &str, id: &OrderId) -> bool {
        let Some(book) = self.books.get(symbol).map(|entry| entry.clone()) else {
            return false;
        };
        let mut book = book.write().expect("book lock poisoned");
        let removed = book.bids.remove(id) || book.asks.remove(id);
        drop(book);

        if removed {
            if let Some(order) = self.registry.read().expect("order registry poisoned").get(id) {
                self.journal.log(JournalEvent::Canceled, order);
            }
        }
        removed
    }

    /// Best bid/offer for `symbol`; `(0, 0)` if the symbol is unknown or empty.
    pub fn bbo(&self, symbol: &str) -> (i64, i64) {
        let Some(book) = self.books.get(symbol).map(|entry| entry.clone()) else {
            return (0, 0);
        };
        book.read().expect("book lock poisoned").bbo()
    }

    /// L2 snapshot for `symbol`, truncated to `depth` (clamped to
    /// `[1, 100]`; `None` uses the engine's configured default).
    pub fn l2(&self, symbol: &str, depth: Option<usize>) -> L2Update {
        let depth = depth.unwrap_or(self.config.default_l2_depth).clamp(MIN_L2_DEPTH, MAX_L2_DEPTH);
        let Some(book) = self.books.get(symbol).map(|entry| entry.clone()) else {
            return L2Update {
                symbol: symbol.to_string(),
                timestamp: now_nanos(),
                bids: Vec::new(),
                asks: Vec::new(),
            };
        };
        let book = book.read().expect("book lock poisoned");
        book.l2_snapshot(symbol, depth, now_nanos())
    }

    /// Current view of an order, if it has ever been registered.
    pub fn order_status(&self, id: &OrderId) -> Option<Order> {
        self.registry.read().expect("order registry poisoned").get(id).cloned()
    }

    /// All symbols with a book registered so far (i.e. that have seen at
    /// least one `submit` or `ensure_symbol` call), in arbitrary order.
    pub fn symbols(&self) -> Vec<String> {
        self.books.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Creates an empty book for `symbol` if one doesn't already exist.
    /// Used by adapters that want a known symbol list to exist before the
    /// first order arrives.
    pub fn ensure_symbol(&self, symbol: &str) {
        self.book_for(symbol);
    }

    fn validate(&self, order: &Order) -> Option<OrderResponse> {
        let invalid = order.id.0.is_empty()
            || order.symbol.is_empty()
            || order.quantity <= 0
            || (order.order_type.requires_price() && order.price <= 0)
            || self
                .registry
                .read()
                .expect("order registry poisoned")
                .contains_key(&order.id);

        if invalid {
            Some(OrderResponse {
                result: OrderResult::RejectedInvalidParams,
                message: "invalid or duplicate order".to_string(),
                filled_quantity: 0,
                trades: Vec::new(),
            })
        } else {
            None
        }
    }

    fn book_for(&self, symbol: &str) -> Arc<RwLock<Book>> {
        self.books
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(Book::new())))
            .clone()
    }

    fn run_market(&self, book: &Arc<RwLock<Book>>, taker: &mut Order) -> (OrderResult, Vec<TradeReport>) {
        let mut book = book.write().expect("book lock poisoned");
        let fills = book.match_against(taker, false);
        let trades = self.finalize_fills(taker, &fills);
        self.publish_locked(&book, taker, &trades, !trades.is_empty());
        (classify_non_resting(taker), trades)
    }

    fn run_limit(&self, book: &Arc<RwLock<Book>>, taker: &mut Order) -> (OrderResult, Vec<TradeReport>) {
        let mut book = book.write().expect("book lock poisoned");

        if book.would_trade_through(taker) {
            return (OrderResult::RejectedTradeThrough, Vec::new());
        }

        let fills = book.match_against(taker, true);
        let trades = self.finalize_fills(taker, &fills);

        let result = if taker.is_filled() {
            OrderResult::CompletelyFilled
        } else {
            let resting = taker.clone();
            book.add(resting);
            self.journal.log(JournalEvent::Rested, taker);
            OrderResult::Accepted
        };

        self.publish_locked(&book, taker, &trades, !trades.is_empty() || result == OrderResult::Accepted);
        (result, trades)
    }

    fn run_ioc(&self, book: &Arc<RwLock<Book>>, taker: &mut Order) -> (OrderResult, Vec<TradeReport>) {
        let mut book = book.write().expect("book lock poisoned");
        let fills = book.match_against(taker, true);
        let trades = self.finalize_fills(taker, &fills);
        self.publish_locked(&book, taker, &trades, !trades.is_empty());
        (classify_non_resting(taker), trades)
    }

    fn run_fok(&self, book: &Arc<RwLock<Book>>, taker: &mut Order) -> (OrderResult, Vec<TradeReport>) {
        let mut book = book.write().expect("book lock poisoned");

        if !book.can_fill(taker) {
            return (OrderResult::RejectedFokUnfillable, Vec::new());
        }

        let fills = book.match_against(taker, true);
        let trades = self.finalize_fills(taker, &fills);
        self.publish_locked(&book, taker, &trades, true);

        debug_assert!(taker.is_filled(), "can_fill precheck promised a complete fill");
        (OrderResult::CompletelyFilled, trades)
    }

    /// Publishes this submit's trades (in matching order) and, if
    /// `emit_l2`, the resulting L2 update — all while `book`'s write guard
    /// is still held, so a subscriber never observes a later submit's
    /// events before an earlier submit's (spec.md §5 ordering guarantees).
    fn publish_locked(
        &self,
        book: &std::sync::RwLockWriteGuard<'_, Book>,
        taker: &Order,
        trades: &[TradeReport],
        emit_l2: bool,
    ) {
        for trade in trades {
            self.trade_feed.publish(trade);
        }
        if emit_l2 {
            let snapshot = book.l2_snapshot(&taker.symbol, self.config.default_l2_depth, now_nanos());
            self.l2_feed.publish(&snapshot);
        }
    }

    /// Turns raw book fills into `TradeReport`s: assigns trade ids, computes
    /// fees, and journals both sides' fill progress — the taker's aggregate
    /// transition once at the end, and each maker's own PARTIAL_FILL/FILLED
    /// transition as its fill is processed, mirroring
    /// `MatchingEngine::matchAgainstBook`'s per-maker `logOrderEvent` calls.
    /// Does not touch the order registry — callers apply per-maker registry
    /// updates after releasing the book's write lock, to respect the
    /// engine's registry-before-book lock order (registry lock must never
    /// be acquired while a book lock is held).
    fn finalize_fills(&self, taker: &Order, fills: &[crate::book::Fill]) -> Vec<TradeReport> {
        let mut trades = Vec::with_capacity(fills.len());

        for fill in fills {
            let trade_id = self.trade_id_counter.fetch_add(1, Ordering::SeqCst) + 1;
            let (maker_fee, taker_fee) = self.config.fee_model.compute(fill.price, fill.quantity);

            trades.push(TradeReport {
                symbol: taker.symbol.clone(),
                trade_id: format!("T{trade_id}"),
                price: fill.price,
                quantity: fill.quantity,
                maker_fee,
                taker_fee,
                aggressor: taker.side,
                maker_order_id: fill.maker_id.clone(),
                taker_order_id: taker.id.clone(),
                timestamp: now_nanos(),
            });

            let maker_event = if fill.maker_completely_filled {
                JournalEvent::Filled
            } else {
                JournalEvent::PartialFill
            };
            let maker_view = Order {
                id: fill.maker_id.clone(),
                symbol: taker.symbol.clone(),
                side: taker.side.opposite(),
                order_type: OrderType::Limit,
                price: fill.price,
                quantity: fill.maker_total_quantity,
                filled_qty: fill.maker_filled_qty,
                timestamp: fill.maker_timestamp,
                sequence: 0,
            };
            self.journal.log(maker_event, &maker_view);
        }

        if !trades.is_empty() {
            let event = if taker.is_filled() {
                JournalEvent::Filled
            } else {
                JournalEvent::PartialFill
            };
            self.journal.log(event, taker);
        }

        trades
    }

    fn apply_fill_to_registry(&self, maker_id: &OrderId, quantity: i64) {
        let mut registry = self.registry.write().expect("order registry poisoned");
        if let Some(maker) = registry.get_mut(maker_id) {
            maker.filled_qty += quantity;
        }
    }

    fn update_registered_order(&self, order: &Order) {
        let mut registry = self.registry.write().expect("order registry poisoned");
        registry.insert(order.id.clone(), order.clone());
    }
}

fn classify_non_resting(order: &Order) -> OrderResult {
    if order.is_filled() {
        OrderResult::CompletelyFilled
    } else if order.filled_qty > 0 {
        OrderResult::PartiallyFilled
    } else {
        OrderResult::Canceled
    }
}

fn result_message(result: OrderResult) -> String {
    match result {
        OrderResult::Accepted => "order accepted and resting".to_string(),
        OrderResult::RejectedInvalidParams => "invalid or duplicate order".to_string(),
        OrderResult::RejectedTradeThrough => "would trade through a better price".to_string(),
        OrderResult::RejectedFokUnfillable => "insufficient liquidity to fill completely".to_string(),
        OrderResult::PartiallyFilled => "order partially filled".to_string(),
        OrderResult::CompletelyFilled => "order completely filled".to_string(),
        OrderResult::Canceled => "order canceled with no fills".to_string(),
    }
}

fn now_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use std::io::Read;

    fn limit(id: &str, symbol: &str, side: Side, price: i64, qty: i64) -> Order {
        Order {
            id: OrderId(id.to_string()),
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Limit,
            price,
            quantity: qty,
            filled_qty: 0,
            timestamp: 0,
            sequence: 0,
        }
    }

    #[test]
    fn simple_match() {
        let engine = Engine::with_defaults();
        engine.submit(limit("s1", "BTC-USDT", Side::Sell, 10_000, 1));
        let resp = engine.submit(limit("b1", "BTC-USDT", Side::Buy, 10_000, 1));

        assert_eq!(resp.result, OrderResult::CompletelyFilled);
        assert_eq!(resp.trades.len(), 1);
        let t = &resp.trades[0];
        assert_eq!(t.price, 10_000);
        assert_eq!(t.quantity, 1);
        assert_eq!(t.maker_order_id, OrderId("s1".into()));
        assert_eq!(t.taker_order_id, OrderId("b1".into()));
        assert_eq!(t.aggressor, Side::Buy);
        assert_eq!(engine.bbo("BTC-USDT"), (0, 0));
    }

    #[test]
    fn duplicate_id_rejected() {
        let engine = Engine::with_defaults();
        let resp1 = engine.submit(limit("x", "AAPL", Side::Buy, 100, 1));
        assert_eq!(resp1.result, OrderResult::Accepted);

        let resp2 = engine.submit(limit("x", "AAPL", Side::Buy, 100, 1));
        assert_eq!(resp2.result, OrderResult::RejectedInvalidParams);
    }

    #[test]
    fn fok_unfillable_leaves_book_untouched() {
        let engine = Engine::with_defaults();
        engine.submit(limit("s1", "AAPL", Side::Sell, 100, 1));

        let mut fok = limit("b1", "AAPL", Side::Buy, 100, 2);
        fok.order_type = OrderType::Fok;
        let resp = engine.submit(fok);

        assert_eq!(resp.result, OrderResult::RejectedFokUnfillable);
        assert!(resp.trades.is_empty());
        assert_eq!(engine.bbo("AAPL"), (0, 100));
    }

    #[test]
    fn ioc_partial_discards_remainder() {
        let engine = Engine::with_defaults();
        engine.submit(limit("s1", "AAPL", Side::Sell, 100, 1));

        let mut ioc = limit("b1", "AAPL", Side::Buy, 100, 2);
        ioc.order_type = OrderType::Ioc;
        let resp = engine.submit(ioc);

        assert_eq!(resp.result, OrderResult::PartiallyFilled);
        assert_eq!(resp.filled_quantity, 1);
        assert_eq!(engine.bbo("AAPL"), (0, 0));
    }

    #[test]
    fn ioc_zero_fill_is_canceled_not_partially_filled() {
        let engine = Engine::with_defaults();
        let mut ioc = limit("b1", "AAPL", Side::Buy, 100, 1);
        ioc.order_type = OrderType::Ioc;
        let resp = engine.submit(ioc);

        assert_eq!(resp.result, OrderResult::Canceled);
        assert_eq!(resp.filled_quantity, 0);
    }

    #[test]
    fn market_order_trades_through_book_no_limit_check() {
        let engine = Engine::with_defaults();
        engine.submit(limit("s1", "AAPL", Side::Sell, 101, 1));
        engine.submit(limit("s2", "AAPL", Side::Sell, 100, 1));

        let mut market = limit("b1", "AAPL", Side::Buy, 0, 1);
        market.order_type = OrderType::Market;
        let resp = engine.submit(market);

        assert_eq!(resp.result, OrderResult::CompletelyFilled);
        assert_eq!(resp.trades[0].price, 100, "price priority: best ask first");
    }

    #[test]
    fn l2_unknown_symbol_is_empty() {
        let engine = Engine::with_defaults();
        let snap = engine.l2("GHOST", None);
        assert!(snap.bids.is_empty());
        assert!(snap.asks.is_empty());
    }

    #[test]
    fn cancel_removes_resting_order() {
        let engine = Engine::with_defaults();
        engine.submit(limit("b1", "AAPL", Side::Buy, 100, 5));
        assert_eq!(engine.bbo("AAPL"), (100, 0));

        assert!(engine.cancel_order("AAPL", &OrderId("b1".into())));
        assert_eq!(engine.bbo("AAPL"), (0, 0));
        assert!(!engine.cancel_order("AAPL", &OrderId("b1".into())), "already canceled");
    }

    #[test]
    fn try_new_rejects_negative_fee_rate() {
        let config = EngineConfig::default().with_fee_model(crate::fees::FeeModel::new(-0.001, 0.002));
        assert!(Engine::try_new(config, crate::journal::Journal::disabled()).is_err());
    }

    #[test]
    fn try_new_accepts_valid_config() {
        let config = EngineConfig::default().with_fee_model(crate::fees::FeeModel::new(0.001, 0.002));
        assert!(Engine::try_new(config, crate::journal::Journal::disabled()).is_ok());
    }

    #[test]
    fn journal_records_maker_fill_transition_not_just_takers() {
        let tmp = tempfile::NamedTempFile::new().expect("tmpfile");
        let journal = crate::journal::Journal::open(tmp.path()).expect("open journal");
        let engine = Engine::new(EngineConfig::default(), journal);

        engine.submit(limit("s1", "AAPL", Side::Sell, 100, 3));
        engine.submit(limit("s2", "AAPL", Side::Sell, 100, 4));
        // Crosses s1 completely and s2 partially: s1 -> FILLED, s2 -> PARTIAL_FILL.
        engine.submit(limit("b1", "AAPL", Side::Buy, 100, 5));

        let mut contents = String::new();
        std::fs::File::open(tmp.path()).unwrap().read_to_string(&mut contents).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        let maker_filled = lines.iter().any(|l| {
            let f: Vec<&str> = l.split('|').collect();
            f[1] == "FILLED" && f[2] == "s1"
        });
        let maker_partial = lines.iter().any(|l| {
            let f: Vec<&str> = l.split('|').collect();
            f[1] == "PARTIAL_FILL" && f[2] == "s2"
        });
        assert!(maker_filled, "expected a FILLED journal line for maker s1, got:\n{contents}");
        assert!(maker_partial, "expected a PARTIAL_FILL journal line for maker s2, got:\n{contents}");
    }
}
