//! Async adapter around the synchronous, lock-based matching core.
//!
//! `matching_core::Engine` performs no I/O and holds no lock across an
//! await point — it isn't async at all. Every call that might block on a
//! book lock is dispatched through `spawn_blocking`, so a slow or
//! contended symbol never stalls the executor. Grounded on the teacher's
//! `Exchange` (a `DashMap<String, RwLock<OrderBook>>` behind async
//! methods); here the map and the locking both live inside the engine,
//! so this wrapper is just the `spawn_blocking` boundary plus default
//! symbol seeding.

use matching_core::{Engine, L2Update, Order, OrderId, OrderResponse};
use std::sync::Arc;

use crate::types::OrderBookState;

/// Default symbols pre-populated for demo purposes, matching the teacher's
/// `Exchange::new()`. In production, symbols would be loaded from
/// configuration or created on demand as orders arrive.
const DEFAULT_SYMBOLS: &[&str] = &["AAPL", "TSLA", "MSFT", "NVDA", "GOOGL"];

#[derive(Clone)]
pub struct Exchange {
    engine: Arc<Engine>,
}

impl Exchange {
    pub fn new(engine: Arc<Engine>) -> Self {
        for symbol in DEFAULT_SYMBOLS {
            engine.ensure_symbol(symbol);
        }
        Self { engine }
    }

    pub async fn list_symbols(&self) -> Vec<String> {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.symbols())
            .await
            .expect("engine symbols task panicked")
    }

    pub async fn get_orderbook_state(&self, symbol: &str) -> Option<OrderBookState> {
        if !self.list_symbols().await.iter().any(|s| s == symbol) {
            return None;
        }
        let engine = self.engine.clone();
        let symbol_owned = symbol.to_string();
        let (best_bid, best_ask) = tokio::task::spawn_blocking(move || engine.bbo(&symbol_owned))
            .await
            .expect("engine bbo task panicked");
        Some(OrderBookState { symbol: symbol.to_string(), best_bid, best_ask })
    }

    pub async fn get_market_depth(&self, symbol: &str, levels: usize) -> Option<L2Update> {
        if !self.list_symbols().await.iter().any(|s| s == symbol) {
            return None;
        }
        let engine = self.engine.clone();
        let symbol_owned = symbol.to_string();
        Some(
            tokio::task::spawn_blocking(move || engine.l2(&symbol_owned, Some(levels)))
                .await
                .expect("engine l2 task panicked"),
        )
    }

    /// Submits an order. The engine creates the symbol's book on first use,
    /// so unlike the teacher's `Exchange::submit_order` this never returns
    /// `None` for an unknown symbol.
    pub async fn submit_order(&self, order: Order) -> OrderResponse {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.submit(order))
            .await
            .expect("engine submit task panicked")
    }

    pub async fn cancel_order(&self, symbol: &str, order_id: OrderId) -> Option<bool> {
        if !self.list_symbols().await.iter().any(|s| s == symbol) {
            return None;
        }
        let engine = self.engine.clone();
        let symbol = symbol.to_string();
        Some(
            tokio::task::spawn_blocking(move || engine.cancel_order(&symbol, &order_id))
                .await
                .expect("engine cancel task panicked"),
        )
    }

    pub async fn get_best_prices(&self, symbol: &str) -> Option<(i64, i64)> {
        if !self.list_symbols().await.iter().any(|s| s == symbol) {
            return None;
        }
        let engine = self.engine.clone();
        let symbol = symbol.to_string();
        Some(
            tokio::task::spawn_blocking(move || engine.bbo(&symbol))
                .await
                .expect("engine bbo task panicked"),
        )
    }

    pub async fn add_symbol(&self, symbol: String) {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || engine.ensure_symbol(&symbol))
            .await
            .expect("engine ensure_symbol task panicked");
    }

    pub fn engine(&self) -> Arc<Engine> {
        self.engine.clone()
    }
}
