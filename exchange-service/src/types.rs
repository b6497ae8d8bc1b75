//! API types for the REST and WebSocket interfaces.

use matching_core::{OrderResponse, OrderType, Side, TradeReport};
use serde::{Deserialize, Serialize};

/// Request to submit a new order. `order_id` is caller-supplied (the
/// engine never generates ids; duplicate submission is itself a protocol
/// error the engine reports back as `REJECTED_INVALID_PARAMS`).
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitOrderRequest {
    pub order_id: String,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Required for LIMIT/IOC/FOK; ignored for MARKET.
    #[serde(default)]
    pub price: i64,
    pub quantity: i64,
}

/// Response after submitting an order — a thin wire wrapper around the
/// engine's own `OrderResponse`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitOrderResponse {
    pub order_id: String,
    pub result: String,
    pub message: String,
    pub filled_quantity: i64,
    pub trades: Vec<TradeReport>,
}

impl SubmitOrderResponse {
    pub fn from_engine(order_id: String, resp: OrderResponse) -> Self {
        Self {
            order_id,
            result: format!("{:?}", resp.result),
            message: resp.message,
            filled_quantity: resp.filled_quantity,
            trades: resp.trades,
        }
    }
}

/// Query parameters for market depth / L2 requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct DepthQuery {
    pub levels: Option<usize>,
}

/// List of symbols known to the exchange.
#[derive(Debug, Serialize, Deserialize)]
pub struct SymbolsResponse {
    pub symbols: Vec<String>,
}

/// Current BBO / book state snapshot for a symbol.
#[derive(Debug, Serialize, Deserialize)]
pub struct OrderBookState {
    pub symbol: String,
    pub best_bid: i64,
    pub best_ask: i64,
}

/// One price level of an aggregated depth response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceLevelWire {
    pub price: i64,
    pub quantity: i64,
}

/// Aggregated market depth for a symbol, truncated to the requested levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDepth {
    pub symbol: String,
    pub bids: Vec<PriceLevelWire>,
    pub asks: Vec<PriceLevelWire>,
    pub timestamp: u128,
}

impl MarketDepth {
    pub fn from_l2(update: matching_core::L2Update) -> Self {
        Self {
            symbol: update.symbol,
            bids: update.bids.into_iter().map(|(price, quantity)| PriceLevelWire { price, quantity }).collect(),
            asks: update.asks.into_iter().map(|(price, quantity)| PriceLevelWire { price, quantity }).collect(),
            timestamp: update.timestamp,
        }
    }
}

/// Trade execution event for WebSocket streaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub symbol: String,
    pub trade: TradeReport,
}

/// Market depth update for WebSocket streaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthUpdate {
    pub symbol: String,
    pub best_bid: i64,
    pub best_ask: i64,
    pub bid_size: i64,
    pub ask_size: i64,
    pub timestamp: u128,
}

/// WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WebSocketMessage {
    #[serde(rename = "trade")]
    Trade(TradeEvent),
    #[serde(rename = "depth")]
    Depth(DepthUpdate),
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "ping")]
    Ping { timestamp: u128 },
    #[serde(rename = "pong")]
    Pong { timestamp: u128 },
}
