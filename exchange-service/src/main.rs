//! HFT Exchange Service - REST API and WebSocket server for trading operations.
//!
//! Provides HTTP endpoints for order management and WebSocket streams for real-time
//! market data. Built with Axum for high-performance async request handling, backed
//! by the synchronous `matching-core` engine called through `spawn_blocking`.

use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use clap::Parser;
use matching_core::{Engine, EngineConfig, FeeModel, Journal, Order, OrderId, OrderResult};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::info;

mod exchange;
mod types;
mod websocket;

use exchange::Exchange;
use types::*;

/// Command-line configuration for the exchange service.
#[derive(Parser, Debug)]
#[command(name = "exchange-service", about = "HTTP/WebSocket gateway over the matching engine")]
struct Args {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "EXCHANGE_BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind_addr: String,

    /// Path to the append-only audit journal. Journaling is disabled if omitted.
    #[arg(long, env = "EXCHANGE_JOURNAL_PATH")]
    journal_path: Option<String>,

    /// Maker fee rate, e.g. 0.001 for 10 bps.
    #[arg(long, env = "EXCHANGE_MAKER_FEE", default_value_t = 0.001)]
    maker_fee: f64,

    /// Taker fee rate, e.g. 0.002 for 20 bps.
    #[arg(long, env = "EXCHANGE_TAKER_FEE", default_value_t = 0.002)]
    taker_fee: f64,

    /// Default number of L2 price levels returned per side when a request
    /// doesn't specify one. Clamped to [1, 100].
    #[arg(long, env = "EXCHANGE_L2_DEPTH", default_value_t = 10)]
    l2_depth: usize,
}

/// Application state shared across all handlers.
#[derive(Clone)]
struct AppState {
    exchange: Arc<Exchange>,
    trade_broadcaster: broadcast::Sender<TradeEvent>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let journal = match &args.journal_path {
        Some(path) => Journal::open(path)?,
        None => Journal::disabled(),
    };

    let config = EngineConfig::default()
        .with_fee_model(FeeModel::new(args.maker_fee, args.taker_fee))
        .with_default_l2_depth(args.l2_depth);

    let engine = Arc::new(Engine::try_new(config, journal)?);

    let (trade_tx, _) = broadcast::channel(1000);
    let broadcaster = trade_tx.clone();
    engine.trade_feed.subscribe(move |trade: &matching_core::TradeReport| {
        let _ = broadcaster.send(TradeEvent { symbol: trade.symbol.clone(), trade: trade.clone() });
    });

    let exchange = Arc::new(Exchange::new(engine));

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/symbols", get(list_symbols))
        .route("/symbols/:symbol/orderbook", get(get_orderbook))
        .route("/symbols/:symbol/depth", get(get_depth))
        .route("/symbols/:symbol/orders", post(submit_order))
        .route("/symbols/:symbol/orders/:order_id", delete(cancel_order))
        .route("/symbols/:symbol/trades/stream", get(trade_stream))
        .route("/symbols/:symbol/depth/stream", get(depth_stream))
        .layer(CorsLayer::permissive())
        .with_state(AppState { exchange, trade_broadcaster: trade_tx });

    let listener = tokio::net::TcpListener::bind(&args.bind_addr).await?;

    info!("HFT exchange service starting on http://{}", args.bind_addr);
    info!("  GET  /health - health check");
    info!("  GET  /symbols - list available symbols");
    info!("  GET  /symbols/:symbol/orderbook - BBO snapshot");
    info!("  GET  /symbols/:symbol/depth - L2 market depth");
    info!("  POST /symbols/:symbol/orders - submit order");
    info!("  DEL  /symbols/:symbol/orders/:id - cancel order");
    info!("  WS   /symbols/:symbol/trades/stream - trade stream");
    info!("  WS   /symbols/:symbol/depth/stream - depth stream");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "hft-exchange",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis()
    }))
}

async fn list_symbols(State(state): State<AppState>) -> impl IntoResponse {
    let symbols = state.exchange.list_symbols().await;
    Json(SymbolsResponse { symbols })
}

async fn get_orderbook(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let orderbook_state = state.exchange.get_orderbook_state(&symbol).await.ok_or(AppError::SymbolNotFound)?;
    Ok(Json(orderbook_state))
}

async fn get_depth(
    Path(symbol): Path<String>,
    Query(params): Query<DepthQuery>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let levels = params.levels.unwrap_or(10);
    let l2 = state.exchange.get_market_depth(&symbol, levels).await.ok_or(AppError::SymbolNotFound)?;
    Ok(Json(MarketDepth::from_l2(l2)))
}

/// Submits a new order to the exchange. `order_id` is caller-supplied; a
/// duplicate is reported back as `REJECTED_INVALID_PARAMS`, not an HTTP error.
async fn submit_order(
    Path(symbol): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<SubmitOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let order = Order {
        id: OrderId(request.order_id.clone()),
        symbol: symbol.clone(),
        side: request.side,
        order_type: request.order_type,
        price: request.price,
        quantity: request.quantity,
        filled_qty: 0,
        timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos(),
        sequence: 0,
    };

    let resp = state.exchange.submit_order(order).await;
    let status = match resp.result {
        OrderResult::RejectedInvalidParams => StatusCode::BAD_REQUEST,
        OrderResult::RejectedTradeThrough | OrderResult::RejectedFokUnfillable => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::CREATED,
    };

    Ok((status, Json(SubmitOrderResponse::from_engine(request.order_id, resp))))
}

async fn cancel_order(
    Path((symbol, order_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if order_id.is_empty() {
        return Err(AppError::InvalidOrderId);
    }

    let cancelled = state
        .exchange
        .cancel_order(&symbol, OrderId(order_id.clone()))
        .await
        .ok_or(AppError::SymbolNotFound)?;

    if cancelled {
        Ok(Json(serde_json::json!({"status": "cancelled", "order_id": order_id})))
    } else {
        Err(AppError::OrderNotFound)
    }
}

async fn trade_stream(
    Path(symbol): Path<String>,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| websocket::handle_trade_stream(socket, symbol, state))
}

async fn depth_stream(
    Path(symbol): Path<String>,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| websocket::handle_depth_stream(socket, symbol, state))
}

/// Application error types for HTTP responses.
#[derive(Debug)]
enum AppError {
    SymbolNotFound,
    OrderNotFound,
    InvalidOrderId,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::SymbolNotFound => (StatusCode::NOT_FOUND, "symbol not found"),
            AppError::OrderNotFound => (StatusCode::NOT_FOUND, "order not found"),
            AppError::InvalidOrderId => (StatusCode::BAD_REQUEST, "invalid order id"),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}
