//! WebSocket handlers for real-time market data streaming.
//!
//! Provides live trade execution and market depth updates via WebSocket connections.
//! Uses tokio::select! for concurrent handling of messages, broadcasts, and heartbeats.

use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::StreamExt};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::{types::*, AppState};

/// Handles real-time trade streaming for a symbol.
///
/// Streams trade executions immediately as they occur (fed by the engine's
/// `trade_feed` subscriber registered in `main`). Includes ping/pong
/// heartbeat for connection health monitoring.
pub async fn handle_trade_stream(socket: WebSocket, symbol: String, state: AppState) {
    info!("new trade stream connection for {}", symbol);

    let (mut sender, mut receiver) = socket.split();
    let mut trade_rx = state.trade_broadcaster.subscribe();
    let mut ping_interval = interval(Duration::from_secs(30));

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(WebSocketMessage::Ping { timestamp }) = serde_json::from_str::<WebSocketMessage>(&text) {
                            let pong = WebSocketMessage::Pong { timestamp };
                            if let Ok(pong_json) = serde_json::to_string(&pong) {
                                let _ = sender.send(Message::Text(pong_json)).await;
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!("trade stream connection closed for {}", symbol);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("websocket error in trade stream: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            trade_result = trade_rx.recv() => {
                match trade_result {
                    Ok(trade_event) => {
                        if trade_event.symbol == symbol {
                            let ws_msg = WebSocketMessage::Trade(trade_event);
                            if let Ok(json) = serde_json::to_string(&ws_msg) {
                                if sender.send(Message::Text(json)).await.is_err() {
                                    warn!("failed to send trade update for {}", symbol);
                                    break;
                                }
                            }
                        }
                    }
                    Err(_) => break,
                }
            }

            _ = ping_interval.tick() => {
                let ping = WebSocketMessage::Ping {
                    timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis(),
                };
                if let Ok(ping_json) = serde_json::to_string(&ping) {
                    if sender.send(Message::Text(ping_json)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    info!("trade stream handler ended for {}", symbol);
}

/// Handles real-time market depth streaming for a symbol.
///
/// Sends depth updates at 10 Hz (every 100ms) but only when the BBO
/// changes. Includes an initial snapshot on connection.
pub async fn handle_depth_stream(socket: WebSocket, symbol: String, state: AppState) {
    info!("new depth stream connection for {}", symbol);

    let (mut sender, mut receiver) = socket.split();
    let mut update_interval = interval(Duration::from_millis(100));
    let mut ping_interval = interval(Duration::from_secs(30));

    let mut last_best_bid: i64 = 0;
    let mut last_best_ask: i64 = 0;

    if let Some(update) = depth_update(&state, &symbol).await {
        last_best_bid = update.best_bid;
        last_best_ask = update.best_ask;
        if let Ok(json) = serde_json::to_string(&WebSocketMessage::Depth(update)) {
            let _ = sender.send(Message::Text(json)).await;
        }
    }

    loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(WebSocketMessage::Ping { timestamp }) = serde_json::from_str::<WebSocketMessage>(&text) {
                            let pong = WebSocketMessage::Pong { timestamp };
                            if let Ok(pong_json) = serde_json::to_string(&pong) {
                                let _ = sender.send(Message::Text(pong_json)).await;
                            }
                        }
                    }
                    Some(Ok(Message::Binary(_))) => {}
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sender.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) => {
                        info!("depth stream connection closed for {}", symbol);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("websocket error in depth stream: {}", e);
                        break;
                    }
                    None => break,
                }
            }

            _ = update_interval.tick() => {
                if let Some(update) = depth_update(&state, &symbol).await {
                    if update.best_bid != last_best_bid || update.best_ask != last_best_ask {
                        last_best_bid = update.best_bid;
                        last_best_ask = update.best_ask;
                        let ws_msg = WebSocketMessage::Depth(update);
                        if let Ok(json) = serde_json::to_string(&ws_msg) {
                            if sender.send(Message::Text(json)).await.is_err() {
                                warn!("failed to send depth update for {}", symbol);
                                break;
                            }
                        }
                    }
                }
            }

            _ = ping_interval.tick() => {
                let ping = WebSocketMessage::Ping {
                    timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis(),
                };
                if let Ok(ping_json) = serde_json::to_string(&ping) {
                    if sender.send(Message::Text(ping_json)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    info!("depth stream handler ended for {}", symbol);
}

async fn depth_update(state: &AppState, symbol: &str) -> Option<DepthUpdate> {
    let l2 = state.exchange.get_market_depth(symbol, 1).await?;
    let (best_bid, bid_size) = l2.bids.first().copied().unwrap_or((0, 0));
    let (best_ask, ask_size) = l2.asks.first().copied().unwrap_or((0, 0));
    Some(DepthUpdate {
        symbol: symbol.to_string(),
        best_bid,
        best_ask,
        bid_size,
        ask_size,
        timestamp: l2.timestamp,
    })
}
