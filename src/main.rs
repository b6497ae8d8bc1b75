//! Matching engine performance lab and trading demo.
//!
//! Runs performance tests followed by a basic trading demo showing
//! order submission, matching, and trade execution through the full
//! `Engine` API.

use matching_core::{Engine, Order, OrderId, OrderType, Side};
use std::time::{SystemTime, UNIX_EPOCH};

mod latency_test;

/// Main entry point - runs performance tests and demo.
fn main() {
    println!("=== Matching Core Performance Lab ===");

    latency_test::run_latency_tests();
    latency_test::run_throughput_test();

    println!("\n=== 1-Minute Sustained Throughput Test ===");
    latency_test::run_throughput_test_1min();

    println!("\n=== Basic Demo ===");
    run_basic_demo();
}

fn now_nanos() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos()
}

fn order(id: &str, side: Side, order_type: OrderType, price: i64, qty: i64) -> Order {
    Order {
        id: OrderId(id.to_string()),
        symbol: "AAPL".to_string(),
        side,
        order_type,
        price,
        quantity: qty,
        filled_qty: 0,
        timestamp: now_nanos(),
        sequence: 0,
    }
}

/// Demonstrates basic engine functionality with trade execution.
fn run_basic_demo() {
    let engine = Engine::with_defaults();

    println!("Matching Core - Order Book Demo");

    let ask_order = order("ask-1", Side::Sell, OrderType::Limit, 15000, 100);
    let bid_order = order("bid-1", Side::Buy, OrderType::Limit, 14950, 50);

    println!("Submitting ask order: {} @ {}", ask_order.quantity, ask_order.price);
    engine.submit(ask_order);

    println!("Submitting bid order: {} @ {}", bid_order.quantity, bid_order.price);
    engine.submit(bid_order);

    println!("Best bid/ask: {:?}", engine.bbo("AAPL"));

    // Crossing bid that will execute against the resting ask.
    let crossing_bid = order("bid-2", Side::Buy, OrderType::Limit, 15000, 75);

    println!("Submitting crossing bid: {} @ {}", crossing_bid.quantity, crossing_bid.price);
    let resp = engine.submit(crossing_bid);

    println!("Trades executed: {}", resp.trades.len());
    for trade in &resp.trades {
        println!("  Trade {}: {} shares @ {} ticks", trade.trade_id, trade.quantity, trade.price);
    }

    println!("Final best bid/ask: {:?}", engine.bbo("AAPL"));
}
