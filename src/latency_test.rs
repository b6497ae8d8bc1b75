//! Performance testing suite for the matching engine.
//!
//! Measures latency and throughput under various scenarios:
//! - Market data access, order submission, matching, cancellation
//! - Sustained throughput testing with mixed workloads
//! - Statistical analysis with multiple iterations

use matching_core::{Book, Engine, Order, OrderId, OrderType, PriceLevels, Side};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Runs complete latency test suite.
pub fn run_latency_tests() {
    println!("Matching Core - Real-time Latency Tests\n");

    test_market_data_latency();
    test_order_submission_latency();
    test_order_matching_latency();
    test_cancellation_latency();
}

/// Creates test order with current timestamp.
fn create_order(id: u64, symbol: &str, side: Side, price: i64, qty: i64) -> Order {
    Order {
        id: OrderId(id.to_string()),
        symbol: symbol.to_string(),
        side,
        order_type: OrderType::Limit,
        price,
        quantity: qty,
        filled_qty: 0,
        timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos(),
        sequence: id,
    }
}

fn submit_limit(book: &mut Book, mut taker: Order) -> Vec<matching_core::Fill> {
    let fills = book.match_against(&mut taker, true);
    if taker.remaining() > 0 {
        book.add(taker);
    }
    fills
}

/// Tests best bid/ask lookup performance.
fn test_market_data_latency() {
    println!("Market Data Latency Test");

    let mut book = Book::new();

    for i in 0..100 {
        let ask = create_order(i, "AAPL", Side::Sell, 10000 + i as i64, 100);
        submit_limit(&mut book, ask);
        let bid = create_order(i + 100, "AAPL", Side::Buy, 9999 - i as i64, 100);
        submit_limit(&mut book, bid);
    }

    let iterations = 1_000_000;

    let start = Instant::now();
    for _ in 0..iterations {
        std::hint::black_box(book.bbo());
    }
    let bbo_duration = start.elapsed();

    println!("  BBO lookup: {:.2} ns/call\n", bbo_duration.as_nanos() as f64 / iterations as f64);
}

/// Tests order submission latency for non-crossing orders.
fn test_order_submission_latency() {
    println!("Order Submission Latency Test");

    let iterations = 10_000;
    let mut total_time = 0u128;

    for i in 0..iterations {
        let mut book = Book::new();
        let order = create_order(i, "AAPL", Side::Buy, 10000 - i as i64, 100);

        let start = Instant::now();
        submit_limit(&mut book, order);
        total_time += start.elapsed().as_nanos();
    }

    let avg_latency = total_time as f64 / iterations as f64;
    println!("  Average order submission: {:.2} ns", avg_latency);
    println!("  Throughput: {:.0} orders/second\n", 1_000_000_000.0 / avg_latency);
}

/// Tests order matching latency for crossing orders.
fn test_order_matching_latency() {
    println!("Order Matching Latency Test");

    let iterations = 1_000;
    let mut total_setup_time = 0u128;
    let mut total_match_time = 0u128;

    for i in 0..iterations {
        let setup_start = Instant::now();
        let mut book = Book::new();

        for j in 0..10 {
            let ask = create_order(j, "AAPL", Side::Sell, 10000 + j as i64, 100);
            submit_limit(&mut book, ask);
        }
        total_setup_time += setup_start.elapsed().as_nanos();

        let mut crossing = create_order(1000 + i, "AAPL", Side::Buy, 10005, 500);

        let match_start = Instant::now();
        let fills = book.match_against(&mut crossing, true);
        total_match_time += match_start.elapsed().as_nanos();

        std::hint::black_box(fills);
    }

    println!("  Setup (10 resting orders): {:.2} ns", total_setup_time as f64 / iterations as f64);
    println!("  Crossing order execution: {:.2} ns", total_match_time as f64 / iterations as f64);
    println!(
        "  Total order-to-trade: {:.2} ns\n",
        (total_setup_time + total_match_time) as f64 / iterations as f64
    );
}

/// Compares lazy vs eager cancellation performance.
fn test_cancellation_latency() {
    println!("Cancellation Latency Test");

    let iterations = 1_000;
    let orders_per_test = 100;

    let mut total_lazy_time = 0u128;
    for i in 0..iterations {
        let mut bids = PriceLevels::new(Side::Buy);
        let mut order_ids = Vec::new();

        for j in 0..orders_per_test {
            let order = create_order(i * orders_per_test + j, "AAPL", Side::Buy, 10000, 100);
            order_ids.push(order.id.clone());
            bids.push(order);
        }

        let start = Instant::now();
        for (idx, order_id) in order_ids.into_iter().enumerate() {
            if idx % 2 == 0 {
                bids.cancel(order_id);
            }
        }
        total_lazy_time += start.elapsed().as_nanos();
    }

    let mut total_eager_time = 0u128;
    for i in 0..iterations {
        let mut bids = PriceLevels::new(Side::Buy);
        let mut order_ids = Vec::new();

        for j in 0..orders_per_test {
            let order = create_order(i * orders_per_test + j + 1_000_000, "AAPL", Side::Buy, 10000, 100);
            order_ids.push(order.id.clone());
            bids.push(order);
        }

        let start = Instant::now();
        for (idx, order_id) in order_ids.iter().enumerate() {
            if idx % 2 == 0 {
                bids.remove(order_id);
            }
        }
        total_eager_time += start.elapsed().as_nanos();
    }

    println!(
        "  Lazy cancellation: {:.2} ns per order",
        total_lazy_time as f64 / (iterations * orders_per_test / 2) as f64
    );
    println!(
        "  Eager removal: {:.2} ns per order",
        total_eager_time as f64 / (iterations * orders_per_test / 2) as f64
    );
    println!("  Lazy is {:.1}x faster\n", total_eager_time as f64 / total_lazy_time as f64);
}

/// Runs sustained throughput test with mixed workload through the full
/// `Engine`, not just `Book`, so fee computation and event publication are
/// included in the measured path.
pub fn run_throughput_test() {
    run_sustained_throughput_test(std::time::Duration::from_secs(10));
}

/// Runs 1-minute sustained throughput test with mixed workload.
pub fn run_throughput_test_1min() {
    run_sustained_throughput_test(std::time::Duration::from_secs(60));
}

fn run_sustained_throughput_test(duration: std::time::Duration) {
    println!("Sustained Throughput Test ({:.0} seconds)", duration.as_secs_f64());

    let engine = Engine::with_defaults();
    let mut order_id = 1u64;
    let mut orders_processed = 0u64;
    let mut trades_executed = 0u64;

    let start_time = Instant::now();

    while start_time.elapsed() < duration {
        let order = match order_id % 4 {
            0 => create_order(order_id, "AAPL", Side::Buy, 9999 - (order_id % 100) as i64, 100),
            1 => create_order(order_id, "AAPL", Side::Sell, 10001 + (order_id % 100) as i64, 100),
            2 => create_order(order_id, "AAPL", Side::Buy, 10001, 50),
            3 => create_order(order_id, "AAPL", Side::Sell, 9999, 50),
            _ => unreachable!(),
        };

        let resp = engine.submit(order);
        trades_executed += resp.trades.len() as u64;

        order_id += 1;
        orders_processed += 1;

        if order_id % 100 == 0 {
            std::hint::black_box(engine.bbo("AAPL"));
        }
    }

    let elapsed = start_time.elapsed();
    let orders_per_sec = orders_processed as f64 / elapsed.as_secs_f64();
    let trades_per_sec = trades_executed as f64 / elapsed.as_secs_f64();

    println!("  Duration: {:.1} seconds", elapsed.as_secs_f64());
    println!("  Orders processed: {}", orders_processed);
    println!("  Trades executed: {}", trades_executed);
    println!("  Order throughput: {:.0} orders/second", orders_per_sec);
    println!("  Trade throughput: {:.0} trades/second", trades_per_sec);
    println!("  Final book state: {:?}", engine.bbo("AAPL"));
}
