//! Command-line client for the exchange service's HTTP API.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "hftx-cli")]
#[command(about = "Command-line client for the matching-core exchange service")]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    server: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SideArg {
    Buy,
    Sell,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OrderTypeArg {
    Market,
    Limit,
    Ioc,
    Fok,
}

#[derive(Subcommand)]
enum Commands {
    /// Submits a new order.
    Submit {
        #[arg(short = 'i', long)]
        order_id: String,
        #[arg(short = 's', long)]
        symbol: String,
        #[arg(long, value_enum)]
        side: SideArg,
        #[arg(short = 't', long, value_enum, default_value = "limit")]
        order_type: OrderTypeArg,
        /// Required for LIMIT/IOC/FOK, ignored for MARKET.
        #[arg(short = 'p', long, default_value_t = 0)]
        price: i64,
        #[arg(short = 'q', long)]
        quantity: i64,
    },
    /// Shows BBO for one symbol, or all known symbols if omitted.
    Status {
        #[arg(short, long)]
        symbol: Option<String>,
    },
    Health,
    Symbols,
    Depth {
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long, default_value = "10")]
        levels: usize,
    },
    Cancel {
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long)]
        order_id: String,
    },
}

#[derive(Serialize)]
struct SubmitOrderRequest {
    order_id: String,
    side: &'static str,
    #[serde(rename = "type")]
    order_type: &'static str,
    price: i64,
    quantity: i64,
}

#[derive(Deserialize)]
struct SubmitOrderResponse {
    order_id: String,
    result: String,
    message: String,
    filled_quantity: i64,
    trades: Vec<Trade>,
}

#[derive(Deserialize)]
struct Trade {
    trade_id: String,
    price: i64,
    quantity: i64,
}

#[derive(Deserialize)]
struct SymbolsResponse {
    symbols: Vec<String>,
}

#[derive(Deserialize)]
struct OrderBookState {
    symbol: String,
    best_bid: i64,
    best_ask: i64,
}

#[derive(Deserialize)]
struct MarketDepth {
    symbol: String,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
}

#[derive(Deserialize)]
struct PriceLevel {
    price: i64,
    quantity: i64,
}

fn side_str(side: SideArg) -> &'static str {
    match side {
        SideArg::Buy => "BUY",
        SideArg::Sell => "SELL",
    }
}

fn order_type_str(order_type: OrderTypeArg) -> &'static str {
    match order_type {
        OrderTypeArg::Market => "MARKET",
        OrderTypeArg::Limit => "LIMIT",
        OrderTypeArg::Ioc => "IOC",
        OrderTypeArg::Fok => "FOK",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Submit { order_id, symbol, side, order_type, price, quantity } => {
            let request = SubmitOrderRequest {
                order_id,
                side: side_str(side),
                order_type: order_type_str(order_type),
                price,
                quantity,
            };

            let response = client
                .post(format!("{}/symbols/{}/orders", cli.server, symbol))
                .json(&request)
                .send()
                .await?;

            if response.status().is_success() {
                let result: SubmitOrderResponse = response.json().await?;

                println!("Order ID: {}", result.order_id);
                println!("Result: {}", result.result);
                println!("Message: {}", result.message);
                println!("Filled quantity: {}", result.filled_quantity);

                if !result.trades.is_empty() {
                    println!("Trades executed: {}", result.trades.len());
                    for trade in result.trades {
                        println!("  {} ({} shares @ {})", trade.trade_id, trade.quantity, trade.price);
                    }
                }
            } else {
                println!("Error: {}", response.status());
                println!("{}", response.text().await?);
            }
        }

        Commands::Status { symbol } => match symbol {
            Some(sym) => {
                let response = client.get(format!("{}/symbols/{}/orderbook", cli.server, sym)).send().await?;

                if response.status().is_success() {
                    let state: OrderBookState = response.json().await?;
                    println!("Symbol: {}", state.symbol);
                    println!("Best bid: {}", state.best_bid);
                    println!("Best ask: {}", state.best_ask);
                } else {
                    println!("Error: {}", response.status());
                }
            }
            None => {
                let response = client.get(format!("{}/symbols", cli.server)).send().await?;

                if response.status().is_success() {
                    let symbols: SymbolsResponse = response.json().await?;
                    println!("Active symbols:");
                    for symbol in symbols.symbols {
                        let state_response =
                            client.get(format!("{}/symbols/{}/orderbook", cli.server, symbol)).send().await?;

                        if state_response.status().is_success() {
                            let state: OrderBookState = state_response.json().await?;
                            println!("  {}: bid={}, ask={}", symbol, state.best_bid, state.best_ask);
                        }
                    }
                } else {
                    println!("Error: {}", response.status());
                }
            }
        },

        Commands::Health => {
            let response = client.get(format!("{}/health", cli.server)).send().await?;

            if response.status().is_success() {
                let health: serde_json::Value = response.json().await?;
                println!("{}", serde_json::to_string_pretty(&health)?);
            } else {
                println!("Error: {}", response.status());
            }
        }

        Commands::Symbols => {
            let response = client.get(format!("{}/symbols", cli.server)).send().await?;

            if response.status().is_success() {
                let symbols: SymbolsResponse = response.json().await?;
                for symbol in symbols.symbols {
                    println!("{}", symbol);
                }
            } else {
                println!("Error: {}", response.status());
            }
        }

        Commands::Depth { symbol, levels } => {
            let response =
                client.get(format!("{}/symbols/{}/depth?levels={}", cli.server, symbol, levels)).send().await?;

            if response.status().is_success() {
                let depth: MarketDepth = response.json().await?;

                println!("Market depth for {}", depth.symbol);
                println!("\nAsks (best first):");
                for (i, level) in depth.asks.iter().enumerate() {
                    println!("  {}: {} @ {}", i + 1, level.quantity, level.price);
                }

                println!("\nBids (best first):");
                for (i, level) in depth.bids.iter().enumerate() {
                    println!("  {}: {} @ {}", i + 1, level.quantity, level.price);
                }
            } else {
                println!("Error: {}", response.status());
            }
        }

        Commands::Cancel { symbol, order_id } => {
            let response = client.delete(format!("{}/symbols/{}/orders/{}", cli.server, symbol, order_id)).send().await?;

            if response.status().is_success() {
                let result: serde_json::Value = response.json().await?;
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Error: {}", response.status());
                println!("{}", response.text().await?);
            }
        }
    }

    Ok(())
}
