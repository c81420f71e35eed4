//! Momentum Rebalancer - Main Entry Point
//!
//! Loads a rebalance request from JSON, runs the engine and prints the
//! resulting orders.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use momentum_rebalancer::config::Config;
use momentum_rebalancer::engine::{RebalanceEngine, RebalanceResult};
use momentum_rebalancer::portfolio::RebalanceRequest;
use momentum_rebalancer::strategy::StrategyKind;
use std::path::Path;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Momentum Rebalancer CLI
#[derive(Parser)]
#[command(name = "momentum-rebalancer")]
#[command(version, about = "Budget-constrained whole-share portfolio rebalancing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute rebalancing orders for a request file
    Run {
        /// Path to a JSON rebalance request
        #[arg(short, long)]
        request: String,

        /// Primary promotion strategy (overrides config)
        #[arg(short, long)]
        strategy: Option<StrategyKind>,

        /// Fallback promotion strategy (overrides config)
        #[arg(short, long)]
        fallback: Option<StrategyKind>,

        /// Disable the fallback strategy
        #[arg(long, conflicts_with = "fallback")]
        no_fallback: bool,

        /// Skip the external optimizer and use local heuristics only
        #[arg(long)]
        offline: bool,

        /// Print the full result as JSON (logs go to the log file only)
        #[arg(long)]
        json: bool,
    },

    /// List available promotion strategies
    Strategies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            request,
            strategy,
            fallback,
            no_fallback,
            offline,
            json,
        } => {
            init_logging(!json)?;
            run(&request, strategy, fallback, no_fallback, offline, json).await
        }
        Commands::Strategies => {
            list_strategies();
            Ok(())
        }
    }
}

/// Initialize logging to an hourly log file, and to stdout when `to_stdout`.
fn init_logging(to_stdout: bool) -> Result<()> {
    use tracing_subscriber::fmt::writer::MakeWriterExt;

    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::hourly("logs", "rebalancer.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Keep the guard alive for the program duration
    Box::leak(Box::new(guard));

    let filter = EnvFilter::from_default_env()
        .add_directive("momentum_rebalancer=debug".parse()?)
        .add_directive(Level::INFO.into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE);

    if to_stdout {
        builder
            .with_writer(std::io::stdout.and(file_writer))
            .with_ansi(true)
            .init();
    } else {
        builder.with_writer(file_writer).with_ansi(false).init();
    }

    Ok(())
}

/// Log configuration on startup.
fn log_config(config: &Config) {
    info!("📋 Configuration:");
    info!("   Top N: {}", config.selection.top_n);
    if let Some(alternative) = &config.selection.alternative {
        info!(
            "   Alternative bucket: {} at {}%",
            config.alternative_tickers().join(", "),
            alternative.weight_pct
        );
    }
    info!("   Primary strategy: {}", config.strategy.primary);
    match config.strategy.active_fallback() {
        Some(fallback) => info!("   Fallback strategy: {}", fallback),
        None => info!("   Fallback strategy: disabled"),
    }
    info!("   Max iterations: {}", config.strategy.max_iterations);
    match (&config.optimizer.base_url, config.optimizer.enabled) {
        (Some(url), true) => info!(
            "   Optimizer: {} (timeout {}s)",
            url, config.optimizer.timeout_secs
        ),
        _ => info!("   Optimizer: disabled"),
    }
}

fn load_request(path: &str) -> Result<RebalanceRequest> {
    let raw = std::fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read request file {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse request file {path}"))
}

async fn run(
    request_path: &str,
    strategy: Option<StrategyKind>,
    fallback: Option<StrategyKind>,
    no_fallback: bool,
    offline: bool,
    json: bool,
) -> Result<()> {
    info!(
        "📈 Momentum Rebalancer v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::load()?.with_strategy(strategy, fallback, no_fallback);
    config.validate()?;
    log_config(&config);

    let request = load_request(request_path)?;
    info!(
        "📂 Loaded request: {} holdings, {} momentum scores, extra cash ${}",
        request.holdings.len(),
        request.momentum.len(),
        request.extra_cash
    );

    let engine = if offline {
        RebalanceEngine::offline(config)
    } else {
        RebalanceEngine::new(config)?
    };

    let result = engine
        .rebalance(&request)
        .await
        .context("Rebalance failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_orders(&result);
    }

    Ok(())
}

fn print_orders(result: &RebalanceResult) {
    println!(
        "\n{:<8} {:<6} {:>8} {:>14} {:>14} {:>14} {:>9}",
        "TICKER", "ACTION", "SHARES", "CURRENT", "TARGET", "FINAL", "DEV %"
    );
    for order in &result.orders {
        println!(
            "{:<8} {:<6} {:>8} {:>14.2} {:>14.2} {:>14.2} {:>9.2}",
            order.ticker,
            order.action,
            order.shares,
            order.current_value,
            order.target_value,
            order.final_value,
            order.deviation_percentage
        );
    }

    let summary = result.summary();
    println!();
    println!("Portfolio value:  ${:.2}", result.total_portfolio_value);
    println!("Available budget: ${:.2}", result.available_budget);
    println!("Spent on buys:    ${:.2}", summary.buy_cost);
    println!("Leftover:         ${:.2}", result.allocation.leftover_budget);
    println!(
        "Allocation:       {:?} via {} ({} promotions)",
        result.allocation.source, result.allocation.strategy_used, result.allocation.promotions
    );
}

fn list_strategies() {
    for kind in StrategyKind::ALL {
        println!("{:<18} {}", kind.as_str(), kind.description());
    }
}
