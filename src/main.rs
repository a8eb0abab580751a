//! Stock breakout analysis - main entry point
//!
//! This binary provides two subcommands:
//! - analyze: Detect breakout days and backtest the holding-period trade
//! - download: Fetch daily bars and cache them as CSV

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "breakout-analysis")]
#[command(about = "Stock breakout detection with fixed holding-period backtesting", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the breakout detection and backtest pipeline
    Analyze {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Stock ticker (e.g., AAPL)
        #[arg(short, long)]
        ticker: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Volume breakout threshold in percent of the 20-day average (>= 100)
        #[arg(long)]
        volume_threshold: Option<f64>,

        /// Daily price change threshold in percent (> 0)
        #[arg(long)]
        price_threshold: Option<f64>,

        /// Holding period in calendar days (>= 1)
        #[arg(long)]
        holding_period: Option<u32>,

        /// Require the target sell date to be a trading day instead of
        /// rolling forward to the next one
        #[arg(long)]
        exact_sell_date: bool,

        /// Read bars from a CSV file instead of fetching from a provider
        #[arg(long)]
        data: Option<String>,

        /// Report CSV path (default: results/{TICKER}_breakout_analysis.csv)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Download daily bars and cache them as CSV
    Download {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Tickers to download (comma-separated). E.g., "AAPL,MSFT"
        #[arg(short, long)]
        tickers: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Output directory (default: the configured data_dir)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    // Filter out noisy HTTP crates
    let level = if verbose { "debug" } else { "info" };
    let filter_str = format!("{},hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn", level);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let command_name = match &cli.command {
        Commands::Analyze { .. } => "analyze",
        Commands::Download { .. } => "download",
    };

    setup_logging(cli.verbose, command_name)?;

    match cli.command {
        Commands::Analyze {
            config,
            ticker,
            start,
            end,
            volume_threshold,
            price_threshold,
            holding_period,
            exact_sell_date,
            data,
            output,
        } => commands::analyze::run(
            config,
            ticker,
            start,
            end,
            volume_threshold,
            price_threshold,
            holding_period,
            exact_sell_date,
            data,
            output,
        ),

        Commands::Download {
            config,
            tickers,
            start,
            end,
            output,
        } => commands::download::run(config, tickers, start, end, output),
    }
}
