mod analysis;
mod config;
mod error;
mod model;
mod report;
mod series;
mod source;
mod swing;
mod trend;
mod zone;

use std::path::Path;

use clap::Parser;
use derive_more::{Display, Error};
use error_stack::{Report, ResultExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use analysis::Analyzer;
use config::{AppConfig, SourceConfig};
use model::TimeFrame;
use report::Reporter;
use report::json::JsonReporter;
use report::terminal::TerminalReporter;
use series::CandleSeries;
use source::CandleSource;
use source::binance::BinanceSource;
use source::file::FileSource;

#[derive(Debug, Display, Error)]
pub enum AppError {
    #[display("configuration error")]
    Config,
    #[display("candle source error")]
    Source,
    #[display("analysis error")]
    Analysis,
    #[display("report error")]
    Report,
}

#[derive(Parser)]
#[command(
    name = "market-structure",
    about = "Swing, trend and supply/demand zone analysis"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Analyze this symbol instead of `source.symbol`
    #[arg(short, long)]
    symbol: Option<String>,
    /// Emit the report as JSON regardless of `general.output`
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    if let Err(report) = run().await {
        eprintln!("{report:?}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Report<AppError>> {
    let cli = Cli::parse();
    let config = config::load(Path::new(&cli.config)).change_context(AppError::Config)?;

    init_tracing(&config);

    let symbol = cli.symbol.as_deref().unwrap_or(&config.source.symbol);
    // validated in config::load
    let timeframe = TimeFrame::from_str(&config.source.timeframe).unwrap_or(TimeFrame::Day1);

    // ── Candles ───────────────────────────────────────────────────────────────
    let source = build_source(&config.source);
    info!(
        source = source.name(),
        symbol,
        timeframe = %timeframe,
        limit = config.source.limit,
        "fetching candles"
    );

    let candles = source
        .fetch_candles(symbol, timeframe, config.source.limit)
        .await
        .change_context(AppError::Source)?;
    let series = CandleSeries::new(candles).change_context(AppError::Analysis)?;

    let current_price = live_price(source.as_ref(), symbol).await;

    // ── Analysis ──────────────────────────────────────────────────────────────
    let analyzer = Analyzer::from_config(&config.analysis).change_context(AppError::Analysis)?;
    let report = analyzer.run(symbol, &series, current_price);

    // ── Output ────────────────────────────────────────────────────────────────
    let reporter = build_reporter(&config, cli.json);
    reporter.report(&report).change_context(AppError::Report)?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::new(&config.general.log_level);
    // keep stdout clean for the JSON report
    let writer = std::io::stderr;
    match config.general.log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(writer)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .init();
        }
    }
}

/// Live quote for `symbol`. A failed fetch is logged and reported as unavailable.
async fn live_price(source: &dyn CandleSource, symbol: &str) -> Option<f64> {
    match source.fetch_price(symbol).await {
        Ok(price) => price,
        Err(e) => {
            warn!(error = ?e, symbol, "failed to get current price (continuing)");
            None
        }
    }
}

fn build_source(config: &SourceConfig) -> Box<dyn CandleSource> {
    match (config.kind.as_str(), config.path.as_deref()) {
        ("file", Some(path)) => Box::new(FileSource::new(path)),
        _ => Box::new(BinanceSource::new()),
    }
}

fn build_reporter(config: &AppConfig, force_json: bool) -> Box<dyn Reporter> {
    if force_json || config.general.output == "json" {
        Box::new(JsonReporter::stdout())
    } else {
        Box::new(TerminalReporter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_source_reports_no_current_price() {
        let source = FileSource::new("candles.json");
        assert_eq!(live_price(&source, "BTCUSDT").await, None);
    }

    #[tokio::test]
    async fn unreachable_quote_is_unavailable() {
        let source = BinanceSource::with_base_url("http://127.0.0.1:9");
        assert_eq!(live_price(&source, "BTCUSDT").await, None);
    }
}
