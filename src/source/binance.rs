use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::SourceError;
use crate::model::{Candle, TimeFrame};
use crate::source::CandleSource;

const BINANCE_BASE_URL: &str = "https://api.binance.com";
pub const MAX_CANDLES_PER_REQUEST: usize = 1000;
/// Half of the ~40 req/s the kline weight (2 of 5000/min) allows.
const BINANCE_REQUESTS_PER_SECOND: NonZeroU32 = NonZeroU32::new(20).unwrap();

fn request_error() -> SourceError {
    SourceError::Request {
        source_name: "binance".into(),
    }
}

fn parse_error() -> SourceError {
    SourceError::ResponseParse {
        source_name: "binance".into(),
    }
}

pub struct BinanceSource {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl BinanceSource {
    pub fn new() -> Self {
        Self::with_base_url(BINANCE_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let quota = Quota::per_second(BINANCE_REQUESTS_PER_SECOND);
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    async fn get(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<reqwest::Response, Report<SourceError>> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .change_context_lazy(request_error)?;

        if !response.status().is_success() {
            return Err(Report::new(request_error())
                .attach(format!("HTTP status: {}", response.status())));
        }
        Ok(response)
    }
}

impl Default for BinanceSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CandleSource for BinanceSource {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Candle>, Report<SourceError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move { self.klines(&symbol, timeframe, limit).await })
    }

    fn fetch_price(&self, symbol: &str) -> BoxFuture<'_, Result<Option<f64>, Report<SourceError>>> {
        let symbol = symbol.to_owned();
        Box::pin(async move { self.ticker_price(&symbol).await.map(Some) })
    }
}

impl BinanceSource {
    async fn klines(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        limit: usize,
    ) -> Result<Vec<Candle>, Report<SourceError>> {
        if limit > MAX_CANDLES_PER_REQUEST {
            warn!(
                requested = limit,
                cap = MAX_CANDLES_PER_REQUEST,
                "candle limit exceeds binance request cap"
            );
        }
        let limit_str = limit.min(MAX_CANDLES_PER_REQUEST).to_string();
        let params = [
            ("symbol", symbol),
            ("interval", timeframe.binance_interval()),
            ("limit", limit_str.as_str()),
        ];

        let raw: Vec<BinanceKlineRow> = self
            .get("/api/v3/klines", &params)
            .await?
            .json()
            .await
            .change_context_lazy(parse_error)?;

        info!(
            symbol,
            timeframe = %timeframe,
            fetched = raw.len(),
            "binance candle fetch complete"
        );

        let candles = raw
            .into_iter()
            .enumerate()
            .map(|(index, row)| row.into_candle(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(candles)
    }

    async fn ticker_price(&self, symbol: &str) -> Result<f64, Report<SourceError>> {
        let ticker: BinanceTickerPrice = self
            .get("/api/v3/ticker/price", &[("symbol", symbol)])
            .await?
            .json()
            .await
            .change_context_lazy(parse_error)?;

        ticker
            .price
            .parse::<f64>()
            .change_context_lazy(parse_error)
            .attach_with(|| format!("price: {}", ticker.price))
    }
}

// ── REST response types ───────────────────────────────────────────────────────

/// Binance kline row: `[open_time, open, high, low, close, volume, close_time, ...]`
#[derive(Debug, Deserialize)]
struct BinanceKlineRow(
    i64,                        // 0: open_time (ms)
    String,                     // 1: open
    String,                     // 2: high
    String,                     // 3: low
    String,                     // 4: close
    #[allow(dead_code)] String, // 5: volume
    #[allow(dead_code)] i64,    // 6: close_time
    #[allow(dead_code)] String, // 7: quote asset volume
    #[allow(dead_code)] i64,    // 8: number of trades
    #[allow(dead_code)] String, // 9: taker buy base volume
    #[allow(dead_code)] String, // 10: taker buy quote volume
    #[allow(dead_code)] String, // 11: ignore
);

impl BinanceKlineRow {
    fn into_candle(self, index: usize) -> Result<Candle, Report<SourceError>> {
        let parse_f64 = |s: &str| -> Result<f64, Report<SourceError>> {
            s.parse::<f64>()
                .change_context_lazy(parse_error)
                .attach_with(|| format!("value: {s}"))
        };

        let time: DateTime<Utc> = DateTime::from_timestamp_millis(self.0)
            .ok_or_else(|| Report::new(parse_error()))
            .attach_with(|| format!("open_time: {}", self.0))?;

        Ok(Candle {
            time,
            open: parse_f64(&self.1)?,
            high: parse_f64(&self.2)?,
            low: parse_f64(&self.3)?,
            close: parse_f64(&self.4)?,
            index,
        })
    }
}

#[derive(Debug, Deserialize)]
struct BinanceTickerPrice {
    price: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(open_time: i64, close: &str) -> BinanceKlineRow {
        BinanceKlineRow(
            open_time,
            "42000.0".into(),
            "43000.0".into(),
            "41500.0".into(),
            close.into(),
            "100.5".into(),
            open_time + 59_999,
            "0".into(),
            10,
            "0".into(),
            "0".into(),
            "0".into(),
        )
    }

    #[test]
    fn binance_kline_row_parses_into_candle() {
        let candle = row(1704067200000, "42500.0").into_candle(3).unwrap();
        assert_eq!(candle.open, 42000.0);
        assert_eq!(candle.high, 43000.0);
        assert_eq!(candle.low, 41500.0);
        assert_eq!(candle.close, 42500.0);
        assert_eq!(candle.index, 3);
        assert_eq!(candle.time.timestamp(), 1704067200);
    }

    #[test]
    fn binance_kline_row_rejects_bad_number() {
        assert!(row(1704067200000, "n/a").into_candle(0).is_err());
    }

    #[test]
    fn binance_kline_json_deserializes() {
        let json = r#"[[1704067200000,"1.0","2.0","0.5","1.5","10.0",1704067259999,"15.0",7,"5.0","7.5","0"]]"#;
        let rows: Vec<BinanceKlineRow> = serde_json::from_str(json).unwrap();
        let candle = rows.into_iter().next().unwrap().into_candle(0).unwrap();
        assert_eq!(candle.close, 1.5);
    }

    #[test]
    fn binance_ticker_json_deserializes() {
        let ticker: BinanceTickerPrice =
            serde_json::from_str(r#"{"symbol":"BTCUSDT","price":"42123.45"}"#).unwrap();
        assert_eq!(ticker.price, "42123.45");
    }

    /// Integration test: requires network access. Run with `cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn integration_fetch_candles() {
        let source = BinanceSource::new();
        let candles = source
            .fetch_candles("BTCUSDT", TimeFrame::Day1, 10)
            .await
            .unwrap();
        assert!(!candles.is_empty());
        assert!(candles.len() <= 10);
    }

    /// Integration test: requires network access. Run with `cargo test -- --ignored`
    #[tokio::test]
    #[ignore]
    async fn integration_fetch_price() {
        let source = BinanceSource::new();
        let price = source.fetch_price("BTCUSDT").await.unwrap();
        assert!(price.is_some_and(|p| p > 0.0));
    }
}
