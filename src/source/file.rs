use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use error_stack::{Report, ResultExt};
use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::info;

use crate::error::SourceError;
use crate::model::{Candle, TimeFrame};
use crate::source::CandleSource;

fn read_error() -> SourceError {
    SourceError::ReadFile {
        source_name: "file".into(),
    }
}

fn parse_error() -> SourceError {
    SourceError::ResponseParse {
        source_name: "file".into(),
    }
}

/// Candles recorded to disk as a JSON array, oldest first.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn read_candles(&self, limit: usize) -> Result<Vec<Candle>, Report<SourceError>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .change_context_lazy(read_error)
            .attach_with(|| format!("path: {}", self.path.display()))?;

        let rows: Vec<CandleRow> = serde_json::from_str(&content)
            .change_context_lazy(parse_error)
            .attach_with(|| format!("path: {}", self.path.display()))?;

        let skip = rows.len().saturating_sub(limit);
        let candles: Vec<Candle> = rows
            .into_iter()
            .skip(skip)
            .enumerate()
            .map(|(index, row)| row.into_candle(index))
            .collect();

        info!(
            path = %self.path.display(),
            loaded = candles.len(),
            "candle file loaded"
        );

        Ok(candles)
    }
}

impl CandleSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    /// The file carries a single series, so `symbol` and `timeframe` only label it.
    fn fetch_candles(
        &self,
        _symbol: &str,
        _timeframe: TimeFrame,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Candle>, Report<SourceError>>> {
        Box::pin(self.read_candles(limit))
    }

    fn fetch_price(&self, _symbol: &str) -> BoxFuture<'_, Result<Option<f64>, Report<SourceError>>> {
        Box::pin(async { Ok(None) })
    }
}

#[derive(Debug, Deserialize)]
struct CandleRow {
    #[serde(with = "chrono::serde::ts_seconds")]
    time: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl CandleRow {
    fn into_candle(self, index: usize) -> Candle {
        Candle {
            time: self.time,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"time": 1704067200, "open": 1.0, "high": 2.0, "low": 0.5, "close": 1.5},
        {"time": 1704153600, "open": 1.5, "high": 2.5, "low": 1.0, "close": 2.0},
        {"time": 1704240000, "open": 2.0, "high": 3.0, "low": 1.5, "close": 2.5}
    ]"#;

    fn write_sample(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "market-structure-{}-{name}.json",
            std::process::id()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn loads_all_candles_when_limit_is_large() {
        let path = write_sample("all", SAMPLE);
        let source = FileSource::new(&path);
        let candles = source
            .fetch_candles("TEST", TimeFrame::Day1, 100)
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(candles.len(), 3);
        assert_eq!(candles[0].time.timestamp(), 1704067200);
        assert_eq!(candles[2].close, 2.5);
        assert_eq!(candles[2].index, 2);
    }

    #[tokio::test]
    async fn keeps_newest_candles_under_limit() {
        let path = write_sample("limit", SAMPLE);
        let source = FileSource::new(&path);
        let candles = source
            .fetch_candles("TEST", TimeFrame::Day1, 2)
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, 2.0);
        assert_eq!(candles[0].index, 0);
        assert_eq!(candles[1].close, 2.5);
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let source = FileSource::new("/nonexistent/market-structure/candles.json");
        let err = source
            .fetch_candles("TEST", TimeFrame::Day1, 10)
            .await
            .unwrap_err();
        assert!(matches!(
            err.current_context(),
            SourceError::ReadFile { .. }
        ));
    }

    #[tokio::test]
    async fn malformed_file_is_a_parse_error() {
        let path = write_sample("malformed", r#"[{"time": "yesterday"}]"#);
        let source = FileSource::new(&path);
        let err = source
            .fetch_candles("TEST", TimeFrame::Day1, 10)
            .await
            .unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            err.current_context(),
            SourceError::ResponseParse { .. }
        ));
    }

    #[tokio::test]
    async fn file_source_has_no_live_price() {
        let source = FileSource::new("unused.json");
        assert_eq!(source.fetch_price("TEST").await.unwrap(), None);
    }
}
