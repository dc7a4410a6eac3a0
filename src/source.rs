pub mod binance;
pub mod file;

use error_stack::Report;
use futures::future::BoxFuture;

use crate::error::SourceError;
use crate::model::{Candle, TimeFrame};

/// Where candles and live quotes come from.
///
/// Uses `BoxFuture` (from `futures` crate) instead of `async fn` in trait
/// to keep the trait object-safe (`dyn CandleSource`).
pub trait CandleSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch up to `limit` of the most recent candles, oldest first.
    fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: TimeFrame,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Candle>, Report<SourceError>>>;

    /// Current price for `symbol`, or `None` when the source has no live quote.
    fn fetch_price(&self, symbol: &str) -> BoxFuture<'_, Result<Option<f64>, Report<SourceError>>>;
}
