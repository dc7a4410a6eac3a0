use std::ops::Deref;

use error_stack::{Report, bail};
use tracing::warn;

use crate::error::AnalysisError;
use crate::model::Candle;

/// Validated, chronologically ordered candles.
///
/// Construction re-numbers every candle's `index` to its position, so downstream
/// stages can rely on `series[i].index == i`.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(mut candles: Vec<Candle>) -> Result<Self, Report<AnalysisError>> {
        if candles.is_empty() {
            bail!(AnalysisError::InvalidInput {
                reason: "candle series is empty".into(),
            });
        }

        for (position, candle) in candles.iter_mut().enumerate() {
            candle.index = position;
        }

        for candle in &candles {
            validate_candle(candle)?;
        }

        for pair in candles.windows(2) {
            if pair[1].time <= pair[0].time {
                bail!(AnalysisError::InvalidInput {
                    reason: format!(
                        "timestamps must be strictly increasing: index {} ({}) follows {}",
                        pair[1].index, pair[1].time, pair[0].time
                    ),
                });
            }
        }

        Ok(Self { candles })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }
}

impl Deref for CandleSeries {
    type Target = [Candle];

    fn deref(&self) -> &Self::Target {
        &self.candles
    }
}

fn validate_candle(candle: &Candle) -> Result<(), Report<AnalysisError>> {
    let prices = [candle.open, candle.high, candle.low, candle.close];
    if prices.iter().any(|p| !p.is_finite()) {
        bail!(AnalysisError::InvalidInput {
            reason: format!("candle {} has a non-finite price", candle.index),
        });
    }
    // Rounding feeds can overshoot the range: warn and keep the candle.
    if candle.high < candle.low {
        warn!(
            index = candle.index,
            high = candle.high,
            low = candle.low,
            "candle high below low"
        );
    }
    let within = |p: f64| p >= candle.low && p <= candle.high;
    if !within(candle.open) || !within(candle.close) {
        warn!(
            index = candle.index,
            open = candle.open,
            close = candle.close,
            high = candle.high,
            low = candle.low,
            "candle open/close outside its range"
        );
    }
    Ok(())
}
