use error_stack::{Report, bail};

use crate::error::AnalysisError;
use crate::model::{Candle, SwingKind, SwingPoint};
use crate::series::CandleSeries;
use crate::swing::{SwingDetector, candidate_range};

pub const DEFAULT_STRUCTURAL_LOOKBACK: usize = 4;
pub const DEFAULT_CLOSE_LOOKBACK: usize = 1;

fn check_lookback(lookback: usize) -> Result<(), Report<AnalysisError>> {
    if lookback == 0 {
        bail!(AnalysisError::InvalidParameter {
            name: "lookback must be > 0".into(),
        });
    }
    Ok(())
}

fn swing_at(candle: &Candle, price: f64, kind: SwingKind) -> SwingPoint {
    SwingPoint {
        time: candle.time,
        price,
        kind,
        index: candle.index,
        candle_range: candle.range(),
    }
}

/// High/low extrema: a candle's high (low) must strictly beat every high (low)
/// within `lookback` candles on each side. Both tests run independently, so one
/// candle can yield a High and a Low.
pub struct StructuralDetector {
    lookback: usize,
}

impl StructuralDetector {
    pub fn new(lookback: usize) -> Result<Self, Report<AnalysisError>> {
        check_lookback(lookback)?;
        Ok(Self { lookback })
    }
}

impl SwingDetector for StructuralDetector {
    fn name(&self) -> &str {
        "structural"
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn detect<'a>(&self, series: &'a CandleSeries) -> Box<dyn Iterator<Item = SwingPoint> + 'a> {
        let lookback = self.lookback;
        let candles = series.candles();

        Box::new(
            candidate_range(candles.len(), lookback).flat_map(move |i| {
                let current = &candles[i];
                let left = &candles[i - lookback..i];
                let right = &candles[i + 1..=i + lookback];
                let neighbours = || left.iter().chain(right);

                let mut found = Vec::with_capacity(2);
                if neighbours().all(|c| c.high < current.high) {
                    found.push(swing_at(current, current.high, SwingKind::High));
                }
                if neighbours().all(|c| c.low > current.low) {
                    found.push(swing_at(current, current.low, SwingKind::Low));
                }
                found
            }),
        )
    }
}

/// Close-only extrema for trend classification. High and Low are mutually
/// exclusive per candle.
pub struct CloseDetector {
    lookback: usize,
}

impl CloseDetector {
    pub fn new(lookback: usize) -> Result<Self, Report<AnalysisError>> {
        check_lookback(lookback)?;
        Ok(Self { lookback })
    }
}

impl SwingDetector for CloseDetector {
    fn name(&self) -> &str {
        "close"
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn detect<'a>(&self, series: &'a CandleSeries) -> Box<dyn Iterator<Item = SwingPoint> + 'a> {
        let lookback = self.lookback;
        let candles = series.candles();

        Box::new(
            candidate_range(candles.len(), lookback).filter_map(move |i| {
                let current = &candles[i];
                let mut neighbours = candles[i - lookback..i]
                    .iter()
                    .chain(&candles[i + 1..=i + lookback]);

                if neighbours.clone().all(|c| c.close < current.close) {
                    Some(swing_at(current, current.close, SwingKind::High))
                } else if neighbours.all(|c| c.close > current.close) {
                    Some(swing_at(current, current.close, SwingKind::Low))
                } else {
                    None
                }
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::test_support::{series_from_closes, series_from_highs_lows};

    fn structural() -> StructuralDetector {
        StructuralDetector::new(DEFAULT_STRUCTURAL_LOOKBACK).unwrap()
    }

    fn close() -> CloseDetector {
        CloseDetector::new(DEFAULT_CLOSE_LOOKBACK).unwrap()
    }

    #[test]
    fn zero_lookback_invalid() {
        assert!(StructuralDetector::new(0).is_err());
        assert!(CloseDetector::new(0).is_err());
    }

    #[test]
    fn required_candles_covers_both_windows() {
        assert_eq!(structural().required_candles(), 9);
        assert_eq!(close().required_candles(), 3);
    }

    #[test]
    fn structural_flags_single_peak_only() {
        let highs = [10.0, 11.0, 12.0, 13.0, 14.0, 20.0, 14.0, 13.0, 12.0, 11.0, 10.0];
        let lows: Vec<f64> = highs.iter().map(|h| h - 1.0).collect();
        // lows mirror highs, so no candle is a strict low inside the window
        let series = series_from_highs_lows(&highs, &lows);
        let swings: Vec<_> = structural().detect(&series).collect();

        let high_indices: Vec<usize> = swings
            .iter()
            .filter(|s| s.kind == SwingKind::High)
            .map(|s| s.index)
            .collect();
        assert_eq!(high_indices, vec![5]);
        assert!(swings.iter().all(|s| s.kind == SwingKind::High));
        assert_eq!(swings[0].price, 20.0);
        assert_eq!(swings[0].candle_range, 1.0);
    }

    #[test]
    fn structural_flags_single_trough_only() {
        let lows = [20.0, 19.0, 18.0, 17.0, 16.0, 10.0, 16.0, 17.0, 18.0, 19.0, 20.0];
        let highs: Vec<f64> = lows.iter().map(|l| l + 1.0).collect();
        let series = series_from_highs_lows(&highs, &lows);
        let swings: Vec<_> = structural().detect(&series).collect();

        assert_eq!(swings.len(), 1);
        assert_eq!(swings[0].kind, SwingKind::Low);
        assert_eq!(swings[0].index, 5);
        assert_eq!(swings[0].price, 10.0);
    }

    #[test]
    fn structural_same_candle_can_be_high_and_low() {
        let highs = [10.0, 10.0, 10.0, 10.0, 15.0, 10.0, 10.0, 10.0, 10.0];
        let lows = [8.0, 8.0, 8.0, 8.0, 5.0, 8.0, 8.0, 8.0, 8.0];
        let series = series_from_highs_lows(&highs, &lows);
        let swings: Vec<_> = structural().detect(&series).collect();

        assert_eq!(swings.len(), 2);
        assert_eq!(swings[0].kind, SwingKind::High);
        assert_eq!(swings[1].kind, SwingKind::Low);
        assert!(swings.iter().all(|s| s.index == 4));
    }

    #[test]
    fn structural_last_candidate_is_reached() {
        // 9 candles with lookback 4: index 4 is the only candidate
        let highs = [1.0, 2.0, 3.0, 4.0, 9.0, 4.0, 3.0, 2.0, 1.0];
        let lows = [0.5; 9];
        let series = series_from_highs_lows(&highs, &lows);
        let swings: Vec<_> = structural().detect(&series).collect();
        assert_eq!(swings.len(), 1);
        assert_eq!(swings[0].index, 4);
    }

    #[test]
    fn ties_never_qualify() {
        let highs = [1.0, 2.0, 3.0, 4.0, 9.0, 9.0, 3.0, 2.0, 1.0, 0.5];
        let lows = [0.1; 10];
        let series = series_from_highs_lows(&highs, &lows);
        assert_eq!(structural().detect(&series).count(), 0);

        let closes = [1.0, 3.0, 3.0, 1.0];
        assert_eq!(close().detect(&series_from_closes(&closes)).count(), 0);
    }

    #[test]
    fn monotonic_series_has_no_swings() {
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let falling: Vec<f64> = rising.iter().rev().copied().collect();

        for closes in [rising, falling] {
            let series = series_from_closes(&closes);
            assert_eq!(structural().detect(&series).count(), 0);
            assert_eq!(close().detect(&series).count(), 0);
        }
    }

    #[test]
    fn short_series_yields_nothing() {
        let series = series_from_closes(&[1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        assert_eq!(structural().detect(&series).count(), 0);

        let series = series_from_closes(&[1.0, 2.0]);
        assert_eq!(close().detect(&series).count(), 0);
    }

    #[test]
    fn close_detector_alternates_on_zigzag() {
        let series = series_from_closes(&[1.0, 3.0, 2.0, 4.0, 3.0, 5.0]);
        let swings: Vec<_> = close().detect(&series).collect();
        let kinds: Vec<_> = swings.iter().map(|s| (s.index, s.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (1, SwingKind::High),
                (2, SwingKind::Low),
                (3, SwingKind::High),
                (4, SwingKind::Low),
            ]
        );
        assert_eq!(swings[2].price, 4.0);
    }

    #[test]
    fn close_detector_wider_lookback() {
        let series = series_from_closes(&[1.0, 2.0, 5.0, 3.0, 2.0, 4.0, 1.0]);
        let swings: Vec<_> = CloseDetector::new(2).unwrap().detect(&series).collect();
        assert_eq!(swings.len(), 1);
        assert_eq!(swings[0].index, 2);
        assert_eq!(swings[0].kind, SwingKind::High);
    }
}
