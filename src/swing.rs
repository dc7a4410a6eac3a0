pub mod detector;
pub mod grouper;
pub mod refiner;

use std::ops::Range;

use crate::model::SwingPoint;
use crate::series::CandleSeries;

/// A windowed local-extremum search over a candle series.
///
/// Implementations yield swing points lazily, in ascending index order.
pub trait SwingDetector: Send + Sync {
    /// Short name used in logs (e.g., "structural", "close").
    fn name(&self) -> &str;

    /// Number of candles compared on each side of a candidate.
    fn lookback(&self) -> usize;

    /// Minimum number of candles required to produce any swing point.
    fn required_candles(&self) -> usize {
        2 * self.lookback() + 1
    }

    fn detect<'a>(&self, series: &'a CandleSeries) -> Box<dyn Iterator<Item = SwingPoint> + 'a>;
}

/// Candidate indices that have `lookback` candles on both sides.
///
/// Empty when `len <= 2 * lookback`.
pub fn candidate_range(len: usize, lookback: usize) -> Range<usize> {
    lookback..len.saturating_sub(lookback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_range_leaves_full_window() {
        assert_eq!(candidate_range(10, 4), 4..6);
        assert_eq!(candidate_range(3, 1), 1..2);
    }

    #[test]
    fn candidate_range_empty_when_too_short() {
        assert!(candidate_range(8, 4).is_empty());
        assert!(candidate_range(2, 1).is_empty());
        assert!(candidate_range(0, 1).is_empty());
    }
}
