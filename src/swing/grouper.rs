use error_stack::{Report, bail};

use crate::error::AnalysisError;
use crate::model::{RefinedSwingPoint, SwingKind};

pub const DEFAULT_MAX_GAP: usize = 10;
pub const DEFAULT_RANGE_RATIO: f64 = 0.5;

/// Collapses clusters of nearby same-kind swings that sit at roughly the same price.
///
/// Grouping is two-phase: [`partition`] chains swings into runs whose consecutive
/// index gaps are at most `max_gap`, then [`SwingGrouper::reduce`] decides per run
/// whether it is one level (keep the extreme member) or several (keep everything).
#[derive(Debug, Clone)]
pub struct SwingGrouper {
    max_gap: usize,
    range_ratio: f64,
}

impl SwingGrouper {
    pub fn new(max_gap: usize, range_ratio: f64) -> Result<Self, Report<AnalysisError>> {
        if !(range_ratio.is_finite() && range_ratio > 0.0) {
            bail!(AnalysisError::InvalidParameter {
                name: "range_ratio must be > 0".into(),
            });
        }
        Ok(Self {
            max_gap,
            range_ratio,
        })
    }

    pub fn group(&self, swings: &[RefinedSwingPoint]) -> Vec<RefinedSwingPoint> {
        let mut out = self.group_kind(swings, SwingKind::High);
        out.extend(self.group_kind(swings, SwingKind::Low));
        // stable: a High stays ahead of a Low on the same candle
        out.sort_by_key(|s| s.index);
        out
    }

    fn group_kind(&self, swings: &[RefinedSwingPoint], kind: SwingKind) -> Vec<RefinedSwingPoint> {
        let mut of_kind: Vec<&RefinedSwingPoint> =
            swings.iter().filter(|s| s.kind == kind).collect();
        of_kind.sort_by_key(|s| s.index);

        partition(&of_kind, self.max_gap)
            .into_iter()
            .flat_map(|run| self.reduce(run, kind))
            .cloned()
            .collect()
    }

    /// Keep only the extreme member of a run when its price spread is below
    /// `range_ratio` of the widest candle in it. Highs keep the highest price, lows
    /// the lowest; on a tie the earliest member wins.
    fn reduce<'a>(
        &self,
        run: &[&'a RefinedSwingPoint],
        kind: SwingKind,
    ) -> Vec<&'a RefinedSwingPoint> {
        if run.len() < 2 {
            return run.to_vec();
        }

        let max_price = run.iter().map(|s| s.price).fold(f64::MIN, f64::max);
        let min_price = run.iter().map(|s| s.price).fold(f64::MAX, f64::min);
        let max_range = run.iter().map(|s| s.candle_range).fold(f64::MIN, f64::max);

        if max_price - min_price >= self.range_ratio * max_range {
            return run.to_vec();
        }

        let best = run.iter().copied().reduce(|best, candidate| {
            let better = match kind {
                SwingKind::High => candidate.price > best.price,
                SwingKind::Low => candidate.price < best.price,
            };
            if better { candidate } else { best }
        });
        best.into_iter().collect()
    }
}

impl Default for SwingGrouper {
    fn default() -> Self {
        Self {
            max_gap: DEFAULT_MAX_GAP,
            range_ratio: DEFAULT_RANGE_RATIO,
        }
    }
}

/// Split index-sorted swings into maximal runs. A swing joins the current run when it
/// is within `max_gap` candles of the run's most recently added member.
fn partition<'a, 'b>(
    sorted: &'b [&'a RefinedSwingPoint],
    max_gap: usize,
) -> Vec<&'b [&'a RefinedSwingPoint]> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..sorted.len() {
        if sorted[i].index - sorted[i - 1].index > max_gap {
            runs.push(&sorted[start..i]);
            start = i;
        }
    }
    if start < sorted.len() {
        runs.push(&sorted[start..]);
    }
    runs
}
