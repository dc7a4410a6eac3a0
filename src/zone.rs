use error_stack::{Report, bail};
use serde::Serialize;
use tracing::debug;

use crate::error::AnalysisError;
use crate::model::{Candle, Zone, ZoneKind};
use crate::series::CandleSeries;

pub const DEFAULT_BASING_RATIO: f64 = 0.5;

/// The freshest untested zone of each kind, if any.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZoneScan {
    pub supply: Option<Zone>,
    pub demand: Option<Zone>,
}

impl ZoneScan {
    fn complete(&self) -> bool {
        self.supply.is_some() && self.demand.is_some()
    }
}

/// Price envelope of a run of basing candles.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    low: f64,
    high: f64,
}

impl Candidate {
    fn contains(&self, price: f64) -> bool {
        price >= self.low && price <= self.high
    }
}

/// Finds supply and demand zones: runs of small-bodied candles followed by a strong
/// candle that closes beyond the run, with no later close back inside the band.
#[derive(Debug, Clone)]
pub struct ZoneDetector {
    basing_ratio: f64,
}

impl ZoneDetector {
    pub fn new(basing_ratio: f64) -> Result<Self, Report<AnalysisError>> {
        if !(basing_ratio.is_finite() && basing_ratio > 0.0) {
            bail!(AnalysisError::InvalidParameter {
                name: "basing_ratio must be > 0".into(),
            });
        }
        Ok(Self { basing_ratio })
    }

    /// Body smaller than `basing_ratio` of the full range.
    pub fn is_basing(&self, candle: &Candle) -> bool {
        candle.body() < self.basing_ratio * candle.range()
    }

    /// Scan from the newest candle backward. The newest candle can only confirm a
    /// group, never start one. Each kind keeps the first untested match it finds.
    pub fn detect(&self, series: &CandleSeries) -> ZoneScan {
        let candles = series.candles();
        let mut scan = ZoneScan::default();
        if candles.len() < 2 {
            return scan;
        }

        let basing: Vec<bool> = candles.iter().map(|c| self.is_basing(c)).collect();

        for i in (0..candles.len() - 1).rev() {
            if !basing[i] {
                continue;
            }

            let start = basing_run_start(&basing, i);
            let group = &candles[start..=i];
            let confirmation = &candles[i + 1];
            let later = &candles[i + 2..];

            if scan.supply.is_none() && confirmation.is_sell() {
                let candidate = supply_candidate(group);
                if confirmation.close < candidate.low && untested(&candidate, later) {
                    debug!(
                        start,
                        end = i,
                        low = candidate.low,
                        high = candidate.high,
                        "supply zone found"
                    );
                    scan.supply = Some(Zone {
                        near_bound: candidate.low,
                        far_bound: candidate.high,
                        time: candles[start].time,
                        kind: ZoneKind::Supply,
                    });
                }
            }

            if scan.demand.is_none() && confirmation.is_buy() {
                let candidate = demand_candidate(group);
                if confirmation.close > candidate.high && untested(&candidate, later) {
                    debug!(
                        start,
                        end = i,
                        low = candidate.low,
                        high = candidate.high,
                        "demand zone found"
                    );
                    scan.demand = Some(Zone {
                        near_bound: candidate.high,
                        far_bound: candidate.low,
                        time: candles[start].time,
                        kind: ZoneKind::Demand,
                    });
                }
            }

            if scan.complete() {
                break;
            }
        }

        scan
    }
}

impl Default for ZoneDetector {
    fn default() -> Self {
        Self {
            basing_ratio: DEFAULT_BASING_RATIO,
        }
    }
}

/// Earliest index of the contiguous basing run ending at `end`.
fn basing_run_start(basing: &[bool], end: usize) -> usize {
    let mut start = end;
    while start > 0 && basing[start - 1] {
        start -= 1;
    }
    start
}

fn supply_candidate(group: &[Candle]) -> Candidate {
    Candidate {
        low: group
            .iter()
            .map(|c| c.open.min(c.close))
            .fold(f64::MAX, f64::min),
        high: group.iter().map(|c| c.high).fold(f64::MIN, f64::max),
    }
}

fn demand_candidate(group: &[Candle]) -> Candidate {
    Candidate {
        low: group.iter().map(|c| c.low).fold(f64::MAX, f64::min),
        high: group
            .iter()
            .map(|c| c.open.max(c.close))
            .fold(f64::MIN, f64::max),
    }
}

fn untested(candidate: &Candidate, later: &[Candle]) -> bool {
    !later.iter().any(|c| candidate.contains(c.close))
}
