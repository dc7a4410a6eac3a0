use error_stack::Report;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::model::{RefinedSwingPoint, Trend};
use crate::series::CandleSeries;
use crate::swing::SwingDetector;
use crate::swing::detector::{CloseDetector, StructuralDetector};
use crate::swing::grouper::SwingGrouper;
use crate::swing::refiner::refine;
use crate::trend::TrendClassifier;
use crate::zone::{ZoneDetector, ZoneScan};

/// Everything one analysis pass produces for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub candle_count: usize,
    /// Structural swings after grouping, for chart overlays.
    pub swings: Vec<RefinedSwingPoint>,
    /// Close-based swings the trend was classified from.
    pub trend_swings: Vec<RefinedSwingPoint>,
    pub trend: Trend,
    pub zones: ZoneScan,
    pub current_price: Option<f64>,
}

pub struct Analyzer {
    structural: Box<dyn SwingDetector>,
    trend_detector: Box<dyn SwingDetector>,
    grouper: SwingGrouper,
    classifier: TrendClassifier,
    zones: ZoneDetector,
}

impl Analyzer {
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, Report<AnalysisError>> {
        Ok(Self {
            structural: Box::new(StructuralDetector::new(config.structural_lookback)?),
            trend_detector: Box::new(CloseDetector::new(config.trend_lookback)?),
            grouper: SwingGrouper::new(config.group_max_gap, config.group_range_ratio)?,
            classifier: TrendClassifier::new(config.trend_required_sets)?,
            zones: ZoneDetector::new(config.basing_ratio)?,
        })
    }

    /// Structural swings: detect on highs/lows, label, then collapse clusters.
    pub fn structural_swings(&self, series: &CandleSeries) -> Vec<RefinedSwingPoint> {
        self.swings_with(self.structural.as_ref(), series, true)
    }

    /// Close-based swings, labelled but not grouped.
    pub fn trend_swings(&self, series: &CandleSeries) -> Vec<RefinedSwingPoint> {
        self.swings_with(self.trend_detector.as_ref(), series, false)
    }

    fn swings_with(
        &self,
        detector: &dyn SwingDetector,
        series: &CandleSeries,
        grouped: bool,
    ) -> Vec<RefinedSwingPoint> {
        if series.len() < detector.required_candles() {
            debug!(
                detector = detector.name(),
                available = series.len(),
                required = detector.required_candles(),
                "insufficient candles for swing detection"
            );
            return Vec::new();
        }

        let refined = refine(detector.detect(series));
        if !grouped {
            return refined;
        }

        let final_swings = self.grouper.group(&refined);
        debug!(
            detector = detector.name(),
            refined = refined.len(),
            grouped = final_swings.len(),
            "swing grouping complete"
        );
        final_swings
    }

    pub fn run(
        &self,
        symbol: &str,
        series: &CandleSeries,
        current_price: Option<f64>,
    ) -> AnalysisReport {
        let swings = self.structural_swings(series);
        let trend_swings = self.trend_swings(series);
        let trend = self.classifier.classify(&trend_swings);
        debug!(swings = trend_swings.len(), trend = %trend, "trend classified");
        let zones = self.zones.detect(series);

        info!(
            symbol,
            candles = series.len(),
            swings = swings.len(),
            trend_swings = trend_swings.len(),
            trend = %trend,
            supply = zones.supply.is_some(),
            demand = zones.demand.is_some(),
            "analysis complete"
        );

        AnalysisReport {
            symbol: symbol.to_owned(),
            candle_count: series.len(),
            swings,
            trend_swings,
            trend,
            zones,
            current_price,
        }
    }
}
