use error_stack::Report;
use tracing::info;

use crate::analysis::AnalysisReport;
use crate::error::ReportError;
use crate::model::{Zone, ZoneKind};
use crate::report::Reporter;

pub struct TerminalReporter;

impl TerminalReporter {
    fn report_zone(&self, kind: ZoneKind, zone: Option<&Zone>, current_price: Option<f64>) {
        let Some(zone) = zone else {
            info!("No untested {kind} Zone found");
            return;
        };

        info!(
            kind = %kind,
            near_bound = zone.near_bound,
            far_bound = zone.far_bound,
            formed_at = %zone.time,
            price_inside = current_price.is_some_and(|p| zone.contains(p)),
            "{kind} Zone: {:.4} - {:.4}",
            zone.lower(),
            zone.upper(),
        );
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, report: &AnalysisReport) -> Result<(), Report<ReportError>> {
        info!(
            symbol = %report.symbol,
            candles = report.candle_count,
            "market structure for {}",
            report.symbol,
        );

        for swing in &report.swings {
            info!(
                time = %swing.time,
                price = swing.price,
                index = swing.index,
                "{swing}"
            );
        }

        info!(
            symbol = %report.symbol,
            swings = report.trend_swings.len(),
            "Trend: {}",
            report.trend,
        );

        self.report_zone(
            ZoneKind::Supply,
            report.zones.supply.as_ref(),
            report.current_price,
        );
        self.report_zone(
            ZoneKind::Demand,
            report.zones.demand.as_ref(),
            report.current_price,
        );

        match report.current_price {
            Some(price) => info!(symbol = %report.symbol, price, "Current price: {price}"),
            None => info!(symbol = %report.symbol, "Current price unavailable"),
        }

        Ok(())
    }
}
