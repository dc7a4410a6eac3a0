use std::io::Write;
use std::sync::{Mutex, PoisonError};

use error_stack::{Report, ResultExt};

use crate::analysis::AnalysisReport;
use crate::error::ReportError;
use crate::report::Reporter;

/// Writes each report as pretty-printed JSON followed by a newline.
pub struct JsonReporter<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl JsonReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> Reporter for JsonReporter<W> {
    fn report(&self, report: &AnalysisReport) -> Result<(), Report<ReportError>> {
        let mut writer = self
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        serde_json::to_writer_pretty(&mut *writer, report).change_context(ReportError::Write)?;
        writeln!(writer).change_context(ReportError::Write)?;
        writer.flush().change_context(ReportError::Write)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Trend, Zone, ZoneKind};
    use crate::series::test_support::base_time;
    use crate::zone::ZoneScan;

    fn sample_report() -> AnalysisReport {
        AnalysisReport {
            symbol: "BTCUSDT".into(),
            candle_count: 3,
            swings: Vec::new(),
            trend_swings: Vec::new(),
            trend: Trend::NoClearTrend,
            zones: ZoneScan {
                supply: Some(Zone {
                    near_bound: 100.0,
                    far_bound: 102.0,
                    time: base_time(),
                    kind: ZoneKind::Supply,
                }),
                demand: None,
            },
            current_price: Some(99.5),
        }
    }

    #[test]
    fn writes_pretty_json() {
        let reporter = JsonReporter::new(Vec::new());
        reporter.report(&sample_report()).unwrap();
        let output = String::from_utf8(reporter.into_inner()).unwrap();

        assert!(output.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["symbol"], "BTCUSDT");
        assert_eq!(value["trend"], "No Clear Trend");
        assert_eq!(value["zones"]["supply"]["near_bound"], 100.0);
        assert_eq!(value["zones"]["supply"]["kind"], "Supply");
        assert!(value["zones"]["demand"].is_null());
        assert_eq!(value["current_price"], 99.5);
    }

    #[test]
    fn consecutive_reports_are_appended() {
        let reporter = JsonReporter::new(Vec::new());
        reporter.report(&sample_report()).unwrap();
        reporter.report(&sample_report()).unwrap();
        let output = String::from_utf8(reporter.into_inner()).unwrap();

        let documents: Vec<serde_json::Value> = serde_json::Deserializer::from_str(&output)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(documents.len(), 2);
    }
}
