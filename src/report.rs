pub mod json;
pub mod terminal;

use error_stack::Report;

use crate::analysis::AnalysisReport;
use crate::error::ReportError;

/// Sink for finished analysis results.
pub trait Reporter: Send + Sync {
    fn report(&self, report: &AnalysisReport) -> Result<(), Report<ReportError>>;
}
