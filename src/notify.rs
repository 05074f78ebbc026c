// Operator notification for failed runs
//
// The loader only produces the report; delivery is up to the Notifier.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::error;

use crate::loader::RunReport;

/// Notifier - receives the report of a failed run
pub trait Notifier {
    fn notify(&self, report: &RunReport) -> Result<()>;
}

/// Logs the failure through tracing; the default when nothing else is set up
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, report: &RunReport) -> Result<()> {
        error!(
            run_id = %report.run_id,
            status = report.status,
            state = ?report.state,
            dataset_at_risk = report.dataset_at_risk,
            messages = ?report.messages,
            "daily rate data load failed"
        );
        Ok(())
    }
}

/// Writes the report as JSON for an external mailer or monitor to pick up
pub struct ReportFileNotifier {
    path: PathBuf,
}

impl ReportFileNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ReportFileNotifier { path: path.into() }
    }
}

impl Notifier for ReportFileNotifier {
    fn notify(&self, report: &RunReport) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write report to {}", self.path.display()))?;
        Ok(())
    }
}
