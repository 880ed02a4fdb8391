use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use shared::report::AnalysisReport;

pub const REPORT_FILENAME: &str = "ipo-analysis-report.json";

/// A finished analysis rendered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedReport {
    pub filename: &'static str,
    pub contents: String,
}

impl ExportedReport {
    /// Pretty-prints the document as the analyzer returned it.
    pub fn from_report(report: &AnalysisReport) -> Result<Self, serde_json::Error> {
        Ok(Self {
            filename: REPORT_FILENAME,
            contents: report.to_pretty_json()?,
        })
    }

    /// Writes the report into `dir`, creating the directory if needed.
    pub async fn save_in(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create export directory '{}'", dir.display()))?;
        let path = dir.join(self.filename);
        tokio::fs::write(&path, self.contents.as_bytes())
            .await
            .with_context(|| format!("failed to write report to '{}'", path.display()))?;
        Ok(path)
    }
}
