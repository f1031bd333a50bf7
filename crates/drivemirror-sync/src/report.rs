//! Persists rendered run summaries

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use drivemirror_core::domain::RunSummary;
use tracing::info;

/// Writes `backup_report_*.txt` files into a reports directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `summary` to the reports directory, creating it if needed
    ///
    /// # Returns
    /// Path of the written report
    pub async fn write(&self, summary: &RunSummary) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create reports directory {}", self.dir.display()))?;

        let path = self.dir.join(summary.file_name());
        tokio::fs::write(&path, summary.render())
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;

        info!(path = %path.display(), "Report saved");
        Ok(path)
    }
}
