//! Run report aggregation
//!
//! [`RunReport`] is an append-only sink filled during traversal. At the end
//! of a run it is combined with a [`Census`] of the remote drive into a
//! [`RunSummary`], which knows how to render itself as the plain-text backup
//! report.

use chrono::{DateTime, Local};
use serde::Serialize;

use super::newtypes::RemoteId;

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// A file written to local disk during this run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadedItem {
    pub id: RemoteId,
    /// Remote name, as shown in the report
    pub name: String,
    /// Bytes written to disk
    pub byte_size: u64,
}

/// Per-run accumulator of downloads and per-item failures
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub errors: Vec<String>,
    pub downloaded: Vec<DownloadedItem>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_downloaded(&mut self, item: DownloadedItem) {
        self.downloaded.push(item);
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn downloaded_bytes(&self) -> u64 {
        self.downloaded.iter().map(|d| d.byte_size).sum()
    }
}

/// Totals over every non-trashed item of the remote drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Census {
    pub total_items: u64,
    pub total_bytes: u64,
}

impl Census {
    /// Fold one page of item sizes into the totals
    pub fn add_page(&mut self, sizes: &[Option<u64>]) {
        self.total_items += sizes.len() as u64;
        self.total_bytes += sizes.iter().flatten().sum::<u64>();
    }
}

/// Final summary of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Local>,
    pub census: Census,
    pub downloaded_count: usize,
    pub downloaded_bytes: u64,
    /// Share of remote items downloaded this run, 0 when the census is empty
    pub percentage: f64,
    pub error_count: usize,
    pub report: RunReport,
}

impl RunSummary {
    pub fn new(report: RunReport, census: Census, generated_at: DateTime<Local>) -> Self {
        let downloaded_count = report.downloaded.len();
        let percentage = if census.total_items == 0 {
            0.0
        } else {
            downloaded_count as f64 / census.total_items as f64 * 100.0
        };

        Self {
            generated_at,
            census,
            downloaded_count,
            downloaded_bytes: report.downloaded_bytes(),
            percentage,
            error_count: report.errors.len(),
            report,
        }
    }

    /// File name of the persisted report, e.g. `backup_report_2024-03-01_10-15-30.txt`
    pub fn file_name(&self) -> String {
        format!(
            "backup_report_{}.txt",
            self.generated_at.format("%Y-%m-%d_%H-%M-%S")
        )
    }

    /// Render the report as flat text lines
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "Backup Report - {}",
                self.generated_at.format("%Y-%m-%d %H:%M:%S")
            ),
            format!("Total files on shared drive: {}", self.census.total_items),
            format!(
                "Total size on shared drive: {:.2} GB",
                to_gb(self.census.total_bytes)
            ),
            format!("Total files downloaded this run: {}", self.downloaded_count),
            format!(
                "Total data downloaded this run: {:.2} GB",
                to_gb(self.downloaded_bytes)
            ),
            format!(
                "Percentage of drive downloaded this run: {:.2}%",
                self.percentage
            ),
            format!(
                "Total errors encountered during backup: {}",
                self.error_count
            ),
            String::new(),
            "List of files downloaded:".to_string(),
        ];
        lines.extend(self.report.downloaded.iter().map(|d| d.name.clone()));

        if !self.report.errors.is_empty() {
            lines.push(String::new());
            lines.push("Errors and Warnings encountered during backup:".to_string());
            lines.extend(self.report.errors.iter().cloned());
        }

        lines
    }

    pub fn render(&self) -> String {
        let mut text = self.render_lines().join("\n");
        text.push('\n');
        text
    }
}

fn to_gb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_GB
}
