//! # heatsoak-adapter-export-csv
//!
//! Append-only CSV record of finished days, one row per zone.
//!
//! ## Responsibilities
//! - Implement the `ReportSink` port trait defined in `heatsoak-app::ports`
//! - Write the header row only when the file is new or empty
//! - Quote cells so zone names and timestamps never break the layout
//!
//! ## Dependency rule
//! Depends on `heatsoak-app` (for port traits) and `heatsoak-domain` (for domain types).

pub mod error;

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use heatsoak_app::ports::ReportSink;
use heatsoak_domain::error::SoakError;
use heatsoak_domain::summary::ZoneReport;

use crate::error::ExportError;

/// CSV file sink. The file and its header are created on first append.
#[derive(Debug, Clone)]
pub struct CsvReportSink {
    path: PathBuf,
}

impl CsvReportSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_rows(&self, rows: &[ZoneReport]) -> Result<(), ExportError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut buffer = String::new();
        if file.metadata().await?.len() == 0 {
            push_record(&mut buffer, ZoneReport::HEADERS.iter().copied());
        }
        for row in rows {
            let values = row.values();
            push_record(&mut buffer, values.iter().map(String::as_str));
        }

        file.write_all(buffer.as_bytes()).await?;
        file.sync_all().await?;
        Ok(())
    }
}

impl ReportSink for CsvReportSink {
    async fn append(&self, rows: &[ZoneReport]) -> Result<(), SoakError> {
        self.write_rows(rows).await?;
        Ok(())
    }
}

fn push_record<'a>(buffer: &mut String, cells: impl Iterator<Item = &'a str>) {
    for (index, cell) in cells.enumerate() {
        if index > 0 {
            buffer.push(',');
        }
        if cell.contains([',', '"', '\n', '\r']) {
            buffer.push('"');
            buffer.push_str(&cell.replace('"', "\"\""));
            buffer.push('"');
        } else {
            buffer.push_str(cell);
        }
    }
    buffer.push('\n');
}
