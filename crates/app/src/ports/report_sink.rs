//! Report sink port — append-only tabular record of finished days.

use std::future::Future;

use heatsoak_domain::error::SoakError;
use heatsoak_domain::summary::ZoneReport;

pub trait ReportSink {
    /// Append `rows` after any existing content. A new or empty sink gets
    /// the header row first.
    fn append(&self, rows: &[ZoneReport]) -> impl Future<Output = Result<(), SoakError>> + Send;
}
