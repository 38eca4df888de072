//! Export-specific error type.

use heatsoak_domain::error::SoakError;

/// Errors originating from the CSV export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("cannot write report file")]
    Io(#[from] std::io::Error),
}

impl From<ExportError> for SoakError {
    fn from(err: ExportError) -> Self {
        Self::Export(Box::new(err))
    }
}
