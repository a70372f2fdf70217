//! Reporting error types.

use domain::{RepositoryError, StockError};
use thiserror::Error;

/// Errors that can occur while building a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Inventory error: {0}")]
    Inventory(#[from] StockError),
}

/// Result type for reporting operations.
pub type Result<T> = std::result::Result<T, ReportError>;
